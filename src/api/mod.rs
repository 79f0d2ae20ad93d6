use axum::Json;
use axum::extract::{Path, Query};
use axum::routing::post;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::dates::parse_date;
use crate::error::AppError;
use crate::models::*;
use crate::services::{
    CalendarData, DateRange, DayMarkers, DaySelection, LeaveOverview, LeaveService, MonthEvent,
    SubmissionReceipt, TaskService, TaskView, YearMonth, load_profile,
};
use crate::state::AppState;

#[derive(Deserialize)]
struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

/// Session as exposed to the screens; tokens stay in the process.
#[derive(Debug, Serialize)]
struct SessionInfo {
    user: AuthUser,
    expires_at: i64,
}

impl From<Session> for SessionInfo {
    fn from(session: Session) -> Self {
        Self {
            user: session.user,
            expires_at: session.expires_at,
        }
    }
}

#[derive(Deserialize)]
struct CalendarParams {
    month: Option<String>,
}

#[derive(Serialize)]
struct CalendarView {
    month: String,
    markers: DayMarkers,
    events: Vec<MonthEvent>,
}

#[derive(Deserialize)]
struct LeaveParams {
    year: Option<i32>,
    start: Option<String>,
    end: Option<String>,
}

#[derive(Deserialize)]
struct CarryForwardInput {
    days: f64,
    year: Option<i32>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/session", get(current_session))
        .route("/profile", get(profile))
        .route("/calendar", get(calendar))
        .route("/calendar/days/{date}", get(calendar_day))
        .route("/leave", get(leave_overview))
        .route("/leave/requests", post(request_pto))
        .route("/leave/carry-forward", post(request_carry_forward))
        .route("/tasks", get(list_tasks))
        .route("/tasks/{id}/changes", post(submit_task_changes))
        .with_state(state)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionInfo>, AppError> {
    let session = state.session.sign_in(&req.email, &req.password).await?;
    Ok(Json(session.into()))
}

async fn logout(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.session.sign_out().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn current_session(State(state): State<AppState>) -> Json<Option<SessionInfo>> {
    Json(state.session.current().map(SessionInfo::from))
}

async fn profile(State(state): State<AppState>) -> Result<Json<Profile>, AppError> {
    state.session.require()?;
    let profile = load_profile(state.backend.as_ref()).await?;
    Ok(Json(profile))
}

async fn calendar(
    State(state): State<AppState>,
    Query(params): Query<CalendarParams>,
) -> Result<Json<CalendarView>, AppError> {
    state.session.require()?;
    let month = match params.month.as_deref() {
        Some(m) => m.parse::<YearMonth>()?,
        None => YearMonth::of(today()),
    };

    let data = CalendarData::load(state.backend.as_ref()).await?;
    Ok(Json(CalendarView {
        month: month.to_string(),
        markers: data.markers(month.year),
        events: data.month_events(month),
    }))
}

async fn calendar_day(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<DaySelection>, AppError> {
    state.session.require()?;
    let day = parse_date(&date)
        .map_err(|e| AppError::validation("Invalid Date", e.to_string()))?;

    let data = CalendarData::load(state.backend.as_ref()).await?;
    Ok(Json(data.day_selection(&date, day.year())))
}

async fn leave_overview(
    State(state): State<AppState>,
    Query(params): Query<LeaveParams>,
) -> Result<Json<LeaveOverview>, AppError> {
    let session = state.session.require()?;
    let today = today();
    let range = DateRange {
        start: params.start,
        end: params.end,
    };

    let overview = LeaveService::new(state.backend.clone())
        .load_overview(&session.user, params.year.unwrap_or(today.year()), &range, today)
        .await?;
    Ok(Json(overview))
}

async fn request_pto(
    State(state): State<AppState>,
    Json(input): Json<PtoRequestInput>,
) -> Result<(StatusCode, Json<SubmissionReceipt>), AppError> {
    let session = state.session.require()?;
    let receipt = LeaveService::new(state.backend.clone())
        .submit_pto_request(&session.user, &input, today())
        .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

async fn request_carry_forward(
    State(state): State<AppState>,
    Json(input): Json<CarryForwardInput>,
) -> Result<(StatusCode, Json<SubmissionReceipt>), AppError> {
    let session = state.session.require()?;
    let today = today();
    let receipt = LeaveService::new(state.backend.clone())
        .submit_carry_forward(
            &session.user,
            input.days,
            input.year.unwrap_or(today.year()),
            today,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<TaskView>>, AppError> {
    let session = state.session.require()?;
    let tasks = TaskService::new(state.backend.clone())
        .list_tasks(&session.user)
        .await?;
    Ok(Json(tasks))
}

async fn submit_task_changes(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(changes): Json<TaskDraft>,
) -> Result<Json<SubmissionReceipt>, AppError> {
    let session = state.session.require()?;
    let service = TaskService::new(state.backend.clone());
    let changed_by = service.resolve_owner(&session.user).await?;
    let receipt = service
        .submit_changes(&id, changes, &changed_by, chrono::Utc::now())
        .await?;
    Ok(Json(receipt))
}
