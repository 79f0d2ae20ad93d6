use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use chrono::{Datelike, Duration, Local};
use opsclad::api::router;
use opsclad::models::{Employee, EmployeeInfo, HolidayRecord, Profile, TaskRecord, TaskStatus};
use opsclad::state::AppState;
use opsclad::supabase::InMemorySupabase;
use serde_json::{Value, json};
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

async fn app() -> (Router, Arc<InMemorySupabase>) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let backend = Arc::new(InMemorySupabase::new());
    let user = backend.add_user("ana@opsclad.io", "secret");
    backend.add_profile(
        &user.id,
        Profile {
            name: "Ana".to_string(),
            email: "ana@opsclad.io".to_string(),
            employee_id: Some("E-1".to_string()),
            birthday: None,
            role: Some("engineer".to_string()),
            username: Some("ana".to_string()),
        },
    );
    backend.add_employee_info(EmployeeInfo {
        employee_id: "E-1".to_string(),
        name: "Ana".to_string(),
        email_id: "ana@opsclad.io".to_string(),
    });

    (router(AppState::new(pool, backend.clone())), backend)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn sign_in(app: &Router) {
    let (status, _) = send(
        app,
        "POST",
        "/auth/login",
        Some(json!({"email": "ana@opsclad.io", "password": "secret"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health() {
    let (app, _) = app().await;
    let (status, _) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_screens_require_sign_in() {
    let (app, _) = app().await;

    let (status, body) = send(&app, "GET", "/calendar", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["title"], "Not Signed In");

    let (_, session) = send(&app, "GET", "/auth/session", None).await;
    assert_eq!(session, Value::Null);
}

#[tokio::test]
async fn test_login_with_missing_password() {
    let (app, backend) = app().await;
    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        Some(json!({"email": "ana@opsclad.io"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["title"], "Missing fields");
    assert_eq!(body["message"], "Please enter both email and password.");
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_session_lifecycle() {
    let (app, _) = app().await;
    sign_in(&app).await;

    let (_, session) = send(&app, "GET", "/auth/session", None).await;
    assert_eq!(session["user"]["email"], "ana@opsclad.io");
    assert!(session.get("access_token").is_none());

    let (status, _) = send(&app, "POST", "/auth/logout", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", "/leave", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_pto_request_then_duplicate() {
    let (app, backend) = app().await;
    sign_in(&app).await;
    let date = (Local::now().date_naive() + Duration::days(7))
        .format("%Y-%m-%d")
        .to_string();
    let request = json!({"date": date, "hours": 8, "reason": "Trip"});

    let (status, body) = send(&app, "POST", "/leave/requests", Some(request.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["title"], "Request Submitted");

    let (status, body) = send(&app, "POST", "/leave/requests", Some(request)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["title"], "Duplicate Request");
    assert_eq!(
        body["message"],
        format!("A PTO request for {} already exists.", date)
    );
    assert_eq!(backend.pto_records().len(), 1);
}

#[tokio::test]
async fn test_leave_overview_and_calendar() {
    let (app, _) = app().await;
    sign_in(&app).await;
    let date = Local::now().date_naive() + Duration::days(1);
    let (status, _) = send(
        &app,
        "POST",
        "/leave/requests",
        Some(json!({"date": date.format("%Y-%m-%d").to_string(), "hours": 4})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, overview) = send(
        &app,
        "GET",
        &format!("/leave?year={}", date.format("%Y")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(overview["employee"]["employee_id"], "E-1");
    assert_eq!(overview["summary"]["effective_pto_limit"], 12.0);
    assert_eq!(overview["records"].as_array().unwrap().len(), 1);
    assert_eq!(overview["records"][0]["status"], "pending");

    let (status, calendar) = send(
        &app,
        "GET",
        &format!("/calendar?month={}", date.format("%Y-%m")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let key = date.format("%Y-%m-%d").to_string();
    assert_eq!(calendar["markers"][&key][0]["color"], "green");
    assert_eq!(calendar["events"][0]["title"], "PTO - Ana");

    let (status, _) = send(&app, "GET", "/calendar?month=june", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

fn task(id: &str, owner: &str) -> TaskRecord {
    TaskRecord {
        id: id.to_string(),
        task_id: format!("OPS-{}", id),
        description: "Patch runners".to_string(),
        owner: owner.to_string(),
        department: "Ops".to_string(),
        start_date: "2025-05-01".to_string(),
        estimated_completion_date: "2025-06-30".to_string(),
        actual_completion_date: String::new(),
        status: TaskStatus::InProgress,
        pending_changes: None,
        created_at: Some(format!("2025-05-0{}T09:00:00Z", id)),
        updated_at: None,
    }
}

#[tokio::test]
async fn test_profile() {
    let (app, _) = app().await;

    let (status, _) = send(&app, "GET", "/profile", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    sign_in(&app).await;
    let (status, profile) = send(&app, "GET", "/profile", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["name"], "Ana");
    assert_eq!(profile["employee_id"], "E-1");
    assert_eq!(profile["role"], "engineer");
}

#[tokio::test]
async fn test_calendar_day_lists_birthdays_and_holidays() {
    let (app, backend) = app().await;
    backend.add_employee(Employee {
        id: "10".to_string(),
        name: "Cy".to_string(),
        birthday: Some("25/12/1991".to_string()),
    });
    backend.add_employee(Employee {
        id: "11".to_string(),
        name: "Di".to_string(),
        birthday: Some("1988-03-02".to_string()),
    });
    backend.add_holiday(HolidayRecord {
        id: "20".to_string(),
        name: "Christmas".to_string(),
        date: "2025-12-25".to_string(),
        description: Some("Office closed".to_string()),
    });
    sign_in(&app).await;

    let (status, day) = send(&app, "GET", "/calendar/days/2025-12-25", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(day["date"], "2025-12-25");
    assert_eq!(day["birthdays"].as_array().unwrap().len(), 1);
    assert_eq!(day["birthdays"][0]["name"], "Cy");
    assert_eq!(day["holidays"][0]["holiday"], "Christmas");
    assert!(day["pto_records"].as_array().unwrap().is_empty());

    let (status, body) = send(&app, "GET", "/calendar/days/2025-13-40", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["title"], "Invalid Date");
}

#[tokio::test]
async fn test_carry_forward_flow() {
    let (app, backend) = app().await;
    sign_in(&app).await;
    let next_year = Local::now().date_naive().year() + 1;

    let (status, body) = send(&app, "POST", "/leave/carry-forward", Some(json!({"days": 20}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Cannot carry forward more days than you have remaining."
    );

    let (status, body) = send(&app, "POST", "/leave/carry-forward", Some(json!({"days": 2}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body["message"],
        format!(
            "Your request to carry forward 2 days to {} has been submitted for approval.",
            next_year
        )
    );

    let (status, body) = send(&app, "POST", "/leave/carry-forward", Some(json!({"days": 1}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["title"], "Request Already Exists");
    assert_eq!(backend.carry_forward_requests().len(), 1);
}

#[tokio::test]
async fn test_task_changes_flow() {
    let (app, backend) = app().await;
    backend.add_task(task("1", "ana"));
    backend.add_task(task("2", "lee"));
    sign_in(&app).await;

    let (status, tasks) = send(&app, "GET", "/tasks", None).await;
    assert_eq!(status, StatusCode::OK);
    let tasks = tasks.as_array().unwrap().clone();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["task_id"], "OPS-1");
    assert_eq!(tasks[0]["can_edit"], true);

    let (status, body) = send(
        &app,
        "POST",
        "/tasks/1/changes",
        Some(json!({"status": "completed", "actual_completion_date": "2025-06-01"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Changes submitted for manager approval");

    let (_, tasks) = send(&app, "GET", "/tasks", None).await;
    assert_eq!(tasks[0]["can_edit"], false);
    assert_eq!(tasks[0]["status"], "in_progress");

    let (status, body) = send(&app, "POST", "/tasks/1/changes", Some(json!({"status": "blocked"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["title"], "Conflict");

    let (status, _) = send(&app, "POST", "/tasks/2/changes", Some(json!({"status": "blocked"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(backend.tasks()[1].pending_changes.is_none());
}
