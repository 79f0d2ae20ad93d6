use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::{error, info, warn};

use super::leave_balance::{DateRange, EmployeePtoSummary, LeaveLedger};
use super::{SubmissionReceipt, format_number, surface};
use crate::dates::{parse_date, weekday_label};
use crate::error::AppError;
use crate::models::{
    AuthUser, CarryForwardBalance, CarryForwardRequest, EmployeeInfo, LeaveRecord, LeaveStatus,
    NewLeaveRecord, PtoRequestInput, RequestStatus,
};
use crate::supabase::{SupabaseClient, UNIQUE_VIOLATION};

pub const PTO_ACTIVITY: &str = "PTO Request";

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaveOverview {
    pub employee: EmployeeInfo,
    pub summary: EmployeePtoSummary,
    /// Newest first.
    pub records: Vec<LeaveRecord>,
}

/// Checks a PTO request before anything is sent. Returns the parsed date.
pub fn validate_pto_request(input: &PtoRequestInput, today: NaiveDate) -> Result<NaiveDate, AppError> {
    let date = input.date.trim();
    if date.is_empty() || !is_positive(input.hours) {
        return Err(AppError::validation(
            "Invalid Request",
            "Please fill in all required fields.",
        ));
    }

    let date = parse_date(date).map_err(|_| {
        AppError::validation("Invalid Date", "Please choose a valid date.")
    })?;
    if date < today {
        return Err(AppError::validation(
            "Invalid Date",
            "You can only request PTO for today or future dates.",
        ));
    }
    Ok(date)
}

pub fn validate_carry_forward(days: f64, summary: &EmployeePtoSummary) -> Result<(), AppError> {
    if !is_positive(days) {
        return Err(AppError::validation(
            "Invalid Request",
            "Please specify the number of days to carry forward.",
        ));
    }
    if days > summary.remaining_pto_days {
        return Err(AppError::validation(
            "Invalid Request",
            "Cannot carry forward more days than you have remaining.",
        ));
    }
    Ok(())
}

pub struct LeaveService {
    backend: Arc<dyn SupabaseClient>,
}

impl LeaveService {
    pub fn new(backend: Arc<dyn SupabaseClient>) -> Self {
        Self { backend }
    }

    /// Employee row for the signed-in email. Falls back to a placeholder when
    /// there is no row or the lookup fails; only a missing session is an error.
    pub async fn resolve_employee(&self, email: &str) -> Result<EmployeeInfo, AppError> {
        match self.backend.find_employee_by_email(email).await {
            Ok(Some(employee)) => Ok(employee),
            Ok(None) => {
                warn!("No employee record for {}, using a placeholder", email);
                Ok(EmployeeInfo::placeholder(email))
            }
            Err(AppError::Unauthorized(msg)) => Err(AppError::Unauthorized(msg)),
            Err(e) => {
                warn!("Employee lookup for {} failed, using a placeholder: {}", email, e);
                Ok(EmployeeInfo::placeholder(email))
            }
        }
    }

    /// Carry-forward balance for `year`. A failed lookup counts as no balance.
    async fn carry_forward_balance(
        &self,
        employee_id: &str,
        year: i32,
    ) -> Result<Option<CarryForwardBalance>, AppError> {
        match self.backend.find_carry_forward_balance(employee_id, year).await {
            Ok(balance) => Ok(balance),
            Err(AppError::Unauthorized(msg)) => Err(AppError::Unauthorized(msg)),
            Err(e) => {
                error!("Failed to load carry forward balance for {}: {}", employee_id, e);
                Ok(None)
            }
        }
    }

    pub async fn load_overview(
        &self,
        user: &AuthUser,
        year: i32,
        range: &DateRange,
        today: NaiveDate,
    ) -> Result<LeaveOverview, AppError> {
        let loaded = async {
            let employee = self.resolve_employee(&user.email).await?;
            let records = self.backend.fetch_pto_records(Some(&user.email)).await?;
            let balance = self
                .carry_forward_balance(&employee.employee_id, year)
                .await?;
            Ok::<_, AppError>((employee, records, balance))
        }
        .await;

        let (employee, records, balance) =
            loaded.map_err(|e| surface(e, "Error", "Failed to load your leave data."))?;

        let ledger = LeaveLedger {
            sender_email: &user.email,
            records: &records,
            balance: balance.as_ref(),
            year,
        };
        let summary = ledger.summary(&employee, today.year());
        let records = ledger.records_in_range(range);

        Ok(LeaveOverview {
            employee,
            summary,
            records,
        })
    }

    pub async fn submit_pto_request(
        &self,
        user: &AuthUser,
        input: &PtoRequestInput,
        today: NaiveDate,
    ) -> Result<SubmissionReceipt, AppError> {
        let date = validate_pto_request(input, today)?;

        let employee = self
            .resolve_employee(&user.email)
            .await
            .map_err(|e| surface(e, "Submission Failed", "Failed to submit your PTO request. Please try again."))?;

        let record = NewLeaveRecord {
            date: date.format("%Y-%m-%d").to_string(),
            day: weekday_label(date),
            hours: input.hours,
            employee_name: employee.name.clone(),
            employee_id: employee.employee_id.clone(),
            sender_email: user.email.clone(),
            activity: PTO_ACTIVITY.to_string(),
            status: LeaveStatus::Pending,
            request_reason: input.reason.trim().to_string(),
            is_pto: false,
        };

        match self.backend.insert_pto_record(&record).await {
            Ok(()) => {
                info!("PTO request for {} on {} submitted", record.employee_id, record.date);
                Ok(SubmissionReceipt::new(
                    "Request Submitted",
                    "Your leave request has been submitted for manager approval.",
                ))
            }
            Err(e) if e.backend_code() == Some(UNIQUE_VIOLATION) => {
                warn!("Duplicate PTO request for {} on {}", record.employee_id, record.date);
                Err(AppError::Duplicate(format!(
                    "A PTO request for {} already exists.",
                    record.date
                )))
            }
            Err(e) => Err(surface(
                e,
                "Submission Failed",
                "Failed to submit your PTO request. Please try again.",
            )),
        }
    }

    /// Carries unused days of `year` into `year + 1`. Only the current year can
    /// be carried forward.
    pub async fn submit_carry_forward(
        &self,
        user: &AuthUser,
        days: f64,
        year: i32,
        today: NaiveDate,
    ) -> Result<SubmissionReceipt, AppError> {
        if !is_positive(days) {
            return Err(AppError::validation(
                "Invalid Request",
                "Please specify the number of days to carry forward.",
            ));
        }

        let overview = self
            .load_overview(user, year, &DateRange::default(), today)
            .await?;
        validate_carry_forward(days, &overview.summary)?;
        if year != today.year() {
            return Err(AppError::validation(
                "Invalid Request",
                "Only the current year's days can be carried forward.",
            ));
        }

        let employee = overview.employee;
        let to_year = year + 1;
        let failed = |e: AppError| {
            surface(
                e,
                "Submission Failed",
                "Failed to submit your carry forward request. Please try again.",
            )
        };

        let existing = self
            .backend
            .find_carry_forward_request(&employee.employee_id, year, to_year)
            .await
            .map_err(|e| {
                surface(
                    e,
                    "Error",
                    "Failed to check existing carry forward requests.",
                )
            })?;
        if let Some(existing) = existing {
            return Err(AppError::AlreadyRequested(format!(
                "You already have a {} carry forward request for {} to {}.",
                existing.status.as_str(),
                year,
                to_year
            )));
        }

        let request = CarryForwardRequest {
            employee_id: employee.employee_id,
            employee_name: employee.name,
            sender_email: user.email.clone(),
            from_year: year,
            to_year,
            days_requested: days,
            status: RequestStatus::Pending,
        };
        self.backend
            .insert_carry_forward_request(&request)
            .await
            .map_err(failed)?;

        info!(
            "Carry forward of {} days from {} to {} requested by {}",
            days, year, to_year, request.employee_id
        );
        Ok(SubmissionReceipt::new(
            "Request Submitted",
            format!(
                "Your request to carry forward {} days to {} has been submitted for approval.",
                format_number(days),
                to_year
            ),
        ))
    }
}
