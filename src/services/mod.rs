pub mod calendar;
pub mod leave_balance;
pub mod leave_request;
pub mod profile;
pub mod scheduler;
pub mod session;
pub mod task_review;

pub use calendar::{CalendarData, DayMarkers, DaySelection, EventCategory, MonthEvent, YearMonth};
pub use leave_balance::{DateRange, EmployeePtoSummary, LeaveLedger};
pub use leave_request::{LeaveOverview, LeaveService, validate_carry_forward, validate_pto_request};
pub use profile::load_profile;
pub use scheduler::SessionRefresher;
pub use session::SessionManager;
pub use task_review::{TaskEditor, TaskService, TaskView};

use serde::Serialize;
use tracing::error;

use crate::error::AppError;

/// Confirmation shown after a request is accepted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionReceipt {
    pub title: String,
    pub message: String,
}

impl SubmissionReceipt {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Logs an unexpected failure and replaces it with a user-facing message.
/// Errors that already speak to the user pass through.
pub(crate) fn surface(e: AppError, title: &str, message: &str) -> AppError {
    match e {
        AppError::Validation { .. }
        | AppError::Failed { .. }
        | AppError::Duplicate(_)
        | AppError::AlreadyRequested(_)
        | AppError::Conflict(_)
        | AppError::NotFound
        | AppError::Unauthorized(_) => e,
        other => {
            error!("{}: {}", message, other);
            AppError::failed(title, message)
        }
    }
}

/// `8.0` as "8", `7.5` as "7.5".
pub(crate) fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
