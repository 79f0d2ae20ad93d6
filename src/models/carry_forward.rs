use serde::{Deserialize, Serialize};

use super::de_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }
}

/// Row of `carry_forward_balances`, one per employee per year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarryForwardBalance {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub employee_id: String,
    #[serde(default)]
    pub employee_name: Option<String>,
    #[serde(default)]
    pub sender_email: Option<String>,
    pub year: i32,
    pub days_carried_forward: f64,
    pub days_used: f64,
    #[serde(default)]
    pub expires_at: Option<String>,
}

impl CarryForwardBalance {
    /// Carried days still available.
    pub fn available_days(&self) -> f64 {
        self.days_carried_forward - self.days_used
    }
}

/// Insert payload for `carry_forward_requests`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarryForwardRequest {
    pub employee_id: String,
    pub employee_name: String,
    pub sender_email: String,
    pub from_year: i32,
    pub to_year: i32,
    pub days_requested: f64,
    pub status: RequestStatus,
}

/// `id, status` projection used by the duplicate check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExistingCarryForwardRequest {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub status: RequestStatus,
}
