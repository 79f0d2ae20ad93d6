use serde::{Deserialize, Serialize};

use super::de_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

/// Row of `pto_records`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveRecord {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub date: String,
    #[serde(default)]
    pub day: String,
    pub hours: f64,
    #[serde(default)]
    pub activity: Option<String>,
    #[serde(default)]
    pub employee_name: String,
    #[serde(default)]
    pub employee_id: String,
    pub sender_email: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub is_pto: bool,
    pub status: LeaveStatus,
    #[serde(default)]
    pub request_reason: Option<String>,
    #[serde(default)]
    pub pending_changes: Option<String>,
}

/// Insert payload for a new leave request.
#[derive(Debug, Clone, Serialize)]
pub struct NewLeaveRecord {
    pub date: String,
    pub day: String,
    pub hours: f64,
    pub employee_name: String,
    pub employee_id: String,
    pub sender_email: String,
    pub activity: String,
    pub status: LeaveStatus,
    pub request_reason: String,
    pub is_pto: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PtoRequestInput {
    pub date: String,
    pub hours: f64,
    #[serde(default)]
    pub reason: String,
}
