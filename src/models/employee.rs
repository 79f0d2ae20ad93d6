use serde::{Deserialize, Serialize};

use super::de_id;

/// Calendar projection of `employees` (`id, name, birthday`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub birthday: Option<String>,
}

/// Leave-tracker projection of `employees` (`employee_id, name, email_id`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeInfo {
    #[serde(deserialize_with = "de_id")]
    pub employee_id: String,
    pub name: String,
    pub email_id: String,
}

impl EmployeeInfo {
    /// Stand-in used when the signed-in user has no employee row.
    pub fn placeholder(email: &str) -> Self {
        Self {
            employee_id: format!("TEMP_{}", chrono::Utc::now().timestamp_millis()),
            name: "Unknown Employee".to_string(),
            email_id: email.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub employee_id: Option<String>,
    #[serde(default)]
    pub birthday: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    /// Owner key for `task_overviews`.
    #[serde(default)]
    pub username: Option<String>,
}
