pub mod carry_forward;
pub mod employee;
pub mod holiday;
pub mod leave;
pub mod session;
pub mod task;

pub use carry_forward::{CarryForwardBalance, CarryForwardRequest, ExistingCarryForwardRequest, RequestStatus};
pub use employee::{Employee, EmployeeInfo, Profile};
pub use holiday::HolidayRecord;
pub use leave::{LeaveRecord, LeaveStatus, NewLeaveRecord, PtoRequestInput};
pub use session::{AuthUser, Session};
pub use task::{PendingChanges, TaskDraft, TaskRecord, TaskStatus};

use serde::{Deserialize, Deserializer};

/// PostgREST returns `id` columns as strings (uuid/text) or numbers (serial)
/// depending on the table; both are kept as strings.
pub(crate) fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

/// Nullable text column read as an empty string.
pub(crate) fn de_null_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Row {
        #[serde(deserialize_with = "de_id")]
        id: String,
        #[serde(default, deserialize_with = "de_null_string")]
        note: String,
    }

    #[test]
    fn test_numeric_and_text_ids() {
        let a: Row = serde_json::from_str(r#"{"id": 42, "note": null}"#).unwrap();
        assert_eq!(a.id, "42");
        assert_eq!(a.note, "");

        let b: Row = serde_json::from_str(r#"{"id": "a1b2", "note": "x"}"#).unwrap();
        assert_eq!(b.id, "a1b2");
        assert_eq!(b.note, "x");
    }

    #[test]
    fn test_rejects_object_id() {
        let res: Result<Row, _> = serde_json::from_str(r#"{"id": {"v": 1}}"#);
        assert!(res.is_err());
    }
}
