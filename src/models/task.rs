use serde::{Deserialize, Serialize};

use super::{de_id, de_null_string};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Completed,
    InProgress,
    OnHold,
    Blocked,
}

/// Row of `task_overviews`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub task_id: String,
    #[serde(default, deserialize_with = "de_null_string")]
    pub description: String,
    pub owner: String,
    #[serde(default, deserialize_with = "de_null_string")]
    pub department: String,
    #[serde(default, deserialize_with = "de_null_string")]
    pub start_date: String,
    #[serde(default, deserialize_with = "de_null_string")]
    pub estimated_completion_date: String,
    #[serde(default, deserialize_with = "de_null_string")]
    pub actual_completion_date: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub pending_changes: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl TaskRecord {
    pub fn has_pending_changes(&self) -> bool {
        self.pending_changes
            .as_deref()
            .is_some_and(|p| !p.trim().is_empty())
    }
}

/// Partial overlay of the editable task fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_completion_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_completion_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
}

impl TaskDraft {
    pub fn from_task(task: &TaskRecord) -> Self {
        Self {
            task_id: Some(task.task_id.clone()),
            description: Some(task.description.clone()),
            estimated_completion_date: Some(task.estimated_completion_date.clone()),
            actual_completion_date: Some(task.actual_completion_date.clone()),
            status: Some(task.status),
        }
    }

    /// Applies the fields set in `other` over this draft.
    pub fn merge(&mut self, other: TaskDraft) {
        if let Some(v) = other.description {
            self.description = Some(v);
        }
        if let Some(v) = other.estimated_completion_date {
            self.estimated_completion_date = Some(v);
        }
        if let Some(v) = other.actual_completion_date {
            self.actual_completion_date = Some(v);
        }
        if let Some(v) = other.status {
            self.status = Some(v);
        }
    }
}

/// Serialized into `task_overviews.pending_changes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingChanges {
    #[serde(flatten)]
    pub draft: TaskDraft,
    pub changed_by: String,
    pub change_requested_at: String,
}
