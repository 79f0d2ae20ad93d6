//! Task overview editing with manager approval.
//!
//! Edits never touch a task's fields directly. They are staged in a
//! [`TaskEditor`] and saved as a JSON overlay in `pending_changes`, which a
//! manager later applies or discards. A task with an outstanding overlay is
//! locked until then.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use super::{SubmissionReceipt, surface};
use crate::error::AppError;
use crate::models::{AuthUser, PendingChanges, TaskDraft, TaskRecord};
use crate::supabase::SupabaseClient;

const LOCKED: &str = "This task already has changes awaiting approval.";

#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: TaskRecord,
    pub can_edit: bool,
}

/// Edit state for a single task.
#[derive(Debug, Default)]
pub struct TaskEditor {
    editing: Option<(TaskRecord, TaskDraft)>,
}

impl TaskEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_editing(&mut self, task: &TaskRecord) -> Result<(), AppError> {
        if task.has_pending_changes() {
            return Err(AppError::Conflict(LOCKED.to_string()));
        }
        self.editing = Some((task.clone(), TaskDraft::from_task(task)));
        Ok(())
    }

    pub fn update(&mut self, changes: TaskDraft) -> Result<(), AppError> {
        let (_, draft) = self
            .editing
            .as_mut()
            .ok_or_else(|| AppError::validation("Error", "No task is being edited."))?;
        draft.merge(changes);
        Ok(())
    }

    pub fn cancel(&mut self) {
        self.editing = None;
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn draft(&self) -> Option<&TaskDraft> {
        self.editing.as_ref().map(|(_, draft)| draft)
    }
}

pub struct TaskService {
    backend: Arc<dyn SupabaseClient>,
}

impl TaskService {
    pub fn new(backend: Arc<dyn SupabaseClient>) -> Self {
        Self { backend }
    }

    /// The profile's username, or the sign-in email when there is none.
    pub async fn resolve_owner(&self, user: &AuthUser) -> Result<String, AppError> {
        match self.backend.fetch_profile().await {
            Ok(profile) => Ok(profile
                .username
                .filter(|u| !u.trim().is_empty())
                .unwrap_or_else(|| user.email.clone())),
            Err(AppError::Unauthorized(msg)) => Err(AppError::Unauthorized(msg)),
            Err(e) => {
                warn!("Profile unavailable, owning tasks by email: {}", e);
                Ok(user.email.clone())
            }
        }
    }

    pub async fn list_tasks(&self, user: &AuthUser) -> Result<Vec<TaskView>, AppError> {
        let owner = self.resolve_owner(user).await?;
        let tasks = self
            .backend
            .fetch_tasks(&owner)
            .await
            .map_err(|e| surface(e, "Error", "Failed to load tasks"))?;

        Ok(tasks
            .into_iter()
            .map(|task| TaskView {
                can_edit: !task.has_pending_changes(),
                task,
            })
            .collect())
    }

    /// Submits the editor's draft for approval on behalf of the task's owner.
    /// The draft is kept when the save fails.
    pub async fn save(
        &self,
        editor: &mut TaskEditor,
        changed_by: &str,
        now: DateTime<Utc>,
    ) -> Result<SubmissionReceipt, AppError> {
        let (task, draft) = editor
            .editing
            .as_ref()
            .ok_or_else(|| AppError::validation("Error", "No task is being edited."))?;

        let failed = |e: AppError| surface(e, "Error", "Failed to submit changes");

        let latest = self
            .backend
            .find_task(&task.id)
            .await
            .map_err(failed)?
            .filter(|t| t.owner == changed_by)
            .ok_or(AppError::NotFound)?;
        if latest.has_pending_changes() {
            return Err(AppError::Conflict(LOCKED.to_string()));
        }

        let changes = PendingChanges {
            draft: draft.clone(),
            changed_by: changed_by.to_string(),
            change_requested_at: now.to_rfc3339(),
        };
        let payload = serde_json::to_string(&changes).map_err(|e| {
            error!("Failed to encode pending changes: {}", e);
            AppError::InternalServerError
        })?;

        self.backend
            .set_task_pending_changes(&task.id, &payload)
            .await
            .map_err(failed)?;

        info!("Changes to task {} submitted by {}", task.task_id, changed_by);
        editor.cancel();
        Ok(SubmissionReceipt::new(
            "Success",
            "Changes submitted for manager approval",
        ))
    }

    /// Loads one of `changed_by`'s tasks, stages `changes` and saves them in
    /// one go. Tasks owned by someone else are reported as missing.
    pub async fn submit_changes(
        &self,
        id: &str,
        changes: TaskDraft,
        changed_by: &str,
        now: DateTime<Utc>,
    ) -> Result<SubmissionReceipt, AppError> {
        let task = self
            .backend
            .find_task(id)
            .await
            .map_err(|e| surface(e, "Error", "Failed to submit changes"))?
            .filter(|t| t.owner == changed_by)
            .ok_or(AppError::NotFound)?;

        let mut editor = TaskEditor::new();
        editor.start_editing(&task)?;
        editor.update(changes)?;
        self.save(&mut editor, changed_by, now).await
    }
}
