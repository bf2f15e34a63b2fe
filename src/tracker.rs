//! Task reconciliation
//!
//! [`TaskTracker`] ties the local task store, the remote status boundary and
//! the materializer together. The remote API is authoritative for a task's
//! state; the local record is a cache of it that reconciliation refreshes.

use std::sync::Arc;

use crate::config::Config;
use crate::db::Database;
use crate::materializer::Materializer;
use crate::remote::{HttpStatusClient, RemoteState, RemoteStatus, StatusClient};
use crate::types::{
    ApiType, MediaKind, NewTask, SubmissionResponse, TaskId, TaskRecord, TaskStatus,
    TaskStatusView, TaskUpdate,
};
use crate::Result;

/// Number of tasks listed when the caller gives no limit
pub const DEFAULT_LIST_LIMIT: u32 = 20;

/// Largest number of tasks a single listing returns
pub const MAX_LIST_LIMIT: u32 = 100;

/// Tracks submitted generation tasks and reconciles them with the remote API
///
/// Cheap to clone; clones share the store, the status client and the HTTP
/// connection pool.
#[derive(Clone)]
pub struct TaskTracker {
    db: Arc<Database>,
    client: Arc<dyn StatusClient>,
    materializer: Materializer,
}

impl TaskTracker {
    /// Open the task store and build the HTTP-backed collaborators
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let db = Database::new(&config.persistence.database_path).await?;
        let client = HttpStatusClient::new(&config.remote)?;
        let materializer = Materializer::from_config(&config)?;

        Ok(Self::with_parts(db, Arc::new(client), materializer))
    }

    /// Assemble a tracker from already constructed parts
    pub fn with_parts(
        db: Database,
        client: Arc<dyn StatusClient>,
        materializer: Materializer,
    ) -> Self {
        Self {
            db: Arc::new(db),
            client,
            materializer,
        }
    }

    /// Underlying task store
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Record a freshly submitted job
    ///
    /// Returns `Ok(None)` when the submission carried no task id, since there
    /// is nothing to track. A result URL returned synchronously seeds the
    /// record's `result_url`.
    pub async fn record_submission(
        &self,
        api_type: ApiType,
        response: &SubmissionResponse,
    ) -> Result<Option<TaskRecord>> {
        let Some(raw_id) = response
            .task_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
        else {
            tracing::debug!(api_type = %api_type, "submission returned no task id, not recording");
            return Ok(None);
        };

        let task_id = TaskId::new(raw_id)?;
        let new_task = NewTask {
            result_url: response.image_url.clone(),
            ..NewTask::pending(task_id, api_type)
        };

        let record = self.db.create_task(&new_task).await?;
        tracing::info!(task_id = %record.task_id, api_type = %api_type, "recorded submitted task");

        Ok(Some(record))
    }

    /// Local record of a task, without asking the remote API
    pub async fn get_local_task(&self, task_id: &str) -> Result<Option<TaskRecord>> {
        let task_id = TaskId::new(task_id)?;
        self.db.get_task(&task_id).await
    }

    /// Recent tasks, newest first, optionally filtered by status
    ///
    /// `limit` defaults to [`DEFAULT_LIST_LIMIT`] and is clamped to
    /// `1..=MAX_LIST_LIMIT`.
    pub async fn list_tasks(
        &self,
        limit: Option<u32>,
        status: Option<TaskStatus>,
    ) -> Result<Vec<TaskRecord>> {
        let limit = limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT);

        match status {
            Some(status) => self.db.get_tasks_by_status(status, limit).await,
            None => self.db.get_all_tasks(limit).await,
        }
    }

    /// Refresh what is known about a task and act on terminal results
    ///
    /// A task the store has never seen is still polled and its results
    /// materialized. A failed poll is not an error: the view carries the
    /// local record and the failure reason instead.
    pub async fn reconcile(&self, task_id: &str) -> Result<TaskStatusView> {
        let task_id = TaskId::new(task_id)?;

        let local = self.db.get_task(&task_id).await?;
        let hint = local.as_ref().map(|record| record.api_type);

        let (remote, remote_error) = match self.client.query(&task_id, hint).await {
            Ok(status) => (Some(status), None),
            Err(e) => {
                tracing::warn!(
                    task_id = %task_id,
                    error = %e,
                    "remote status query failed, using local data"
                );
                (None, Some(e.to_string()))
            }
        };

        let mut downloaded = Vec::new();
        if let Some(status) = remote.as_ref().filter(|s| s.is_terminal_success()) {
            // Without a record there is no family to go by; video is the safer extension
            let kind = hint.map_or(MediaKind::Video, |api_type| api_type.media_kind());
            downloaded = self
                .materializer
                .materialize(&status.result_urls, &task_id, kind)
                .await;
        }

        let local_task = match (local, remote.as_ref()) {
            (Some(record), Some(status)) => Some(self.apply_remote(record, status).await),
            (local, _) => local,
        };

        let message = if local_task.is_some() {
            "Task found"
        } else {
            "Task not found in local database"
        };

        Ok(TaskStatusView {
            local_task,
            api_response: remote,
            remote_error,
            downloaded_files: (!downloaded.is_empty()).then_some(downloaded),
            message: message.to_string(),
        })
    }

    /// Fold a remote report into the local record
    ///
    /// Returns the refreshed record when an update was written, otherwise the
    /// record unchanged. Update failures are logged; the remote report and
    /// any downloaded files remain valid.
    async fn apply_remote(&self, record: TaskRecord, status: &RemoteStatus) -> TaskRecord {
        let Some(update) = update_for(&record, status) else {
            return record;
        };

        match self.db.update_task(&record.task_id, &update).await {
            Ok(updated) => {
                if updated.status != record.status {
                    tracing::info!(
                        task_id = %updated.task_id,
                        from = %record.status,
                        to = %updated.status,
                        "task status changed"
                    );
                }
                updated
            }
            Err(e) => {
                tracing::warn!(
                    task_id = %record.task_id,
                    error = %e,
                    "failed to update local task record"
                );
                record
            }
        }
    }

    /// Close the task store
    pub async fn shutdown(&self) {
        self.db.pool().close().await;
    }
}

/// Local change implied by a remote report, if any
fn update_for(record: &TaskRecord, status: &RemoteStatus) -> Option<TaskUpdate> {
    if status.is_terminal_success() {
        return status.result_urls.first().map(TaskUpdate::completed);
    }

    match status.state {
        RemoteState::Failed if !record.status.is_terminal() => Some(TaskUpdate::failed(
            status
                .error_message
                .clone()
                .unwrap_or_else(|| "generation failed".to_string()),
        )),
        RemoteState::Processing if record.status.advances_to(TaskStatus::Processing) => {
            Some(TaskUpdate::status(TaskStatus::Processing))
        }
        _ => None,
    }
}
