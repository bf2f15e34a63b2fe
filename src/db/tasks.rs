//! Task record CRUD operations.

use crate::error::{DatabaseError, TaskError};
use crate::types::{NewTask, TaskId, TaskRecord, TaskStatus, TaskUpdate};
use crate::{Error, Result};

use super::{Database, TaskRow};

const TASK_COLUMNS: &str =
    "id, task_id, api_type, status, created_at, updated_at, result_url, error_message";

impl Database {
    /// Insert a new task record
    ///
    /// Creation is an insert, never an upsert: a second insert for the same
    /// task id fails with [`TaskError::AlreadyExists`].
    pub async fn create_task(&self, task: &NewTask) -> Result<TaskRecord> {
        let now = chrono::Utc::now().timestamp_millis();

        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            INSERT INTO tasks (
                task_id, api_type, status, created_at, updated_at,
                result_url, error_message
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(task.task_id.as_str())
        .bind(task.api_type.as_str())
        .bind(task.status.as_str())
        .bind(now)
        .bind(now)
        .bind(&task.result_url)
        .bind(&task.error_message)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                Error::Task(TaskError::AlreadyExists {
                    task_id: task.task_id.to_string(),
                })
            }
            other => Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to insert task: {}",
                other
            ))),
        })?;

        row.try_into()
    }

    /// Get a task by its remote id
    pub async fn get_task(&self, task_id: &TaskId) -> Result<Option<TaskRecord>> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE task_id = ?"
        ))
        .bind(task_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get task: {}",
                e
            )))
        })?;

        row.map(TaskRecord::try_from).transpose()
    }

    /// Merge the supplied fields into an existing task
    ///
    /// Fields left as `None` keep their stored value. `updated_at` always
    /// moves forward, even when two updates land within the same millisecond.
    pub async fn update_task(&self, task_id: &TaskId, update: &TaskUpdate) -> Result<TaskRecord> {
        let now = chrono::Utc::now().timestamp_millis();

        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            UPDATE tasks SET
                status = COALESCE(?, status),
                result_url = COALESCE(?, result_url),
                error_message = CASE WHEN ? THEN NULL ELSE COALESCE(?, error_message) END,
                updated_at = MAX(?, updated_at + 1)
            WHERE task_id = ?
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(update.status.map(|s| s.as_str()))
        .bind(&update.result_url)
        .bind(update.clear_error)
        .bind(&update.error_message)
        .bind(now)
        .bind(task_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to update task: {}",
                e
            )))
        })?;

        match row {
            Some(row) => row.try_into(),
            None => Err(Error::Task(TaskError::NotFound {
                task_id: task_id.to_string(),
            })),
        }
    }

    /// List tasks, most recently created first
    pub async fn get_all_tasks(&self, limit: u32) -> Result<Vec<TaskRecord>> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at DESC, id DESC LIMIT ?"
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list tasks: {}",
                e
            )))
        })?;

        rows.into_iter().map(TaskRecord::try_from).collect()
    }

    /// List tasks with a specific status, most recently created first
    pub async fn get_tasks_by_status(
        &self,
        status: TaskStatus,
        limit: u32,
    ) -> Result<Vec<TaskRecord>> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            SELECT {TASK_COLUMNS} FROM tasks
            WHERE status = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#
        ))
        .bind(status.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list tasks by status: {}",
                e
            )))
        })?;

        rows.into_iter().map(TaskRecord::try_from).collect()
    }
}
