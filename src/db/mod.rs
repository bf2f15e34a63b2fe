//! Database layer for mediagen-tasks
//!
//! Handles SQLite persistence of task records.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] - Database lifecycle, schema migrations
//! - [`tasks`] - Task record CRUD and listing

use crate::error::DatabaseError;
use crate::types::{TaskId, TaskRecord};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, sqlite::SqlitePool};

mod migrations;
mod tasks;

/// Task record as stored in SQLite
#[derive(Debug, Clone, FromRow)]
pub struct TaskRow {
    /// Unique database ID (insertion order)
    pub id: i64,
    /// Remote-assigned task id
    pub task_id: String,
    /// Generation family (kebab-case)
    pub api_type: String,
    /// Status (lowercase)
    pub status: String,
    /// Unix timestamp in milliseconds when the record was created
    pub created_at: i64,
    /// Unix timestamp in milliseconds when the record was last changed
    pub updated_at: i64,
    /// First result URL
    pub result_url: Option<String>,
    /// Failure reason
    pub error_message: Option<String>,
}

fn timestamp(millis: i64, column: &str) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        Error::Database(DatabaseError::InvalidRow(format!(
            "{} {} is out of range",
            column, millis
        )))
    })
}

impl TryFrom<TaskRow> for TaskRecord {
    type Error = Error;

    fn try_from(row: TaskRow) -> Result<Self> {
        let invalid = |e: Error| {
            Error::Database(DatabaseError::InvalidRow(format!(
                "task row {}: {}",
                row.id, e
            )))
        };

        Ok(TaskRecord {
            task_id: TaskId::new(row.task_id.clone()).map_err(invalid)?,
            api_type: row.api_type.parse().map_err(invalid)?,
            status: row.status.parse().map_err(invalid)?,
            created_at: timestamp(row.created_at, "created_at")?,
            updated_at: timestamp(row.updated_at, "updated_at")?,
            result_url: row.result_url,
            error_message: row.error_message,
        })
    }
}

/// Database handle for mediagen-tasks
pub struct Database {
    pool: SqlitePool,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
