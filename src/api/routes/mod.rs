//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`tasks`] - Task submission records, listing and reconciliation
//! - [`system`] - Health and OpenAPI

use serde::{Deserialize, Serialize};

use crate::types::{ApiType, SubmissionResponse, TaskRecord};

mod system;
mod tasks;

pub use system::*;
pub use tasks::*;

// ============================================================================
// Query/Request Types (shared across handlers)
// ============================================================================

/// Query parameters for GET /tasks
#[derive(Debug, Default, Deserialize, Serialize, utoipa::IntoParams, utoipa::ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ListTasksQuery {
    /// Maximum number of tasks to return (default: 20, max: 100)
    pub limit: Option<u32>,
    /// Filter by status: "pending", "processing", "completed" or "failed"
    pub status: Option<String>,
}

/// Response for GET /tasks
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ListTasksResponse {
    /// Tasks, newest first
    pub tasks: Vec<TaskRecord>,
    /// Number of tasks returned
    pub count: usize,
}

/// Request body for POST /tasks
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct RecordSubmissionRequest {
    /// Generation family the job was submitted to
    pub api_type: ApiType,
    /// What the submission call returned
    pub response: SubmissionResponse,
}

/// Response for POST /tasks
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RecordSubmissionResponse {
    /// Whether a task record was created
    pub recorded: bool,
    /// The created record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskRecord>,
}
