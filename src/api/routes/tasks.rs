//! Task handlers.

use super::{ListTasksQuery, ListTasksResponse, RecordSubmissionRequest, RecordSubmissionResponse};
use crate::Result;
use crate::api::AppState;
use crate::types::{TaskStatus, TaskStatusView};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// GET /tasks - List recent tasks
#[utoipa::path(
    get,
    path = "/tasks",
    tag = "tasks",
    params(ListTasksQuery),
    responses(
        (status = 200, description = "Recent tasks, newest first", body = ListTasksResponse),
        (status = 400, description = "Unknown status filter", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<ListTasksResponse>> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<TaskStatus>)
        .transpose()?;

    let tasks = state.tracker.list_tasks(query.limit, status).await?;

    Ok(Json(ListTasksResponse {
        count: tasks.len(),
        tasks,
    }))
}

/// POST /tasks - Record a submitted generation job
#[utoipa::path(
    post,
    path = "/tasks",
    tag = "tasks",
    request_body = RecordSubmissionRequest,
    responses(
        (status = 201, description = "Task recorded", body = RecordSubmissionResponse),
        (status = 200, description = "Submission carried no task id, nothing recorded", body = RecordSubmissionResponse),
        (status = 400, description = "Malformed task id", body = crate::error::ApiError),
        (status = 409, description = "Task already recorded", body = crate::error::ApiError)
    )
)]
pub async fn record_submission(
    State(state): State<AppState>,
    Json(request): Json<RecordSubmissionRequest>,
) -> Result<Response> {
    let task = state
        .tracker
        .record_submission(request.api_type, &request.response)
        .await?;

    let status = if task.is_some() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(RecordSubmissionResponse {
            recorded: task.is_some(),
            task,
        }),
    )
        .into_response())
}

/// GET /tasks/:task_id - Reconcile a task with the remote API
#[utoipa::path(
    get,
    path = "/tasks/{task_id}",
    tag = "tasks",
    params(
        ("task_id" = String, Path, description = "Remote-assigned task id")
    ),
    responses(
        (status = 200, description = "Current knowledge about the task", body = TaskStatusView),
        (status = 400, description = "Malformed task id", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn get_task_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskStatusView>> {
    let view = state.tracker.reconcile(&task_id).await?;
    Ok(Json(view))
}
