//! Core types for mediagen-tasks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::ToSchema;

use crate::error::{Error, Result};
use crate::remote::RemoteStatus;

/// Longest task id accepted from the remote API
pub const MAX_TASK_ID_LEN: usize = 256;

/// Remote-assigned identifier of a generation task
///
/// Task ids end up verbatim in result filenames, so construction rejects
/// anything that could escape the download directory.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId(String);

impl TaskId {
    /// Validate and wrap a task id
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let trimmed = id.trim();

        if trimmed.is_empty() {
            return Err(Error::Validation("task_id is required".to_string()));
        }
        if trimmed.chars().count() > MAX_TASK_ID_LEN {
            return Err(Error::Validation(format!(
                "task_id exceeds {} characters",
                MAX_TASK_ID_LEN
            )));
        }
        if trimmed == "." || trimmed == ".." || trimmed.contains(['/', '\\', '\0']) {
            return Err(Error::Validation(format!(
                "task_id '{}' contains path characters",
                trimmed
            )));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TaskId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<TaskId> for String {
    fn from(id: TaskId) -> Self {
        id.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// Generation family that produced a task
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ApiType {
    /// Image generation from a prompt
    #[serde(rename = "nano-banana")]
    NanoBanana,
    /// Image editing from a prompt and input images
    #[serde(rename = "nano-banana-edit")]
    NanoBananaEdit,
    /// Veo3 video generation
    #[serde(rename = "veo3")]
    Veo3,
    /// Sora 2 video generation
    #[serde(rename = "sora2")]
    Sora2,
}

impl ApiType {
    /// All known generation families
    pub const ALL: [ApiType; 4] = [
        ApiType::NanoBanana,
        ApiType::NanoBananaEdit,
        ApiType::Veo3,
        ApiType::Sora2,
    ];

    /// Stored/wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiType::NanoBanana => "nano-banana",
            ApiType::NanoBananaEdit => "nano-banana-edit",
            ApiType::Veo3 => "veo3",
            ApiType::Sora2 => "sora2",
        }
    }

    /// Kind of media this family produces
    pub fn media_kind(&self) -> MediaKind {
        match self {
            ApiType::NanoBanana | ApiType::NanoBananaEdit => MediaKind::Image,
            ApiType::Veo3 | ApiType::Sora2 => MediaKind::Video,
        }
    }
}

impl std::fmt::Display for ApiType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ApiType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ApiType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::Validation(format!("unknown api_type '{}'", s)))
    }
}

/// Last-known lifecycle state of a task
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Submitted, not yet picked up
    Pending,
    /// Remote reports the job is running
    Processing,
    /// Finished with results
    Completed,
    /// Finished without results
    Failed,
}

impl TaskStatus {
    /// Stored/wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    /// Completed and failed tasks never change again on their own
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    fn rank(&self) -> u8 {
        match self {
            TaskStatus::Pending => 0,
            TaskStatus::Processing => 1,
            TaskStatus::Completed | TaskStatus::Failed => 2,
        }
    }

    /// Whether moving from `self` to `next` moves the lifecycle forward
    pub fn advances_to(&self, next: TaskStatus) -> bool {
        next.rank() > self.rank()
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "processing" => Ok(TaskStatus::Processing),
            "completed" => Ok(TaskStatus::Completed),
            "failed" => Ok(TaskStatus::Failed),
            other => Err(Error::Validation(format!(
                "invalid status '{}', expected one of pending, processing, completed, failed",
                other
            ))),
        }
    }
}

/// Kind of result file a task produces
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Still image
    Image,
    /// Video clip
    Video,
}

impl MediaKind {
    /// Extension used when the result URL has none
    pub fn default_extension(&self) -> &'static str {
        match self {
            MediaKind::Image => ".png",
            MediaKind::Video => ".mp4",
        }
    }
}

/// Locally persisted record of a submitted task
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TaskRecord {
    /// Remote-assigned task id
    #[schema(value_type = String)]
    pub task_id: TaskId,
    /// Generation family
    pub api_type: ApiType,
    /// Last-known status
    pub status: TaskStatus,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// When the record was last changed
    pub updated_at: DateTime<Utc>,
    /// First result URL, once known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
    /// Failure reason reported by the remote API
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// New task to be inserted into the store
#[derive(Clone, Debug)]
pub struct NewTask {
    /// Remote-assigned task id
    pub task_id: TaskId,
    /// Generation family
    pub api_type: ApiType,
    /// Initial status
    pub status: TaskStatus,
    /// Result URL already known at submission time
    pub result_url: Option<String>,
    /// Initial error message
    pub error_message: Option<String>,
}

impl NewTask {
    /// A freshly submitted task with no results yet
    pub fn pending(task_id: TaskId, api_type: ApiType) -> Self {
        Self {
            task_id,
            api_type,
            status: TaskStatus::Pending,
            result_url: None,
            error_message: None,
        }
    }
}

/// Partial update of a task record; `None` fields are left untouched
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskUpdate {
    /// New status
    pub status: Option<TaskStatus>,
    /// New representative result URL
    pub result_url: Option<String>,
    /// New error message
    pub error_message: Option<String>,
    /// Erase any stored error message; takes precedence over `error_message`
    pub clear_error: bool,
}

impl TaskUpdate {
    /// Mark the task completed with its first result URL, dropping any earlier failure reason
    pub fn completed(result_url: impl Into<String>) -> Self {
        Self {
            status: Some(TaskStatus::Completed),
            result_url: Some(result_url.into()),
            error_message: None,
            clear_error: true,
        }
    }

    /// Mark the task failed with the remote's reason
    pub fn failed(error_message: impl Into<String>) -> Self {
        Self {
            status: Some(TaskStatus::Failed),
            result_url: None,
            error_message: Some(error_message.into()),
            clear_error: false,
        }
    }

    /// Change only the status
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

/// What the upstream submission call returned
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    /// Task id, when the remote accepted the job
    #[serde(default)]
    pub task_id: Option<String>,
    /// Result URL returned synchronously by some image endpoints
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Composite answer to "what is the current truth about this task"
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct TaskStatusView {
    /// Local record, refreshed when reconciliation changed it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_task: Option<TaskRecord>,
    /// Remote status, when the poll succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_response: Option<RemoteStatus>,
    /// Why the remote poll failed, when it did
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_error: Option<String>,
    /// Result files confirmed on disk (omitted when none)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<String>>)]
    pub downloaded_files: Option<Vec<PathBuf>>,
    /// Human-readable summary
    pub message: String,
}
