//! Remote status query boundary
//!
//! The generation API is the source of truth for a task's state. The tracker
//! only depends on the [`StatusClient`] trait; [`HttpStatusClient`] is the
//! reqwest-backed implementation used in production, and tests plug in stubs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::Result;
use crate::types::{ApiType, TaskId};

mod http;

pub use http::HttpStatusClient;

/// Normalized remote job state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RemoteState {
    /// Accepted, waiting for capacity
    Pending,
    /// Generation in progress
    Processing,
    /// Finished successfully
    Succeeded,
    /// Finished with an error
    Failed,
}

/// Result of one status poll
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RemoteStatus {
    /// Status code from the response envelope
    pub status_code: i64,
    /// Normalized job state
    pub state: RemoteState,
    /// Result URLs in the order the remote listed them
    #[serde(default)]
    pub result_urls: Vec<String>,
    /// Failure reason, when the job failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Unmodified `data` payload of the response
    #[serde(default)]
    #[schema(value_type = Object)]
    pub raw: serde_json::Value,
}

impl RemoteStatus {
    /// Finished and produced at least one result resource
    pub fn is_terminal_success(&self) -> bool {
        self.state == RemoteState::Succeeded && !self.result_urls.is_empty()
    }

    /// Finished without producing results
    pub fn is_terminal_failure(&self) -> bool {
        self.state == RemoteState::Failed
    }
}

/// Capability to ask the remote API about a task
///
/// Implementations must not retry internally on behalf of the tracker; a
/// failed query is reported as `Err` and the tracker falls back to local data.
#[async_trait]
pub trait StatusClient: Send + Sync {
    /// Current status of `task_id`; `api_type` selects the endpoint family when known
    async fn query(&self, task_id: &TaskId, api_type: Option<ApiType>) -> Result<RemoteStatus>;
}
