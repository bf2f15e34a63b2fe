//! # mediagen-tasks
//!
//! Lifecycle tracking for asynchronous media-generation jobs.
//!
//! Jobs submitted to a remote generation API (image and video families) are
//! recorded in a local SQLite store. Reconciling a task polls the remote API,
//! the source of truth, folds the answer back into the local record and
//! downloads finished results to disk exactly once.
//!
//! ## Components
//!
//! - [`db::Database`] - durable task records
//! - [`remote::StatusClient`] - remote status boundary, with
//!   [`remote::HttpStatusClient`] as the HTTP implementation
//! - [`materializer::Materializer`] - idempotent result downloads
//! - [`tracker::TaskTracker`] - reconciliation and the public operations
//! - [`api`] - optional REST surface over the tracker
//!
//! ## Quick Start
//!
//! ```no_run
//! use mediagen_tasks::{ApiType, Config, SubmissionResponse, TaskTracker};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.download.download_dir = Some("./downloads".into());
//!
//!     let tracker = TaskTracker::new(config).await?;
//!
//!     let response = SubmissionResponse {
//!         task_id: Some("3f2a9c1e".to_string()),
//!         image_url: None,
//!     };
//!     tracker.record_submission(ApiType::Veo3, &response).await?;
//!
//!     let view = tracker.reconcile("3f2a9c1e").await?;
//!     println!("{}", view.message);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Error types
pub mod error;
/// Result artifact downloads
pub mod materializer;
/// Remote status query boundary
pub mod remote;
/// Task reconciliation
pub mod tracker;
/// Core types
pub mod types;

use std::sync::Arc;

// Re-export commonly used types
pub use config::{ApiConfig, Config, DownloadConfig, PersistenceConfig, RemoteConfig};
pub use db::Database;
pub use error::{ApiError, DatabaseError, Error, ErrorDetail, Result, TaskError, ToHttpStatus};
pub use materializer::Materializer;
pub use remote::{HttpStatusClient, RemoteState, RemoteStatus, StatusClient};
pub use tracker::TaskTracker;
pub use types::{
    ApiType, MediaKind, NewTask, SubmissionResponse, TaskId, TaskRecord, TaskStatus,
    TaskStatusView, TaskUpdate,
};

/// Serve the REST API until a termination signal arrives, then shut down.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// The task store is closed once the server has stopped.
///
/// # Example
///
/// ```no_run
/// use mediagen_tasks::{Config, TaskTracker, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config::default();
///     let tracker = TaskTracker::new(config.clone()).await?;
///
///     run_with_shutdown(tracker, config).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(tracker: TaskTracker, config: Config) -> Result<()> {
    let server = api::start_api_server(tracker.clone(), Arc::new(config));

    let result = tokio::select! {
        result = server => result,
        _ = wait_for_signal() => {
            tracing::info!("Shutting down API server");
            Ok(())
        }
    };

    tracker.shutdown().await;
    result
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            sigint.recv().await;
            tracing::info!("Received SIGINT signal (Ctrl+C)");
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            sigterm.recv().await;
            tracing::info!("Received SIGTERM signal");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "Could not register any signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
