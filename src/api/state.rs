//! Application state for the API server

use crate::{Config, TaskTracker};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request; both fields are cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Tracker that owns the task store and remote collaborators
    pub tracker: TaskTracker,

    /// Configuration the server was started with
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(tracker: TaskTracker, config: Arc<Config>) -> Self {
        Self { tracker, config }
    }
}
