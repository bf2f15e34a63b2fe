//! REST API server module
//!
//! Exposes the [`TaskTracker`](crate::TaskTracker) operations over HTTP with
//! an OpenAPI 3.1 description.

use crate::{Config, Result, TaskTracker};
use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Tasks
/// - `GET /tasks` - List recent tasks (`?limit=&status=`)
/// - `POST /tasks` - Record a submitted generation job
/// - `GET /tasks/:task_id` - Reconcile a task and download finished results
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
/// - `GET /api-docs/openapi.json` - Specification backing the Swagger UI (if enabled)
pub fn create_router(tracker: TaskTracker, config: Arc<Config>) -> Router {
    let state = AppState::new(tracker, config.clone());

    let router = Router::new()
        // Tasks
        .route("/tasks", get(routes::list_tasks))
        .route("/tasks", post(routes::record_submission))
        .route("/tasks/:task_id", get(routes::get_task_status))
        // System
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec));

    // Must not collide with the /openapi.json route above
    let router = if config.api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    let router = router.with_state(state);

    // Last layer applied runs first: Trace → CORS → Auth → Handler
    let router = if config.api.api_key.is_some() {
        router.layer(middleware::from_fn_with_state(
            config.api.api_key.clone(),
            auth::require_api_key,
        ))
    } else {
        router
    };

    let router = if config.api.cors_enabled {
        router.layer(build_cors_layer(&config.api.cors_origins))
    } else {
        router
    };

    router.layer(TraceLayer::new_for_http())
}

/// Build a CORS layer based on configured origins
///
/// `"*"` (or an empty list) allows any origin; otherwise only the listed
/// origins that parse as header values are allowed.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    let allow_origin = if allow_any || origins.is_empty() {
        AllowOrigin::any()
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        AllowOrigin::list(allowed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Start the API server on the configured bind address.
///
/// Runs until the server stops, either because of an error or because the
/// surrounding task is cancelled.
///
/// # Example
///
/// ```no_run
/// use mediagen_tasks::{Config, TaskTracker};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let tracker = TaskTracker::new((*config).clone()).await?;
///
/// mediagen_tasks::api::start_api_server(tracker, config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(tracker: TaskTracker, config: Arc<Config>) -> Result<()> {
    let bind_address = config.api.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let app = create_router(tracker, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(address = %bind_address, "API server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
