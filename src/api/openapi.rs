//! OpenAPI documentation and schema generation
//!
//! Describes the mediagen-tasks REST API using utoipa for compile-time spec
//! generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the mediagen-tasks REST API
///
/// Served at `/openapi.json` and, when enabled, browsable at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "mediagen-tasks REST API",
        version = "0.1.0",
        description = "Track media generation jobs, reconcile them with the generation API and download their results",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:6790", description = "Local development server")
    ),
    paths(
        // Tasks
        crate::api::routes::list_tasks,
        crate::api::routes::record_submission,
        crate::api::routes::get_task_status,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::ApiType,
        crate::types::TaskStatus,
        crate::types::MediaKind,
        crate::types::TaskRecord,
        crate::types::SubmissionResponse,
        crate::types::TaskStatusView,

        // Remote status payload
        crate::remote::RemoteState,
        crate::remote::RemoteStatus,

        // Config types from config.rs
        crate::config::Config,
        crate::config::RemoteConfig,
        crate::config::DownloadConfig,
        crate::config::PersistenceConfig,
        crate::config::ApiConfig,

        // API request/response types from routes
        crate::api::routes::ListTasksQuery,
        crate::api::routes::ListTasksResponse,
        crate::api::routes::RecordSubmissionRequest,
        crate::api::routes::RecordSubmissionResponse,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "tasks", description = "Generation tasks - Record submissions, list tasks, reconcile status and download results"),
        (name = "system", description = "System endpoints - Health check and OpenAPI spec"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Adds the `X-Api-Key` header scheme to the generated spec
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = &mut openapi.components {
            components.add_security_scheme(
                "api_key",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new("X-Api-Key"),
                    ),
                ),
            );
        }
    }
}
