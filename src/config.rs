//! Configuration types for mediagen-tasks
//!
//! Configuration is an explicit value handed to constructors
//! ([`TaskTracker::new`](crate::TaskTracker::new),
//! [`Materializer::new`](crate::Materializer::new)); nothing is read from the
//! process environment.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Main configuration for [`TaskTracker`](crate::TaskTracker)
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Remote generation API connection settings
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Result download settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// Local task store settings
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// REST API settings
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Check settings that would otherwise only fail at first use
    pub fn validate(&self) -> Result<()> {
        if self.remote.base_url.trim().is_empty() {
            return Err(Error::Config {
                message: "base_url must not be empty".to_string(),
                key: Some("remote.base_url".to_string()),
            });
        }
        if url::Url::parse(&self.remote.base_url).is_err() {
            return Err(Error::Config {
                message: format!("base_url '{}' is not a valid URL", self.remote.base_url),
                key: Some("remote.base_url".to_string()),
            });
        }
        if self.remote.timeout.is_zero() {
            return Err(Error::Config {
                message: "timeout must be greater than zero".to_string(),
                key: Some("remote.timeout".to_string()),
            });
        }
        Ok(())
    }
}

/// Remote generation API connection settings
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RemoteConfig {
    /// Base URL of the generation API (default: "https://api.kie.ai/api/v1")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token sent with every status query
    #[serde(default)]
    pub api_key: Option<String>,

    /// Timeout in seconds (default: 60). Bounds each status query end to end;
    /// result downloads only use it to bound connection setup.
    #[serde(default = "default_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout: default_timeout(),
        }
    }
}

/// Result download settings
///
/// Materialization is opt-in: without a `download_dir` nothing is written.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DownloadConfig {
    /// Directory result files are written to (None = downloading disabled)
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub download_dir: Option<PathBuf>,

    /// Download results automatically when a poll reports success (default: true)
    #[serde(default = "default_true")]
    pub auto_download: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: None,
            auto_download: true,
        }
    }
}

impl DownloadConfig {
    /// Directory to download into, if downloading is enabled
    pub fn enabled_dir(&self) -> Option<&PathBuf> {
        if self.auto_download {
            self.download_dir.as_ref()
        } else {
            None
        }
    }
}

/// Local task store settings
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PersistenceConfig {
    /// Database path (default: "./tasks.db")
    #[serde(default = "default_database_path")]
    #[schema(value_type = String)]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:6790)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Optional API key required in the X-Api-Key header
    #[serde(default)]
    pub api_key: Option<String>,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            api_key: None,
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

fn default_base_url() -> String {
    "https://api.kie.ai/api/v1".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./tasks.db")
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 6790))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
