//! reqwest-backed status client for the generation API.

use async_trait::async_trait;
use serde::Deserialize;

use super::{RemoteState, RemoteStatus, StatusClient};
use crate::config::RemoteConfig;
use crate::types::{ApiType, TaskId};
use crate::{Error, Result};

/// Envelope code the API uses for a successful call
const CODE_OK: i64 = 200;

/// Response envelope shared by every endpoint
#[derive(Debug, Deserialize)]
struct Envelope {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// Endpoint family a task is polled through
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Endpoint {
    /// `/veo/record-info`, reports `successFlag`
    Veo,
    /// `/jobs/recordInfo`, reports `state` and a JSON-encoded `resultJson`
    Jobs,
}

impl Endpoint {
    fn for_hint(hint: Option<ApiType>) -> Self {
        match hint {
            Some(ApiType::Veo3) => Endpoint::Veo,
            Some(ApiType::NanoBanana | ApiType::NanoBananaEdit | ApiType::Sora2) | None => {
                Endpoint::Jobs
            }
        }
    }

    fn path(&self) -> &'static str {
        match self {
            Endpoint::Veo => "veo/record-info",
            Endpoint::Jobs => "jobs/recordInfo",
        }
    }
}

/// Status client talking to the generation API over HTTPS
#[derive(Clone)]
pub struct HttpStatusClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpStatusClient {
    /// Build a client from remote settings
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn status_url(&self, endpoint: Endpoint, task_id: &TaskId) -> Result<url::Url> {
        let raw = format!("{}/{}", self.base_url, endpoint.path());
        let mut url = url::Url::parse(&raw).map_err(|e| Error::Config {
            message: format!("invalid base_url '{}': {}", self.base_url, e),
            key: Some("remote.base_url".to_string()),
        })?;
        url.query_pairs_mut().append_pair("taskId", task_id.as_str());
        Ok(url)
    }
}

#[async_trait]
impl StatusClient for HttpStatusClient {
    async fn query(&self, task_id: &TaskId, api_type: Option<ApiType>) -> Result<RemoteStatus> {
        let endpoint = Endpoint::for_hint(api_type);
        let url = self.status_url(endpoint, task_id)?;

        tracing::debug!(task_id = %task_id, url = %url, "polling remote task status");

        let mut request = self.client.get(url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Error::Remote(format!(
                "HTTP {} polling task {}",
                response.status(),
                task_id
            )));
        }

        let envelope: Envelope = response.json().await?;
        if envelope.code != CODE_OK {
            return Err(Error::Remote(format!(
                "code {}: {}",
                envelope.code, envelope.msg
            )));
        }

        let data = envelope.data.unwrap_or(serde_json::Value::Null);
        Ok(match endpoint {
            Endpoint::Veo => parse_veo(envelope.code, data),
            Endpoint::Jobs => parse_jobs(envelope.code, data),
        })
    }
}

fn string_field(data: &serde_json::Value, key: &str) -> Option<String> {
    data.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn url_list(value: Option<&serde_json::Value>) -> Vec<String> {
    value
        .and_then(|v| v.as_array())
        .map(|urls| {
            urls.iter()
                .filter_map(|u| u.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// `successFlag`: 0 generating, 1 success, 2 and 3 failed
fn parse_veo(code: i64, data: serde_json::Value) -> RemoteStatus {
    let state = match data.get("successFlag").and_then(|v| v.as_i64()) {
        Some(1) => RemoteState::Succeeded,
        Some(2) | Some(3) => RemoteState::Failed,
        Some(_) => RemoteState::Processing,
        None => RemoteState::Pending,
    };
    let result_urls = url_list(
        data.get("response")
            .and_then(|r| r.get("resultUrls"))
            .or_else(|| data.get("resultUrls")),
    );
    let error_message = match state {
        RemoteState::Failed => string_field(&data, "errorMessage")
            .or_else(|| Some("generation failed".to_string())),
        _ => None,
    };

    RemoteStatus {
        status_code: code,
        state,
        result_urls,
        error_message,
        raw: data,
    }
}

/// `state`: waiting/queuing, generating, success, fail
fn parse_jobs(code: i64, data: serde_json::Value) -> RemoteStatus {
    let state = match data.get("state").and_then(|v| v.as_str()) {
        Some("success") => RemoteState::Succeeded,
        Some("fail") => RemoteState::Failed,
        Some("generating") => RemoteState::Processing,
        _ => RemoteState::Pending,
    };

    // resultJson is itself a JSON document serialized into a string
    let result_urls = match data.get("resultJson").and_then(|v| v.as_str()) {
        Some(encoded) if !encoded.is_empty() => {
            match serde_json::from_str::<serde_json::Value>(encoded) {
                Ok(parsed) => url_list(parsed.get("resultUrls")),
                Err(e) => {
                    tracing::warn!(error = %e, "remote resultJson is not valid JSON");
                    Vec::new()
                }
            }
        }
        _ => Vec::new(),
    };
    let error_message = match state {
        RemoteState::Failed => {
            string_field(&data, "failMsg").or_else(|| Some("generation failed".to_string()))
        }
        _ => None,
    };

    RemoteStatus {
        status_code: code,
        state,
        result_urls,
        error_message,
        raw: data,
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> HttpStatusClient {
        HttpStatusClient::new(&RemoteConfig {
            base_url: format!("{}/api/v1/", server.uri()),
            api_key: Some("secret".to_string()),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn task(id: &str) -> TaskId {
        TaskId::new(id).unwrap()
    }

    #[tokio::test]
    async fn veo_success_reports_result_urls() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/veo/record-info"))
            .and(query_param("taskId", "veo-1"))
            .and(header("Authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 200,
                "msg": "success",
                "data": {
                    "taskId": "veo-1",
                    "successFlag": 1,
                    "response": {"resultUrls": ["http://cdn/a.mp4", "http://cdn/b.mp4"]}
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let status = client_for(&server)
            .query(&task("veo-1"), Some(ApiType::Veo3))
            .await
            .unwrap();

        assert_eq!(status.status_code, 200);
        assert_eq!(status.state, RemoteState::Succeeded);
        assert!(status.is_terminal_success());
        assert_eq!(status.result_urls, vec!["http://cdn/a.mp4", "http://cdn/b.mp4"]);
        assert_eq!(status.raw["taskId"], "veo-1");
    }

    #[tokio::test]
    async fn jobs_success_decodes_nested_result_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/jobs/recordInfo"))
            .and(query_param("taskId", "img-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 200,
                "msg": "success",
                "data": {
                    "state": "success",
                    "resultJson": "{\"resultUrls\":[\"http://cdn/i.png\"]}"
                }
            })))
            .mount(&server)
            .await;

        let status = client_for(&server)
            .query(&task("img-1"), Some(ApiType::NanoBanana))
            .await
            .unwrap();

        assert!(status.is_terminal_success());
        assert_eq!(status.result_urls, vec!["http://cdn/i.png"]);
    }

    #[tokio::test]
    async fn missing_hint_uses_jobs_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/jobs/recordInfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 200,
                "msg": "success",
                "data": {"state": "generating"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let status = client_for(&server).query(&task("x"), None).await.unwrap();

        assert_eq!(status.state, RemoteState::Processing);
        assert!(!status.is_terminal_success());
        assert!(status.result_urls.is_empty());
    }

    #[tokio::test]
    async fn failed_job_carries_fail_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/jobs/recordInfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 200,
                "msg": "success",
                "data": {"state": "fail", "failMsg": "content policy"}
            })))
            .mount(&server)
            .await;

        let status = client_for(&server)
            .query(&task("s2"), Some(ApiType::Sora2))
            .await
            .unwrap();

        assert!(status.is_terminal_failure());
        assert_eq!(status.error_message.as_deref(), Some("content policy"));
    }

    #[tokio::test]
    async fn envelope_error_code_is_remote_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 401,
                "msg": "invalid api key"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .query(&task("t"), Some(ApiType::Veo3))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Remote(ref m) if m.contains("invalid api key")));
    }

    #[tokio::test]
    async fn http_error_status_is_remote_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server).query(&task("t"), None).await.unwrap_err();

        assert!(matches!(err, Error::Remote(ref m) if m.contains("503")));
    }

    #[test]
    fn veo_failure_without_message_gets_generic_reason() {
        let status = parse_veo(200, json!({"successFlag": 3}));
        assert_eq!(status.state, RemoteState::Failed);
        assert_eq!(status.error_message.as_deref(), Some("generation failed"));
    }

    #[test]
    fn malformed_result_json_yields_no_urls() {
        let status = parse_jobs(200, json!({"state": "success", "resultJson": "{not json"}));
        assert_eq!(status.state, RemoteState::Succeeded);
        assert!(!status.is_terminal_success());
    }
}
