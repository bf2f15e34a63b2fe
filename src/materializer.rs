//! Result artifact materialization
//!
//! Turns the result URLs of a finished task into files under the configured
//! download directory. Destinations are a pure function of the task id, the
//! URL and its position in the list, so repeated calls find the file already
//! present and skip the transfer.
//!
//! Bodies are streamed into a uniquely named `*.part` file beside the
//! destination and renamed into place once complete. A reader never observes
//! a truncated file under the final name, and two concurrent transfers of the
//! same result never share a temporary file.

use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use crate::config::{Config, DownloadConfig};
use crate::types::{MediaKind, TaskId};
use crate::{Error, Result};

/// Downloads result resources to local disk, at most once per destination
#[derive(Clone, Debug)]
pub struct Materializer {
    config: DownloadConfig,
    client: reqwest::Client,
}

impl Materializer {
    /// Create a materializer that fetches through `client`
    pub fn new(config: DownloadConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// Create a materializer with its own HTTP client
    ///
    /// Only connection setup is bounded by the remote timeout. Result bodies
    /// can be large videos, so a transfer that keeps delivering bytes is
    /// never cut off.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.remote.timeout)
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::new(config.download.clone(), client))
    }

    /// Whether downloads happen at all
    pub fn is_enabled(&self) -> bool {
        self.config.enabled_dir().is_some()
    }

    /// Where the `index`-th of `total` results of `task_id` is stored
    ///
    /// A single result is named after the task id alone; multiple results get
    /// an `_{index}` suffix. The extension comes from the URL path, falling
    /// back to the media kind's default.
    pub fn destination_for(
        dir: &Path,
        url: &str,
        task_id: &TaskId,
        index: usize,
        total: usize,
        kind: MediaKind,
    ) -> Result<PathBuf> {
        let parsed = url::Url::parse(url).map_err(|e| Error::Transfer {
            url: url.to_string(),
            reason: format!("invalid URL: {}", e),
        })?;

        let extension = parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .and_then(|segment| Path::new(segment).extension())
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .map(|ext| format!(".{}", ext))
            .unwrap_or_else(|| kind.default_extension().to_string());

        let stem = if total > 1 {
            format!("{}_{}", task_id, index)
        } else {
            task_id.to_string()
        };

        Ok(dir.join(format!("{}{}", stem, extension)))
    }

    /// Materialize every URL, returning the paths that now exist in input order
    ///
    /// A failed URL is logged and left out of the result; it never prevents
    /// the remaining URLs from being processed.
    pub async fn materialize(
        &self,
        urls: &[String],
        task_id: &TaskId,
        kind: MediaKind,
    ) -> Vec<PathBuf> {
        if !self.is_enabled() {
            return Vec::new();
        }

        let total = urls.len();
        let mut paths = Vec::with_capacity(total);

        for (index, url) in urls.iter().enumerate() {
            match self.materialize_one(url, task_id, index, total, kind).await {
                Ok(path) => paths.push(path),
                Err(e) => {
                    tracing::warn!(
                        task_id = %task_id,
                        url = %url,
                        error = %e,
                        "failed to materialize result"
                    );
                }
            }
        }

        paths
    }

    /// Materialize a single URL as the `index`-th of `total` results
    pub async fn materialize_one(
        &self,
        url: &str,
        task_id: &TaskId,
        index: usize,
        total: usize,
        kind: MediaKind,
    ) -> Result<PathBuf> {
        let dir = self.config.enabled_dir().ok_or_else(|| Error::Config {
            message: "result downloads are disabled".to_string(),
            key: Some("download.download_dir".to_string()),
        })?;

        let destination = Self::destination_for(dir, url, task_id, index, total, kind)?;

        if tokio::fs::try_exists(&destination).await? {
            tracing::debug!(
                task_id = %task_id,
                path = %destination.display(),
                "result already present, skipping download"
            );
            return Ok(destination);
        }

        tokio::fs::create_dir_all(dir).await?;

        let temp_path = temp_path_for(&destination);
        if let Err(e) = self.fetch_into(url, &temp_path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e);
        }

        if let Err(e) = tokio::fs::rename(&temp_path, &destination).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        tracing::info!(
            task_id = %task_id,
            url = %url,
            path = %destination.display(),
            "downloaded result"
        );

        Ok(destination)
    }

    /// Stream the body of `url` into `path`
    async fn fetch_into(&self, url: &str, path: &Path) -> Result<()> {
        let transfer_error = |reason: String| Error::Transfer {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transfer_error(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(transfer_error(format!("HTTP {}", response.status())));
        }

        let mut file = tokio::fs::File::create(path).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let bytes = chunk.map_err(|e| transfer_error(format!("read failed: {}", e)))?;
            file.write_all(&bytes).await?;
        }
        file.flush().await?;
        file.sync_all().await?;

        Ok(())
    }
}

/// Hidden, uniquely named sibling of `destination`
fn temp_path_for(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix: u64 = rand::random();
    destination.with_file_name(format!(".{}.{:016x}.part", name, suffix))
}
