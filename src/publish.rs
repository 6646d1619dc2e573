// src/publish.rs

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::config::Config;
use crate::error::ReportError;

/// The single capability the pipeline needs from the artifact side: hand
/// over the rendered bytes, get back a time-limited retrievable URL.
#[async_trait]
pub trait ArtifactStore {
    async fn publish(&self, filename: &str, bytes: Vec<u8>) -> Result<String, ReportError>;
}

#[derive(Debug, Deserialize)]
struct PublishResponse {
    url: String,
}

/// Uploads to the artifact-store service over HTTP; the service owns bucket
/// placement and link signing.
pub struct HttpArtifactStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpArtifactStore {
    pub fn new(cfg: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: cfg.artifact_url.trim_end_matches('/').to_string(),
        }
    }

    fn object_url(&self, filename: &str) -> String {
        format!("{}/{}", self.base_url, filename)
    }
}

#[async_trait]
impl ArtifactStore for HttpArtifactStore {
    async fn publish(&self, filename: &str, bytes: Vec<u8>) -> Result<String, ReportError> {
        let size = bytes.len();
        let response = self
            .client
            .put(self.object_url(filename))
            .header(reqwest::header::CONTENT_TYPE, "application/pdf")
            .body(bytes)
            .send()
            .await
            .map_err(|e| {
                ReportError::dependency("publish.publish", e.to_string(), "Failed to store report")
            })?
            .error_for_status()
            .map_err(|e| {
                ReportError::dependency("publish.publish", e.to_string(), "Failed to store report")
            })?;

        let parsed: PublishResponse = response.json().await.map_err(|e| {
            ReportError::dependency("publish.publish", e.to_string(), "Failed to store report")
        })?;

        info!(filename, size, "report published");
        Ok(parsed.url)
    }
}
