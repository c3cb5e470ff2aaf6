// oEmbed metadata adapter - Video title lookup through noembed

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::domain::errors::*;
use crate::ports::*;

#[derive(Debug, Deserialize)]
struct EmbedWire {
    #[serde(default)]
    title: Option<String>,
}

/// Looks up video titles through an oEmbed proxy
pub struct NoembedAdapter {
    client: Client,
    endpoint: String,
}

impl NoembedAdapter {
    pub fn new(endpoint: &str, request_timeout: Duration) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| DomainError::InternalError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    async fn lookup(&self, source_url: &str) -> Result<Option<String>, reqwest::Error> {
        let wire: EmbedWire = self
            .client
            .get(&self.endpoint)
            .query(&[("url", source_url)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(wire.title.filter(|title| !title.trim().is_empty()))
    }
}

#[async_trait]
impl VideoMetadataPort for NoembedAdapter {
    async fn video_title(&self, source_url: &str) -> Option<String> {
        match self.lookup(source_url).await {
            Ok(title) => title,
            Err(e) => {
                debug!(error = %e, "Title lookup failed");
                None
            }
        }
    }
}
