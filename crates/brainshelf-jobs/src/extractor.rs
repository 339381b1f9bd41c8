//! HTTP fetching for link metadata.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{header, Client, Url};
use tracing::{debug, instrument};

use brainshelf_core::defaults::{
    METADATA_FETCH_TIMEOUT_SECS, METADATA_MAX_BODY_BYTES, METADATA_USER_AGENT,
};
use brainshelf_core::{Error, ExtractedMetadata, Result};

use crate::html::extract_metadata;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml;q=0.9,*/*;q=0.2";

/// Fetches a page and turns it into [`ExtractedMetadata`].
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<ExtractedMetadata>;
}

/// HTTP client settings for the extractor.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub timeout: Duration,
    pub user_agent: String,
    /// Bytes of body read before the rest is discarded.
    pub max_body_bytes: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(METADATA_FETCH_TIMEOUT_SECS),
            user_agent: METADATA_USER_AGENT.to_string(),
            max_body_bytes: METADATA_MAX_BODY_BYTES,
        }
    }
}

/// [`PageFetcher`] over `reqwest`.
#[derive(Clone)]
pub struct MetadataExtractor {
    client: Client,
    config: ExtractorConfig,
}

impl MetadataExtractor {
    pub fn new(config: ExtractorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Only absolute `http`/`https` URLs are fetched.
    pub fn validate_url(url: &str) -> Result<Url> {
        let parsed = Url::parse(url.trim())
            .map_err(|e| Error::InvalidInput(format!("Invalid URL '{}': {}", url, e)))?;
        match parsed.scheme() {
            "http" | "https" => Ok(parsed),
            scheme => Err(Error::InvalidInput(format!(
                "Unsupported URL scheme '{}' for metadata extraction",
                scheme
            ))),
        }
    }

    async fn read_body(&self, mut response: reqwest::Response) -> Result<String> {
        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            let remaining = self.config.max_body_bytes.saturating_sub(body.len());
            if chunk.len() >= remaining {
                body.extend_from_slice(&chunk[..remaining]);
                debug!(
                    limit = self.config.max_body_bytes,
                    "Body truncated at size limit"
                );
                break;
            }
            body.extend_from_slice(&chunk);
        }
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

#[async_trait]
impl PageFetcher for MetadataExtractor {
    #[instrument(skip(self), fields(subsystem = "jobs", component = "extractor", op = "fetch"))]
    async fn fetch(&self, url: &str) -> Result<ExtractedMetadata> {
        let start = Instant::now();
        let page_url = Self::validate_url(url)?;

        let response = self
            .client
            .get(page_url.clone())
            .header(header::ACCEPT, ACCEPT_HTML)
            .send()
            .await?
            .error_for_status()?;

        // Redirects may land somewhere else; relative links resolve there.
        let final_url = response.url().clone();
        let html = self.read_body(response).await?;
        let metadata = extract_metadata(&html, &final_url);

        debug!(
            bytes = html.len(),
            has_title = metadata.title.is_some(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Page metadata extracted"
        );
        Ok(metadata)
    }
}
