//! Thin client for the upstream OpenAI API
//!
//! Wraps a `reqwest::Client` with the base URL and bearer credential from
//! configuration. Each call sends exactly once; faults are returned, never
//! retried.

mod types;

pub use types::*;

use crate::config::Config;
use crate::error::{Error, Result};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenAiClient {
    /// Build a client from configuration, resolving the credential once.
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config.api_key()?;
        Self::with_credentials(
            &config.openai.base_url,
            api_key,
            Duration::from_secs(config.openai.timeout_secs),
        )
    }

    /// Build a client against an explicit base URL (tests point this at a
    /// mock server).
    pub fn with_credentials(base_url: &str, api_key: String, timeout: Duration) -> Result<Self> {
        // Parse up front so a malformed base URL fails at startup, not per call
        Url::parse(base_url)?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<String> {
        let url = self.endpoint(path);
        debug!(%url, "POST upstream");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let body_text = response.text().await?;
        debug!(status = status.as_u16(), body = %body_text, "upstream reply");

        if !status.is_success() {
            return Err(Error::UpstreamStatus {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("").to_string(),
                body: body_text,
            });
        }

        Ok(body_text)
    }

    /// Submit a completion request and return the (polymorphic) reply.
    pub async fn create_response(&self, request: &ResponsesRequest) -> Result<ResponsesReply> {
        let body = self.post("responses", request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Search a vector store. Returns the typed reply alongside the raw JSON
    /// document so callers can append it for diagnostics.
    pub async fn vector_store_search(
        &self,
        vector_store_id: &str,
        request: &VectorSearchRequest,
    ) -> Result<(VectorSearchReply, Value)> {
        let path = format!("vector_stores/{}/search", vector_store_id);
        let body = self.post(&path, request).await?;
        let raw: Value = serde_json::from_str(&body)?;
        let reply: VectorSearchReply = serde_json::from_value(raw.clone())?;
        Ok((reply, raw))
    }
}
