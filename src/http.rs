use crate::error::MovieError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Minimal GET transport the API client is written against.
///
/// Network-level failures must surface with a [`MovieError::Transport`] root
/// cause; non-2xx responses are returned as-is so the caller can classify them.
#[async_trait]
pub trait HttpAdapter: Send + Sync {
    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<HttpResponse>;
}

#[derive(Debug, Clone)]
pub struct ReqwestAdapter {
    client: Client,
}

impl ReqwestAdapter {
    pub fn new(timeout: Duration) -> Result<Self> {
        let user_agent = format!("cinedeck/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpAdapter for ReqwestAdapter {
    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<HttpResponse> {
        // reqwest errors carry the full URL, query string included
        let res = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| MovieError::Transport(e.without_url().to_string()))?;
        let status = res.status().as_u16();
        let body = res
            .text()
            .await
            .map_err(|e| {
                MovieError::Transport(format!("reading body failed: {}", e.without_url()))
            })?;
        Ok(HttpResponse { status, body })
    }
}
