use crate::error::ExtractError;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use std::time::Duration;

/// A webpage-fetch collaborator
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Raw HTML of `url`. One attempt, no retries.
    async fn fetch(&self, url: &str) -> Result<String, ExtractError>;
}

pub struct RequestFetcher {
    client: Client,
}

impl RequestFetcher {
    pub fn new(timeout: Option<Duration>, user_agent: &str) -> Result<Self, ExtractError> {
        let timeout = timeout.unwrap_or(Duration::from_secs(30));
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(ExtractError::network)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for RequestFetcher {
    async fn fetch(&self, url: &str) -> Result<String, ExtractError> {
        debug!("Fetching {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ExtractError::network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::Network {
                status: Some(status.as_u16()),
                message: status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string(),
            });
        }

        let html = response.text().await.map_err(ExtractError::network)?;
        debug!("Fetched {} bytes from {}", html.len(), url);
        Ok(html)
    }
}
