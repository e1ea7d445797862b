use crate::config::ProviderConfig;
use crate::error::ExtractError;
use crate::providers::{read_json, resolve_api_key, CompletionProvider};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

const PROVIDER: &str = "anthropic";

pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider from configuration
    pub fn new(config: &ProviderConfig, timeout: Duration) -> Result<Self, ExtractError> {
        let api_key = resolve_api_key(PROVIDER, config.api_key.as_deref(), "ANTHROPIC_API_KEY")?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| "https://api.anthropic.com".to_string());

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExtractError::api(PROVIDER, e))?;

        Ok(AnthropicProvider {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl CompletionProvider for AnthropicProvider {
    fn provider_name(&self) -> &str {
        PROVIDER
    }

    async fn complete(&self, system_prompt: &str, user_text: &str) -> Result<String, ExtractError> {
        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&json!({
                "model": self.model,
                "max_tokens": self.max_tokens,
                "temperature": self.temperature,
                "system": system_prompt,
                "messages": [
                    {
                        "role": "user",
                        "content": user_text
                    }
                ]
            }))
            .send()
            .await
            .map_err(|e| ExtractError::api(PROVIDER, e))?;

        let response_body = read_json(PROVIDER, response).await?;
        debug!("{:?}", response_body);

        response_body["content"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ExtractError::Api {
                provider: PROVIDER.to_string(),
                status: None,
                message: "Failed to extract content from Anthropic response".to_string(),
            })
    }
}
