use crate::config::ProviderConfig;
use crate::error::ExtractError;
use crate::providers::{read_json, resolve_api_key, CompletionProvider};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

const PROVIDER: &str = "openai";

/// OpenAI-compatible chat completions
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider from configuration
    pub fn new(config: &ProviderConfig, timeout: Duration) -> Result<Self, ExtractError> {
        // Try config first, then fall back to environment variable
        let api_key = resolve_api_key(PROVIDER, config.api_key.as_deref(), "OPENAI_API_KEY")?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| "https://api.openai.com".to_string());

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExtractError::api(PROVIDER, e))?;

        Ok(OpenAIProvider {
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
impl CompletionProvider for OpenAIProvider {
    fn provider_name(&self) -> &str {
        PROVIDER
    }

    async fn complete(&self, system_prompt: &str, user_text: &str) -> Result<String, ExtractError> {
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "model": self.model,
                "messages": [
                    {"role": "system", "content": system_prompt},
                    {"role": "user", "content": user_text}
                ],
                "temperature": self.temperature,
                "max_tokens": self.max_tokens
            }))
            .send()
            .await
            .map_err(|e| ExtractError::api(PROVIDER, e))?;

        let response_body = read_json(PROVIDER, response).await?;
        debug!("{:?}", response_body);

        response_body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ExtractError::Api {
                provider: PROVIDER.to_string(),
                status: None,
                message: "Failed to extract content from response".to_string(),
            })
    }
}
