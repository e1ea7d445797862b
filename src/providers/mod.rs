mod anthropic;
mod factory;
mod open_ai;
mod prompt;

pub use anthropic::AnthropicProvider;
pub use factory::ProviderFactory;
pub use open_ai::OpenAIProvider;
pub use prompt::RECIPE_STRUCTURING_PROMPT;

use crate::error::ExtractError;
use async_trait::async_trait;
use log::warn;
use serde_json::Value;

/// A text-completion collaborator
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Get the provider name (e.g., "openai", "anthropic")
    fn provider_name(&self) -> &str;

    /// Send one system/user exchange and return the model's raw reply
    async fn complete(&self, system_prompt: &str, user_text: &str) -> Result<String, ExtractError>;
}

/// True for keys that were obviously never filled in
pub fn is_placeholder_key(key: &str) -> bool {
    let key = key.trim();
    let lower = key.to_ascii_lowercase();
    key.is_empty()
        || lower.starts_with("your-")
        || lower.starts_with("your_")
        || lower == "changeme"
        || key == "sk-..."
}

/// Pick the configured key, else the environment's, refusing placeholders
pub(crate) fn resolve_api_key(
    provider: &str,
    configured: Option<&str>,
    env_var: &str,
) -> Result<String, ExtractError> {
    pick_api_key(provider, configured, std::env::var(env_var).ok())
}

fn pick_api_key(
    provider: &str,
    configured: Option<&str>,
    from_env: Option<String>,
) -> Result<String, ExtractError> {
    configured
        .map(str::to_string)
        .into_iter()
        .chain(from_env)
        .find(|key| !is_placeholder_key(key))
        .map(|key| key.trim().to_string())
        .ok_or_else(|| ExtractError::MissingCredentials {
            provider: provider.to_string(),
        })
}

/// Turn a provider response into JSON, mapping non-success statuses to `Api` errors
pub(crate) async fn read_json(
    provider: &str,
    response: reqwest::Response,
) -> Result<Value, ExtractError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!("{} returned {}: {}", provider, status, body);
        return Err(ExtractError::Api {
            provider: provider.to_string(),
            status: Some(status.as_u16()),
            message: body,
        });
    }
    response
        .json()
        .await
        .map_err(|e| ExtractError::api(provider, e))
}
