use crate::config::{ExtractorConfig, ProviderConfig};
use crate::error::ExtractError;
use crate::providers::{AnthropicProvider, CompletionProvider, OpenAIProvider};
use std::time::Duration;

pub struct ProviderFactory;

impl ProviderFactory {
    /// Create a provider instance from configuration
    pub fn create(
        provider_name: &str,
        config: &ProviderConfig,
        timeout: Duration,
    ) -> Result<Box<dyn CompletionProvider>, ExtractError> {
        // Validate that provider is enabled
        if !config.enabled {
            return Err(ExtractError::InvalidInput(format!(
                "Provider '{}' is not enabled in configuration",
                provider_name
            )));
        }

        match provider_name {
            "openai" => Ok(Box::new(OpenAIProvider::new(config, timeout)?)),
            "anthropic" => Ok(Box::new(AnthropicProvider::new(config, timeout)?)),
            _ => Err(ExtractError::InvalidInput(format!(
                "Unknown provider: {}",
                provider_name
            ))),
        }
    }

    /// Get the default provider from configuration.
    ///
    /// A provider without a config section still works from environment keys
    /// with its default model.
    pub fn get_default_provider(
        config: &ExtractorConfig,
    ) -> Result<Box<dyn CompletionProvider>, ExtractError> {
        let provider_name = &config.default_provider;
        let provider_config = config
            .providers
            .get(provider_name)
            .cloned()
            .unwrap_or_else(|| Self::default_config(provider_name));

        Self::create(
            provider_name,
            &provider_config,
            Duration::from_secs(config.timeout),
        )
    }

    fn default_config(provider_name: &str) -> ProviderConfig {
        let model = match provider_name {
            "anthropic" => "claude-sonnet-4-5",
            _ => "gpt-4o-mini",
        };
        ProviderConfig {
            enabled: true,
            model: model.to_string(),
            temperature: 0.2,
            max_tokens: 2000,
            api_key: None,
            base_url: None,
        }
    }

    /// List all available provider names
    pub fn available_providers() -> Vec<&'static str> {
        vec!["openai", "anthropic"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn create_test_provider_config() -> ProviderConfig {
        ProviderConfig {
            enabled: true,
            model: "test-model".to_string(),
            temperature: 0.2,
            max_tokens: 2000,
            api_key: Some("test-key".to_string()),
            base_url: None,
        }
    }

    #[test]
    fn test_create_providers() {
        let config = create_test_provider_config();
        let timeout = Duration::from_secs(5);
        for name in ProviderFactory::available_providers() {
            let provider = ProviderFactory::create(name, &config, timeout).unwrap();
            assert_eq!(provider.provider_name(), name);
        }
    }

    #[test]
    fn test_create_unknown_provider() {
        let config = create_test_provider_config();
        let result = ProviderFactory::create("unknown", &config, Duration::from_secs(5));
        assert!(matches!(result, Err(ExtractError::InvalidInput(_))));
    }

    #[test]
    fn test_create_disabled_provider() {
        let mut config = create_test_provider_config();
        config.enabled = false;
        let result = ProviderFactory::create("openai", &config, Duration::from_secs(5));
        assert!(result.is_err());
    }

    #[test]
    fn test_get_default_provider() {
        let mut providers = HashMap::new();
        providers.insert("anthropic".to_string(), create_test_provider_config());

        let config = ExtractorConfig {
            default_provider: "anthropic".to_string(),
            providers,
            ..Default::default()
        };

        let provider = ProviderFactory::get_default_provider(&config).unwrap();
        assert_eq!(provider.provider_name(), "anthropic");
    }
}
