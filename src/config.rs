use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;

use crate::extractors::boilerplate::DEFAULT_MAX_FRAGMENT_LEN;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct ExtractorConfig {
    /// Request timeout in seconds, applied to every outbound call
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// User agent sent when fetching pages
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Tuning knobs for the pattern cascade
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    /// Completion provider used to structure OCR text
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Map of provider name to provider configuration
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Vision (OCR) settings
    #[serde(default)]
    pub ocr: OcrConfig,
}

/// Heuristic constants of the pattern-based extractor
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ThresholdConfig {
    /// Stop trying ingredient strategies once more than this many were found
    #[serde(default = "default_ingredient_confidence")]
    pub ingredient_confidence: usize,
    /// Stop trying step strategies once more than this many were found
    #[serde(default = "default_step_confidence")]
    pub step_confidence: usize,
    /// Ingredient fragments must be longer than this
    #[serde(default = "default_min_ingredient_len")]
    pub min_ingredient_len: usize,
    /// Steps taken from instruction-classed list items must be longer than this
    #[serde(default = "default_min_listed_step_len")]
    pub min_listed_step_len: usize,
    /// Steps found by header-anchored and paragraph fallbacks must be longer than this
    #[serde(default = "default_min_loose_step_len")]
    pub min_loose_step_len: usize,
    /// Minimum length of a fragment when splitting one instruction string
    #[serde(default = "default_min_split_step_len")]
    pub min_split_step_len: usize,
    /// Fragments longer than this are treated as boilerplate
    #[serde(default = "default_max_fragment_len")]
    pub max_fragment_len: usize,
    /// Pages with less visible text than this are assumed to be rendered by JavaScript
    #[serde(default = "default_js_text_threshold")]
    pub js_text_threshold: usize,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            ingredient_confidence: default_ingredient_confidence(),
            step_confidence: default_step_confidence(),
            min_ingredient_len: default_min_ingredient_len(),
            min_listed_step_len: default_min_listed_step_len(),
            min_loose_step_len: default_min_loose_step_len(),
            min_split_step_len: default_min_split_step_len(),
            max_fragment_len: default_max_fragment_len(),
            js_text_threshold: default_js_text_threshold(),
        }
    }
}

/// Configuration for a specific completion provider
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Whether this provider is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Model identifier (e.g., "gpt-4o-mini", "claude-sonnet-4-5")
    pub model: String,
    /// Temperature for generation (0.0-1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// API key for authentication (can also be set via environment variable)
    pub api_key: Option<String>,
    /// Base URL for API endpoint (for custom or proxy endpoints)
    pub base_url: Option<String>,
}

/// Google Cloud Vision settings
#[derive(Debug, Deserialize, Clone, Default)]
pub struct OcrConfig {
    /// API key (falls back to GOOGLE_API_KEY)
    pub api_key: Option<String>,
    /// Base URL for the Vision endpoint (for proxies and tests)
    pub base_url: Option<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            user_agent: default_user_agent(),
            thresholds: ThresholdConfig::default(),
            default_provider: default_provider(),
            providers: HashMap::new(),
            ocr: OcrConfig::default(),
        }
    }
}

// Default value functions
fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; RecipeExtract/0.3)".to_string()
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_ingredient_confidence() -> usize {
    2
}

fn default_step_confidence() -> usize {
    1
}

fn default_min_ingredient_len() -> usize {
    2
}

fn default_min_listed_step_len() -> usize {
    5
}

fn default_min_loose_step_len() -> usize {
    15
}

fn default_min_split_step_len() -> usize {
    6
}

fn default_max_fragment_len() -> usize {
    DEFAULT_MAX_FRAGMENT_LEN
}

fn default_js_text_threshold() -> usize {
    200
}

impl ExtractorConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with RECIPE_EXTRACT__ prefix
    /// 2. recipe-extract.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: RECIPE_EXTRACT__PROVIDERS__OPENAI__API_KEY
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }
}

/// Load configuration from file and environment variables
pub fn load_config() -> Result<ExtractorConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("recipe-extract").required(false))
        // Use double underscore for nested: RECIPE_EXTRACT__THRESHOLDS__STEP_CONFIDENCE
        .add_source(
            Environment::with_prefix("RECIPE_EXTRACT")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = ExtractorConfig::default();
        assert_eq!(config.timeout, 30);
        assert_eq!(config.default_provider, "openai");
        assert!(config.providers.is_empty());
        assert_eq!(config.thresholds.ingredient_confidence, 2);
        assert_eq!(config.thresholds.step_confidence, 1);
        assert_eq!(config.thresholds.min_loose_step_len, 15);
        assert_eq!(config.thresholds.max_fragment_len, 500);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ExtractorConfig = Config::builder()
            .add_source(File::from_str(
                r#"
                timeout = 10

                [thresholds]
                step_confidence = 3

                [providers.anthropic]
                model = "claude-sonnet-4-5"
                api_key = "test-key"
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.timeout, 10);
        assert_eq!(config.thresholds.step_confidence, 3);
        assert_eq!(config.thresholds.ingredient_confidence, 2);
        let anthropic = &config.providers["anthropic"];
        assert!(anthropic.enabled);
        assert_eq!(anthropic.max_tokens, 2000);
    }

    #[test]
    fn test_load_config_without_file() {
        for (key, _) in std::env::vars() {
            if key.starts_with("RECIPE_EXTRACT__") {
                std::env::remove_var(key);
            }
        }

        let config = load_config().unwrap();
        assert_eq!(config.timeout, 30);
        assert_eq!(config.default_provider, "openai");
        assert_eq!(config.thresholds, ThresholdConfig::default());
    }
}
