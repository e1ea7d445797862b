use thiserror::Error;

use crate::validate::ValidationIssue;

/// Hint attached to extraction failures on pages that render their content with JavaScript
pub const JS_RENDERED_HINT: &str =
    "This site may require JavaScript to show its recipe - try the photo feature instead";

/// Errors that can occur while extracting a recipe
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The caller handed us something unusable (bad URL, empty text)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The assembled recipe broke one or more validation rules
    #[error("Recipe failed validation: {}", join_issues(.issues))]
    Validation { issues: Vec<ValidationIssue> },

    /// Failed to fetch the webpage
    #[error("Failed to fetch page{}: {message}", status_suffix(.status))]
    Network { status: Option<u16>, message: String },

    /// The OCR or completion provider returned an error
    #[error("{provider} request failed{}: {message}", status_suffix(.status))]
    Api {
        provider: String,
        status: Option<u16>,
        message: String,
    },

    /// No usable API key was configured for a provider
    #[error("No API key configured for {provider}; set it in the config file or environment")]
    MissingCredentials { provider: String },

    /// Nothing usable could be assembled from otherwise successful input
    #[error("Could not extract a recipe: {message}{}", hint_suffix(.hint))]
    Extraction {
        message: String,
        hint: Option<String>,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    /// Failed to read a local file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    pub(crate) fn network(err: reqwest::Error) -> Self {
        ExtractError::Network {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }

    pub(crate) fn api(provider: &str, err: reqwest::Error) -> Self {
        ExtractError::Api {
            provider: provider.to_string(),
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }

    /// The actionable hint for the user, if one could be derived
    pub fn hint(&self) -> Option<&str> {
        match self {
            ExtractError::Extraction { hint, .. } => hint.as_deref(),
            ExtractError::MissingCredentials { .. } => {
                Some("Add an API key to recipe-extract.toml or the RECIPE_EXTRACT__ environment")
            }
            _ => None,
        }
    }
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|issue| issue.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

fn hint_suffix(hint: &Option<String>) -> String {
    hint.as_ref().map(|h| format!(". {h}")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_message_includes_status() {
        let err = ExtractError::Network {
            status: Some(404),
            message: "not found".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to fetch page (404): not found");
    }

    #[test]
    fn test_extraction_error_carries_hint() {
        let err = ExtractError::Extraction {
            message: "no title".to_string(),
            hint: Some(JS_RENDERED_HINT.to_string()),
        };
        assert_eq!(err.hint(), Some(JS_RENDERED_HINT));
        assert!(err.to_string().contains("try the photo feature"));
    }

    #[test]
    fn test_validation_error_lists_every_issue() {
        let err = ExtractError::Validation {
            issues: vec![ValidationIssue::NoIngredients, ValidationIssue::NoSteps],
        };
        let message = err.to_string();
        assert!(message.contains("ingredient"));
        assert!(message.contains("step"));
    }
}
