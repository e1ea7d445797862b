use crate::error::ExtractError;
use crate::model::{Ingredient, Recipe, SourceType};
use crate::normalize::{collapse_whitespace, strip_tags};
use log::debug;
use thiserror::Error;
use url::Url;

pub const MAX_URL_LEN: usize = 2048;
pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_SERVINGS: u32 = 100;
/// 24 hours
pub const MAX_TIME_MINUTES: u32 = 1440;

/// One broken validation rule
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    #[error("a source URL is required for web recipes")]
    MissingUrl,

    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("title must be between 1 and 200 characters, got {0}")]
    TitleLength(usize),

    #[error("servings must be between 1 and 100, got {0}")]
    ServingsOutOfRange(u32),

    #[error("prep time must be at most 1440 minutes, got {0}")]
    PrepTimeOutOfRange(u32),

    #[error("cook time must be at most 1440 minutes, got {0}")]
    CookTimeOutOfRange(u32),

    #[error("at least one ingredient is required")]
    NoIngredients,

    #[error("at least one step is required")]
    NoSteps,
}

/// Outcome of validating a candidate recipe
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    /// The sanitised recipe, present only when every rule passed
    pub validated_recipe: Option<Recipe>,
}

impl ValidationReport {
    pub fn into_result(self) -> Result<Recipe, ExtractError> {
        match self.validated_recipe {
            Some(recipe) if self.is_valid => Ok(recipe),
            _ => Err(ExtractError::Validation {
                issues: self.errors,
            }),
        }
    }
}

/// Check every rule against `candidate` and collect all failures.
///
/// The URL is only mandatory for [`SourceType::Url`] recipes. An invalid image
/// URL is dropped rather than reported.
pub fn validate(candidate: &Recipe) -> ValidationReport {
    let mut errors = Vec::new();

    match (&candidate.url, candidate.source_type) {
        (Some(url), _) => {
            if let Err(issue) = check_url(url) {
                errors.push(issue);
            }
        }
        (None, SourceType::Url) => errors.push(ValidationIssue::MissingUrl),
        (None, _) => {}
    }

    let title = sanitize_title(&candidate.title);
    let title_len = title.chars().count();
    if title_len == 0 || title_len > MAX_TITLE_LEN {
        errors.push(ValidationIssue::TitleLength(title_len));
    }

    if !(1..=MAX_SERVINGS).contains(&candidate.servings) {
        errors.push(ValidationIssue::ServingsOutOfRange(candidate.servings));
    }
    if candidate.prep_time > MAX_TIME_MINUTES {
        errors.push(ValidationIssue::PrepTimeOutOfRange(candidate.prep_time));
    }
    if candidate.cook_time > MAX_TIME_MINUTES {
        errors.push(ValidationIssue::CookTimeOutOfRange(candidate.cook_time));
    }

    let ingredients: Vec<Ingredient> = candidate
        .ingredients
        .iter()
        .map(sanitize_ingredient)
        .filter(|ingredient| !ingredient.item.is_empty())
        .collect();
    if ingredients.is_empty() {
        errors.push(ValidationIssue::NoIngredients);
    }

    let steps: Vec<String> = candidate
        .steps
        .iter()
        .map(|step| sanitize_text(step))
        .filter(|step| !step.is_empty())
        .collect();
    if steps.is_empty() {
        errors.push(ValidationIssue::NoSteps);
    }

    let image_url = candidate.image_url.as_ref().and_then(|url| match check_url(url) {
        Ok(()) => Some(url.clone()),
        Err(issue) => {
            debug!("Dropping image URL: {}", issue);
            None
        }
    });

    if !errors.is_empty() {
        return ValidationReport {
            is_valid: false,
            errors,
            validated_recipe: None,
        };
    }

    ValidationReport {
        is_valid: true,
        errors,
        validated_recipe: Some(Recipe {
            url: candidate.url.clone(),
            recipe_id: candidate.recipe_id.clone(),
            title,
            servings: candidate.servings,
            prep_time: candidate.prep_time,
            cook_time: candidate.cook_time,
            ingredients,
            steps,
            image_url,
            source_type: candidate.source_type,
        }),
    }
}

/// Absolute http(s) URL with a host, no longer than [`MAX_URL_LEN`]
pub fn check_url(raw: &str) -> Result<(), ValidationIssue> {
    let invalid = |reason: &str| ValidationIssue::InvalidUrl {
        url: raw.chars().take(80).collect(),
        reason: reason.to_string(),
    };

    if raw.len() > MAX_URL_LEN {
        return Err(invalid("too long"));
    }
    let url = Url::parse(raw.trim()).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("only http and https are supported"));
    }
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(invalid("missing host")),
    }
}

/// Strip markup and script content, then escape what is left for safe display
pub fn sanitize_title(title: &str) -> String {
    html_escape::encode_quoted_attribute(&sanitize_text(title)).into_owned()
}

fn sanitize_text(text: &str) -> String {
    collapse_whitespace(&strip_tags(text))
}

fn sanitize_ingredient(ingredient: &Ingredient) -> Ingredient {
    Ingredient {
        amount: sanitize_text(&ingredient.amount),
        unit: sanitize_text(&ingredient.unit),
        item: sanitize_text(&ingredient.item),
    }
}
