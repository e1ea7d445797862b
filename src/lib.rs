pub mod config;
pub mod entities;
pub mod error;
pub mod extractors;
pub mod fetch;
pub mod model;
pub mod normalize;
pub mod ocr;
pub mod pipeline;
pub mod providers;
pub mod synthesize;
pub mod trace;
pub mod validate;

pub use config::ExtractorConfig;
pub use error::ExtractError;
pub use model::{Ingredient, Recipe, SourceType};
pub use ocr::ImageSource;
pub use pipeline::RecipeExtractor;
pub use trace::{ExtractionObserver, TraceEvent};
pub use validate::{validate, ValidationIssue, ValidationReport};

/// Fetch a recipe page and extract its recipe, using configuration from
/// `recipe-extract.toml` and the environment
pub async fn extract_recipe(url: &str) -> Result<Recipe, ExtractError> {
    let extractor = RecipeExtractor::new(ExtractorConfig::load()?)?;
    extractor.extract_from_url(url).await
}

/// Extract a recipe from HTML fetched elsewhere
pub fn extract_recipe_from_html(html: &str, url: &str) -> Result<Recipe, ExtractError> {
    let extractor = RecipeExtractor::new(ExtractorConfig::load()?)?;
    extractor.extract_from_html(html, url)
}

/// Structure OCR or PDF text into a recipe with the configured completion provider
pub async fn extract_recipe_from_text(
    text: &str,
    source_type: SourceType,
) -> Result<Recipe, ExtractError> {
    let extractor = RecipeExtractor::new(ExtractorConfig::load()?)?;
    extractor.extract_from_text(text, source_type).await
}

/// OCR the images in order and structure the combined text into one recipe
pub async fn extract_recipe_from_images(images: &[ImageSource]) -> Result<Recipe, ExtractError> {
    let extractor = RecipeExtractor::new(ExtractorConfig::load()?)?;
    extractor.extract_from_images(images).await
}
