use crate::config::ExtractorConfig;
use crate::error::{ExtractError, JS_RENDERED_HINT};
use crate::extractors::{extract_structured, visible_text_len, HtmlPatternExtractor, ParsingContext};
use crate::fetch::{PageFetcher, RequestFetcher};
use crate::model::{Ingredient, PartialRecipe, Recipe, SourceType};
use crate::ocr::{GoogleVisionRecognizer, ImageSource, TextRecognizer};
use crate::providers::{CompletionProvider, ProviderFactory};
use crate::synthesize::synthesize;
use crate::trace::{ExtractionObserver, Field, LogObserver, TraceEvent};
use crate::validate::{check_url, validate};
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;

pub const INGREDIENTS_PLACEHOLDER: &str = "Could not extract ingredients - please add them manually";
pub const STEPS_PLACEHOLDER: &str = "Could not extract instructions - please add them manually";

/// Runs the whole extraction for one input: fetch or OCR, extraction, placeholder
/// fill and validation.
///
/// Collaborators are created from configuration on first use, so a missing OCR
/// key only matters to callers that actually extract from images.
pub struct RecipeExtractor {
    config: ExtractorConfig,
    fetcher: Arc<dyn PageFetcher>,
    observer: Arc<dyn ExtractionObserver>,
    provider: Option<Arc<dyn CompletionProvider>>,
    recognizer: Option<Arc<dyn TextRecognizer>>,
}

impl RecipeExtractor {
    pub fn new(config: ExtractorConfig) -> Result<Self, ExtractError> {
        let fetcher = RequestFetcher::new(
            Some(Duration::from_secs(config.timeout)),
            &config.user_agent,
        )?;
        Ok(Self {
            config,
            fetcher: Arc::new(fetcher),
            observer: Arc::new(LogObserver),
            provider: None,
            recognizer: None,
        })
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ExtractionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_provider(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_recognizer(mut self, recognizer: Arc<dyn TextRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Fetch `url` and extract its recipe
    pub async fn extract_from_url(&self, url: &str) -> Result<Recipe, ExtractError> {
        let url = url.trim();
        check_url(url).map_err(|issue| ExtractError::Validation {
            issues: vec![issue],
        })?;

        info!("Extracting recipe from {}", url);
        let html = self.fetcher.fetch(url).await?;
        self.extract_from_html(&html, url)
    }

    /// Extract a recipe from HTML that was already fetched from `url`
    pub fn extract_from_html(&self, html: &str, url: &str) -> Result<Recipe, ExtractError> {
        let candidate = {
            let context = ParsingContext::new(
                url,
                html,
                &self.config.thresholds,
                self.observer.as_ref(),
            );
            let mut candidate = extract_structured(&context).unwrap_or_default();
            HtmlPatternExtractor.fill_missing(&context, &mut candidate);
            candidate
        };

        if candidate.title.is_none() {
            return Err(self.nothing_found(html, &candidate));
        }

        let mut recipe = Recipe::from_partial(candidate, Some(url.to_string()), SourceType::Url);
        self.fill_placeholders(&mut recipe);
        validate(&recipe).into_result()
    }

    /// Structure free text (OCR output, PDF text) into a recipe
    pub async fn extract_from_text(
        &self,
        text: &str,
        source_type: SourceType,
    ) -> Result<Recipe, ExtractError> {
        if text.trim().is_empty() {
            return Err(ExtractError::InvalidInput("no text to extract from".to_string()));
        }

        let provider = self.provider()?;
        let mut recipe = synthesize(provider.as_ref(), text, source_type, self.observer.as_ref()).await?;
        self.fill_placeholders(&mut recipe);
        validate(&recipe).into_result()
    }

    /// OCR every image in order and extract one recipe from the combined text.
    ///
    /// Pages are recognised one after another; page N's text always follows
    /// page N-1's.
    pub async fn extract_from_images(&self, images: &[ImageSource]) -> Result<Recipe, ExtractError> {
        if images.is_empty() {
            return Err(ExtractError::InvalidInput("no images given".to_string()));
        }

        let recognizer = self.recognizer()?;
        let mut pages = Vec::with_capacity(images.len());
        for (index, image) in images.iter().enumerate() {
            let text = recognizer.recognize(image).await?;
            self.observer.on_event(&TraceEvent::OcrPageProcessed {
                page: index + 1,
                chars: text.chars().count(),
            });
            if !text.trim().is_empty() {
                pages.push(text.trim().to_string());
            }
        }

        if pages.is_empty() {
            return Err(ExtractError::Extraction {
                message: "no text was found in the images".to_string(),
                hint: Some("Try a sharper, well-lit photo of the recipe".to_string()),
            });
        }

        self.extract_from_text(&pages.join("\n\n"), SourceType::Ocr)
            .await
    }

    fn provider(&self) -> Result<Arc<dyn CompletionProvider>, ExtractError> {
        match &self.provider {
            Some(provider) => Ok(Arc::clone(provider)),
            None => ProviderFactory::get_default_provider(&self.config).map(Arc::from),
        }
    }

    fn recognizer(&self) -> Result<Arc<dyn TextRecognizer>, ExtractError> {
        match &self.recognizer {
            Some(recognizer) => Ok(Arc::clone(recognizer)),
            None => {
                let recognizer = GoogleVisionRecognizer::new(
                    &self.config.ocr,
                    Duration::from_secs(self.config.timeout),
                )?;
                Ok(Arc::new(recognizer))
            }
        }
    }

    /// Missing ingredients or steps become explicit filler entries
    fn fill_placeholders(&self, recipe: &mut Recipe) {
        if recipe.ingredients.is_empty() {
            self.observer.on_event(&TraceEvent::PlaceholderUsed {
                field: Field::Ingredients,
            });
            recipe.ingredients = vec![Ingredient::item_only(INGREDIENTS_PLACEHOLDER)];
        }
        if recipe.steps.is_empty() {
            self.observer.on_event(&TraceEvent::PlaceholderUsed {
                field: Field::Steps,
            });
            recipe.steps = vec![STEPS_PLACEHOLDER.to_string()];
        }
    }

    fn nothing_found(&self, html: &str, candidate: &PartialRecipe) -> ExtractError {
        let visible = visible_text_len(html);
        warn!(
            "No recipe title found ({} visible characters, partial: {})",
            visible,
            !candidate.is_empty()
        );
        let hint = (visible < self.config.thresholds.js_text_threshold)
            .then(|| JS_RENDERED_HINT.to_string());
        ExtractError::Extraction {
            message: "no recipe title could be found on the page".to_string(),
            hint,
        }
    }
}
