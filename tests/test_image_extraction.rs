use async_trait::async_trait;
use recipe_extract::config::{OcrConfig, ProviderConfig};
use recipe_extract::ocr::TextRecognizer;
use recipe_extract::providers::CompletionProvider;
use recipe_extract::synthesize::RAW_TEXT_HEADER;
use recipe_extract::trace::RecordingObserver;
use recipe_extract::{
    ExtractError, ExtractorConfig, ImageSource, RecipeExtractor, SourceType, TraceEvent,
};
use std::collections::HashMap;
use std::env;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Returns a canned reply and remembers the text it was asked to structure
struct ScriptedProvider {
    reply: String,
    seen: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _system_prompt: &str, user_text: &str) -> Result<String, ExtractError> {
        self.seen.lock().unwrap().push(user_text.to_string());
        Ok(self.reply.clone())
    }
}

/// Recognises `ImageSource::Base64(text)` as `text`, slower for earlier pages
struct EchoRecognizer;

#[async_trait]
impl TextRecognizer for EchoRecognizer {
    async fn recognize(&self, image: &ImageSource) -> Result<String, ExtractError> {
        match image {
            ImageSource::Base64(text) => {
                let delay = 30u64.saturating_sub(text.len() as u64);
                tokio::time::sleep(Duration::from_millis(delay)).await;
                Ok(text.clone())
            }
            _ => Err(ExtractError::InvalidInput("unsupported image".to_string())),
        }
    }
}

fn config_without_keys() -> ExtractorConfig {
    let mut providers = HashMap::new();
    providers.insert(
        "openai".to_string(),
        ProviderConfig {
            enabled: true,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            max_tokens: 2000,
            api_key: Some("your-api-key-here".to_string()),
            base_url: None,
        },
    );
    ExtractorConfig {
        providers,
        ocr: OcrConfig {
            api_key: Some(String::new()),
            base_url: None,
        },
        ..Default::default()
    }
}

#[tokio::test]
async fn test_pages_are_combined_in_order() {
    let provider = ScriptedProvider::new(
        r#"{"title": "Bread", "servings": 1, "ingredients": ["500 g flour", "1 tsp yeast"], "steps": ["Knead", "Bake for 40 minutes"]}"#,
    );
    let observer = RecordingObserver::new();
    let extractor = RecipeExtractor::new(ExtractorConfig::default())
        .unwrap()
        .with_provider(provider.clone())
        .with_recognizer(Arc::new(EchoRecognizer))
        .with_observer(observer.clone());

    let images = vec![
        ImageSource::Base64("page one".to_string()),
        ImageSource::Base64("page two, a bit longer".to_string()),
        ImageSource::Base64("page three, the longest of them all".to_string()),
    ];
    let recipe = extractor.extract_from_images(&images).await.unwrap();

    assert_eq!(
        provider.seen(),
        vec!["page one\n\npage two, a bit longer\n\npage three, the longest of them all"]
    );
    assert_eq!(recipe.title, "Bread");
    assert_eq!(recipe.servings, 1);
    assert_eq!(recipe.ingredients.len(), 2);
    assert_eq!(recipe.source_type, SourceType::Ocr);
    assert!(recipe.recipe_id.starts_with("ocr_"));
    assert_eq!(recipe.url, None);

    let pages: Vec<usize> = observer
        .events()
        .into_iter()
        .filter_map(|event| match event {
            TraceEvent::OcrPageProcessed { page, .. } => Some(page),
            _ => None,
        })
        .collect();
    assert_eq!(pages, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_unstructured_reply_keeps_text() {
    let provider = ScriptedProvider::new("Sorry, I can't help with that.");
    let observer = RecordingObserver::new();
    let extractor = RecipeExtractor::new(ExtractorConfig::default())
        .unwrap()
        .with_provider(provider)
        .with_observer(observer.clone());

    let recipe = extractor
        .extract_from_text("Grandma's soup\nboil water, add love", SourceType::Ocr)
        .await
        .unwrap();

    assert_eq!(recipe.steps[0], RAW_TEXT_HEADER);
    assert!(recipe.steps[1].contains("add love"));
    // no ingredients in a raw fallback, so the placeholder fills in
    assert_eq!(recipe.ingredients.len(), 1);
    assert!(observer
        .events()
        .iter()
        .any(|e| matches!(e, TraceEvent::SynthesisFallback { .. })));
}

#[tokio::test]
async fn test_pdf_text_source() {
    let provider = ScriptedProvider::new(r#"{"ingredients": ["2 apples"], "steps": ["Slice the apples"]}"#);
    let extractor = RecipeExtractor::new(ExtractorConfig::default())
        .unwrap()
        .with_provider(provider);

    let recipe = extractor
        .extract_from_text("Apple slices\n2 apples\nSlice the apples", SourceType::Pdf)
        .await
        .unwrap();

    assert_eq!(recipe.source_type, SourceType::Pdf);
    assert_eq!(recipe.title, "Recipe from PDF");
    assert!(recipe.recipe_id.starts_with("pdf_"));
}

#[tokio::test]
async fn test_blank_images_are_an_extraction_error() {
    let extractor = RecipeExtractor::new(ExtractorConfig::default())
        .unwrap()
        .with_provider(ScriptedProvider::new("{}"))
        .with_recognizer(Arc::new(EchoRecognizer));

    let err = extractor
        .extract_from_images(&[ImageSource::Base64("   ".to_string())])
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::Extraction { .. }));
}

#[tokio::test]
async fn test_missing_ocr_key_fails_fast() {
    env::remove_var("GOOGLE_API_KEY");
    let extractor = RecipeExtractor::new(config_without_keys()).unwrap();

    let err = extractor
        .extract_from_images(&[ImageSource::Base64("aGVsbG8=".to_string())])
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::MissingCredentials { .. }));
}

#[tokio::test]
async fn test_placeholder_provider_key_fails_fast() {
    env::remove_var("OPENAI_API_KEY");
    let extractor = RecipeExtractor::new(config_without_keys()).unwrap();

    let err = extractor
        .extract_from_text("1 egg\nfry it", SourceType::Ocr)
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::MissingCredentials { .. }));
}
