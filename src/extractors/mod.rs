use crate::config::ThresholdConfig;
use crate::model::PartialRecipe;
use crate::trace::{ExtractionObserver, TraceEvent};
use scraper::Html;
use url::Url;

pub mod boilerplate;
mod html_pattern;
mod json_ld;
mod microdata;

pub use html_pattern::{visible_text_len, HtmlPatternExtractor};
pub use json_ld::JsonLdExtractor;
pub use microdata::MicroDataExtractor;

/// Everything an extractor may look at for one page
pub struct ParsingContext<'a> {
    pub url: &'a str,
    pub html: &'a str,
    pub document: Html,
    pub thresholds: &'a ThresholdConfig,
    pub observer: &'a dyn ExtractionObserver,
}

impl<'a> ParsingContext<'a> {
    pub fn new(
        url: &'a str,
        html: &'a str,
        thresholds: &'a ThresholdConfig,
        observer: &'a dyn ExtractionObserver,
    ) -> Self {
        ParsingContext {
            url,
            html,
            document: Html::parse_document(html),
            thresholds,
            observer,
        }
    }

    pub(crate) fn emit(&self, event: TraceEvent) {
        self.observer.on_event(&event);
    }

    /// Resolve a possibly relative URL against the page URL
    pub(crate) fn resolve_url(&self, raw: &str) -> Option<String> {
        resolve_url(self.url, raw)
    }
}

pub trait Extractor {
    /// Short name used in trace events
    fn name(&self) -> &'static str;

    /// Extract whatever recipe fields this strategy can see. `None` means the
    /// strategy found no recipe at all on the page.
    fn extract(&self, context: &ParsingContext) -> Option<PartialRecipe>;
}

/// Structured data first (JSON-LD, then microdata). Returns `None` when the page
/// carries no Recipe record in either form.
pub fn extract_structured(context: &ParsingContext) -> Option<PartialRecipe> {
    let extractors: [&dyn Extractor; 2] = [&JsonLdExtractor, &MicroDataExtractor];
    extractors
        .iter()
        .find_map(|extractor| extractor.extract(context))
}

pub(crate) fn resolve_url(base: &str, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with("data:") {
        return None;
    }
    if raw.starts_with("http://") || raw.starts_with("https://") {
        return Some(raw.to_string());
    }
    let base = Url::parse(base).ok()?;
    base.join(raw).ok().map(|u| u.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        let base = "https://example.com/recipes/pie";
        assert_eq!(
            resolve_url(base, "/img/pie.jpg").as_deref(),
            Some("https://example.com/img/pie.jpg")
        );
        assert_eq!(
            resolve_url(base, "//cdn.example.com/pie.jpg").as_deref(),
            Some("https://cdn.example.com/pie.jpg")
        );
        assert_eq!(
            resolve_url(base, "https://other.com/a.png").as_deref(),
            Some("https://other.com/a.png")
        );
        assert_eq!(resolve_url(base, "data:image/gif;base64,R0lG"), None);
        assert_eq!(resolve_url("not a url", "/img/pie.jpg"), None);
    }
}
