//! Structured trace events emitted while a recipe is being extracted.
//!
//! The pipeline reports every strategy it tries through an [`ExtractionObserver`],
//! so callers (and tests) can see which strategy produced a field without
//! scraping log output.

use log::{debug, info, warn};
use std::fmt;
use std::sync::{Arc, Mutex};

/// Recipe field a strategy was trying to fill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Ingredients,
    Steps,
    Image,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Title => "title",
            Field::Ingredients => "ingredients",
            Field::Steps => "steps",
            Field::Image => "image",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent {
    /// A structured-data block could not be used
    StructuredBlockSkipped { index: usize, reason: String },
    /// A Recipe record was found in structured data
    StructuredRecipeFound { source: &'static str, block: usize },
    /// A pattern strategy ran and found `found` usable items
    StrategyAttempted {
        field: Field,
        strategy: &'static str,
        found: usize,
    },
    /// The strategy whose result was kept for `field`
    StrategySucceeded {
        field: Field,
        strategy: &'static str,
        found: usize,
    },
    /// Nothing was found for `field`; a placeholder was used
    PlaceholderUsed { field: Field },
    /// One image of a batch went through OCR
    OcrPageProcessed { page: usize, chars: usize },
    /// The completion output could not be parsed; raw text was kept instead
    SynthesisFallback { reason: String },
}

/// Receives trace events. Implementations must be cheap; they run inline.
pub trait ExtractionObserver: Send + Sync {
    fn on_event(&self, event: &TraceEvent);
}

/// Default observer, forwards events to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl ExtractionObserver for LogObserver {
    fn on_event(&self, event: &TraceEvent) {
        match event {
            TraceEvent::StructuredBlockSkipped { index, reason } => {
                debug!("Structured data block {} skipped: {}", index, reason)
            }
            TraceEvent::StructuredRecipeFound { source, block } => {
                info!("Recipe found in {} block {}", source, block)
            }
            TraceEvent::StrategyAttempted {
                field,
                strategy,
                found,
            } => debug!("{}: strategy '{}' found {}", field, strategy, found),
            TraceEvent::StrategySucceeded {
                field,
                strategy,
                found,
            } => info!("{}: using strategy '{}' ({} found)", field, strategy, found),
            TraceEvent::PlaceholderUsed { field } => {
                warn!("No {} could be extracted, using placeholder", field)
            }
            TraceEvent::OcrPageProcessed { page, chars } => {
                debug!("OCR page {}: {} characters", page, chars)
            }
            TraceEvent::SynthesisFallback { reason } => {
                warn!("Could not structure text, keeping raw text: {}", reason)
            }
        }
    }
}

/// Collects every event, for tests and diagnostics
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<TraceEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<TraceEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Name of the strategy that satisfied `field`, if any
    pub fn winning_strategy(&self, field: Field) -> Option<&'static str> {
        self.events().into_iter().find_map(|event| match event {
            TraceEvent::StrategySucceeded {
                field: f, strategy, ..
            } if f == field => Some(strategy),
            _ => None,
        })
    }
}

impl ExtractionObserver for RecordingObserver {
    fn on_event(&self, event: &TraceEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
