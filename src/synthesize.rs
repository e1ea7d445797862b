//! Structures free-form OCR text into a recipe with the help of a completion provider.

use crate::error::ExtractError;
use crate::model::{generate_recipe_id, Ingredient, Recipe, SourceType};
use crate::model::{DEFAULT_COOK_TIME, DEFAULT_PREP_TIME, DEFAULT_SERVINGS};
use crate::normalize::{clean_fragment, parse_duration_text, parse_ingredient_line, parse_servings};
use crate::providers::{CompletionProvider, RECIPE_STRUCTURING_PROMPT};
use crate::trace::{ExtractionObserver, TraceEvent};
use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;

/// First step of a recipe whose text could not be structured
pub const RAW_TEXT_HEADER: &str = "Original text from image:";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SynthesizedRecipe {
    title: Option<Value>,
    servings: Option<Value>,
    #[serde(alias = "prepTime")]
    prep_time: Option<Value>,
    #[serde(alias = "cookTime")]
    cook_time: Option<Value>,
    ingredients: Option<Value>,
    #[serde(alias = "instructions")]
    steps: Option<Value>,
}

/// Ask `provider` to structure `raw_text` and normalise whatever comes back.
///
/// A reply that holds no JSON object is not an error: the raw text is kept as
/// the recipe's steps so nothing the user photographed is lost. Provider
/// failures are returned unchanged.
pub async fn synthesize(
    provider: &dyn CompletionProvider,
    raw_text: &str,
    source_type: SourceType,
    observer: &dyn ExtractionObserver,
) -> Result<Recipe, ExtractError> {
    info!(
        "Structuring {} characters of text with {}",
        raw_text.chars().count(),
        provider.provider_name()
    );
    let reply = provider
        .complete(RECIPE_STRUCTURING_PROMPT, raw_text)
        .await?;
    debug!("Completion reply: {}", reply);

    Ok(recipe_from_reply(&reply, raw_text, source_type, observer))
}

/// Build a recipe from a completion reply, falling back to the raw text
pub fn recipe_from_reply(
    reply: &str,
    raw_text: &str,
    source_type: SourceType,
    observer: &dyn ExtractionObserver,
) -> Recipe {
    match parse_reply(reply) {
        Ok(parsed) => normalize_reply(parsed, source_type),
        Err(reason) => {
            observer.on_event(&TraceEvent::SynthesisFallback { reason });
            raw_text_recipe(raw_text, source_type)
        }
    }
}

fn parse_reply(reply: &str) -> Result<SynthesizedRecipe, String> {
    let json = extract_json_object(reply).ok_or_else(|| "no JSON object in reply".to_string())?;
    serde_json::from_value(json).map_err(|e| format!("unexpected reply shape: {e}"))
}

/// The reply itself when it is a JSON object, else the outermost `{...}` inside it
fn extract_json_object(reply: &str) -> Option<Value> {
    let reply = reply.trim();
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(reply) {
        return Some(value);
    }

    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&reply[start..=end]) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

fn normalize_reply(parsed: SynthesizedRecipe, source_type: SourceType) -> Recipe {
    let title = parsed
        .title
        .as_ref()
        .and_then(value_text)
        .map(|title| clean_fragment(&title))
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| fallback_title(source_type).to_string());

    let ingredients = as_list(parsed.ingredients)
        .iter()
        .filter_map(ingredient_from_value)
        .collect();

    let steps = as_list(parsed.steps)
        .iter()
        .filter_map(|value| match value {
            Value::Object(obj) => ["text", "step", "instruction"]
                .iter()
                .find_map(|key| obj.get(*key).and_then(value_text)),
            other => value_text(other),
        })
        .map(|step| clean_fragment(&step))
        .filter(|step| !step.is_empty())
        .collect();

    Recipe {
        url: None,
        recipe_id: generate_recipe_id(source_type),
        title,
        servings: parsed
            .servings
            .as_ref()
            .and_then(|v| number_field(v, parse_servings))
            .filter(|servings| *servings > 0)
            .unwrap_or(DEFAULT_SERVINGS),
        prep_time: parsed
            .prep_time
            .as_ref()
            .and_then(|v| number_field(v, parse_duration_text))
            .unwrap_or(DEFAULT_PREP_TIME),
        cook_time: parsed
            .cook_time
            .as_ref()
            .and_then(|v| number_field(v, parse_duration_text))
            .unwrap_or(DEFAULT_COOK_TIME),
        ingredients,
        steps,
        image_url: None,
        source_type,
    }
}

/// The minimal recipe kept when the reply could not be understood
fn raw_text_recipe(raw_text: &str, source_type: SourceType) -> Recipe {
    Recipe {
        url: None,
        recipe_id: generate_recipe_id(source_type),
        title: fallback_title(source_type).to_string(),
        servings: DEFAULT_SERVINGS,
        prep_time: DEFAULT_PREP_TIME,
        cook_time: DEFAULT_COOK_TIME,
        ingredients: Vec::new(),
        steps: vec![RAW_TEXT_HEADER.to_string(), raw_text.trim().to_string()],
        image_url: None,
        source_type,
    }
}

fn fallback_title(source_type: SourceType) -> &'static str {
    match source_type {
        SourceType::Pdf => "Recipe from PDF",
        _ => "Recipe from photo",
    }
}

fn as_list(value: Option<Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items,
        Some(Value::String(text)) => text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| Value::String(line.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Numbers are taken as is; strings go through `parse`
fn number_field(value: &Value, parse: fn(&str) -> Option<u32>) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => parse(s),
        _ => None,
    }
}

fn ingredient_from_value(value: &Value) -> Option<Ingredient> {
    let ingredient = match value {
        Value::String(line) => parse_ingredient_line(line),
        Value::Object(obj) => {
            let field = |keys: &[&str]| {
                keys.iter()
                    .find_map(|key| obj.get(*key).and_then(value_text))
                    .map(|text| clean_fragment(&text))
                    .unwrap_or_default()
            };
            let item = field(&["item", "name", "ingredient"]);
            let amount = field(&["amount", "quantity"]);
            let unit = field(&["unit"]);
            // a bare line in "item" still carries its own quantity
            if amount.is_empty() && unit.is_empty() {
                parse_ingredient_line(&item)
            } else {
                Ingredient { amount, unit, item }
            }
        }
        _ => return None,
    };
    (!ingredient.item.is_empty()).then_some(ingredient)
}
