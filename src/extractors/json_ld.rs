use super::{Extractor, ParsingContext};
use crate::entities;
use crate::model::PartialRecipe;
use crate::normalize::{
    clean_fragment, parse_duration_minutes, parse_ingredient_line, parse_servings,
    split_instruction_text,
};
use crate::trace::TraceEvent;
use log::debug;
use regex::Regex;
use scraper::Selector;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::sync::LazyLock;

pub struct JsonLdExtractor;

static JSON_LD_SCRIPT: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("script[type='application/ld+json']").expect("valid JSON-LD selector")
});
static HTML_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--|-->").expect("valid comment regex"));
static CDATA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:/\*\s*)?(?://\s*)?<!\[CDATA\[|(?://\s*)?\]\]>(?:\s*\*/)?")
        .expect("valid CDATA regex")
});
static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("valid trailing comma regex"));

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JsonLdRecipe {
    #[serde(deserialize_with = "lenient")]
    name: Option<String>,
    image: Option<Value>,
    #[serde(rename = "recipeYield", deserialize_with = "lenient")]
    recipe_yield: Option<RecipeYield>,
    #[serde(rename = "prepTime", deserialize_with = "lenient")]
    prep_time: Option<String>,
    #[serde(rename = "cookTime", deserialize_with = "lenient")]
    cook_time: Option<String>,
    #[serde(rename = "recipeIngredient", deserialize_with = "lenient")]
    recipe_ingredient: Option<RecipeIngredients>,
    // pre-2015 schema.org name for recipeIngredient
    #[serde(deserialize_with = "lenient")]
    ingredients: Option<RecipeIngredients>,
    #[serde(rename = "recipeInstructions")]
    recipe_instructions: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecipeYield {
    Number(f64),
    String(String),
    Array(Vec<Value>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecipeIngredients {
    Single(String),
    Multiple(Vec<IngredientEntry>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IngredientEntry {
    Text(String),
    Object(IngredientObject),
    Other(serde::de::IgnoredAny),
}

#[derive(Debug, Deserialize)]
struct IngredientObject {
    name: String,
    amount: Option<String>,
}

/// Deserialize a field, turning shape mismatches into `None` instead of failing the record
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl JsonLdExtractor {
    fn convert_to_recipe(&self, json_ld_recipe: JsonLdRecipe, context: &ParsingContext) -> PartialRecipe {
        let mut recipe = PartialRecipe::default();

        if let Some(name) = json_ld_recipe.name {
            recipe.set_title(clean_fragment(&name));
        }

        recipe.image_url = json_ld_recipe
            .image
            .as_ref()
            .and_then(image_url)
            .and_then(|url| context.resolve_url(&entities::decode(&url)));

        recipe.servings = json_ld_recipe.recipe_yield.and_then(|yield_val| match yield_val {
            RecipeYield::Number(n) => number_to_servings(n),
            RecipeYield::String(s) => parse_servings(&s),
            RecipeYield::Array(values) => values.first().and_then(|first| match first {
                Value::Number(n) => n.as_f64().and_then(number_to_servings),
                Value::String(s) => parse_servings(s),
                _ => None,
            }),
        });

        recipe.prep_time = json_ld_recipe
            .prep_time
            .as_deref()
            .and_then(parse_duration_minutes);
        recipe.cook_time = json_ld_recipe
            .cook_time
            .as_deref()
            .and_then(parse_duration_minutes);

        let ingredients = match json_ld_recipe
            .recipe_ingredient
            .or(json_ld_recipe.ingredients)
        {
            Some(RecipeIngredients::Single(text)) => text
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(parse_ingredient_line)
                .collect(),
            Some(RecipeIngredients::Multiple(entries)) => entries
                .into_iter()
                .filter_map(|entry| match entry {
                    IngredientEntry::Text(text) => Some(text),
                    IngredientEntry::Object(obj) => {
                        let amount = obj.amount.as_deref().unwrap_or("").trim();
                        if amount.is_empty() {
                            Some(obj.name)
                        } else {
                            Some(format!("{amount} {}", obj.name))
                        }
                    }
                    IngredientEntry::Other(_) => None,
                })
                .filter(|line| !line.trim().is_empty())
                .map(|line| parse_ingredient_line(&line))
                .collect(),
            None => Vec::new(),
        };
        recipe.set_ingredients(
            ingredients
                .into_iter()
                .filter(|ingredient| !ingredient.item.is_empty())
                .collect(),
        );

        if let Some(instructions) = json_ld_recipe.recipe_instructions {
            recipe.set_steps(flatten_instructions(
                &instructions,
                context.thresholds.min_split_step_len,
            ));
        }

        recipe
    }
}

fn number_to_servings(n: f64) -> Option<u32> {
    if n.is_finite() && n >= 0.0 && n <= u32::MAX as f64 {
        Some(n.round() as u32)
    } else {
        None
    }
}

/// Image may be a URL string, an ImageObject or a list of either
fn image_url(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Object(obj) => ["url", "contentUrl", "@id"]
            .iter()
            .find_map(|key| obj.get(*key).and_then(Value::as_str))
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.trim().to_string()),
        Value::Array(items) => items.first().and_then(image_url),
        _ => None,
    }
}

/// Top-level recipeInstructions: a string is split into steps, a list is flattened
fn flatten_instructions(value: &Value, min_split_len: usize) -> Vec<String> {
    let mut steps = Vec::new();
    match value {
        Value::String(text) => steps.extend(split_instruction_text(text, min_split_len)),
        other => flatten_instruction_item(other, &mut steps),
    }
    steps
}

fn flatten_instruction_item(value: &Value, steps: &mut Vec<String>) {
    match value {
        Value::String(text) => push_step(text, steps),
        Value::Array(items) => {
            for item in items {
                flatten_instruction_item(item, steps);
            }
        }
        Value::Object(obj) => {
            // HowToSection and friends group their steps under a nested list
            let nested = ["itemListElement", "steps", "recipeInstructions"]
                .iter()
                .find_map(|key| obj.get(*key).filter(|v| v.is_array() || v.is_object()));
            if let Some(nested) = nested {
                flatten_instruction_item(nested, steps);
                return;
            }

            let text = ["text", "name", "description", "instruction"]
                .iter()
                .find_map(|key| {
                    obj.get(*key)
                        .and_then(Value::as_str)
                        .filter(|s| !s.trim().is_empty())
                });
            if let Some(text) = text {
                push_step(text, steps);
            }
        }
        _ => {}
    }
}

fn push_step(raw: &str, steps: &mut Vec<String>) {
    let step = clean_fragment(raw);
    if !step.is_empty() {
        steps.push(step);
    }
}

fn is_recipe_type(value: &Value) -> bool {
    let is_recipe = |tag: &str| {
        let local = tag.rsplit(|c| c == '/' || c == ':').next().unwrap_or(tag);
        local.trim().eq_ignore_ascii_case("recipe")
    };
    match value.get("@type") {
        Some(Value::String(tag)) => is_recipe(tag),
        Some(Value::Array(tags)) => tags.iter().filter_map(Value::as_str).any(is_recipe),
        _ => false,
    }
}

/// Depth-first search for the first Recipe-typed record
fn find_recipe(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.iter().find_map(find_recipe),
        Value::Object(obj) => {
            if is_recipe_type(value) {
                return Some(value);
            }
            if let Some(recipe) = obj.get("@graph").and_then(find_recipe) {
                return Some(recipe);
            }
            obj.get("itemListElement")
                .and_then(Value::as_array)
                .and_then(|elements| {
                    elements
                        .iter()
                        .filter_map(|element| element.get("item"))
                        .find_map(find_recipe)
                })
        }
        _ => None,
    }
}

/// Strip comment and CDATA wrappers, then drop trailing commas
fn prepare_json(raw: &str) -> String {
    let without_comments = HTML_COMMENT.replace_all(raw, "");
    let without_cdata = CDATA.replace_all(&without_comments, "");
    remove_trailing_commas(without_cdata.trim())
}

fn remove_trailing_commas(json: &str) -> String {
    TRAILING_COMMA.replace_all(json, "$1").into_owned()
}

/// Parse one JSON-LD block, trying progressively more aggressive repairs
fn parse_block(raw: &str) -> Result<Value, serde_json::Error> {
    let prepared = prepare_json(raw);
    let first_error = match serde_json::from_str::<Value>(&prepared) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    let unescaped = remove_trailing_commas(&entities::decode(&prepared));
    if let Ok(value) = serde_json::from_str::<Value>(&unescaped) {
        debug!("JSON-LD parsed after unescaping entities");
        return Ok(value);
    }

    serde_json::from_str::<Value>(&insert_missing_commas(&prepared)).map_err(|_| first_error)
}

/// Insert commas authors forgot between adjacent values and collapse doubled ones
fn insert_missing_commas(json_str: &str) -> String {
    let mut repaired = String::with_capacity(json_str.len());
    let mut in_string = false;
    let mut prev_char = None;
    let mut depth = 0;
    let chars: Vec<char> = json_str.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        match c {
            '"' if prev_char != Some('\\') => {
                in_string = !in_string;
                if !in_string {
                    let next_char = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                    if matches!(next_char, Some('"' | '[' | '{')) {
                        repaired.push('"');
                        repaired.push(',');
                        prev_char = Some(',');
                        continue;
                    }
                }
                repaired.push(c);
            }
            '[' | '{' if !in_string => {
                depth += 1;
                repaired.push(c);
            }
            ']' | '}' if !in_string => {
                depth -= 1;
                repaired.push(c);
                let next_char = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                if depth > 0 && matches!(next_char, Some('"' | '{' | '[')) {
                    repaired.push(',');
                    prev_char = Some(',');
                    continue;
                }
            }
            ',' if !in_string => {
                if prev_char != Some(',') {
                    repaired.push(c);
                }
            }
            _ => {
                if in_string || !c.is_whitespace() {
                    repaired.push(c);
                }
            }
        }
        prev_char = Some(c);
    }

    remove_trailing_commas(&repaired)
}

impl Extractor for JsonLdExtractor {
    fn name(&self) -> &'static str {
        "json-ld"
    }

    fn extract(&self, context: &ParsingContext) -> Option<PartialRecipe> {
        let scripts: Vec<_> = context.document.select(&JSON_LD_SCRIPT).collect();
        debug!("JsonLdExtractor: Found {} JSON-LD script tags", scripts.len());

        for (index, script) in scripts.iter().enumerate() {
            let raw_json = script.text().collect::<String>();

            let json_ld = match parse_block(&raw_json) {
                Ok(value) => value,
                Err(e) => {
                    context.emit(TraceEvent::StructuredBlockSkipped {
                        index,
                        reason: format!("invalid JSON: {e}"),
                    });
                    continue;
                }
            };

            let Some(recipe_json) = find_recipe(&json_ld) else {
                context.emit(TraceEvent::StructuredBlockSkipped {
                    index,
                    reason: "no Recipe record".to_string(),
                });
                continue;
            };

            context.emit(TraceEvent::StructuredRecipeFound {
                source: self.name(),
                block: index,
            });
            let json_ld_recipe = JsonLdRecipe::deserialize(recipe_json).unwrap_or_else(|e| {
                debug!("JsonLdExtractor: Recipe record has unexpected shape: {}", e);
                JsonLdRecipe::default()
            });
            return Some(self.convert_to_recipe(json_ld_recipe, context));
        }

        None
    }
}
