use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVINGS: u32 = 4;
pub const DEFAULT_PREP_TIME: u32 = 15;
pub const DEFAULT_COOK_TIME: u32 = 30;

/// Where a recipe came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    Url,
    Ocr,
    Pdf,
}

impl SourceType {
    /// Prefix used for generated recipe ids
    fn id_prefix(self) -> &'static str {
        match self {
            SourceType::Url => "url",
            SourceType::Ocr => "ocr",
            SourceType::Pdf => "pdf",
        }
    }
}

/// One ingredient line split into its parts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Ingredient {
    pub amount: String,
    pub unit: String,
    pub item: String,
}

impl Ingredient {
    pub fn item_only(item: impl Into<String>) -> Self {
        Ingredient {
            amount: String::new(),
            unit: String::new(),
            item: item.into(),
        }
    }
}

/// A normalized recipe record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub recipe_id: String,
    pub title: String,
    pub servings: u32,
    pub prep_time: u32,
    pub cook_time: u32,
    pub ingredients: Vec<Ingredient>,
    pub steps: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub source_type: SourceType,
}

impl Recipe {
    /// Build a recipe from a candidate, applying defaults for anything still missing.
    ///
    /// Missing ingredients or steps stay empty here; the pipeline decides whether to
    /// fill them with placeholders.
    pub fn from_partial(partial: PartialRecipe, url: Option<String>, source_type: SourceType) -> Self {
        let recipe_id = match (&url, source_type) {
            (Some(u), SourceType::Url) => u.clone(),
            _ => generate_recipe_id(source_type),
        };

        Recipe {
            url,
            recipe_id,
            title: partial.title.unwrap_or_default(),
            servings: partial.servings.filter(|s| *s > 0).unwrap_or(DEFAULT_SERVINGS),
            prep_time: partial.prep_time.unwrap_or(DEFAULT_PREP_TIME),
            cook_time: partial.cook_time.unwrap_or(DEFAULT_COOK_TIME),
            ingredients: partial.ingredients.unwrap_or_default(),
            steps: partial.steps.unwrap_or_default(),
            image_url: partial.image_url,
            source_type,
        }
    }
}

/// A candidate recipe being filled by successive extraction strategies.
///
/// `None` means "not found yet"; an empty `Vec` is never stored, so a field that
/// is `Some` always carries data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialRecipe {
    pub title: Option<String>,
    pub servings: Option<u32>,
    pub prep_time: Option<u32>,
    pub cook_time: Option<u32>,
    pub ingredients: Option<Vec<Ingredient>>,
    pub steps: Option<Vec<String>>,
    pub image_url: Option<String>,
}

impl PartialRecipe {
    /// Fill every field that is still absent from `other`, leaving present fields untouched
    pub fn merge_missing(&mut self, other: PartialRecipe) {
        fill(&mut self.title, other.title);
        fill(&mut self.servings, other.servings);
        fill(&mut self.prep_time, other.prep_time);
        fill(&mut self.cook_time, other.cook_time);
        fill(&mut self.ingredients, other.ingredients);
        fill(&mut self.steps, other.steps);
        fill(&mut self.image_url, other.image_url);
    }

    /// True when no field at all has been found
    pub fn is_empty(&self) -> bool {
        *self == PartialRecipe::default()
    }

    pub(crate) fn set_ingredients(&mut self, ingredients: Vec<Ingredient>) {
        if !ingredients.is_empty() {
            self.ingredients = Some(ingredients);
        }
    }

    pub(crate) fn set_steps(&mut self, steps: Vec<String>) {
        if !steps.is_empty() {
            self.steps = Some(steps);
        }
    }

    pub(crate) fn set_title(&mut self, title: String) {
        let title = title.trim();
        if !title.is_empty() {
            self.title = Some(title.to_string());
        }
    }
}

fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}

/// Generate a unique id such as `ocr_1718000000000_k3j9x2a1`
pub fn generate_recipe_id(source_type: SourceType) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect();
    format!(
        "{}_{}_{}",
        source_type.id_prefix(),
        chrono::Utc::now().timestamp_millis(),
        suffix
    )
}
