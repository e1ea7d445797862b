use super::{Extractor, ParsingContext};
use crate::model::PartialRecipe;
use crate::normalize::{
    clean_fragment, parse_duration_text, parse_ingredient_line, parse_servings,
    split_instruction_text,
};
use crate::trace::TraceEvent;
use log::debug;
use scraper::{ElementRef, Selector};
use std::sync::LazyLock;

pub struct MicroDataExtractor;

static ITEMSCOPE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[itemscope]").expect("valid itemscope selector"));
static ITEMPROP: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[itemprop]").expect("valid itemprop selector"));

impl MicroDataExtractor {
    fn find_recipe_container<'a>(&self, document: &'a scraper::Html) -> Option<ElementRef<'a>> {
        document.select(&ITEMSCOPE).find(|element| {
            element.value().attr("itemtype").is_some_and(|itemtype| {
                let itemtype = itemtype.to_ascii_lowercase();
                itemtype.contains("schema.org/recipe")
                    || itemtype.contains("data-vocabulary.org/recipe")
            })
        })
    }

    /// Properties that belong to the recipe itself, not to a nested item such as the author
    fn own_props<'a>(&self, container: ElementRef<'a>, prop: &str) -> Vec<ElementRef<'a>> {
        container
            .select(&ITEMPROP)
            .filter(|el| {
                el.value()
                    .attr("itemprop")
                    .is_some_and(|names| names.split_whitespace().any(|name| name == prop))
            })
            .filter(|el| nearest_scope(*el).is_some_and(|scope| scope.id() == container.id()))
            .collect()
    }

    fn get_itemprop(&self, container: ElementRef, prop: &str) -> Option<String> {
        self.own_props(container, prop)
            .into_iter()
            .map(prop_value)
            .find(|value| !value.trim().is_empty())
    }

    fn get_itemprop_list(&self, container: ElementRef, props: &[&str]) -> Vec<String> {
        props
            .iter()
            .map(|prop| {
                self.own_props(container, prop)
                    .into_iter()
                    .map(prop_value)
                    .filter(|value| !value.trim().is_empty())
                    .collect::<Vec<_>>()
            })
            .find(|values| !values.is_empty())
            .unwrap_or_default()
    }

    fn instructions(&self, container: ElementRef, min_split_len: usize) -> Vec<String> {
        let elements = self.own_props(container, "recipeInstructions");
        match elements.as_slice() {
            [] => Vec::new(),
            // one element usually wraps the whole method
            [single] => split_instruction_text(&single.inner_html(), min_split_len),
            many => many
                .iter()
                .map(|el| clean_fragment(&el.inner_html()))
                .filter(|step| !step.is_empty())
                .collect(),
        }
    }
}

fn nearest_scope(element: ElementRef) -> Option<ElementRef> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().attr("itemscope").is_some())
}

/// Value of an itemprop element, following the microdata attribute rules
fn prop_value(element: ElementRef) -> String {
    let value = element.value();
    let attr = match value.name() {
        "meta" => value.attr("content"),
        "img" | "source" => value.attr("src"),
        "a" | "link" => value.attr("href"),
        "time" => value.attr("datetime"),
        _ => None,
    };
    match attr.or_else(|| value.attr("content")) {
        Some(attr) => attr.trim().to_string(),
        None => element.text().collect::<Vec<_>>().join(" ").trim().to_string(),
    }
}

impl Extractor for MicroDataExtractor {
    fn name(&self) -> &'static str {
        "microdata"
    }

    fn extract(&self, context: &ParsingContext) -> Option<PartialRecipe> {
        debug!("Attempting to extract recipe using MicroData extractor");

        // Itemprops outside a Recipe scope pick up site titles and author bios
        let container = self.find_recipe_container(&context.document)?;
        context.emit(TraceEvent::StructuredRecipeFound {
            source: self.name(),
            block: 0,
        });

        let mut recipe = PartialRecipe::default();

        if let Some(name) = self.get_itemprop(container, "name") {
            recipe.set_title(clean_fragment(&name));
        }

        recipe.image_url = self
            .get_itemprop(container, "image")
            .and_then(|src| context.resolve_url(&src));

        recipe.servings = self
            .get_itemprop(container, "recipeYield")
            .as_deref()
            .and_then(parse_servings);
        recipe.prep_time = self
            .get_itemprop(container, "prepTime")
            .as_deref()
            .and_then(parse_duration_text);
        recipe.cook_time = self
            .get_itemprop(container, "cookTime")
            .as_deref()
            .and_then(parse_duration_text);

        let ingredients = self
            .get_itemprop_list(container, &["recipeIngredient", "ingredients"])
            .iter()
            .map(|line| parse_ingredient_line(line))
            .filter(|ingredient| !ingredient.item.is_empty())
            .collect();
        recipe.set_ingredients(ingredients);

        recipe.set_steps(self.instructions(container, context.thresholds.min_split_step_len));

        Some(recipe)
    }
}
