//! Pattern-based extraction for pages without usable structured data.
//!
//! Each field is filled by an ordered cascade of strategies. A strategy reports
//! how many usable fragments it found; the cascade stops at the first one that
//! clears the configured confidence threshold and otherwise keeps the best
//! result seen.

use super::boilerplate::is_boilerplate;
use super::ParsingContext;
use crate::model::PartialRecipe;
use crate::normalize::{
    clean_fragment, collapse_whitespace, parse_duration_text, parse_ingredient_line,
    parse_servings, split_instruction_text, strip_tags,
};
use crate::trace::{Field, TraceEvent};
use log::debug;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

pub struct HtmlPatternExtractor;

enum Probe {
    /// Text of every outermost element matching the selector
    Items(Selector),
    /// Custom walk over the document
    Scan(fn(&Html) -> Vec<String>),
}

struct Strategy {
    name: &'static str,
    probe: Probe,
    /// Loose strategies guess at structure and need longer step text
    loose: bool,
}

fn items(name: &'static str, selector: &str, loose: bool) -> Strategy {
    Strategy {
        name,
        probe: Probe::Items(Selector::parse(selector).expect("valid strategy selector")),
        loose,
    }
}

fn scan(name: &'static str, walk: fn(&Html) -> Vec<String>) -> Strategy {
    Strategy {
        name,
        probe: Probe::Scan(walk),
        loose: true,
    }
}

static INGREDIENT_STRATEGIES: LazyLock<Vec<Strategy>> = LazyLock::new(|| {
    vec![
        items(
            "itemprop",
            "[itemprop='recipeIngredient'], [itemprop='ingredients']",
            false,
        ),
        items(
            "ingredient-class",
            "li[class*='ingredient'], span[class*='ingredient'], p[class*='ingredient']",
            false,
        ),
        items(
            "wprm",
            ".wprm-recipe-ingredient, .wprm-recipe-ingredients-container li",
            false,
        ),
        items(
            "tasty",
            ".tasty-recipes-ingredients li, .tasty-recipes-ingredients-body li",
            false,
        ),
        items("mediavine", ".mv-create-ingredients li", false),
        items(
            "wpzoom",
            ".wpzoom-recipe-ingredients li, .recipe-card-ingredients li, .ingredients-list li",
            false,
        ),
        items(
            "dotdash",
            ".structured-ingredients__list-item, .mntl-structured-ingredients__list-item",
            false,
        ),
        items(
            "ingredient-container",
            "[class*='ingredient'] li, [id*='ingredient'] li",
            true,
        ),
        scan("ingredient-heading", ingredients_after_heading),
    ]
});

static STEP_STRATEGIES: LazyLock<Vec<Strategy>> = LazyLock::new(|| {
    vec![
        items(
            "itemprop",
            "li[itemprop='recipeInstructions'], p[itemprop='recipeInstructions'], [itemprop='recipeInstructions'] li",
            false,
        ),
        items(
            "instruction-class",
            "li[class*='instruction'], li[class*='direction'], li[class*='step']",
            false,
        ),
        items(
            "wprm",
            ".wprm-recipe-instruction, .wprm-recipe-instruction-text",
            false,
        ),
        items(
            "tasty",
            ".tasty-recipes-instructions li, .tasty-recipes-instructions-body li",
            false,
        ),
        items("mediavine", ".mv-create-instructions li", false),
        items(
            "wpzoom",
            ".wpzoom-recipe-instructions li, .recipe-card-instructions li, .direction-step",
            false,
        ),
        items("dotdash", ".mntl-sc-block-group--LI", false),
        items(
            "instruction-container",
            "[class*='instruction'] li, [class*='direction'] li, [class*='method'] li, \
             [id*='instruction'] li, [id*='direction'] li, [id*='method'] li",
            true,
        ),
        scan("instruction-heading", steps_after_heading),
        scan("numbered-paragraphs", numbered_step_paragraphs),
    ]
});

/// Title candidates from most to least specific
static TITLE_SELECTORS: LazyLock<Vec<(&'static str, Selector)>> = LazyLock::new(|| {
    [
        ("h1-recipe-class", "h1[class*='recipe']"),
        ("h2-recipe-class", "h2[class*='recipe']"),
        (
            "recipe-name-class",
            ".wprm-recipe-name, .tasty-recipes-title, .mv-create-title, .recipe-title, \
             .recipe-name, .recipe-card-title, .wpzoom-recipe-card-title",
        ),
        ("itemprop-name", "h1[itemprop='name'], h2[itemprop='name']"),
        ("og:title", "meta[property='og:title']"),
        ("h1", "h1"),
        ("title", "title"),
    ]
    .into_iter()
    .map(|(name, selector)| (name, Selector::parse(selector).expect("valid title selector")))
    .collect()
});

const IMG_ATTRS: &[&str] = &["src", "data-src", "data-lazy-src", "srcset", "data-srcset"];

/// Image candidates: meta tags first, inline images last
static IMAGE_SELECTORS: LazyLock<Vec<(&'static str, Selector, &'static [&'static str])>> =
    LazyLock::new(|| {
        let candidates: [(&'static str, &str, &'static [&'static str]); 6] = [
            (
                "og:image",
                "meta[property='og:image'], meta[property='og:image:secure_url']",
                &["content"],
            ),
            (
                "twitter:image",
                "meta[name='twitter:image'], meta[property='twitter:image'], meta[name='twitter:image:src']",
                &["content"],
            ),
            ("image_src", "link[rel='image_src']", &["href"]),
            ("itemprop-image", "[itemprop='image']", &["content", "src", "href"]),
            (
                "recipe-image",
                ".wprm-recipe-image img, .tasty-recipes-image img, .mv-create-image img, \
                 .recipe-image img, img[class*='recipe']",
                IMG_ATTRS,
            ),
            (
                "content-image",
                "article img, main img, .entry-content img, .post-content img",
                IMG_ATTRS,
            ),
        ];
        candidates
            .into_iter()
            .map(|(name, selector, attrs)| {
                (
                    name,
                    Selector::parse(selector).expect("valid image selector"),
                    attrs,
                )
            })
            .collect()
    });

static SERVINGS_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        ".wprm-recipe-servings, .tasty-recipes-yield, .mv-create-yield, .recipe-yield, \
         .recipe-servings, .recipe-card-servings, .wpzoom-recipe-servings, [itemprop='recipeYield']",
    )
    .expect("valid servings selector")
});
static PREP_TIME_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        ".wprm-recipe-prep-time, .wprm-recipe-prep_time, .tasty-recipes-prep-time, \
         .mv-create-time-prep, .recipe-prep-time, .prep-time, [itemprop='prepTime']",
    )
    .expect("valid prep time selector")
});
static COOK_TIME_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        ".wprm-recipe-cook-time, .wprm-recipe-cook_time, .tasty-recipes-cook-time, \
         .mv-create-time-active, .recipe-cook-time, .cook-time, [itemprop='cookTime']",
    )
    .expect("valid cook time selector")
});

static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h1, h2, h3, h4, h5, h6, strong, b").expect("valid anchor selector")
});
static BOLD_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("strong, b").expect("valid bold selector"));
static LI_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li").expect("valid li selector"));
static P_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("valid p selector"));

static INGREDIENTS_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bingredients?\b").expect("valid heading regex"));
static STEPS_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:instructions|directions|method|steps|preparation)\b")
        .expect("valid heading regex")
});
static QUANTITY_OR_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\d|[½⅓⅔¼¾⅛]|\b(?:cups?|tbsps?|tsps?|tablespoons?|teaspoons?|oz|ounces?|g|grams?|kg|ml|l|lbs?|pounds?|pinch|cloves?|handful)\b",
    )
    .expect("valid unit regex")
});
static BR_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid br regex"));
static STEP_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*step\s*\d+\s*[:.)\-–]?\s*(.*)$").expect("valid step regex")
});
static TITLE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\|.*$").expect("valid title suffix regex"));
static TITLE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^recipe\s*[-–—:]\s*").expect("valid title prefix regex"));

/// Headings shorter than this are section labels rather than prose
const MAX_ANCHOR_LEN: usize = 40;
/// Untagged ingredient paragraphs longer than this are prose
const MAX_LOOSE_INGREDIENT_LEN: usize = 100;
const MAX_SIBLINGS: usize = 60;

impl HtmlPatternExtractor {
    /// Fill every field of `recipe` that is still absent. Present fields are never touched.
    pub fn fill_missing(&self, context: &ParsingContext, recipe: &mut PartialRecipe) {
        if recipe.title.is_none() {
            recipe.title = self.extract_title(context);
        }

        if recipe.ingredients.is_none() {
            let fragments = self.run_cascade(context, Field::Ingredients);
            recipe.set_ingredients(
                fragments
                    .iter()
                    .map(|fragment| parse_ingredient_line(fragment))
                    .filter(|ingredient| !ingredient.item.is_empty())
                    .collect(),
            );
        }

        if recipe.steps.is_none() {
            let steps = self.run_cascade(context, Field::Steps);
            recipe.set_steps(steps);
        }

        if recipe.image_url.is_none() {
            recipe.image_url = self.extract_image(context);
        }

        if recipe.servings.is_none() {
            recipe.servings = first_value(&context.document, &SERVINGS_SELECTOR)
                .as_deref()
                .and_then(parse_servings)
                .filter(|servings| *servings > 0);
        }
        if recipe.prep_time.is_none() {
            recipe.prep_time = first_value(&context.document, &PREP_TIME_SELECTOR)
                .as_deref()
                .and_then(parse_duration_text);
        }
        if recipe.cook_time.is_none() {
            recipe.cook_time = first_value(&context.document, &COOK_TIME_SELECTOR)
                .as_deref()
                .and_then(parse_duration_text);
        }
    }

    fn run_cascade(&self, context: &ParsingContext, field: Field) -> Vec<String> {
        let thresholds = context.thresholds;
        let (strategies, confidence) = match field {
            Field::Ingredients => (&*INGREDIENT_STRATEGIES, thresholds.ingredient_confidence),
            _ => (&*STEP_STRATEGIES, thresholds.step_confidence),
        };

        let mut best: Option<(&'static str, Vec<String>)> = None;
        for strategy in strategies {
            let min_len = match field {
                Field::Ingredients => thresholds.min_ingredient_len,
                _ if strategy.loose => thresholds.min_loose_step_len,
                _ => thresholds.min_listed_step_len,
            };

            let raw = match &strategy.probe {
                Probe::Items(selector) => outermost_texts(&context.document, selector),
                Probe::Scan(walk) => walk(&context.document),
            };
            let accepted: Vec<String> = raw
                .into_iter()
                .filter(|fragment| {
                    fragment.chars().count() > min_len
                        && !is_boilerplate(fragment, thresholds.max_fragment_len)
                })
                .collect();

            let found = accepted.len();
            context.emit(TraceEvent::StrategyAttempted {
                field,
                strategy: strategy.name,
                found,
            });

            if found > confidence {
                best = Some((strategy.name, accepted));
                break;
            }
            if found > best.as_ref().map_or(0, |(_, items)| items.len()) {
                best = Some((strategy.name, accepted));
            }
        }

        match best {
            Some((strategy, items)) => {
                context.emit(TraceEvent::StrategySucceeded {
                    field,
                    strategy,
                    found: items.len(),
                });
                items
            }
            None => {
                debug!("No {} found by any pattern strategy", field);
                Vec::new()
            }
        }
    }

    fn extract_title(&self, context: &ParsingContext) -> Option<String> {
        TITLE_SELECTORS.iter().find_map(|(name, selector)| {
            let title = context.document.select(selector).find_map(|element| {
                let raw = match element.value().attr("content") {
                    Some(content) => content.to_string(),
                    None => element.inner_html(),
                };
                let title = clean_title(&raw);
                (!title.is_empty()).then_some(title)
            })?;
            context.emit(TraceEvent::StrategySucceeded {
                field: Field::Title,
                strategy: *name,
                found: 1,
            });
            Some(title)
        })
    }

    fn extract_image(&self, context: &ParsingContext) -> Option<String> {
        IMAGE_SELECTORS.iter().find_map(|(name, selector, attrs)| {
            let url = context.document.select(selector).find_map(|element| {
                attrs.iter().find_map(|attr| {
                    let raw = element.value().attr(attr)?;
                    context.resolve_url(&first_srcset_candidate(raw))
                })
            })?;
            context.emit(TraceEvent::StrategySucceeded {
                field: Field::Image,
                strategy: *name,
                found: 1,
            });
            Some(url)
        })
    }
}

/// Length of the text a reader would see, used to spot pages rendered by JavaScript
pub fn visible_text_len(html: &str) -> usize {
    collapse_whitespace(&strip_tags(html)).chars().count()
}

fn clean_title(raw: &str) -> String {
    let title = clean_fragment(raw);
    let title = TITLE_SUFFIX.replace(&title, "");
    TITLE_PREFIX.replace(&title, "").trim().to_string()
}

/// `srcset` values list several candidates; keep the URL of the first
fn first_srcset_candidate(raw: &str) -> String {
    let raw = raw.trim();
    if !raw.contains(',') && !raw.contains(char::is_whitespace) {
        return raw.to_string();
    }
    raw.split(',')
        .next()
        .and_then(|candidate| candidate.split_whitespace().next())
        .unwrap_or_default()
        .to_string()
}

fn first_value(document: &Html, selector: &Selector) -> Option<String> {
    document.select(selector).find_map(|element| {
        let value = element.value();
        let raw = value
            .attr("datetime")
            .or_else(|| value.attr("content"))
            .map(str::to_string)
            .unwrap_or_else(|| clean_fragment(&element.inner_html()));
        (!raw.trim().is_empty()).then_some(raw)
    })
}

/// Cleaned text of matching elements, skipping matches nested inside another match
fn outermost_texts(document: &Html, selector: &Selector) -> Vec<String> {
    document
        .select(selector)
        .filter(|element| {
            !element
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|ancestor| selector.matches(&ancestor))
        })
        .map(|element| clean_fragment(&element.inner_html()))
        .filter(|text| !text.is_empty())
        .collect()
}

fn element_text(element: ElementRef) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn is_heading_tag(element: ElementRef) -> bool {
    matches!(
        element.value().name(),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
    )
}

/// A heading, or a short paragraph that is nothing but bold text
fn is_section_break(element: ElementRef) -> bool {
    if is_heading_tag(element) {
        return true;
    }
    let text = element_text(element);
    if text.is_empty() || text.chars().count() > MAX_ANCHOR_LEN {
        return false;
    }
    element
        .select(&BOLD_SELECTOR)
        .any(|bold| element_text(bold) == text)
}

/// Short headings or bold labels matching `keyword`, as the element to walk from
fn section_anchors<'a>(document: &'a Html, keyword: &Regex) -> Vec<ElementRef<'a>> {
    document
        .select(&ANCHOR_SELECTOR)
        .filter(|element| {
            let text = element_text(*element);
            text.chars().count() <= MAX_ANCHOR_LEN && keyword.is_match(&text)
        })
        .map(|element| {
            let is_bold = matches!(element.value().name(), "strong" | "b");
            let parent = element.parent().and_then(ElementRef::wrap);
            match parent {
                Some(parent) if is_bold => parent,
                // a heading wrapped alone in a div has no siblings of its own
                Some(parent) if element.next_siblings().all(|n| ElementRef::wrap(n).is_none()) => {
                    parent
                }
                _ => element,
            }
        })
        .collect()
}

/// Elements following `anchor` up to the next section heading
fn section_body<'a>(anchor: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    anchor
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .take(MAX_SIBLINGS)
        .take_while(|element| !is_section_break(*element))
}

fn list_items(element: ElementRef) -> Vec<String> {
    element
        .select(&LI_SELECTOR)
        .map(|li| clean_fragment(&li.inner_html()))
        .filter(|text| !text.is_empty())
        .collect()
}

fn ingredients_after_heading(document: &Html) -> Vec<String> {
    section_anchors(document, &INGREDIENTS_HEADING)
        .into_iter()
        .map(|anchor| {
            let mut found = Vec::new();
            for element in section_body(anchor) {
                let listed = list_items(element);
                if !listed.is_empty() {
                    found.extend(listed);
                    continue;
                }
                found.extend(
                    BR_TAG
                        .split(&element.inner_html())
                        .map(clean_fragment)
                        .filter(|line| {
                            line.chars().count() <= MAX_LOOSE_INGREDIENT_LEN
                                && QUANTITY_OR_UNIT.is_match(line)
                        }),
                );
            }
            found
        })
        .find(|found| !found.is_empty())
        .unwrap_or_default()
}

fn steps_after_heading(document: &Html) -> Vec<String> {
    section_anchors(document, &STEPS_HEADING)
        .into_iter()
        .map(|anchor| {
            let mut found = Vec::new();
            for element in section_body(anchor) {
                let listed = list_items(element);
                if listed.is_empty() {
                    found.extend(split_instruction_text(&element.inner_html(), 1));
                } else {
                    found.extend(listed);
                }
            }
            found
        })
        .find(|found| !found.is_empty())
        .unwrap_or_default()
}

/// Paragraphs written as "Step 1: ...", "Step 2: ..."
fn numbered_step_paragraphs(document: &Html) -> Vec<String> {
    document
        .select(&P_SELECTOR)
        .filter_map(|p| {
            let text = clean_fragment(&p.inner_html());
            let caps = STEP_PREFIX.captures(&text)?;
            let step = caps[1].trim().to_string();
            (!step.is_empty()).then_some(step)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThresholdConfig;
    use crate::trace::RecordingObserver;

    fn extract_with(html: &str, observer: &RecordingObserver) -> PartialRecipe {
        let thresholds = ThresholdConfig::default();
        let context =
            ParsingContext::new("https://example.com/blog/cake", html, &thresholds, observer);
        let mut recipe = PartialRecipe::default();
        HtmlPatternExtractor.fill_missing(&context, &mut recipe);
        recipe
    }

    fn extract(html: &str) -> PartialRecipe {
        extract_with(html, &RecordingObserver::default())
    }

    #[test]
    fn test_class_patterns() {
        let html = r#"
            <html><head><title>Sugar Cookies | My Blog</title></head><body>
            <ul>
                <li class="ingredient-item">1 cup sugar</li>
                <li class="ingredient-item">1 cup sugar</li>
                <li class="ingredient-item">1 cup sugar</li>
            </ul>
            <ol>
                <li class="instruction">Preheat oven.</li>
                <li class="instruction">Preheat oven.</li>
            </ol>
            </body></html>
        "#;

        let observer = RecordingObserver::default();
        let recipe = extract_with(html, &observer);
        assert_eq!(recipe.ingredients.unwrap().len(), 3);
        assert_eq!(recipe.steps.unwrap().len(), 2);
        assert_eq!(recipe.title.as_deref(), Some("Sugar Cookies"));
        assert_eq!(
            observer.winning_strategy(Field::Ingredients),
            Some("ingredient-class")
        );
        assert_eq!(
            observer.winning_strategy(Field::Steps),
            Some("instruction-class")
        );
    }

    #[test]
    fn test_wprm_nested_spans_not_duplicated() {
        let html = r#"
            <h2 class="wprm-recipe-name">Brownies</h2>
            <ul class="wprm-recipe-ingredients">
                <li class="wprm-recipe-ingredient"><span class="wprm-recipe-ingredient-amount">200</span>
                    <span class="wprm-recipe-ingredient-unit">g</span>
                    <span class="wprm-recipe-ingredient-name">dark chocolate</span></li>
                <li class="wprm-recipe-ingredient"><span class="wprm-recipe-ingredient-amount">3</span>
                    <span class="wprm-recipe-ingredient-name">eggs</span></li>
            </ul>
        "#;

        let ingredients = extract(html).ingredients.unwrap();
        assert_eq!(ingredients.len(), 2);
        assert_eq!(ingredients[0].amount, "200");
        assert_eq!(ingredients[0].unit, "g");
        assert_eq!(ingredients[0].item, "dark chocolate");
    }

    #[test]
    fn test_boilerplate_and_short_fragments_rejected() {
        let html = r#"
            <ul>
                <li class="ingredient">Advertisement</li>
                <li class="ingredient">2 tbsp olive oil</li>
                <li class="ingredient">ok</li>
                <li class="ingredient">Print Recipe</li>
            </ul>
        "#;
        let ingredients = extract(html).ingredients.unwrap();
        assert_eq!(ingredients.len(), 1);
        assert_eq!(ingredients[0].item, "olive oil");
    }

    #[test]
    fn test_heading_anchored_blog_layout() {
        let html = r#"
            <article>
                <h1>Grandma's Banana Bread</h1>
                <p>This is the best banana bread, my whole family loves it.</p>
                <h3>Ingredients</h3>
                <ul>
                    <li>3 ripe bananas</li>
                    <li>1/3 cup melted butter</li>
                    <li>1 tsp baking soda</li>
                    <li>1 1/2 cups flour</li>
                </ul>
                <p><strong>Instructions</strong></p>
                <p>Mash the bananas in a large bowl.</p>
                <p>Stir in the butter, then the baking soda and flour.</p>
                <h3>More recipes</h3>
                <p>Check out our other loaves and cakes this week.</p>
            </article>
        "#;

        let observer = RecordingObserver::default();
        let recipe = extract_with(html, &observer);
        assert_eq!(recipe.title.as_deref(), Some("Grandma's Banana Bread"));
        assert_eq!(recipe.ingredients.unwrap().len(), 4);
        assert_eq!(
            recipe.steps.unwrap(),
            vec![
                "Mash the bananas in a large bowl.",
                "Stir in the butter, then the baking soda and flour."
            ]
        );
        assert_eq!(
            observer.winning_strategy(Field::Ingredients),
            Some("ingredient-heading")
        );
        assert_eq!(
            observer.winning_strategy(Field::Steps),
            Some("instruction-heading")
        );
    }

    #[test]
    fn test_bold_label_with_br_separated_ingredients() {
        let html = r#"
            <div class="post">
                <p><b>Ingredients:</b></p>
                <p>2 cups rice<br>1 onion, diced<br>A lovely story about my trip to Spain last summer</p>
                <h2>Method</h2>
            </div>
        "#;
        let ingredients = extract(html).ingredients.unwrap();
        assert_eq!(ingredients.len(), 2);
        assert_eq!(ingredients[1].item, "onion, diced");
    }

    #[test]
    fn test_numbered_step_paragraphs() {
        let html = r#"
            <p>Step 1: Bring a large pot of salted water to the boil.</p>
            <p>Step 2 - Cook the spaghetti until just al dente.</p>
            <p>Enjoy!</p>
        "#;

        let observer = RecordingObserver::default();
        let steps = extract_with(html, &observer).steps.unwrap();
        assert_eq!(
            steps,
            vec![
                "Bring a large pot of salted water to the boil.",
                "Cook the spaghetti until just al dente."
            ]
        );
        assert_eq!(
            observer.winning_strategy(Field::Steps),
            Some("numbered-paragraphs")
        );
    }

    #[test]
    fn test_loose_strategies_need_longer_steps() {
        let html = r#"
            <div class="method"><ol><li>Stir well.</li><li>Serve.</li></ol></div>
        "#;
        assert!(extract(html).steps.is_none());
    }

    #[test]
    fn test_title_cleanup() {
        assert_eq!(clean_title("Recipe - Lemon Tart | Bakery"), "Lemon Tart");
        assert_eq!(clean_title("Recipe: Lemon Tart"), "Lemon Tart");
        assert_eq!(clean_title("Lemon &amp; Lime Tart"), "Lemon & Lime Tart");
    }

    #[test]
    fn test_title_prefers_recipe_heading() {
        let html = r#"
            <head><title>Site</title><meta property="og:title" content="OG Title"></head>
            <body><h1>Welcome</h1><h1 class="recipe-title">Lasagne</h1></body>
        "#;
        assert_eq!(extract(html).title.as_deref(), Some("Lasagne"));

        let html = r#"<head><title>Site</title><meta property="og:title" content="OG Title"></head>"#;
        assert_eq!(extract(html).title.as_deref(), Some("OG Title"));
    }

    #[test]
    fn test_image_priority_and_srcset() {
        let html = r#"
            <head><meta name="twitter:image" content="https://cdn.example.com/tw.jpg"></head>
            <body><article><img src="/inline.jpg"></article></body>
        "#;
        assert_eq!(
            extract(html).image_url.as_deref(),
            Some("https://cdn.example.com/tw.jpg")
        );

        let html = r#"
            <article><img src="data:image/gif;base64,R0lGOD"
                srcset="/img/cake-300.jpg 300w, /img/cake-600.jpg 600w"></article>
        "#;
        assert_eq!(
            extract(html).image_url.as_deref(),
            Some("https://example.com/img/cake-300.jpg")
        );
    }

    #[test]
    fn test_servings_and_times_from_classes() {
        let html = r#"
            <span class="wprm-recipe-servings">24 cookies</span>
            <span class="wprm-recipe-prep-time">15 minutes</span>
            <span class="wprm-recipe-cook-time">1 hr 5 mins</span>
        "#;
        let recipe = extract(html);
        assert_eq!(recipe.servings, Some(24));
        assert_eq!(recipe.prep_time, Some(15));
        assert_eq!(recipe.cook_time, Some(65));
    }

    #[test]
    fn test_present_fields_untouched() {
        let html = r#"<h1>Pattern Title</h1><li class="ingredient">1 cup rice</li>"#;
        let thresholds = ThresholdConfig::default();
        let observer = RecordingObserver::default();
        let context = ParsingContext::new("https://example.com", html, &thresholds, &observer);
        let mut recipe = PartialRecipe {
            title: Some("Structured".to_string()),
            ..Default::default()
        };
        HtmlPatternExtractor.fill_missing(&context, &mut recipe);
        assert_eq!(recipe.title.as_deref(), Some("Structured"));
        assert_eq!(recipe.ingredients.unwrap().len(), 1);
    }

    #[test]
    fn test_visible_text_len() {
        let html = "<html><head><script>var big = 'x'.repeat(1000);</script></head>\
                    <body><div id=\"root\"></div> Loading </body></html>";
        assert_eq!(visible_text_len(html), "Loading".len());
    }
}
