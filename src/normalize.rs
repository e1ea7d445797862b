//! Turns raw ingredient and instruction text into recipe data.
//!
//! Everything here is heuristic: the ingredient parser will sometimes take the
//! first word of an item for a unit ("2 large eggs" gives unit `large`). Callers
//! only rely on `item` being non-empty.

use crate::entities;
use crate::model::Ingredient;
use regex::Regex;
use std::sync::LazyLock;

const FRACTIONS: &str = "½⅓⅔¼¾⅕⅖⅗⅘⅙⅚⅐⅛⅜⅝⅞⅑⅒";

/// A single quantity: mixed number, fraction, decimal, unicode fraction
fn quantity_pattern() -> String {
    let base = format!(
        r"(?:\d+\s*[{f}]|\d+\s+\d+/\d+|\d+/\d+|\d+(?:[.,]\d+)?|[{f}])",
        f = FRACTIONS
    );
    format!(r"{base}(?:\s*(?:-|–|to)\s*{base})?")
}

static PRIMARY_INGREDIENT: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        r"^(?P<amount>{qty}(?:\s*\([^)]*\))?)\s*(?P<unit>[A-Za-z]+\.?(?:\s+(?:oz|ounces?|cups?|tablespoons?|teaspoons?|tbsp|tsp|pounds?|lbs?)\b\.?)?)\s+(?P<item>.+)$",
        qty = quantity_pattern()
    );
    Regex::new(&pattern).expect("valid ingredient regex")
});

static LOOSE_INGREDIENT: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(r"^(?P<amount>{qty})\s*(?P<item>[^\d/\-–].*)$", qty = quantity_pattern());
    Regex::new(&pattern).expect("valid loose ingredient regex")
});

static SCRIPT_OR_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>|<!--.*?-->")
        .expect("valid script regex")
});
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[A-Za-z/!?][^>]*>").expect("valid tag regex"));
static LINE_BREAK_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</p\s*>|</li\s*>|</div\s*>").expect("valid line break regex")
});
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static STEP_NUMBERING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)\d{1,2}[.)]\s+").expect("valid numbering regex"));
static DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:\d+(?:\.\d+)?S)?)?$")
        .expect("valid duration regex")
});
static HOURS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*(?:hours?|hrs?|h)(?:[^a-z]|$)").expect("valid hours regex")
});
static MINUTES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*(?:minutes?|mins?|m)(?:[^a-z]|$)").expect("valid minutes regex")
});
static FIRST_INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid digit regex"));

/// Remove `<script>`/`<style>` blocks, comments and every tag. Whitespace is left as is.
pub fn strip_tags(html: &str) -> String {
    let without_scripts = SCRIPT_OR_STYLE.replace_all(html, " ");
    TAG.replace_all(&without_scripts, " ").into_owned()
}

/// Collapse runs of whitespace into single spaces and trim
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Decode entities, drop markup and normalise whitespace
pub fn clean_fragment(raw: &str) -> String {
    collapse_whitespace(&strip_tags(&entities::decode(raw)))
}

/// Split one ingredient line into amount, unit and item.
///
/// ```
/// use recipe_extract::normalize::parse_ingredient_line;
///
/// let parsed = parse_ingredient_line("2 cups flour");
/// assert_eq!(parsed.amount, "2");
/// assert_eq!(parsed.unit, "cups");
/// assert_eq!(parsed.item, "flour");
/// ```
pub fn parse_ingredient_line(text: &str) -> Ingredient {
    let line = clean_fragment(text);

    if let Some(caps) = PRIMARY_INGREDIENT.captures(&line) {
        return Ingredient {
            amount: collapse_whitespace(&caps["amount"]),
            unit: caps["unit"].trim().to_string(),
            item: caps["item"].trim().to_string(),
        };
    }

    if let Some(caps) = LOOSE_INGREDIENT.captures(&line) {
        let item = caps["item"].trim();
        if !item.is_empty() {
            return Ingredient {
                amount: collapse_whitespace(&caps["amount"]),
                unit: String::new(),
                item: item.to_string(),
            };
        }
    }

    Ingredient::item_only(line)
}

/// Split a single block of instruction text into steps.
///
/// Splits on line breaks and on leading `N.` numbering, drops fragments shorter
/// than `min_len`. When nothing survives the filter the whole text is kept as one
/// step so that short but real instructions are never lost.
pub fn split_instruction_text(raw: &str, min_len: usize) -> Vec<String> {
    let decoded = entities::decode(raw);
    let with_breaks = LINE_BREAK_TAG.replace_all(&decoded, "\n");
    let text = strip_tags(&with_breaks);

    let steps: Vec<String> = text
        .lines()
        .flat_map(|line| STEP_NUMBERING.split(line).map(str::to_string).collect::<Vec<_>>())
        .map(|fragment| collapse_whitespace(&fragment))
        .filter(|fragment| fragment.chars().count() >= min_len)
        .collect();

    if !steps.is_empty() {
        return steps;
    }

    let whole = collapse_whitespace(&text);
    if whole.is_empty() {
        Vec::new()
    } else {
        vec![whole]
    }
}

/// Parse an ISO 8601 duration such as `PT1H30M` into whole minutes.
///
/// Returns `None` when neither an hour nor a minute (nor day) group is present.
pub fn parse_duration_minutes(duration: &str) -> Option<u32> {
    let caps = DURATION.captures(duration.trim())?;
    let group = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

    let (days, hours, minutes) = (group(1), group(2), group(3));
    if days.is_none() && hours.is_none() && minutes.is_none() {
        return None;
    }

    let total = days
        .unwrap_or(0)
        .saturating_mul(24 * 60)
        .saturating_add(hours.unwrap_or(0).saturating_mul(60))
        .saturating_add(minutes.unwrap_or(0));
    Some(total)
}

/// Parse a duration written either as ISO 8601 or for humans ("1 hr 20 mins").
pub fn parse_duration_text(text: &str) -> Option<u32> {
    if let Some(minutes) = parse_duration_minutes(text) {
        return Some(minutes);
    }
    let number = |re: &Regex| {
        re.captures(text)
            .and_then(|caps| caps[1].parse::<u32>().ok())
    };
    match (number(&HOURS), number(&MINUTES)) {
        (None, None) => None,
        (hours, minutes) => Some(
            hours
                .unwrap_or(0)
                .saturating_mul(60)
                .saturating_add(minutes.unwrap_or(0)),
        ),
    }
}

/// First integer found in free text such as "Serves 4" or "4-6 servings"
pub fn parse_servings(text: &str) -> Option<u32> {
    FIRST_INTEGER
        .find(text)
        .and_then(|m| m.as_str().parse::<u32>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(line: &str) -> (String, String, String) {
        let ing = parse_ingredient_line(line);
        (ing.amount, ing.unit, ing.item)
    }

    #[test]
    fn test_amount_unit_item() {
        assert_eq!(
            parsed("2 cups flour"),
            ("2".into(), "cups".into(), "flour".into())
        );
        assert_eq!(
            parsed("1 1/2 tsp baking soda"),
            ("1 1/2".into(), "tsp".into(), "baking soda".into())
        );
        assert_eq!(
            parsed("½ cup milk"),
            ("½".into(), "cup".into(), "milk".into())
        );
        assert_eq!(
            parsed("2.5 kg potatoes"),
            ("2.5".into(), "kg".into(), "potatoes".into())
        );
    }

    #[test]
    fn test_ranges_and_alternate_quantity() {
        assert_eq!(
            parsed("2-3 cloves garlic"),
            ("2-3".into(), "cloves".into(), "garlic".into())
        );
        assert_eq!(
            parsed("1 (14 oz) can diced tomatoes"),
            ("1 (14 oz)".into(), "can".into(), "diced tomatoes".into())
        );
        assert_eq!(
            parsed("8 fl oz cream"),
            ("8".into(), "fl oz".into(), "cream".into())
        );
    }

    #[test]
    fn test_quantity_without_unit() {
        assert_eq!(parsed("2 eggs"), ("2".into(), "".into(), "eggs".into()));
        assert_eq!(
            parsed("3 eggs, beaten"),
            ("3".into(), "".into(), "eggs, beaten".into())
        );
    }

    #[test]
    fn test_no_quantity() {
        assert_eq!(parsed("salt"), ("".into(), "".into(), "salt".into()));
        assert_eq!(
            parsed("Salt and pepper to taste"),
            ("".into(), "".into(), "Salt and pepper to taste".into())
        );
    }

    #[test]
    fn test_markup_and_entities_removed() {
        assert_eq!(
            parsed("<span>1</span> cup <b>sugar</b> &amp; spice"),
            ("1".into(), "cup".into(), "sugar & spice".into())
        );
    }

    #[test]
    fn test_split_on_newlines_and_numbering() {
        let steps = split_instruction_text("Preheat the oven.\nMix the batter well.", 6);
        assert_eq!(steps, vec!["Preheat the oven.", "Mix the batter well."]);

        let steps = split_instruction_text("1. Whisk the eggs 2. Fold in the flour", 6);
        assert_eq!(steps, vec!["Whisk the eggs", "Fold in the flour"]);
    }

    #[test]
    fn test_split_keeps_temperatures() {
        let steps = split_instruction_text("Bake at 350. Serve warm.", 6);
        assert_eq!(steps, vec!["Bake at 350. Serve warm."]);
    }

    #[test]
    fn test_split_drops_short_fragments() {
        let steps = split_instruction_text("Stir.\nSimmer for ten minutes.", 6);
        assert_eq!(steps, vec!["Simmer for ten minutes."]);
    }

    #[test]
    fn test_split_keeps_whole_text_when_everything_is_short() {
        assert_eq!(split_instruction_text("Mix. Cook.", 6), vec!["Mix. Cook."]);
        assert!(split_instruction_text("   ", 6).is_empty());
    }

    #[test]
    fn test_split_handles_markup() {
        let steps = split_instruction_text("<p>Boil the water.</p><p>Add pasta and salt.</p>", 6);
        assert_eq!(steps, vec!["Boil the water.", "Add pasta and salt."]);
    }

    #[test]
    fn test_duration_parsing() {
        assert_eq!(parse_duration_minutes("PT1H30M"), Some(90));
        assert_eq!(parse_duration_minutes("PT45M"), Some(45));
        assert_eq!(parse_duration_minutes("PT2H"), Some(120));
        assert_eq!(parse_duration_minutes("P1DT1H"), Some(1500));
        assert_eq!(parse_duration_minutes("PT"), None);
        assert_eq!(parse_duration_minutes("PT30S"), None);
        assert_eq!(parse_duration_minutes("30 minutes"), None);
        assert_eq!(parse_duration_minutes(""), None);
    }

    #[test]
    fn test_human_duration_parsing() {
        assert_eq!(parse_duration_text("PT20M"), Some(20));
        assert_eq!(parse_duration_text("1 hr 20 mins"), Some(80));
        assert_eq!(parse_duration_text("45 minutes"), Some(45));
        assert_eq!(parse_duration_text("2 hours"), Some(120));
        assert_eq!(parse_duration_text("1h30m"), Some(90));
        assert_eq!(parse_duration_text("1h 30m"), Some(90));
        assert_eq!(parse_duration_text("overnight"), None);
    }

    #[test]
    fn test_servings_parsing() {
        assert_eq!(parse_servings("4 servings"), Some(4));
        assert_eq!(parse_servings("Serves 6"), Some(6));
        assert_eq!(parse_servings("makes a dozen"), None);
    }

    #[test]
    fn test_comparison_signs_are_not_tags() {
        assert_eq!(
            clean_fragment("Rest the bird if it is &lt; 1 kg, and roast until the thigh reads &gt; 75C."),
            "Rest the bird if it is < 1 kg, and roast until the thigh reads > 75C."
        );
        assert_eq!(clean_fragment("Stir <b>well</b>, 2<3"), "Stir well , 2<3");
    }

    #[test]
    fn test_bare_quantities_stay_whole() {
        assert_eq!(parsed("1/2"), ("".into(), "".into(), "1/2".into()));
        assert_eq!(parsed("1-2"), ("".into(), "".into(), "1-2".into()));
    }

    #[test]
    fn test_strip_tags_removes_scripts() {
        let text = collapse_whitespace(&strip_tags(
            "<p>Keep</p><script>alert('x')</script><style>p{}</style><!-- note -->",
        ));
        assert_eq!(text, "Keep");
    }
}
