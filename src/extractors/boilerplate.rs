use regex::Regex;
use std::sync::LazyLock;

/// Fragments longer than this are never a single ingredient or short step
pub const DEFAULT_MAX_FRAGMENT_LEN: usize = 500;

static BOILERPLATE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // ads and calls to action
        r"(?i)^\s*(?:advertisement|sponsored|subscribe|sign\s*up|log\s*in|print|share|save|pin|email)\b",
        // navigation
        r"(?i)^\s*(?:jump\s+to|skip\s+to|view|see|read\s+more|click|tap)\b",
        // comment and review counters
        r"(?i)^\s*\d+\s*(?:comments?|reviews?|ratings?|votes?)\b",
        r"(?i)^\s*(?:comments?|reviews?|ratings?)\s*\(?\d+",
        // nutrition labels
        r"(?i)^\s*(?:nutrition(?:\s+(?:facts|info(?:rmation)?))?|calories|serving\s+size|total\s+fat|saturated\s+fat|cholesterol|sodium|carbohydrates?|dietary\s+fiber|protein)\s*(?:[:\d]|$)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid boilerplate regex"))
    .collect()
});

/// Decide whether an extracted fragment is page furniture rather than recipe content.
///
/// `text` is expected to be tag-stripped already.
pub fn is_boilerplate(text: &str, max_len: usize) -> bool {
    if text.chars().count() > max_len {
        return true;
    }
    BOILERPLATE_PATTERNS.iter().any(|re| re.is_match(text))
}
