//! HTML character entity decoding for extracted text.

use html_escape::decode_html_entities;
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Named entities seen in recipe markup, double-escaped forms first so that
/// `&amp;#39;` lands on an apostrophe instead of a literal `&#39;`.
const NAMED_ENTITIES: &[(&str, &str)] = &[
    ("&amp;#39;", "'"),
    ("&amp;#039;", "'"),
    ("&amp;#32;", " "),
    ("&amp;quot;", "\""),
    ("&amp;apos;", "'"),
    ("&amp;nbsp;", " "),
    ("&amp;lt;", "<"),
    ("&amp;gt;", ">"),
    ("&amp;amp;", "&"),
    ("&#39;", "'"),
    ("&#039;", "'"),
    ("&#32;", " "),
    ("&quot;", "\""),
    ("&apos;", "'"),
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&amp;", "&"),
];

/// Decimal, hex or named reference, decoded in one left-to-right pass
static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:#(\d{1,7})|#[xX]([0-9a-fA-F]{1,6})|[A-Za-z][A-Za-z0-9]{1,31});")
        .expect("valid entity regex")
});

/// Decode named, decimal and hex entities. Never fails; unknown or invalid
/// entities are left as they are.
pub fn decode(text: &str) -> String {
    if text.is_empty() || !text.contains('&') {
        return text.to_string();
    }

    let mut decoded = text.to_string();
    for (entity, replacement) in NAMED_ENTITIES {
        if decoded.contains(entity) {
            decoded = decoded.replace(entity, replacement);
        }
    }

    // Output of this pass is never decoded again
    ENTITY
        .replace_all(&decoded, |caps: &Captures| {
            if let Some(decimal) = caps.get(1) {
                numeric_entity(&caps[0], decimal.as_str().parse::<u32>().ok())
            } else if let Some(hex) = caps.get(2) {
                numeric_entity(&caps[0], u32::from_str_radix(hex.as_str(), 16).ok())
            } else {
                decode_html_entities(&caps[0]).into_owned()
            }
        })
        .into_owned()
}

fn numeric_entity(original: &str, code: Option<u32>) -> String {
    code.and_then(char::from_u32)
        .map(String::from)
        .unwrap_or_else(|| original.to_string())
}
