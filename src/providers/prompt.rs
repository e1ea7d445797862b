/// The system prompt used for turning OCR text into a recipe.
///
/// The prompt is loaded from `prompt.txt` at compile time using the
/// `include_str!` macro, making it easy to edit without dealing with
/// Rust string syntax.
pub const RECIPE_STRUCTURING_PROMPT: &str = include_str!("prompt.txt");
