//! Removal of invisible directional formatting characters.
//!
//! Exports from right-to-left locales wrap names and message bodies in
//! bidirectional marks. They are invisible on screen but break equality,
//! sorting and search, so they are stripped from everything we store.

/// Returns `true` for directional marks, embeddings, overrides and isolates.
pub fn is_directional_mark(c: char) -> bool {
    matches!(
        c,
        '\u{200E}' | '\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2066}'..='\u{2069}'
    )
}

/// Strips directional formatting characters and surrounding whitespace.
///
/// Idempotent: `sanitize(&sanitize(s)) == sanitize(s)`.
///
/// # Example
///
/// ```
/// use chatvault::parsing::sanitize;
///
/// assert_eq!(sanitize("\u{202A}+1 555 0100\u{202C} "), "+1 555 0100");
/// ```
pub fn sanitize(text: &str) -> String {
    let cleaned: String = text.chars().filter(|&c| !is_directional_mark(c)).collect();
    cleaned.trim().to_string()
}
