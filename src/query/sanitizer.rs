//! Neutralizes characters that carry meaning in query syntax.
//!
//! A phrase like `hello-world` would otherwise read as "hello, excluding
//! world". Every reserved character becomes a plain space, so the phrase only
//! ever contributes literal terms.

/// Operators, grouping and quote characters, wildcards and separators.
pub const RESERVED: [char; 22] = [
    '+', '-', '=', '&', '|', '>', '<', '!', '(', ')', '{', '}', '[', ']', '^', '"', '~', '*',
    '?', ':', '/', '\\',
];

pub fn is_reserved(c: char) -> bool {
    RESERVED.contains(&c)
}

/// Lower-case `phrase` and replace every reserved character with a space.
///
/// Word boundaries are otherwise left as they were; this cannot fail.
pub fn sanitize(phrase: &str) -> String {
    phrase
        .to_lowercase()
        .chars()
        .map(|c| if is_reserved(c) { ' ' } else { c })
        .collect()
}

/// Sanitize `phrase` and split it into non-empty whitespace-separated terms.
pub fn terms(phrase: &str) -> Vec<String> {
    sanitize(phrase)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}
