//! Team name canonicalization.
//!
//! Reduces a free-text club name to lowercase ASCII-ish tokens with
//! diacritics, punctuation, digits and common qualifiers removed, so that
//! "Real Madrid CF" and "Real Madrid" produce the same string.
//!
//! Known limitation: qualifier stripping can collide distinct clubs
//! ("AC Milan" and "Milan" are equal) and abbreviations are not expanded
//! ("R. Madrid" stays "r madrid").

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Tokens that qualify a team rather than name it.
const QUALIFIER_WORDS: &[&str] = &[
    "women", "u21", "u23", "reserves", "ii", "iii", "fc", "cf", "cd", "ca", "team", "ac", "afc",
];

fn is_qualifier(token: &str) -> bool {
    QUALIFIER_WORDS.contains(&token)
}

/// Normalize a team name to its canonical comparison form.
///
/// Rules applied:
/// 1. NFKD-decompose and drop combining marks (diacritics)
/// 2. Lowercase
/// 3. Remove everything that is not alphanumeric or whitespace
/// 4. Drop qualifier tokens ("fc", "u21", "women", ...)
/// 5. Remove digits from the remaining tokens
/// 6. Join surviving tokens with single spaces
///
/// Qualifiers are checked again after digit removal so the result is a
/// fixed point: normalizing an already-normalized name changes nothing.
pub fn normalize_team_name(name: &str) -> String {
    let stripped: String = name
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    stripped
        .split_whitespace()
        .filter(|token| !is_qualifier(token))
        .map(|token| token.chars().filter(|c| !c.is_ascii_digit()).collect::<String>())
        .filter(|token| !token.is_empty() && !is_qualifier(token))
        .collect::<Vec<_>>()
        .join(" ")
}
