//! Tag suggestions from free text.
//!
//! Matching is a prefix heuristic meant to survive Russian declension
//! ("кот" / "кота" / "коты") without a stemmer: a word and a known tag match
//! when one is a prefix of the other and their lengths differ by less than
//! [`MAX_LENGTH_DIFFERENCE`]. It over-matches short unrelated words that share
//! a prefix and misses long inflected forms; both are accepted trade-offs.

use std::collections::HashSet;

/// Characters dropped from the text before tokenizing.
pub const STRIPPED_PUNCTUATION: &[char] = &[
    '.', ',', '/', '#', '!', '$', '%', '^', '&', '*', ';', ':', '{', '}', '=', '-', '_', '`', '~',
    '(', ')',
];

/// Tokens shorter than this are ignored.
pub const MIN_TOKEN_LENGTH: usize = 3;

/// A match needs a length difference strictly below this.
pub const MAX_LENGTH_DIFFERENCE: usize = 4;

/// Suggest tags from `known_tags` that `text` plausibly mentions.
///
/// The result is a subset of `known_tags`, in vocabulary order, without
/// duplicates. Comparison is case-insensitive; the returned strings are the
/// vocabulary entries as given.
pub fn extract_tags<S: AsRef<str>>(text: &str, known_tags: &[S]) -> Vec<String> {
    if text.is_empty() || known_tags.is_empty() {
        return Vec::new();
    }

    let tokens = tokenize(text);
    if tokens.is_empty() {
        return Vec::new();
    }

    let mut found: Vec<String> = Vec::new();
    for tag in known_tags {
        let tag = tag.as_ref();
        let needle = tag.trim().to_lowercase();
        if needle.is_empty() || found.iter().any(|f| f == tag) {
            continue;
        }
        if tokens.iter().any(|token| matches_tag(token, &needle)) {
            found.push(tag.to_string());
        }
    }
    found
}

/// Lowercase, strip punctuation, split on whitespace, drop short words.
fn tokenize(text: &str) -> HashSet<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| !STRIPPED_PUNCTUATION.contains(c))
        .collect();

    cleaned
        .split_whitespace()
        .filter(|word| word.chars().count() >= MIN_TOKEN_LENGTH)
        .map(str::to_string)
        .collect()
}

/// Both arguments are already lowercase.
fn matches_tag(token: &str, tag: &str) -> bool {
    if !(token.starts_with(tag) || tag.starts_with(token)) {
        return false;
    }
    token.chars().count().abs_diff(tag.chars().count()) < MAX_LENGTH_DIFFERENCE
}
