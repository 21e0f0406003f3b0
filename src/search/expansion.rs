//! Suffix-based query expansion
//!
//! A crude stemmer: strip the first matching suffix from a term, then
//! regenerate one variant per suffix. When the stem ends with the character
//! a suffix starts with, that character is written once: `"fas"` + `"st"`
//! yields `"fast"` and `"hope"` + `"ed"` yields `"hoped"`.

/// Candidate suffixes, tried in order. The empty suffix regenerates the bare stem.
pub const SUFFIXES: [&str; 14] = [
    "est", "ing", "ate", "ful", "ify", "st", "ty", "ed", "al", "er", "or", "s", "y", "",
];

/// Strips the first matching suffix, keeping at least one character
pub fn stem(term: &str) -> &str {
    SUFFIXES
        .iter()
        .filter(|suffix| !suffix.is_empty())
        .find(|suffix| term.len() > suffix.len() && term.ends_with(*suffix))
        .map_or(term, |suffix| &term[..term.len() - suffix.len()])
}

/// Appends `suffix` to `stem`, merging a shared boundary character
pub fn join_suffix(stem: &str, suffix: &str) -> String {
    match (stem.as_bytes().last(), suffix.as_bytes().first()) {
        (Some(last), Some(first)) if last == first => format!("{}{}", stem, &suffix[1..]),
        _ => format!("{}{}", stem, suffix),
    }
}

/// Generates every suffix variant of `stem`, one per entry of [`SUFFIXES`]
///
/// Variants are not deduplicated.
pub fn variants(stem: &str) -> Vec<String> {
    SUFFIXES
        .iter()
        .map(|suffix| join_suffix(stem, suffix))
        .collect()
}
