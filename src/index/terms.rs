//! Term normalization and filtering for the keyword index

/// Words too common to be useful as index keys
pub const STOPWORDS: &[&str] = &["and", "the", "not"];

/// Tokens of this length or shorter are never indexed
pub const MIN_TERM_LEN: usize = 2;

/// Splits text into index terms
///
/// Every character outside `[A-Za-z0-9 ]` becomes a space, the text is
/// lowercased and split on single spaces. Tokens of length <= 2 and
/// stopwords are dropped. Repeated terms are kept; deduplication happens
/// in the posting list.
///
/// # Examples
///
/// ```
/// use dragnet::index::normalize_terms;
///
/// assert_eq!(normalize_terms("The Rust-lang book!"), vec!["rust", "lang", "book"]);
/// ```
pub fn normalize_terms(text: &str) -> Vec<String> {
    let cleaned: String = text
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == ' ' {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect();

    cleaned
        .split(' ')
        .filter(|token| is_indexable(token))
        .map(str::to_string)
        .collect()
}

/// Returns true if a normalized token may become an index key
pub fn is_indexable(token: &str) -> bool {
    token.len() > MIN_TERM_LEN && !STOPWORDS.contains(&token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_splits() {
        assert_eq!(
            normalize_terms("Hello WORLD again"),
            vec!["hello", "world", "again"]
        );
    }

    #[test]
    fn test_punctuation_becomes_separator() {
        assert_eq!(
            normalize_terms("rust,tokio;serde...reqwest"),
            vec!["rust", "tokio", "serde", "reqwest"]
        );
    }

    #[test]
    fn test_short_tokens_dropped() {
        assert_eq!(normalize_terms("a an to web"), vec!["web"]);
    }

    #[test]
    fn test_stopwords_dropped() {
        assert_eq!(
            normalize_terms("the cat and the hat are not here"),
            vec!["cat", "hat", "are", "here"]
        );
    }

    #[test]
    fn test_non_ascii_replaced() {
        assert_eq!(normalize_terms("café naïve"), vec!["caf"]);
    }

    #[test]
    fn test_newlines_and_tabs_split() {
        assert_eq!(normalize_terms("first\nsecond\tthird"), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_repeated_terms_kept() {
        assert_eq!(
            normalize_terms("keyword keyword2 keyword2"),
            vec!["keyword", "keyword2", "keyword2"]
        );
    }

    #[test]
    fn test_is_indexable() {
        assert!(is_indexable("web"));
        assert!(!is_indexable("of"));
        assert!(!is_indexable(""));
        assert!(!is_indexable("the"));
    }
}
