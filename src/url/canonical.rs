//! Canonical URL form shared by the frontier, the crawl log and the display stores
//!
//! Canonicalization works on the URL text rather than a parsed `Url` so the
//! same key is produced whatever the link source (anchor, plain text, seed).

/// How much of a URL survives canonicalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    /// Reduce every URL to `scheme://host[:port]`
    #[default]
    HostOnly,
    /// Keep the path
    AllUrls,
}

impl Scope {
    /// Returns the scope matching a `scope-limit` setting
    pub fn from_limit(scope_limit: bool) -> Self {
        if scope_limit {
            Self::HostOnly
        } else {
            Self::AllUrls
        }
    }
}

/// Canonicalizes a URL
///
/// # Canonicalization Steps
///
/// 1. Strip the fragment (everything from `#`)
/// 2. Strip the query string (everything from `?`)
/// 3. Strip trailing path separators after the authority
/// 4. With [`Scope::HostOnly`], drop the path entirely
/// 5. Lowercase the scheme and host
///
/// The function is idempotent: `canonicalize(canonicalize(u)) == canonicalize(u)`.
///
/// # Examples
///
/// ```
/// use dragnet::url::{canonicalize, Scope};
///
/// assert_eq!(canonicalize("http://a.com/x?y=1#z", Scope::AllUrls), "http://a.com/x");
/// assert_eq!(canonicalize("http://a.com/x?y=1#z", Scope::HostOnly), "http://a.com");
/// ```
pub fn canonicalize(raw: &str, scope: Scope) -> String {
    let raw = raw.trim();
    let without_fragment = raw.split('#').next().unwrap_or_default();
    let without_query = without_fragment.split('?').next().unwrap_or_default();

    let authority_start = without_query.find("://").map(|i| i + 3).unwrap_or(0);
    let (head, rest) = without_query.split_at(authority_start);

    let (authority, path) = if authority_start > 0 {
        rest.split_at(rest.find('/').unwrap_or(rest.len()))
    } else {
        ("", rest)
    };

    let path = match scope {
        Scope::HostOnly if authority_start > 0 => "",
        _ => path.trim_end_matches('/'),
    };

    // Scheme and host are case-insensitive, the path is not
    format!(
        "{}{}{}",
        head.to_ascii_lowercase(),
        authority.to_ascii_lowercase(),
        path
    )
}
