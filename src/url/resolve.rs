use crate::{UrlError, UrlResult};
use url::Url;

/// Prefixes that mark a free text token as an unlinked URL
const PLAIN_TEXT_PREFIXES: &[&str] = &["http://", "https://", "www."];

/// Resolves an `href` found on a page to an absolute URL string
///
/// Hrefs that already carry an http(s) scheme are returned as written.
/// Everything else is resolved against `base_url` using standard relative
/// URL resolution.
///
/// Returns None if the link should be excluded:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel:, data: and any other non-HTTP(S) scheme
/// - hrefs that cannot be resolved
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.contains(':') && has_http_scheme(href) {
        return Some(href.to_string());
    }

    match base_url.join(href) {
        Ok(absolute_url) if is_http(&absolute_url) => Some(absolute_url.to_string()),
        _ => None,
    }
}

/// Recognizes a free text token that looks like an unlinked URL
///
/// Tokens starting with `www.` get an `http://` prefix so they can be fetched.
pub fn plain_text_url(text: &str) -> Option<String> {
    let text = text.trim();
    let prefix = PLAIN_TEXT_PREFIXES
        .iter()
        .find(|prefix| starts_with_ignore_case(text, prefix))?;

    // Only the first whitespace-delimited word is the URL
    let candidate = text.split_whitespace().next()?;
    if candidate.len() <= prefix.len() {
        return None;
    }

    if *prefix == "www." {
        Some(format!("http://{}", candidate))
    } else {
        Some(candidate.to_string())
    }
}

/// Checks that a canonical URL can be fetched by the crawler
///
/// # Returns
///
/// * `Ok(Url)` - The parsed URL
/// * `Err(UrlError)` - Not parseable, not HTTP(S), or missing a host
pub fn validate_crawlable(canonical: &str) -> UrlResult<Url> {
    let url = Url::parse(canonical).map_err(|e| UrlError::Parse(format!("{}: {}", canonical, e)))?;

    if !is_http(&url) {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost(canonical.to_string()));
    }

    Ok(url)
}

fn is_http(url: &Url) -> bool {
    url.scheme() == "http" || url.scheme() == "https"
}

fn has_http_scheme(href: &str) -> bool {
    starts_with_ignore_case(href, "http://") || starts_with_ignore_case(href, "https://")
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.len() >= prefix.len()
        && text.is_char_boundary(prefix.len())
        && text[..prefix.len()].eq_ignore_ascii_case(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/dir/page").unwrap()
    }

    #[test]
    fn test_absolute_link_kept_as_written() {
        assert_eq!(
            resolve_link("https://other.com/page?x=1", &base_url()),
            Some("https://other.com/page?x=1".to_string())
        );
    }

    #[test]
    fn test_root_relative_link() {
        assert_eq!(
            resolve_link("/about", &base_url()),
            Some("https://example.com/about".to_string())
        );
    }

    #[test]
    fn test_path_relative_link() {
        assert_eq!(
            resolve_link("other", &base_url()),
            Some("https://example.com/dir/other".to_string())
        );
        assert_eq!(
            resolve_link("../up", &base_url()),
            Some("https://example.com/up".to_string())
        );
    }

    #[test]
    fn test_protocol_relative_link() {
        assert_eq!(
            resolve_link("//cdn.example.org/lib", &base_url()),
            Some("https://cdn.example.org/lib".to_string())
        );
    }

    #[test]
    fn test_skip_special_schemes() {
        for href in [
            "javascript:void(0)",
            "mailto:test@example.com",
            "tel:+1234567890",
            "data:text/html,<h1>x</h1>",
            "ftp://example.com/file",
        ] {
            assert_eq!(resolve_link(href, &base_url()), None, "{}", href);
        }
    }

    #[test]
    fn test_skip_empty_and_fragment() {
        assert_eq!(resolve_link("", &base_url()), None);
        assert_eq!(resolve_link("   ", &base_url()), None);
        assert_eq!(resolve_link("#top", &base_url()), None);
    }

    #[test]
    fn test_plain_text_url() {
        assert_eq!(
            plain_text_url("https://a.com/x and more"),
            Some("https://a.com/x".to_string())
        );
        assert_eq!(
            plain_text_url("www.a.com"),
            Some("http://www.a.com".to_string())
        );
        assert_eq!(plain_text_url("visit https://a.com"), None);
        assert_eq!(plain_text_url("http://"), None);
        assert_eq!(plain_text_url("plain words"), None);
    }

    #[test]
    fn test_validate_crawlable() {
        assert!(validate_crawlable("http://a.com").is_ok());
        assert!(validate_crawlable("https://a.com/x").is_ok());
        assert!(matches!(
            validate_crawlable("ftp://a.com"),
            Err(UrlError::InvalidScheme(_))
        ));
        assert!(validate_crawlable("not a url").is_err());
        assert!(validate_crawlable("http://").is_err());
    }
}
