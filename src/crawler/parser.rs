//! HTML content extractor
//!
//! This module walks a lazy HTML token stream and extracts:
//! - Links to follow (from `<a href>` and unlinked URLs in free text)
//! - The page title and meta description
//! - Keyword-bearing text (title, meta description, `<h1>`, `<h2>`, `<strong>`)
//!
//! Extraction never fails. A truncated or malformed document simply ends the
//! walk early and whatever was found up to that point is kept.

use crate::crawler::tokenizer::{HtmlToken, TokenStream};
use crate::url::{plain_text_url, resolve_link};
use url::Url;

/// A link discovered on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLink {
    /// Absolute, not yet canonicalized URL
    pub url: String,

    /// Anchor text, if the anchor was directly followed by text
    pub text: Option<String>,
}

/// Everything extracted from one HTML page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPage {
    /// Links in document order
    pub links: Vec<ExtractedLink>,

    /// Text of the `<title>` element
    pub title: Option<String>,

    /// Content of `<meta name="description">`
    pub meta: Option<String>,

    /// Text fragments to feed to the keyword indexer
    pub keyword_texts: Vec<String>,
}

/// What the next text token is captured as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    None,
    /// Anchor text for the link at this position
    LinkText(usize),
    Title,
    Keywords,
}

/// Parses an HTML body
///
/// # Arguments
///
/// * `html` - The response body
/// * `page_url` - The page's URL, used to resolve relative links
///
/// # Example
///
/// ```
/// use dragnet::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<title>Test</title><a href="/page">Link</a>"#;
/// let page_url = Url::parse("http://example.com/").unwrap();
/// let page = parse_html(html, &page_url);
/// assert_eq!(page.title.as_deref(), Some("Test"));
/// assert_eq!(page.links[0].url, "http://example.com/page");
/// ```
pub fn parse_html(html: &str, page_url: &Url) -> ExtractedPage {
    extract(TokenStream::new(html), page_url)
}

/// Runs the extractor over any token source
pub fn extract<I>(tokens: I, page_url: &Url) -> ExtractedPage
where
    I: IntoIterator<Item = HtmlToken>,
{
    let mut page = ExtractedPage::default();
    let mut capture = Capture::None;
    let mut in_raw_text = false;

    for token in tokens {
        // A capture only applies to the token immediately after its tag
        let pending = std::mem::replace(&mut capture, Capture::None);

        match &token {
            HtmlToken::End => break,

            HtmlToken::StartTag { name, .. } | HtmlToken::SelfClosingTag { name, .. } => {
                let self_closing = matches!(token, HtmlToken::SelfClosingTag { .. });

                match name.as_str() {
                    "a" => {
                        if let Some(url) = token.attr("href").and_then(|h| resolve_link(h, page_url))
                        {
                            page.links.push(ExtractedLink { url, text: None });
                            if !self_closing {
                                capture = Capture::LinkText(page.links.len() - 1);
                            }
                        }
                    }
                    "meta" => {
                        let is_description = token
                            .attr("name")
                            .map_or(false, |n| n.eq_ignore_ascii_case("description"));
                        if let (true, Some(content)) = (is_description, token.attr("content")) {
                            let content = content.trim();
                            if !content.is_empty() {
                                page.meta = Some(content.to_string());
                                page.keyword_texts.push(content.to_string());
                            }
                        }
                    }
                    "title" if !self_closing => capture = Capture::Title,
                    "h1" | "h2" | "strong" if !self_closing => capture = Capture::Keywords,
                    "script" | "style" if !self_closing => in_raw_text = true,
                    _ => {}
                }
            }

            HtmlToken::EndTag { name } => {
                if name == "script" || name == "style" {
                    in_raw_text = false;
                }
            }

            HtmlToken::Text(raw) => {
                if in_raw_text {
                    continue;
                }
                let text = raw.trim();
                if text.is_empty() {
                    continue;
                }

                match pending {
                    Capture::LinkText(index) => page.links[index].text = Some(text.to_string()),
                    Capture::Title => {
                        page.title = Some(text.to_string());
                        page.keyword_texts.push(text.to_string());
                    }
                    Capture::Keywords => page.keyword_texts.push(text.to_string()),
                    Capture::None => {}
                }

                if let Some(url) = plain_text_url(text) {
                    page.links.push(ExtractedLink { url, text: None });
                }
            }
        }
    }

    tracing::trace!(
        "Extracted {} links and {} keyword fragments from {}",
        page.links.len(),
        page.keyword_texts.len(),
        page_url
    );

    page
}
