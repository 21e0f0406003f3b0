//! Lazy HTML token stream
//!
//! Wraps html5ever's tokenizer behind a pull-based iterator. The body is fed
//! to the tokenizer in small chunks only when the consumer asks for more
//! tokens, and adjacent character tokens are merged into a single text token.

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
    TokenizerResult,
};
use std::collections::VecDeque;

/// Bytes handed to the tokenizer per refill
const CHUNK_SIZE: usize = 4096;

/// One token of an HTML document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlToken {
    /// An opening tag with its attributes in document order
    StartTag {
        name: String,
        attrs: Vec<(String, String)>,
    },
    /// A closing tag
    EndTag { name: String },
    /// A tag written as `<name ... />`
    SelfClosingTag {
        name: String,
        attrs: Vec<(String, String)>,
    },
    /// A run of character data
    Text(String),
    /// End of input
    End,
}

impl HtmlToken {
    /// Returns the value of attribute `key` on a start or self-closing tag
    pub fn attr(&self, key: &str) -> Option<&str> {
        match self {
            Self::StartTag { attrs, .. } | Self::SelfClosingTag { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }
}

/// Collects tokens produced by html5ever
#[derive(Default)]
struct TokenCollector {
    ready: VecDeque<HtmlToken>,
    text: String,
}

impl TokenCollector {
    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            let text = std::mem::take(&mut self.text);
            self.ready.push_back(HtmlToken::Text(text));
        }
    }

    fn push_tag(&mut self, tag: Tag) -> TokenSinkResult<()> {
        self.flush_text();

        let name = tag.name.to_string();
        let attrs: Vec<(String, String)> = tag
            .attrs
            .iter()
            .map(|a| (a.name.local.to_string(), a.value.to_string()))
            .collect();

        match (tag.kind, tag.self_closing) {
            (TagKind::StartTag, true) => {
                self.ready.push_back(HtmlToken::SelfClosingTag { name, attrs });
                TokenSinkResult::Continue
            }
            (TagKind::StartTag, false) => {
                // Without a tree builder the tokenizer has to be told when
                // element content is not markup
                let raw = match name.as_str() {
                    "script" => Some(RawKind::ScriptData),
                    "style" | "xmp" | "iframe" | "noembed" | "noframes" => Some(RawKind::Rawtext),
                    "title" | "textarea" => Some(RawKind::Rcdata),
                    _ => None,
                };
                self.ready.push_back(HtmlToken::StartTag { name, attrs });
                match raw {
                    Some(kind) => TokenSinkResult::RawData(kind),
                    None => TokenSinkResult::Continue,
                }
            }
            (TagKind::EndTag, _) => {
                self.ready.push_back(HtmlToken::EndTag { name });
                TokenSinkResult::Continue
            }
        }
    }
}

impl TokenSink for TokenCollector {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) => return self.push_tag(tag),
            Token::CharacterTokens(chars) => self.text.push_str(&chars),
            Token::EOFToken => {
                self.flush_text();
                self.ready.push_back(HtmlToken::End);
            }
            // Recoverable errors; the tokenizer has already resynchronized
            Token::ParseError(e) => tracing::trace!("HTML parse error: {}", e),
            Token::NullCharacterToken | Token::CommentToken(_) | Token::DoctypeToken(_) => {}
        }
        TokenSinkResult::Continue
    }
}

/// Pull-based token stream over an HTML document
///
/// Yields [`HtmlToken::End`] exactly once when the input is exhausted, then
/// `None`.
pub struct TokenStream<'a> {
    tokenizer: Tokenizer<TokenCollector>,
    queue: BufferQueue,
    input: &'a str,
    offset: usize,
    finished: bool,
}

impl<'a> TokenStream<'a> {
    /// Creates a token stream over `input`
    pub fn new(input: &'a str) -> Self {
        Self {
            tokenizer: Tokenizer::new(TokenCollector::default(), TokenizerOpts::default()),
            queue: BufferQueue::new(),
            input,
            offset: 0,
            finished: false,
        }
    }

    /// Feeds the next chunk of input, or ends the tokenizer when none is left
    fn refill(&mut self) {
        if self.offset < self.input.len() {
            let mut end = (self.offset + CHUNK_SIZE).min(self.input.len());
            while !self.input.is_char_boundary(end) {
                end += 1;
            }

            let chunk = &self.input[self.offset..end];
            self.offset = end;
            self.queue.push_back(StrTendril::from_slice(chunk));
            match self.tokenizer.feed(&mut self.queue) {
                TokenizerResult::Done => {}
                // Pausing for a script needs a tree builder sink; ours never asks
                TokenizerResult::Script(()) => {
                    tracing::trace!("Tokenizer paused at a script; input stays queued")
                }
            }
        } else {
            self.tokenizer.end();
            self.finished = true;
        }
    }
}

impl Iterator for TokenStream<'_> {
    type Item = HtmlToken;

    fn next(&mut self) -> Option<HtmlToken> {
        loop {
            if let Some(token) = self.tokenizer.sink.ready.pop_front() {
                return Some(token);
            }
            if self.finished {
                return None;
            }
            self.refill();
        }
    }
}
