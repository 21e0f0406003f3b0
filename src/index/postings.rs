//! Posting list encoding
//!
//! A posting list is the ordered set of canonical URLs indexed under one
//! term. It is stored as a JSON array. Values written by older crawlers as
//! URLs joined with a four-character delimiter are still readable.

use crate::storage::{StorageError, StorageResult};

/// Delimiter of the legacy posting list format, also written after the last URL
pub const LEGACY_DELIMITER: &str = "||||";

/// Ordered set of URLs indexed under one term
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostingList {
    urls: Vec<String>,
}

impl PostingList {
    /// Creates a posting list holding a single URL
    pub fn singleton(url: &str) -> Self {
        Self {
            urls: vec![url.to_string()],
        }
    }

    /// Appends `url` unless it is already present
    ///
    /// Membership is a linear scan over the list.
    ///
    /// # Returns
    ///
    /// true if the URL was added
    pub fn insert(&mut self, url: &str) -> bool {
        if self.contains(url) {
            return false;
        }
        self.urls.push(url.to_string());
        true
    }

    /// Returns true if the list holds `url`
    pub fn contains(&self, url: &str) -> bool {
        self.urls.iter().any(|existing| existing == url)
    }

    /// URLs in insertion order
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Consumes the list, yielding its URLs in insertion order
    pub fn into_urls(self) -> Vec<String> {
        self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Encodes the list for storage
    pub fn encode(&self) -> StorageResult<Vec<u8>> {
        serde_json::to_vec(&self.urls).map_err(|e| StorageError::Codec(e.to_string()))
    }

    /// Decodes a stored posting list
    ///
    /// JSON arrays are decoded directly. Anything else is treated as the
    /// legacy delimiter-joined format; the empty segment after the trailing
    /// delimiter is discarded.
    pub fn decode(bytes: &[u8]) -> StorageResult<Self> {
        if bytes.first() == Some(&b'[') {
            let urls: Vec<String> =
                serde_json::from_slice(bytes).map_err(|e| StorageError::Codec(e.to_string()))?;
            return Ok(Self { urls });
        }

        let text = std::str::from_utf8(bytes).map_err(|e| StorageError::Codec(e.to_string()))?;
        let mut segments: Vec<&str> = text.split(LEGACY_DELIMITER).collect();
        // The trailing delimiter leaves one empty segment behind
        segments.pop();

        Ok(Self {
            urls: segments.into_iter().map(str::to_string).collect(),
        })
    }
}
