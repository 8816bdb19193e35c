//! Document set abstraction.
//!
//! The engine never touches the filesystem: callers supply a provider
//! (key → text, key → existence) and, for pruning, a mutator. Lookup of a
//! referenced key with no backing document returns `None` rather than
//! erroring; "missing" is a first-class classification outcome, not a
//! failure. [`MemoryStore`] is the reference implementation used by the
//! test suite and by callers that stage documents up front.

use std::collections::BTreeMap;

use crate::error::{RefscanError, RefscanResult};
use crate::scanner::region::Span;

/// Read access to the document set for one run.
///
/// Implementations must be `Sync`: document scanning is read-only and
/// self-contained per document, so the scan phase fans out across threads.
pub trait DocumentProvider: Sync {
    /// The raw text backing an artifact key, or `None` if no document
    /// exists for it.
    fn fetch(&self, key: &str) -> Option<String>;

    /// Whether a document exists for the key.
    fn exists(&self, key: &str) -> bool {
        self.fetch(key).is_some()
    }

    /// All document keys in the set, in stable sorted order.
    fn keys(&self) -> Vec<String>;
}

/// Mutation access, used only by the pruning executor as a strictly
/// sequential final phase after closure completes.
pub trait DocumentMutator {
    /// Delete a document. Returns `false` if no such document existed.
    fn delete_document(&mut self, key: &str) -> RefscanResult<bool>;

    /// Remove a byte span from a document, splicing the remainder
    /// together. Returns `false` if no such document existed.
    fn remove_span(&mut self, key: &str, span: Span) -> RefscanResult<bool>;
}

/// In-memory document set keyed by artifact key.
///
/// `BTreeMap` keeps `keys()` in stable sorted order for free, which the
/// closure engine relies on for reproducible reports.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    docs: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document.
    pub fn insert(&mut self, key: impl Into<String>, text: impl Into<String>) {
        self.docs.insert(key.into(), text.into());
    }

    /// Borrow a document's text.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.docs.get(key).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MemoryStore {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut store = Self::new();
        for (k, v) in iter {
            store.insert(k, v);
        }
        store
    }
}

impl DocumentProvider for MemoryStore {
    fn fetch(&self, key: &str) -> Option<String> {
        self.docs.get(key).cloned()
    }

    fn exists(&self, key: &str) -> bool {
        self.docs.contains_key(key)
    }

    fn keys(&self) -> Vec<String> {
        self.docs.keys().cloned().collect()
    }
}

impl DocumentMutator for MemoryStore {
    fn delete_document(&mut self, key: &str) -> RefscanResult<bool> {
        Ok(self.docs.remove(key).is_some())
    }

    fn remove_span(&mut self, key: &str, span: Span) -> RefscanResult<bool> {
        let Some(text) = self.docs.get_mut(key) else {
            return Ok(false);
        };
        if span.end > text.len() {
            return Err(RefscanError::document(
                key,
                format!("span {} exceeds document length {}", span, text.len()),
            ));
        }
        if !text.is_char_boundary(span.start) || !text.is_char_boundary(span.end) {
            return Err(RefscanError::document(
                key,
                format!("span {} does not fall on character boundaries", span),
            ));
        }
        text.replace_range(span.start..span.end, "");
        Ok(true)
    }
}
