//! Per-run document index: one scan per document, computed up front.
//!
//! Scanning (regions → occurrences → activity) is read-only and
//! self-contained per document, so the index builds embarrassingly
//! parallel via Rayon. The closure engine then consumes the index
//! single-threaded; the index itself is never mutated mid-run.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::Diagnostic;
use crate::extract::activity::{classify_activity, inactive_group, Activity};
use crate::extract::occurrence::{extract_occurrences, Occurrence};
use crate::extract::pattern::PatternSet;
use crate::scanner::lexer::scan_regions;
use crate::scanner::region::Span;
use crate::store::DocumentProvider;

/// One extracted reference with its activity verdict attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannedRef {
    pub occurrence: Occurrence,
    pub activity: Activity,
    /// For inactive refs, the whole logical inactive block (line group or
    /// enclosing block comment) that pruning would remove.
    pub group: Option<Span>,
}

impl ScannedRef {
    pub fn is_active(&self) -> bool {
        self.activity.is_active()
    }
}

/// Everything the engine knows about one document after scanning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentScan {
    pub key: String,
    /// SHA-256 of the document text, for cross-run cache invalidation.
    pub hash: String,
    pub refs: Vec<ScannedRef>,
    pub diagnostics: Vec<Diagnostic>,
}

impl DocumentScan {
    /// Normalized targets of the active references in this document.
    pub fn active_targets(&self) -> impl Iterator<Item = &str> {
        self.refs
            .iter()
            .filter(|r| r.is_active())
            .map(|r| r.occurrence.target.as_str())
    }
}

/// Scan a single document: region partition, reference extraction, and
/// activity classification in one pass over the text.
pub fn scan_document(key: &str, text: &str, patterns: &PatternSet) -> DocumentScan {
    let scan = scan_regions(key, text);
    let extraction = extract_occurrences(key, text, &scan.map, patterns);

    let mut diagnostics = scan.diagnostics;
    diagnostics.extend(extraction.diagnostics);

    let refs = extraction
        .occurrences
        .into_iter()
        .map(|occurrence| {
            let activity = classify_activity(occurrence.span, &scan.map);
            let group = match activity {
                Activity::Active => None,
                Activity::Inactive => Some(inactive_group(text, &scan.map, occurrence.span)),
            };
            ScannedRef {
                occurrence,
                activity,
                group,
            }
        })
        .collect();

    DocumentScan {
        key: key.to_string(),
        hash: crate::cache::content_hash(text),
        refs,
        diagnostics,
    }
}

/// The full per-run index: one [`DocumentScan`] per document key.
#[derive(Debug, Clone, Default)]
pub struct DocumentIndex {
    scans: BTreeMap<String, DocumentScan>,
}

impl DocumentIndex {
    /// Build the index over every document in the provider, scanning
    /// documents in parallel.
    pub fn build<P: DocumentProvider + ?Sized>(provider: &P, patterns: &PatternSet) -> Self {
        let keys = provider.keys();
        let scans: Vec<DocumentScan> = keys
            .par_iter()
            .filter_map(|key| {
                let text = provider.fetch(key)?;
                Some(scan_document(key, &text, patterns))
            })
            .collect();

        Self::from_scans(scans)
    }

    /// Assemble an index from pre-computed scans (cache hits included).
    pub fn from_scans(scans: impl IntoIterator<Item = DocumentScan>) -> Self {
        Self {
            scans: scans
                .into_iter()
                .map(|s| (s.key.clone(), s))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.scans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scans.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.scans.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&DocumentScan> {
        self.scans.get(key)
    }

    /// Document keys in stable sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.scans.keys().map(|k| k.as_str())
    }

    pub fn scans(&self) -> impl Iterator<Item = &DocumentScan> {
        self.scans.values()
    }

    /// All references, across all documents, pointing at a target.
    pub fn refs_to<'a>(&'a self, target: &'a str) -> impl Iterator<Item = &'a ScannedRef> {
        self.scans
            .values()
            .flat_map(|s| s.refs.iter())
            .filter(move |r| r.occurrence.target == target)
    }

    /// Active references pointing at a target.
    pub fn active_refs_to<'a>(&'a self, target: &'a str) -> impl Iterator<Item = &'a ScannedRef> {
        self.refs_to(target).filter(|r| r.is_active())
    }

    /// All diagnostics collected during scanning, in key order.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.scans.values().flat_map(|s| s.diagnostics.iter())
    }
}
