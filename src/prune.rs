//! Pruning executor: removes orphaned documents and the dead text that
//! referenced them.
//!
//! Classification and mutation never interleave. The executor receives a
//! candidate list produced by an earlier analysis, then re-confirms every
//! candidate against a fresh scan of the store as it is now. A candidate
//! that turns out to be reachable is skipped with a `StaleClassification`
//! diagnostic; the executor fails closed rather than trusting a stale
//! report.
//!
//! Three mutations, all optional and all dry-run capable:
//! - Orphan document deletion
//! - Removal of commented-out blocks that referenced a deleted document
//! - Collapse of repeated identical `#uses` declarations to the first
//!
//! The executor is idempotent: a second run over the same store finds
//! nothing left to do.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::classify::{classify, Classification};
use crate::error::{Diagnostic, RefscanResult};
use crate::extract::pattern::PatternSet;
use crate::graph::{close_over, DEFAULT_ITERATION_CAP};
use crate::index::DocumentIndex;
use crate::scanner::lexer::find_matching_brace;
use crate::scanner::region::{BlockSpan, Span};
use crate::store::{DocumentMutator, DocumentProvider};

/// What the executor is allowed to touch.
#[derive(Debug, Clone)]
pub struct PruneOptions {
    /// Report what would change without mutating the store.
    pub dry_run: bool,
    /// Delete confirmed-orphan documents.
    pub remove_orphans: bool,
    /// Remove commented-out blocks that referenced a deleted document.
    pub remove_inactive_groups: bool,
    /// Collapse repeated identical `#uses` lines to the first occurrence.
    pub dedup_includes: bool,
    /// Cap for the re-confirmation closure.
    pub iteration_cap: usize,
}

impl Default for PruneOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            remove_orphans: true,
            remove_inactive_groups: true,
            dedup_includes: true,
            iteration_cap: DEFAULT_ITERATION_CAP,
        }
    }
}

/// Result of one executor run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PruneResult {
    pub documents_removed: Vec<String>,
    /// `(key, span)` pairs of text spliced out of surviving documents.
    pub spans_removed: Vec<(String, Span)>,
    /// Keys where duplicate `#uses` declarations were collapsed.
    pub includes_deduped: Vec<String>,
    /// Candidates skipped because re-confirmation found them reachable.
    pub skipped_stale: Vec<String>,
    pub errors: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl PruneResult {
    pub fn is_noop(&self) -> bool {
        self.documents_removed.is_empty()
            && self.spans_removed.is_empty()
            && self.includes_deduped.is_empty()
    }
}

/// Re-confirming pruning executor over a mutable document store.
pub struct PruneExecutor<'a> {
    patterns: &'a PatternSet,
    options: PruneOptions,
}

impl<'a> PruneExecutor<'a> {
    pub fn new(patterns: &'a PatternSet, options: PruneOptions) -> Self {
        Self { patterns, options }
    }

    /// Run the executor: re-confirm `candidates` against a fresh scan,
    /// delete the confirmed orphans, then clean up the text that pointed
    /// at them.
    ///
    /// Individual failures are collected into `errors`; the run continues
    /// with the remaining work.
    pub fn execute<S>(
        &self,
        store: &mut S,
        candidates: &[String],
        roots: &[String],
    ) -> RefscanResult<PruneResult>
    where
        S: DocumentProvider + DocumentMutator,
    {
        let mut result = PruneResult::default();

        // Fresh scan of the store as it is now, not as it was when the
        // candidate list was produced.
        let index = DocumentIndex::build(store, self.patterns);
        let outcome = close_over(&index, roots, self.options.iteration_cap);
        let report = classify(&index, &outcome);

        let mut sorted: Vec<&String> = candidates.iter().collect();
        sorted.sort();
        sorted.dedup();

        let mut removed: BTreeSet<String> = BTreeSet::new();
        if self.options.remove_orphans {
            for key in sorted {
                match report.classification_of(key) {
                    Some(Classification::Orphan) => {
                        if let Some(r) = index.refs_to(key).find(|r| !r.is_active()) {
                            info!(
                                key = %key,
                                referenced_by = %r.occurrence.key,
                                "deleting orphan that still has commented-out references"
                            );
                        }
                        match self.delete_document(store, key) {
                            Ok(true) => {
                                result.documents_removed.push(key.clone());
                                removed.insert(key.clone());
                            }
                            Ok(false) => {}
                            Err(e) => result.errors.push(format!("delete {}: {}", key, e)),
                        }
                    }
                    Some(Classification::Reachable) => {
                        // Stale candidate: something active points here now.
                        let witness = index.active_refs_to(key).next();
                        result.diagnostics.push(Diagnostic::StaleClassification {
                            key: key.clone(),
                            referenced_by: witness
                                .map(|r| r.occurrence.key.clone())
                                .unwrap_or_default(),
                            span: witness
                                .map(|r| r.occurrence.span)
                                .unwrap_or(Span::new(0, 0)),
                        });
                        result.skipped_stale.push(key.clone());
                        warn!(key = %key, "candidate is reachable in the current store, skipping");
                    }
                    _ => {
                        warn!(key = %key, "candidate has no backing document, skipping");
                    }
                }
            }
        }

        if self.options.remove_inactive_groups {
            self.remove_dead_groups(store, &index, &removed, &mut result);
        }

        if self.options.dedup_includes {
            self.dedup_includes(store, &removed, &mut result);
        }

        Ok(result)
    }

    fn delete_document<S: DocumentMutator>(&self, store: &mut S, key: &str) -> RefscanResult<bool> {
        if self.options.dry_run {
            println!("[DRY-RUN] Would remove document: {}", key);
            return Ok(true);
        }
        let existed = store.delete_document(key)?;
        if existed {
            println!("[PRUNE] Removed document: {}", key);
        }
        Ok(existed)
    }

    /// Splice out the inactive groups that referenced a deleted document.
    /// Groups are applied per document in descending span order so earlier
    /// offsets stay valid; a group overlapping an already-applied one is
    /// skipped.
    fn remove_dead_groups<S>(
        &self,
        store: &mut S,
        index: &DocumentIndex,
        removed: &BTreeSet<String>,
        result: &mut PruneResult,
    ) where
        S: DocumentProvider + DocumentMutator,
    {
        let mut by_doc: BTreeMap<&str, BTreeSet<Span>> = BTreeMap::new();
        for scan in index.scans() {
            if removed.contains(&scan.key) {
                continue;
            }
            for r in scan.refs.iter().filter(|r| !r.is_active()) {
                if removed.contains(&r.occurrence.target) {
                    let group = r.group.unwrap_or(r.occurrence.span);
                    by_doc.entry(scan.key.as_str()).or_default().insert(group);
                }
            }
        }

        for (key, groups) in by_doc {
            let mut applied: Vec<Span> = Vec::new();
            for group in groups.into_iter().rev() {
                if applied.iter().any(|a| a.overlaps(group)) {
                    continue;
                }
                if self.options.dry_run {
                    println!("[DRY-RUN] Would remove {} from: {}", group, key);
                } else {
                    match store.remove_span(key, group) {
                        Ok(true) => {
                            println!("[PRUNE] Removed {} from: {}", group, key);
                        }
                        Ok(false) => continue,
                        Err(e) => {
                            result.errors.push(format!("splice {} {}: {}", key, group, e));
                            continue;
                        }
                    }
                }
                applied.push(group);
                result.spans_removed.push((key.to_string(), group));
            }
        }
    }

    /// Collapse repeated identical `#uses` lines to the first occurrence.
    fn dedup_includes<S>(
        &self,
        store: &mut S,
        removed: &BTreeSet<String>,
        result: &mut PruneResult,
    ) where
        S: DocumentProvider + DocumentMutator,
    {
        let keys = store.keys();
        for key in keys {
            if removed.contains(&key) {
                continue;
            }
            let Some(text) = store.fetch(&key) else {
                continue;
            };
            let duplicates = duplicate_include_lines(&text);
            if duplicates.is_empty() {
                continue;
            }

            let mut changed = false;
            for span in duplicates.into_iter().rev() {
                if self.options.dry_run {
                    println!("[DRY-RUN] Would drop duplicate declaration {} in: {}", span, key);
                    changed = true;
                } else {
                    match store.remove_span(&key, span) {
                        Ok(true) => changed = true,
                        Ok(false) => {}
                        Err(e) => result.errors.push(format!("dedup {} {}: {}", key, span, e)),
                    }
                }
            }
            if changed {
                result.includes_deduped.push(key.clone());
            }
        }
    }
}

/// Full-line spans of `#uses` lines whose trimmed text repeats an earlier
/// line exactly. First occurrence wins; spans come back in ascending order.
fn duplicate_include_lines(text: &str) -> Vec<Span> {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut duplicates = Vec::new();

    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim();
        if trimmed.starts_with("#uses") && !seen.insert(trimmed) {
            duplicates.push(Span::new(offset, offset + line.len()));
        }
        offset += line.len();
    }

    duplicates
}

/// The excision span for a balanced-brace block: from the start of the
/// statement's leading indentation through the matching close brace, plus
/// trailing blank space up to and including the line break.
///
/// `stmt_start` is the first byte of the statement owning the block (the
/// `if` keyword, say) and `open_pos` its open brace. Unbalanced input
/// yields the scanner's `UnmatchedDelimiter` diagnostic.
pub fn block_excision_span(
    key: &str,
    text: &str,
    stmt_start: usize,
    open_pos: usize,
) -> Result<Span, Diagnostic> {
    let close = find_matching_brace(key, text, open_pos)?;
    let block = BlockSpan {
        open: open_pos,
        close,
    };

    let bytes = text.as_bytes();

    // Take the indentation in front of the statement.
    let mut start = stmt_start;
    while start > 0 && matches!(bytes[start - 1], b' ' | b'\t') {
        start -= 1;
    }

    // Consume trailing horizontal space, the line break, then any fully
    // blank lines left behind by the removal.
    let mut end = block.as_span().end;
    while end < bytes.len() && matches!(bytes[end], b' ' | b'\t') {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'\r' {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'\n' {
        end += 1;
    }
    loop {
        let mut probe = end;
        while probe < bytes.len() && matches!(bytes[probe], b' ' | b'\t') {
            probe += 1;
        }
        if probe < bytes.len() && bytes[probe] == b'\r' {
            probe += 1;
        }
        if probe < bytes.len() && bytes[probe] == b'\n' {
            end = probe + 1;
        } else {
            break;
        }
    }

    Ok(Span::new(start, end))
}

/// Excision spans for a set of candidate blocks, rejecting any candidate
/// whose span overlaps an already-accepted one. Candidates are taken in
/// ascending statement order, so the first block wins.
pub fn excise_blocks(
    key: &str,
    text: &str,
    candidates: &[(usize, usize)],
) -> (Vec<Span>, Vec<Diagnostic>) {
    let mut sorted: Vec<(usize, usize)> = candidates.to_vec();
    sorted.sort();

    let mut accepted: Vec<Span> = Vec::new();
    let mut diagnostics = Vec::new();

    for (stmt_start, open_pos) in sorted {
        match block_excision_span(key, text, stmt_start, open_pos) {
            Ok(span) => {
                if accepted.iter().any(|a| a.overlaps(span)) {
                    continue;
                }
                accepted.push(span);
            }
            Err(d) => diagnostics.push(d),
        }
    }

    (accepted, diagnostics)
}
