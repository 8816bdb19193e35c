//! Final per-artifact classification and report assembly.
//!
//! Takes the scanned index plus the closure outcome and folds them into a
//! single serializable report: one verdict per artifact, the missing
//! targets with every source location that names them, and the inventory
//! of commented-out references that pruning may remove.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Diagnostic;
use crate::graph::{ClosureOutcome, NodeState};
use crate::index::DocumentIndex;
use crate::scanner::region::Span;

/// Verdict for one artifact key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    /// Reached from a root through active references.
    Reachable,
    /// In the document set but unreached from every root.
    Orphan,
    /// Referenced but no document backs the key.
    Missing,
}

/// One place that references a missing target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingSource {
    pub key: String,
    pub span: Span,
    pub line: usize,
}

/// A referenced target with no backing document, with every active
/// reference that names it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingRef {
    pub target: String,
    pub sources: Vec<MissingSource>,
}

/// One commented-out reference, with the whole inactive block it sits in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InactiveRef {
    pub key: String,
    pub target: String,
    pub span: Span,
    pub group: Span,
    pub line: usize,
}

/// The complete analysis result, ready for rendering or serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// Verdict per artifact key. Under a blown iteration cap, artifacts
    /// the closure never resolved are absent rather than guessed at.
    pub classifications: BTreeMap<String, Classification>,
    /// Missing targets in sorted order, each with its source locations.
    pub missing: Vec<MissingRef>,
    /// All commented-out references across the document set.
    pub inactive: Vec<InactiveRef>,
    pub diagnostics: Vec<Diagnostic>,
    pub converged: bool,
    pub passes: usize,
}

impl ClassificationReport {
    /// Keys with the given verdict, in sorted order.
    pub fn keys_with(&self, verdict: Classification) -> Vec<&str> {
        self.classifications
            .iter()
            .filter(|(_, c)| **c == verdict)
            .map(|(k, _)| k.as_str())
            .collect()
    }

    pub fn orphans(&self) -> Vec<&str> {
        self.keys_with(Classification::Orphan)
    }

    pub fn reachable(&self) -> Vec<&str> {
        self.keys_with(Classification::Reachable)
    }

    pub fn classification_of(&self, key: &str) -> Option<Classification> {
        self.classifications.get(key).copied()
    }
}

/// Fold the index and the closure outcome into the final report.
pub fn classify(index: &DocumentIndex, outcome: &ClosureOutcome) -> ClassificationReport {
    let mut classifications = BTreeMap::new();
    for (key, state) in &outcome.states {
        let verdict = match state {
            NodeState::Reachable => Classification::Reachable,
            NodeState::Orphan => Classification::Orphan,
            NodeState::Missing => Classification::Missing,
            // Unresolved under a blown cap: no verdict
            NodeState::Unvisited => continue,
        };
        classifications.insert(key.clone(), verdict);
    }

    let missing = collect_missing(index, &classifications);
    let inactive = collect_inactive(index);

    let mut diagnostics: Vec<Diagnostic> = index.diagnostics().cloned().collect();
    diagnostics.extend(outcome.diagnostics.iter().cloned());

    ClassificationReport {
        classifications,
        missing,
        inactive,
        diagnostics,
        converged: outcome.converged,
        passes: outcome.passes,
    }
}

/// Every active reference to each missing target, grouped by target.
/// BTreeMap keyed by target keeps the listing sorted.
fn collect_missing(
    index: &DocumentIndex,
    classifications: &BTreeMap<String, Classification>,
) -> Vec<MissingRef> {
    let mut by_target: BTreeMap<&str, Vec<MissingSource>> = BTreeMap::new();

    for (key, verdict) in classifications {
        if *verdict != Classification::Missing {
            continue;
        }
        let sources = by_target.entry(key.as_str()).or_default();
        for r in index.active_refs_to(key) {
            sources.push(MissingSource {
                key: r.occurrence.key.clone(),
                span: r.occurrence.span,
                line: r.occurrence.line,
            });
        }
    }

    by_target
        .into_iter()
        .map(|(target, mut sources)| {
            sources.sort_by(|a, b| (&a.key, a.span).cmp(&(&b.key, b.span)));
            MissingRef {
                target: target.to_string(),
                sources,
            }
        })
        .collect()
}

fn collect_inactive(index: &DocumentIndex) -> Vec<InactiveRef> {
    let mut inactive = Vec::new();
    for scan in index.scans() {
        for r in scan.refs.iter().filter(|r| !r.is_active()) {
            inactive.push(InactiveRef {
                key: scan.key.clone(),
                target: r.occurrence.target.clone(),
                span: r.occurrence.span,
                group: r.group.unwrap_or(r.occurrence.span),
                line: r.occurrence.line,
            });
        }
    }
    inactive
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::pattern::PatternSet;
    use crate::graph::{close_over, DEFAULT_ITERATION_CAP};
    use crate::store::MemoryStore;

    fn report_of(docs: &[(&str, &str)], roots: &[&str]) -> ClassificationReport {
        let store: MemoryStore = docs.iter().copied().collect();
        let index = DocumentIndex::build(&store, &PatternSet::default_panels());
        let roots: Vec<String> = roots.iter().map(|s| s.to_string()).collect();
        let outcome = close_over(&index, &roots, DEFAULT_ITERATION_CAP);
        classify(&index, &outcome)
    }

    #[test]
    fn test_verdicts_cover_all_states() {
        let report = report_of(
            &[
                ("objects/m.xml", r#"open("objects/a.xml"); open("objects/ghost.xml")"#),
                ("objects/a.xml", ""),
                ("objects/dead.xml", ""),
            ],
            &["objects/m.xml"],
        );
        assert_eq!(
            report.classification_of("objects/m.xml"),
            Some(Classification::Reachable)
        );
        assert_eq!(
            report.classification_of("objects/dead.xml"),
            Some(Classification::Orphan)
        );
        assert_eq!(
            report.classification_of("objects/ghost.xml"),
            Some(Classification::Missing)
        );
    }

    #[test]
    fn test_missing_carries_source_locations() {
        let report = report_of(
            &[
                ("objects/m.xml", r#"open("objects/ghost.xml")"#),
                ("objects/n.xml", r#"also("objects/ghost.xml")"#),
            ],
            &["objects/m.xml", "objects/n.xml"],
        );
        assert_eq!(report.missing.len(), 1);
        let m = &report.missing[0];
        assert_eq!(m.target, "objects/ghost.xml");
        assert_eq!(m.sources.len(), 2);
        assert_eq!(m.sources[0].key, "objects/m.xml");
        assert_eq!(m.sources[1].key, "objects/n.xml");
        assert_eq!(m.sources[0].line, 1);
    }

    #[test]
    fn test_inactive_inventory() {
        let report = report_of(
            &[(
                "objects/m.xml",
                "open(\"objects/live.xml\");\n// open(\"objects/gone.xml\");\n",
            )],
            &["objects/m.xml"],
        );
        assert_eq!(report.inactive.len(), 1);
        let i = &report.inactive[0];
        assert_eq!(i.target, "objects/gone.xml");
        assert_eq!(i.line, 2);
        assert!(i.group.len() >= i.span.len());
    }

    #[test]
    fn test_orphans_sorted() {
        let report = report_of(
            &[
                ("objects/z.xml", ""),
                ("objects/a.xml", ""),
                ("objects/m.xml", ""),
            ],
            &["objects/m.xml"],
        );
        assert_eq!(report.orphans(), vec!["objects/a.xml", "objects/z.xml"]);
    }

    #[test]
    fn test_report_serializes() {
        let report = report_of(&[("objects/m.xml", "")], &["objects/m.xml"]);
        let json = serde_json::to_string(&report).unwrap();
        let back: ClassificationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.classifications.len(), 1);
        assert!(back.converged);
    }
}
