//! Reachability graph construction and fixpoint closure.
//!
//! Performance characteristics:
//! - Graph build: O(|V| + |E|) where V = artifacts, E = active references
//! - Closure: each node expands at most once, O(|V| + |E|) total
//!
//! The worklist fixpoint replaces the legacy "re-scan everything until the
//! set stops growing" loops: a formal visited state per node makes the
//! iteration cap a principled safety bound instead of an arbitrary
//! constant, and cycles terminate by construction. Expansion order does
//! not affect the final classification (a node is reachable iff some path
//! from a root exists), but each pass expands in sorted key order so
//! reports are reproducible.

use std::collections::BTreeMap;

use petgraph::graphmap::DiGraphMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Diagnostic;
use crate::index::DocumentIndex;

/// Default cap on fixpoint passes. Generous: passes are bounded by the
/// longest reference chain, and real panel trees are shallow.
pub const DEFAULT_ITERATION_CAP: usize = 64;

/// Visitation state of one artifact key during and after closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeState {
    /// Never reached; becomes `Orphan` at fixpoint.
    Unvisited,
    /// Reached from a root through active references.
    Reachable,
    /// Referenced but no document backs the key.
    Missing,
    /// In the document set but unreached from every root.
    Orphan,
}

/// Builds the reference graph from the scanned index.
///
/// Nodes are artifact keys: every document, plus every active target even
/// when no document backs it (those classify as missing during closure).
/// Edges are active occurrences only; commented-out references
/// contribute nothing.
pub fn build_graph(index: &DocumentIndex) -> DiGraphMap<&str, ()> {
    let mut g = DiGraphMap::new();

    for key in index.keys() {
        g.add_node(key);
    }

    for scan in index.scans() {
        for target in scan.active_targets() {
            g.add_edge(scan.key.as_str(), target, ());
        }
    }

    g
}

/// Result of running closure to fixpoint (or to the iteration cap).
#[derive(Debug, Clone)]
pub struct ClosureOutcome {
    /// Final state per artifact key, documents and missing targets alike.
    pub states: BTreeMap<String, NodeState>,
    /// Number of expansion passes performed.
    pub passes: usize,
    /// False when the iteration cap cut the fixpoint short; the states
    /// computed so far are still valid for what they cover.
    pub converged: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl ClosureOutcome {
    pub fn state_of(&self, key: &str) -> NodeState {
        self.states.get(key).copied().unwrap_or(NodeState::Unvisited)
    }
}

/// Compute the transitively-reachable set from `roots` over active
/// references, classifying every artifact as reachable, missing, or
/// orphaned.
///
/// Roots with no backing document are skipped with a warning, matching
/// the lookup contract: absence is data, not an error. Tolerates cycles;
/// each node expands at most once. `iteration_cap` bounds the number of
/// frontier passes; exceeding it yields a `ClosureDidNotConverge`
/// diagnostic with the partial classification intact.
pub fn close_over(index: &DocumentIndex, roots: &[String], iteration_cap: usize) -> ClosureOutcome {
    let graph = build_graph(index);
    let mut states: BTreeMap<String, NodeState> = index
        .keys()
        .map(|k| (k.to_string(), NodeState::Unvisited))
        .collect();
    let mut diagnostics = Vec::new();

    // Seed with valid roots, sorted for stable expansion order.
    let mut frontier: Vec<String> = Vec::new();
    let mut sorted_roots: Vec<&String> = roots.iter().collect();
    sorted_roots.sort();
    sorted_roots.dedup();
    for root in sorted_roots {
        if index.contains(root) {
            if states.insert(root.clone(), NodeState::Reachable) != Some(NodeState::Reachable) {
                frontier.push(root.clone());
            }
        } else {
            warn!(root = %root, "root artifact not found in document set");
        }
    }

    let mut passes = 0;
    let mut converged = true;

    while !frontier.is_empty() {
        if passes >= iteration_cap {
            converged = false;
            diagnostics.push(Diagnostic::ClosureDidNotConverge {
                passes,
                cap: iteration_cap,
            });
            break;
        }
        passes += 1;

        frontier.sort();
        let mut next = Vec::new();

        for key in frontier.drain(..) {
            for target in graph.neighbors(key.as_str()) {
                if index.contains(target) {
                    let state = states
                        .entry(target.to_string())
                        .or_insert(NodeState::Unvisited);
                    if *state == NodeState::Unvisited {
                        *state = NodeState::Reachable;
                        next.push(target.to_string());
                    }
                } else {
                    states.insert(target.to_string(), NodeState::Missing);
                }
            }
        }

        frontier = next;
    }

    // At fixpoint, every unvisited document is an orphan. Under a blown
    // cap the unexpanded remainder stays unvisited so callers can tell
    // "resolved orphan" from "never reached because we stopped".
    if converged {
        for state in states.values_mut() {
            if *state == NodeState::Unvisited {
                *state = NodeState::Orphan;
            }
        }
    }

    ClosureOutcome {
        states,
        passes,
        converged,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::pattern::PatternSet;
    use crate::index::DocumentIndex;
    use crate::store::MemoryStore;

    fn index_of(docs: &[(&str, &str)]) -> DocumentIndex {
        let store: MemoryStore = docs.iter().copied().collect();
        DocumentIndex::build(&store, &PatternSet::default_panels())
    }

    fn roots(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_build_graph_nodes_and_edges() {
        let index = index_of(&[
            ("objects/m.xml", r#"open("objects/a.xml")"#),
            ("objects/a.xml", ""),
        ]);
        let g = build_graph(&index);
        assert!(g.contains_node("objects/m.xml"));
        assert!(g.contains_node("objects/a.xml"));
        assert!(g.contains_edge("objects/m.xml", "objects/a.xml"));
    }

    #[test]
    fn test_simple_reachability() {
        let index = index_of(&[
            ("objects/m.xml", r#"open("objects/a.xml")"#),
            ("objects/a.xml", ""),
            ("objects/dead.xml", ""),
        ]);
        let outcome = close_over(&index, &roots(&["objects/m.xml"]), DEFAULT_ITERATION_CAP);
        assert!(outcome.converged);
        assert_eq!(outcome.state_of("objects/m.xml"), NodeState::Reachable);
        assert_eq!(outcome.state_of("objects/a.xml"), NodeState::Reachable);
        assert_eq!(outcome.state_of("objects/dead.xml"), NodeState::Orphan);
    }

    #[test]
    fn test_cycle_terminates_both_reachable() {
        let index = index_of(&[
            ("objects/a.xml", r#"open("objects/b.xml")"#),
            ("objects/b.xml", r#"open("objects/a.xml")"#),
        ]);
        let outcome = close_over(&index, &roots(&["objects/a.xml"]), DEFAULT_ITERATION_CAP);
        assert!(outcome.converged);
        assert_eq!(outcome.state_of("objects/a.xml"), NodeState::Reachable);
        assert_eq!(outcome.state_of("objects/b.xml"), NodeState::Reachable);
    }

    #[test]
    fn test_missing_target_classified() {
        let index = index_of(&[("objects/m.xml", r#"open("objects/ghost.xml")"#)]);
        let outcome = close_over(&index, &roots(&["objects/m.xml"]), DEFAULT_ITERATION_CAP);
        assert_eq!(outcome.state_of("objects/ghost.xml"), NodeState::Missing);
    }

    #[test]
    fn test_commented_reference_leaves_orphan() {
        // M actively references X; X references Y only in a line comment.
        let index = index_of(&[
            ("objects/m.xml", r#"open("objects/x.xml")"#),
            ("objects/x.xml", "// open(\"objects/y.xml\")\n"),
            ("objects/y.xml", ""),
        ]);
        let outcome = close_over(&index, &roots(&["objects/m.xml"]), DEFAULT_ITERATION_CAP);
        assert_eq!(outcome.state_of("objects/m.xml"), NodeState::Reachable);
        assert_eq!(outcome.state_of("objects/x.xml"), NodeState::Reachable);
        assert_eq!(outcome.state_of("objects/y.xml"), NodeState::Orphan);
    }

    #[test]
    fn test_unknown_root_skipped() {
        let index = index_of(&[("objects/m.xml", "")]);
        let outcome = close_over(
            &index,
            &roots(&["objects/m.xml", "objects/nope.xml"]),
            DEFAULT_ITERATION_CAP,
        );
        assert_eq!(outcome.state_of("objects/m.xml"), NodeState::Reachable);
        assert!(!outcome.states.contains_key("objects/nope.xml"));
    }

    #[test]
    fn test_iteration_cap_reports_partial() {
        // Chain of four documents with a cap of two passes.
        let index = index_of(&[
            ("objects/a.xml", r#"open("objects/b.xml")"#),
            ("objects/b.xml", r#"open("objects/c.xml")"#),
            ("objects/c.xml", r#"open("objects/d.xml")"#),
            ("objects/d.xml", ""),
        ]);
        let outcome = close_over(&index, &roots(&["objects/a.xml"]), 2);
        assert!(!outcome.converged);
        assert!(matches!(
            outcome.diagnostics[0],
            Diagnostic::ClosureDidNotConverge { passes: 2, cap: 2 }
        ));
        // Only the passes that actually ran are counted
        assert_eq!(outcome.passes, 2);
        // What was resolved stays resolved
        assert_eq!(outcome.state_of("objects/a.xml"), NodeState::Reachable);
        assert_eq!(outcome.state_of("objects/b.xml"), NodeState::Reachable);
        // The unexpanded tail is not misreported as orphaned
        assert_eq!(outcome.state_of("objects/d.xml"), NodeState::Unvisited);
    }

    #[test]
    fn test_determinism_across_runs() {
        let docs = [
            ("objects/m.xml", r#"open("objects/a.xml"); open("objects/b.xml")"#),
            ("objects/a.xml", r#"open("objects/b.xml")"#),
            ("objects/b.xml", ""),
            ("objects/orphan.xml", r#"open("objects/a.xml")"#),
        ];
        let a = close_over(&index_of(&docs), &roots(&["objects/m.xml"]), DEFAULT_ITERATION_CAP);
        let b = close_over(&index_of(&docs), &roots(&["objects/m.xml"]), DEFAULT_ITERATION_CAP);
        assert_eq!(a.states, b.states);
        assert_eq!(a.passes, b.passes);
    }

    #[test]
    fn test_empty_roots_all_orphans() {
        let index = index_of(&[("objects/a.xml", ""), ("objects/b.xml", "")]);
        let outcome = close_over(&index, &[], DEFAULT_ITERATION_CAP);
        assert!(outcome.converged);
        assert_eq!(outcome.state_of("objects/a.xml"), NodeState::Orphan);
        assert_eq!(outcome.state_of("objects/b.xml"), NodeState::Orphan);
    }
}
