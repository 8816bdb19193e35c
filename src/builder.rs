//! Builder pattern API for reachability analysis.
//!
//! Provides a fluent interface for configuring and running a scan:
//!
//! ```rust,ignore
//! use refscan::prelude::*;
//!
//! let store: MemoryStore = documents.into_iter().collect();
//! let result = Refscan::new()
//!     .root("mnemo/main.xml")
//!     .ignore_patterns(["objects/legacy_*"])
//!     .analyze(&store)?;
//!
//! println!("Orphans: {:?}", result.orphans);
//! ```

use std::path::PathBuf;

use anyhow::Result;
use tracing::warn;

use crate::cache;
use crate::classify::{classify, ClassificationReport};
use crate::extract::pattern::PatternSet;
use crate::graph::{close_over, DEFAULT_ITERATION_CAP};
use crate::index::DocumentIndex;
use crate::store::DocumentProvider;

/// Builder for configuring reachability analysis.
#[derive(Debug, Clone)]
pub struct Refscan {
    /// Artifact keys that seed the closure
    roots: Vec<String>,

    /// Reference shapes to extract
    patterns: PatternSet,

    /// Cap on closure passes
    iteration_cap: usize,

    /// Key patterns whose orphanhood is not reported
    ignored_patterns: Vec<String>,

    /// Dry-run mode for pruning (no store mutations)
    dry_run: bool,

    /// Directory for the incremental scan cache, if caching is enabled
    cache_dir: Option<PathBuf>,
}

impl Default for Refscan {
    fn default() -> Self {
        Self::new()
    }
}

impl Refscan {
    /// Create a new analysis builder with the default panel patterns.
    pub fn new() -> Self {
        Self {
            roots: Vec::new(),
            patterns: PatternSet::default_panels(),
            iteration_cap: DEFAULT_ITERATION_CAP,
            ignored_patterns: Vec::new(),
            dry_run: false,
            cache_dir: None,
        }
    }

    /// Add one root artifact key.
    pub fn root(mut self, key: impl Into<String>) -> Self {
        self.roots.push(key.into());
        self
    }

    /// Add several root artifact keys.
    pub fn roots(mut self, keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.roots.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Replace the reference patterns.
    pub fn patterns(mut self, patterns: PatternSet) -> Self {
        self.patterns = patterns;
        self
    }

    /// Override the closure iteration cap.
    pub fn iteration_cap(mut self, cap: usize) -> Self {
        self.iteration_cap = cap;
        self
    }

    /// Add patterns for artifact keys whose orphanhood is not reported.
    pub fn ignore_patterns(mut self, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.ignored_patterns
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Enable dry-run mode (pruning reports without mutating).
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Enable the incremental scan cache in the given directory.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Run the analysis and return results.
    pub fn analyze<P: DocumentProvider + ?Sized>(&self, provider: &P) -> Result<AnalysisResult> {
        // 1. Scan (incremental when a cache directory is configured)
        let index = if let Some(dir) = &self.cache_dir {
            let cached = cache::load_cache(dir);
            let (index, new_cache) =
                cache::incremental_index(provider, &self.patterns, cached.as_ref());
            // Best-effort save
            if let Err(e) = cache::save_cache(dir, &new_cache) {
                warn!(error = %e, "cache save failed");
            }
            index
        } else {
            DocumentIndex::build(provider, &self.patterns)
        };

        // 2. Closure over active references
        let outcome = close_over(&index, &self.roots, self.iteration_cap);

        // 3. Fold into the report
        let report = classify(&index, &outcome);

        let total_documents = index.len();
        let reachable: Vec<String> = report.reachable().iter().map(|s| s.to_string()).collect();
        let orphans: Vec<String> = report
            .orphans()
            .iter()
            .filter(|k| !self.is_ignored(k))
            .map(|s| s.to_string())
            .collect();
        let missing: Vec<String> = report.missing.iter().map(|m| m.target.clone()).collect();

        Ok(AnalysisResult {
            report,
            total_documents,
            reachable,
            orphans,
            missing,
        })
    }

    /// Check if an artifact key matches any ignored pattern.
    fn is_ignored(&self, key: &str) -> bool {
        for pattern in &self.ignored_patterns {
            if pattern.ends_with('*') {
                let prefix = &pattern[..pattern.len() - 1];
                if key.starts_with(prefix) {
                    return true;
                }
            } else if let Some(suffix) = pattern.strip_prefix('*') {
                if key.ends_with(suffix) {
                    return true;
                }
            } else if key == pattern || key.contains(pattern) {
                return true;
            }
        }
        false
    }

    /// Prune the orphans found by a previous [`analyze`](Self::analyze) run,
    /// re-confirming each against the store's current contents.
    #[cfg(feature = "prune")]
    pub fn prune<S>(&self, store: &mut S, result: &AnalysisResult) -> Result<crate::prune::PruneResult>
    where
        S: DocumentProvider + crate::store::DocumentMutator,
    {
        let options = crate::prune::PruneOptions {
            dry_run: self.dry_run,
            iteration_cap: self.iteration_cap,
            ..Default::default()
        };
        let executor = crate::prune::PruneExecutor::new(&self.patterns, options);
        Ok(executor.execute(store, &result.orphans, &self.roots)?)
    }
}

/// Result of running reachability analysis.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// The full classification report
    pub report: ClassificationReport,

    /// Total number of documents scanned
    pub total_documents: usize,

    /// Artifacts reachable from the roots
    pub reachable: Vec<String>,

    /// Orphaned artifacts, with ignored patterns filtered out
    pub orphans: Vec<String>,

    /// Referenced targets with no backing document
    pub missing: Vec<String>,
}

impl AnalysisResult {
    /// Check if any orphans were found.
    pub fn has_orphans(&self) -> bool {
        !self.orphans.is_empty()
    }

    /// Get percentage of orphaned documents.
    pub fn orphan_percentage(&self) -> f64 {
        if self.total_documents == 0 {
            0.0
        } else {
            (self.orphans.len() as f64 / self.total_documents as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn store() -> MemoryStore {
        [
            ("mnemo/main.xml", r#"open("objects/a.xml")"#),
            ("objects/a.xml", ""),
            ("objects/dead.xml", ""),
            ("objects/legacy_old.xml", ""),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_builder_basic() {
        let result = Refscan::new()
            .root("mnemo/main.xml")
            .analyze(&store())
            .unwrap();

        assert_eq!(result.total_documents, 4);
        assert!(result.orphans.contains(&"objects/dead.xml".to_string()));
        assert!(!result.orphans.contains(&"objects/a.xml".to_string()));
        assert!(result.has_orphans());
    }

    #[test]
    fn test_builder_ignore_patterns() {
        let result = Refscan::new()
            .root("mnemo/main.xml")
            .ignore_patterns(["objects/legacy_*"])
            .analyze(&store())
            .unwrap();

        assert!(!result.orphans.contains(&"objects/legacy_old.xml".to_string()));
        assert!(result.orphans.contains(&"objects/dead.xml".to_string()));
    }

    #[test]
    fn test_orphan_percentage() {
        let result = Refscan::new()
            .root("mnemo/main.xml")
            .analyze(&store())
            .unwrap();
        // 2 orphans out of 4 documents
        assert!((result.orphan_percentage() - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_builder_with_cache_dir() {
        let dir = std::env::temp_dir()
            .join("refscan_builder_test")
            .join(format!("cache_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let builder = Refscan::new().root("mnemo/main.xml").with_cache_dir(&dir);
        let first = builder.analyze(&store()).unwrap();
        // Second run hits the cache and must agree
        let second = builder.analyze(&store()).unwrap();
        assert_eq!(first.orphans, second.orphans);
        assert_eq!(first.reachable, second.reachable);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[cfg(feature = "prune")]
    #[test]
    fn test_builder_prune_roundtrip() {
        let mut docs = store();
        let builder = Refscan::new()
            .root("mnemo/main.xml")
            .ignore_patterns(["objects/legacy_*"]);

        let analysis = builder.analyze(&docs).unwrap();
        let pruned = builder.prune(&mut docs, &analysis).unwrap();

        assert_eq!(pruned.documents_removed, vec!["objects/dead.xml"]);
        // Ignored keys survive pruning
        assert!(docs.exists("objects/legacy_old.xml"));

        // Idempotent: a fresh analysis finds nothing more to prune
        let again = builder.analyze(&docs).unwrap();
        let pruned_again = builder.prune(&mut docs, &again).unwrap();
        assert!(pruned_again.is_noop());
    }

    #[test]
    fn test_is_ignored_shapes() {
        let b = Refscan::new().ignore_patterns(["pre_*", "*_post.xml", "exact"]);
        assert!(b.is_ignored("pre_anything"));
        assert!(b.is_ignored("thing_post.xml"));
        assert!(b.is_ignored("exact"));
        assert!(!b.is_ignored("other"));
    }
}
