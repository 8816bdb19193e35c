//! refscan: artifact reachability and block-extraction engine.
//!
//! This library scans a set of text documents (panel markup and control
//! scripts) for string-encoded references to other documents, classifies
//! each reference as live or commented out, and computes which documents
//! are reachable from a set of root artifacts. Everything unreached is an
//! orphan; everything referenced but absent is missing.
//!
//! # Features
//!
//! - **Region scanning**: partition document text into code, string
//!   literal (three quote dialects), and comment regions
//! - **Reference extraction**: ordered pattern matching with overlap
//!   resolution and target normalization
//! - **Activity classification**: commented-out references are inventoried
//!   but contribute no reachability
//! - **Worklist closure**: cycle-tolerant fixpoint with a bounded pass cap
//! - **Incremental caching**: only re-scan changed documents
//! - **Pruning**: fail-closed removal of confirmed orphans and the dead
//!   text that referenced them
//!
//! # Quick Start
//!
//! Use the [`prelude`] module for convenient imports:
//!
//! ```rust,ignore
//! use refscan::prelude::*;
//!
//! let store: MemoryStore = documents.into_iter().collect();
//! let result = Refscan::new()
//!     .root("mnemo/main.xml")
//!     .analyze(&store)?;
//!
//! for orphan in &result.orphans {
//!     println!("Orphaned: {}", orphan);
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`scanner`]: region partition and the dialect-aware lexer
//! - [`extract`]: reference patterns, occurrence extraction, activity
//! - [`store`]: document set traits and the in-memory store
//! - [`index`]: per-run document index, built in parallel
//! - [`graph`]: reachability graph and fixpoint closure
//! - [`classify`]: final per-artifact verdicts and report assembly
//! - [`report`]: plaintext and JSON rendering
//! - [`cache`]: incremental scan cache with SHA-256 change detection
//! - [`config`]: refscan.toml loading
//! - [`builder`]: fluent builder API
//! - [`error`]: typed errors and non-fatal diagnostics
//!
//! # Cargo Features
//!
//! - `prune` (default): enable the pruning executor

pub mod builder;
pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod extract;
pub mod graph;
pub mod index;
pub mod logging;
pub mod prelude;
pub mod report;
pub mod scanner;
pub mod store;

// Feature-gated modules
#[cfg(feature = "prune")]
pub mod prune;

// ============================================================================
// Explicit Re-exports (avoiding glob imports for clear API surface)
// ============================================================================

// Error types
pub use error::{Diagnostic, OpenDelimiter, RefscanError, RefscanResult};

// Builder API
pub use builder::{AnalysisResult, Refscan};

// Scanner types
pub use scanner::lexer::{find_matching_brace, next_block_open, scan_regions, RegionScan};
pub use scanner::region::{BlockSpan, QuoteDialect, Region, RegionKind, RegionMap, Span};

// Extraction
pub use extract::activity::{classify_activity, inactive_group, Activity};
pub use extract::occurrence::{extract_occurrences, ExtractionResult, Occurrence};
pub use extract::pattern::{normalize_target, PatternSet, RefPattern, ReferenceKind};

// Document set
pub use store::{DocumentMutator, DocumentProvider, MemoryStore};

// Index
pub use index::{scan_document, DocumentIndex, DocumentScan, ScannedRef};

// Graph and closure
pub use graph::{build_graph, close_over, ClosureOutcome, NodeState, DEFAULT_ITERATION_CAP};

// Classification
pub use classify::{
    classify, Classification, ClassificationReport, InactiveRef, MissingRef, MissingSource,
};

// Reporting
pub use report::{print_json, print_plain, render_json, render_plain};

// Cache types
pub use cache::{
    content_hash, incremental_index, load_cache, save_cache, CacheMetadata, ScanCache,
};

// Configuration
pub use config::{load_config, OutputConfig, RefscanConfig};

// Logging
pub use logging::{init_structured_logging, log_error, log_event, log_info, log_warn};

// Feature-gated re-exports
#[cfg(feature = "prune")]
pub use prune::{
    block_excision_span, excise_blocks, PruneExecutor, PruneOptions, PruneResult,
};
