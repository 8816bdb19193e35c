//! Prelude module for convenient imports.
//!
//! Import commonly used types with a single line:
//!
//! ```rust,ignore
//! use refscan::prelude::*;
//! ```
//!
//! This provides the most commonly needed types for reachability analysis
//! without polluting the namespace with rarely-used items.

// Core analysis types
pub use crate::error::{Diagnostic, RefscanError, RefscanResult};
pub use crate::scanner::region::{QuoteDialect, RegionKind, Span};

// Document set
pub use crate::store::{DocumentMutator, DocumentProvider, MemoryStore};

// Extraction
pub use crate::extract::{Activity, Occurrence, PatternSet, ReferenceKind};

// Index and graph
pub use crate::graph::{build_graph, close_over, ClosureOutcome, NodeState};
pub use crate::index::{scan_document, DocumentIndex, DocumentScan};

// Classification
pub use crate::classify::{classify, Classification, ClassificationReport};

// Caching
pub use crate::cache::{incremental_index, load_cache, save_cache, ScanCache};

// Configuration
pub use crate::config::{load_config, RefscanConfig};

// Builder API
pub use crate::builder::{AnalysisResult, Refscan};

// Pruning
#[cfg(feature = "prune")]
pub use crate::prune::{PruneExecutor, PruneOptions, PruneResult};
