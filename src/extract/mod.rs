//! Reference extraction and activity classification.
//!
//! Three strictly separated passes feed the graph: [`pattern`] defines the
//! ordered reference shapes and target normalization, [`occurrence`]
//! applies them region-aware and resolves overlaps, and [`activity`] tags
//! each match `Active` or `Inactive` and groups commented-out lines.
//!
//! Keeping region classification and activity classification separate
//! means policy decisions ("inactive-only means orphan") stay pure
//! functions of clearly separated facts.

pub mod activity;
pub mod occurrence;
pub mod pattern;

// Re-exports for convenience
pub use activity::{classify_activity, inactive_group, Activity};
pub use occurrence::{extract_occurrences, ExtractionResult, Occurrence};
pub use pattern::{normalize_target, PatternSet, RefPattern, ReferenceKind};
