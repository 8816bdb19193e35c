//! Lexical scanning: region partitioning and balanced-delimiter matching.
//!
//! The foundation every other component depends on. One left-to-right
//! state machine tracks string literals (three quote dialects), line and
//! block comments, and brace depth, producing either a full region
//! partition of a document or the offset of a matching closing brace.

pub mod lexer;
pub mod region;

// Re-exports for convenience
pub use lexer::{find_matching_brace, next_block_open, scan_regions, RegionScan};
pub use region::{BlockSpan, QuoteDialect, Region, RegionKind, RegionMap, Span};
