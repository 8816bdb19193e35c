//! Typed error handling for refscan.
//!
//! Two layers, matching how failures actually behave during a run:
//!
//! - [`RefscanError`]: hard failures that stop an operation (bad pattern,
//!   unreadable config, a mutation that cannot be applied). Library
//!   consumers can match on these.
//! - [`Diagnostic`]: recoverable conditions surfaced in reports. A
//!   malformed document never aborts the run; its diagnostics are scoped
//!   to that document and the scan continues.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::extract::pattern::ReferenceKind;
use crate::scanner::region::{QuoteDialect, Span};

/// Main error type for refscan operations.
#[derive(Error, Debug)]
pub enum RefscanError {
    /// A document could not be fetched or mutated.
    #[error("Document error for '{key}': {message}")]
    Document { key: String, message: String },

    /// A reference pattern failed to compile.
    #[error("Pattern error: {message}")]
    Pattern { message: String },

    /// Configuration file errors.
    #[error("Config error at {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// Cache-related errors.
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// Pruning operation errors.
    #[error("Prune error: {message}")]
    Prune { message: String },

    /// Invalid argument provided.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Generic internal error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl RefscanError {
    /// Create a document error with key context.
    pub fn document(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Document {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a pattern error.
    pub fn pattern(message: impl Into<String>) -> Self {
        Self::Pattern {
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a cache error.
    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Create a prune error.
    pub fn prune(message: impl Into<String>) -> Self {
        Self::Prune {
            message: message.into(),
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Check if this is a recoverable error (can continue the run).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Document { .. } | Self::Cache { .. } | Self::Config { .. }
        )
    }

    /// Get the document key associated with this error, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Document { key, .. } => Some(key),
            _ => None,
        }
    }
}

/// Convenience type alias for refscan results.
pub type RefscanResult<T> = Result<T, RefscanError>;

/// Which delimiter was left open when the scanner hit end of document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpenDelimiter {
    /// An opening brace with no matching closer.
    Brace,
    /// A `/*` with no `*/` before end of document.
    BlockComment,
    /// A string opener whose dialect closer never appears.
    StringLiteral(QuoteDialect),
}

impl std::fmt::Display for OpenDelimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Brace => write!(f, "brace"),
            Self::BlockComment => write!(f, "block comment"),
            Self::StringLiteral(d) => write!(f, "{} string", d),
        }
    }
}

/// Recoverable conditions surfaced alongside results.
///
/// None of these abort a run: the scanner keeps going, the closure returns
/// its partial classification, and the executor refuses the single unsafe
/// deletion and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// The scanner could not find a closer before end of document.
    /// The remainder of the document is classified as the open region.
    #[error("'{key}': unmatched {delimiter} opened at offset {offset}")]
    UnmatchedDelimiter {
        key: String,
        offset: usize,
        delimiter: OpenDelimiter,
    },

    /// The fixpoint loop hit its iteration cap. The classification computed
    /// so far is still reported.
    #[error("closure did not converge after {passes} passes (cap {cap})")]
    ClosureDidNotConverge { passes: usize, cap: usize },

    /// Two same-kind patterns matched overlapping spans that normalize to
    /// different targets. Resolved by pattern priority order; the winner is
    /// kept and the conflict reported here.
    #[error("'{key}': ambiguous {kind} overlap at {span}: kept '{winner}', dropped '{loser}'")]
    AmbiguousOverlap {
        key: String,
        span: Span,
        kind: ReferenceKind,
        winner: String,
        loser: String,
    },

    /// Pre-deletion re-confirmation found a live reference that the cached
    /// classification missed. The deletion is refused.
    #[error("'{key}': stale classification, still actively referenced by '{referenced_by}' at {span}")]
    StaleClassification {
        key: String,
        referenced_by: String,
        span: Span,
    },
}

impl Diagnostic {
    /// The document key this diagnostic is scoped to, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::UnmatchedDelimiter { key, .. } => Some(key),
            Self::AmbiguousOverlap { key, .. } => Some(key),
            Self::StaleClassification { key, .. } => Some(key),
            Self::ClosureDidNotConverge { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_error() {
        let err = RefscanError::document("panels/a.xml", "not found");
        assert!(matches!(err, RefscanError::Document { .. }));
        assert_eq!(err.key(), Some("panels/a.xml"));
        assert!(err.to_string().contains("panels/a.xml"));
    }

    #[test]
    fn test_is_recoverable() {
        assert!(RefscanError::document("k", "gone").is_recoverable());
        assert!(RefscanError::cache("stale").is_recoverable());
        assert!(!RefscanError::pattern("bad regex").is_recoverable());
        assert!(!RefscanError::prune("refused").is_recoverable());
    }

    #[test]
    fn test_diagnostic_display() {
        let d = Diagnostic::UnmatchedDelimiter {
            key: "a.xml".into(),
            offset: 42,
            delimiter: OpenDelimiter::BlockComment,
        };
        let text = d.to_string();
        assert!(text.contains("a.xml"));
        assert!(text.contains("block comment"));
        assert!(text.contains("42"));
    }

    #[test]
    fn test_diagnostic_key() {
        let d = Diagnostic::ClosureDidNotConverge { passes: 64, cap: 64 };
        assert_eq!(d.key(), None);
    }
}
