//! Region model: classified spans over a document's text.
//!
//! A scan pass partitions a document into non-overlapping half-open spans,
//! each tagged as code, string literal (per quoting dialect), or comment.
//! The partition always covers the full document, including malformed
//! tails left open at end of input.

use serde::{Deserialize, Serialize};

/// How a string literal is delimited in the source text.
///
/// All three dialects can appear in the same document: panel markup embeds
/// script fragments both raw (CDATA) and attribute-escaped, so a quote may
/// arrive as `"`, `\"`, or `&quot;`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuoteDialect {
    /// Plain double quote: `"..."`
    Plain,
    /// Backslash-escaped double quote: `\"...\"`
    Backslash,
    /// Markup entity quote: `&quot;...&quot;`
    Entity,
}

impl QuoteDialect {
    /// The byte sequence that opens and closes this dialect.
    pub fn delimiter(&self) -> &'static str {
        match self {
            Self::Plain => "\"",
            Self::Backslash => "\\\"",
            Self::Entity => "&quot;",
        }
    }
}

impl std::fmt::Display for QuoteDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain-quote"),
            Self::Backslash => write!(f, "backslash-quote"),
            Self::Entity => write!(f, "entity-quote"),
        }
    }
}

/// Classification of a region of document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionKind {
    /// Live script/markup text outside strings and comments.
    Code,
    /// Inside a string literal, delimiters included.
    StringLiteral(QuoteDialect),
    /// `//` to end of line, newline included.
    LineComment,
    /// `/* ... */`, delimiters included.
    BlockComment,
}

impl RegionKind {
    /// Whether this region kind is a comment.
    pub fn is_comment(&self) -> bool {
        matches!(self, Self::LineComment | Self::BlockComment)
    }
}

/// A half-open byte span `[start, end)` over a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start must not exceed end");
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `offset` lies inside this span.
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }

    /// Whether `other` lies entirely inside this span.
    pub fn contains_span(&self, other: Span) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    /// Whether the two spans share at least one byte.
    pub fn overlaps(&self, other: Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// A classified span of document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub span: Span,
    pub kind: RegionKind,
}

/// A balanced-delimiter extent: byte offsets of the opening and matching
/// closing brace. Used to delete or extract a syntactic unit atomically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSpan {
    pub open: usize,
    pub close: usize,
}

impl BlockSpan {
    /// Span covering the block including both braces.
    pub fn as_span(&self) -> Span {
        Span::new(self.open, self.close + 1)
    }
}

/// Full region partition of one document.
///
/// Invariants (guaranteed by the scanner):
/// - regions are sorted by start offset and never overlap
/// - their union covers `[0, document_len)`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionMap {
    regions: Vec<Region>,
    document_len: usize,
}

impl RegionMap {
    pub(crate) fn new(regions: Vec<Region>, document_len: usize) -> Self {
        debug_assert_eq!(
            regions.iter().map(|r| r.span.len()).sum::<usize>(),
            document_len,
            "region partition must cover the whole document"
        );
        Self {
            regions,
            document_len,
        }
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn document_len(&self) -> usize {
        self.document_len
    }

    /// The region kind at a byte offset, or `None` past end of document.
    pub fn kind_at(&self, offset: usize) -> Option<RegionKind> {
        self.region_at(offset).map(|r| r.kind)
    }

    /// The region containing a byte offset.
    pub fn region_at(&self, offset: usize) -> Option<&Region> {
        if offset >= self.document_len {
            return None;
        }
        let idx = self
            .regions
            .partition_point(|r| r.span.end <= offset);
        self.regions.get(idx).filter(|r| r.span.contains(offset))
    }

    /// Whether any part of `span` lies inside a comment region.
    pub fn intersects_comment(&self, span: Span) -> bool {
        self.regions
            .iter()
            .any(|r| r.kind.is_comment() && r.span.overlaps(span))
    }

    /// Whether `span` lies entirely inside a single region of the given kind.
    pub fn fully_within(&self, span: Span, kind: RegionKind) -> bool {
        self.regions
            .iter()
            .any(|r| r.kind == kind && r.span.contains_span(span))
    }

    /// The comment region fully containing `span`, if any.
    pub fn enclosing_comment(&self, span: Span) -> Option<&Region> {
        self.regions
            .iter()
            .find(|r| r.kind.is_comment() && r.span.contains_span(span))
    }
}
