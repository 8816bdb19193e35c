//! Region-aware reference extraction.
//!
//! Applies an ordered [`PatternSet`] to a document and produces located
//! [`Occurrence`]s tagged with the region kind at the match site. Every
//! occurrence is reported regardless of region; deciding whether a match
//! counts is the activity classifier's job, which keeps the extractor
//! pattern-agnostic.
//!
//! Overlap rule: patterns are tried in priority order, and the extractor
//! never emits two overlapping occurrences of the same reference kind. A
//! suppressed overlap that would have normalized to a *different* target
//! is reported as an `AmbiguousOverlap` diagnostic; a more general shape
//! re-matching the same target is the designed specific-over-general case
//! and stays silent.

use serde::{Deserialize, Serialize};

use crate::error::Diagnostic;
use crate::extract::pattern::{normalize_target, PatternSet, ReferenceKind};
use crate::scanner::region::{QuoteDialect, RegionKind, RegionMap, Span};

/// A located match of a reference pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    /// Source document key.
    pub key: String,
    /// Byte span of the full match in the source document.
    pub span: Span,
    /// Raw matched target text, dialect wrappers intact.
    pub raw: String,
    /// Normalized reference target (canonical artifact key).
    pub target: String,
    /// Reference kind this occurrence was matched as.
    pub kind: ReferenceKind,
    /// Quote dialect the reference was encoded in.
    pub dialect: QuoteDialect,
    /// Region kind at the match start.
    pub region: RegionKind,
    /// 1-indexed line of the match start.
    pub line: usize,
}

/// All occurrences found in one document, plus extraction diagnostics.
#[derive(Debug, Clone, Default)]
pub struct ExtractionResult {
    pub occurrences: Vec<Occurrence>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Byte offsets of line starts, for O(log n) offset→line lookup.
pub(crate) fn line_starts(text: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (i, b) in text.bytes().enumerate() {
        if b == b'\n' {
            starts.push(i + 1);
        }
    }
    starts
}

/// 1-indexed line containing a byte offset.
pub(crate) fn line_of(starts: &[usize], offset: usize) -> usize {
    starts.partition_point(|&s| s <= offset)
}

/// Extract all reference occurrences from one document.
///
/// `map` is the document's region partition from the lexical scanner; it
/// supplies the region kind per match and the dialect for patterns that do
/// not imply one themselves.
pub fn extract_occurrences(
    key: &str,
    text: &str,
    map: &RegionMap,
    patterns: &PatternSet,
) -> ExtractionResult {
    let mut result = ExtractionResult::default();
    let starts = line_starts(text);

    // Spans already claimed, per reference kind.
    let mut claimed: Vec<(Span, ReferenceKind, String)> = Vec::new();

    for pattern in patterns.patterns() {
        for caps in pattern.regex.captures_iter(text) {
            let m = caps.get(0).expect("capture 0 always present");
            let span = Span::new(m.start(), m.end());
            let raw = caps
                .get(1)
                .map(|g| g.as_str())
                .unwrap_or(m.as_str())
                .to_string();
            let target = normalize_target(&raw, pattern.kind);

            if let Some((_, _, winner)) = claimed
                .iter()
                .find(|(s, k, _)| *k == pattern.kind && s.overlaps(span))
            {
                if *winner != target {
                    result.diagnostics.push(Diagnostic::AmbiguousOverlap {
                        key: key.to_string(),
                        span,
                        kind: pattern.kind,
                        winner: winner.clone(),
                        loser: target,
                    });
                }
                continue;
            }

            let region = map.kind_at(span.start).unwrap_or(RegionKind::Code);
            let dialect = pattern.dialect.unwrap_or(match region {
                RegionKind::StringLiteral(d) => d,
                _ => QuoteDialect::Plain,
            });

            claimed.push((span, pattern.kind, target.clone()));
            result.occurrences.push(Occurrence {
                key: key.to_string(),
                span,
                raw,
                target,
                kind: pattern.kind,
                dialect,
                region,
                line: line_of(&starts, span.start),
            });
        }
    }

    // Stable report order: by position, independent of pattern order.
    result.occurrences.sort_by_key(|o| (o.span.start, o.span.end));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::lexer::scan_regions;

    fn extract(text: &str) -> ExtractionResult {
        let scan = scan_regions("doc", text);
        extract_occurrences("doc", text, &scan.map, &PatternSet::default_panels())
    }

    #[test]
    fn test_extract_panel_ref_in_string() {
        let text = r#"ChildPanelOnRelativ("objects/objects_SHD_7/PV/pump.xml", 1);"#;
        let result = extract(text);
        assert_eq!(result.occurrences.len(), 1);
        let occ = &result.occurrences[0];
        assert_eq!(occ.target, "objects/objects_SHD_7/PV/pump.xml");
        assert_eq!(occ.kind, ReferenceKind::Panel);
        assert_eq!(occ.region, RegionKind::StringLiteral(QuoteDialect::Plain));
        assert_eq!(occ.dialect, QuoteDialect::Plain);
        assert_eq!(occ.line, 1);
    }

    #[test]
    fn test_qualified_wins_over_bare_silently() {
        // Both shapes match the same span and normalize identically: the
        // specific one wins, no diagnostic.
        let text = "objects/objects_A/x.xml";
        let result = extract(text);
        assert_eq!(result.occurrences.len(), 1);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_bare_legacy_ref_still_matches() {
        let text = r#"load("objects/PV/valve.xml")"#;
        let result = extract(text);
        assert_eq!(result.occurrences.len(), 1);
        assert_eq!(result.occurrences[0].target, "objects/PV/valve.xml");
    }

    #[test]
    fn test_entity_dialect_inferred_from_region() {
        let text = "call(&quot;objects/objects_A/p.xml&quot;)";
        let result = extract(text);
        assert_eq!(result.occurrences.len(), 1);
        assert_eq!(result.occurrences[0].dialect, QuoteDialect::Entity);
        assert_eq!(
            result.occurrences[0].region,
            RegionKind::StringLiteral(QuoteDialect::Entity)
        );
    }

    #[test]
    fn test_uses_include_normalizes_with_suffix() {
        let text = "#uses &quot;objLogic&quot;\n";
        let result = extract(text);
        assert_eq!(result.occurrences.len(), 1);
        let occ = &result.occurrences[0];
        assert_eq!(occ.kind, ReferenceKind::ScriptInclude);
        assert_eq!(occ.target, "objLogic.ctl");
        assert_eq!(occ.dialect, QuoteDialect::Entity);
    }

    #[test]
    fn test_comment_region_match_still_reported() {
        let text = "// ChildPanelOnRelativ(\"objects/objects_A/p.xml\")\n";
        let result = extract(text);
        assert_eq!(result.occurrences.len(), 1);
        assert_eq!(result.occurrences[0].region, RegionKind::LineComment);
    }

    #[test]
    fn test_no_overlapping_same_kind_occurrences() {
        let text = "objects/objects_A/x.xml objects/PV/y.xml";
        let result = extract(text);
        assert_eq!(result.occurrences.len(), 2);
        for w in result.occurrences.windows(2) {
            assert!(!w[0].span.overlaps(w[1].span));
        }
    }

    #[test]
    fn test_occurrences_sorted_by_position() {
        let text = "objects/PV/b.xml then objects/objects_A/a.xml";
        let result = extract(text);
        assert_eq!(result.occurrences.len(), 2);
        assert!(result.occurrences[0].span.start < result.occurrences[1].span.start);
    }

    #[test]
    fn test_line_numbers() {
        let text = "line one\nobjects/PV/a.xml\n\nobjects/PV/b.xml";
        let result = extract(text);
        assert_eq!(result.occurrences[0].line, 2);
        assert_eq!(result.occurrences[1].line, 4);
    }

    #[test]
    fn test_line_of_helpers() {
        let starts = line_starts("ab\ncd\nef");
        assert_eq!(starts, vec![0, 3, 6]);
        assert_eq!(line_of(&starts, 0), 1);
        assert_eq!(line_of(&starts, 2), 1);
        assert_eq!(line_of(&starts, 3), 2);
        assert_eq!(line_of(&starts, 7), 3);
    }
}
