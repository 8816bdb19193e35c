//! Activity classification: is a matched reference live or commented out?
//!
//! Comment containment is the sole inactivity criterion. References are
//! encoded inside string literals by construction (the quote dialects are
//! string encodings), so string containment never deactivates a match. A
//! span that so much as touches a comment region is `Inactive`: a
//! reference is only trusted when it is entirely uncommented, erring
//! toward not-reachable. A reference sitting after an inline `//` on an
//! otherwise live line is therefore inactive, deliberately.

use serde::{Deserialize, Serialize};

use crate::extract::occurrence::{line_of, line_starts};
use crate::scanner::region::{RegionMap, Span};

/// Whether an occurrence counts toward reachability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activity {
    /// Entirely outside comment regions: contributes a graph edge.
    Active,
    /// Touching a comment region: textually present but logically inert.
    Inactive,
}

impl Activity {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Classify one occurrence span against the document's region partition.
pub fn classify_activity(span: Span, map: &RegionMap) -> Activity {
    if map.intersects_comment(span) {
        Activity::Inactive
    } else {
        Activity::Active
    }
}

/// The span of the whole logical inactive block containing an inactive
/// occurrence, so pruning can remove a multi-line commented-out call in
/// one piece rather than a single line.
///
/// Inside a block comment the group is the comment region itself. For line
/// comments, contiguous non-empty `//` lines extend the group backward and
/// forward; a blank line, a non-comment line, or a line holding nothing
/// but the `//` marker is a block separator and stops the extension.
pub fn inactive_group(text: &str, map: &RegionMap, span: Span) -> Span {
    let Some(region) = map.enclosing_comment(span) else {
        // Straddling a region boundary: nothing larger can be trusted.
        return span;
    };
    if !matches!(region.kind, crate::scanner::region::RegionKind::LineComment) {
        return region.span;
    }

    let starts = line_starts(text);
    let line_span = |idx: usize| -> Span {
        let start = starts[idx];
        let end = starts.get(idx + 1).copied().unwrap_or(text.len());
        Span::new(start, end)
    };
    let line_text = |idx: usize| -> &str { text[line_span(idx).start..line_span(idx).end].trim() };

    let is_group_line = |idx: usize| -> bool {
        let t = line_text(idx);
        t.starts_with("//") && t != "//"
    };

    // 0-indexed line of the match
    let matched = line_of(&starts, span.start) - 1;

    // An inline trailing comment does not own its line; removing the whole
    // line would take live code with it. The group is the comment alone.
    if !line_text(matched).starts_with("//") {
        return region.span;
    }

    let mut first = matched;
    while first > 0 && is_group_line(first - 1) {
        first -= 1;
    }

    let mut last = matched;
    while last + 1 < starts.len() && is_group_line(last + 1) {
        last += 1;
    }

    Span::new(line_span(first).start, line_span(last).end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::occurrence::extract_occurrences;
    use crate::extract::pattern::PatternSet;
    use crate::scanner::lexer::scan_regions;

    fn classify_all(text: &str) -> Vec<(String, Activity)> {
        let scan = scan_regions("doc", text);
        extract_occurrences("doc", text, &scan.map, &PatternSet::default_panels())
            .occurrences
            .into_iter()
            .map(|o| {
                let a = classify_activity(o.span, &scan.map);
                (o.target, a)
            })
            .collect()
    }

    #[test]
    fn test_string_ref_is_active() {
        let refs = classify_all(r#"open("objects/objects_A/p.xml");"#);
        assert_eq!(refs.len(), 1);
        assert!(refs[0].1.is_active());
    }

    #[test]
    fn test_line_comment_ref_is_inactive() {
        let refs = classify_all("// open(\"objects/objects_A/p.xml\");\n");
        assert_eq!(refs.len(), 1);
        assert!(!refs[0].1.is_active());
    }

    #[test]
    fn test_block_comment_ref_is_inactive() {
        let refs = classify_all("/* objects/objects_A/p.xml */ code");
        assert_eq!(refs.len(), 1);
        assert!(!refs[0].1.is_active());
    }

    #[test]
    fn test_ref_after_inline_comment_marker_is_inactive() {
        // The legacy line-scanning shortcut treated this as active; the
        // comment region rule does not.
        let refs = classify_all("doWork(); // objects/objects_A/p.xml\n");
        assert_eq!(refs.len(), 1);
        assert!(!refs[0].1.is_active());
    }

    #[test]
    fn test_active_and_inactive_mix() {
        let text = "open(\"objects/objects_A/live.xml\");\n// open(\"objects/objects_A/dead.xml\");\n";
        let refs = classify_all(text);
        assert_eq!(refs.len(), 2);
        let live = refs.iter().find(|(t, _)| t.contains("live")).unwrap();
        let dead = refs.iter().find(|(t, _)| t.contains("dead")).unwrap();
        assert!(live.1.is_active());
        assert!(!dead.1.is_active());
    }

    #[test]
    fn test_group_extends_over_contiguous_comment_lines() {
        let text = concat!(
            "code();\n",
            "//  if (objName.contains(\"P1V1\")){\n",
            "//    ChildPanelOnRelativ(\"objects/objects_A/p.xml\",\n",
            "//      makeDynString());\n",
            "//  }\n",
            "more();\n",
        );
        let scan = scan_regions("doc", text);
        let occ = extract_occurrences("doc", text, &scan.map, &PatternSet::default_panels())
            .occurrences
            .remove(0);
        let group = inactive_group(text, &scan.map, occ.span);
        let snippet = &text[group.start..group.end];
        assert!(snippet.starts_with("//  if"));
        assert!(snippet.trim_end().ends_with("//  }"));
        assert!(!snippet.contains("code()"));
        assert!(!snippet.contains("more()"));
    }

    #[test]
    fn test_group_stops_at_bare_marker_separator() {
        let text = concat!(
            "// unrelated block\n",
            "//\n",
            "// objects/objects_A/p.xml\n",
            "code();\n",
        );
        let scan = scan_regions("doc", text);
        let occ = extract_occurrences("doc", text, &scan.map, &PatternSet::default_panels())
            .occurrences
            .remove(0);
        let group = inactive_group(text, &scan.map, occ.span);
        let snippet = &text[group.start..group.end];
        assert_eq!(snippet, "// objects/objects_A/p.xml\n");
    }

    #[test]
    fn test_group_stops_at_blank_line() {
        let text = "// other\n\n// objects/objects_A/p.xml\n";
        let scan = scan_regions("doc", text);
        let occ = extract_occurrences("doc", text, &scan.map, &PatternSet::default_panels())
            .occurrences
            .remove(0);
        let group = inactive_group(text, &scan.map, occ.span);
        assert_eq!(&text[group.start..group.end], "// objects/objects_A/p.xml\n");
    }

    #[test]
    fn test_inline_trailing_comment_group_spares_live_code() {
        let text = "doWork(); // objects/objects_A/p.xml\nnext();\n";
        let scan = scan_regions("doc", text);
        let occ = extract_occurrences("doc", text, &scan.map, &PatternSet::default_panels())
            .occurrences
            .remove(0);
        let group = inactive_group(text, &scan.map, occ.span);
        let snippet = &text[group.start..group.end];
        assert!(snippet.starts_with("//"));
        assert!(!snippet.contains("doWork"));
    }

    #[test]
    fn test_block_comment_group_is_whole_region() {
        let text = "a /* keep\nobjects/objects_A/p.xml\ntogether */ b";
        let scan = scan_regions("doc", text);
        let occ = extract_occurrences("doc", text, &scan.map, &PatternSet::default_panels())
            .occurrences
            .remove(0);
        let group = inactive_group(text, &scan.map, occ.span);
        let snippet = &text[group.start..group.end];
        assert!(snippet.starts_with("/*"));
        assert!(snippet.ends_with("*/"));
    }
}
