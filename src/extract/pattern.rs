//! Reference pattern definitions and target normalization.
//!
//! A pattern is a textual shape plus the quote dialect it implies (if the
//! shape itself carries quoting) and the reference kind it produces. The
//! set is ordered: earlier patterns are more specific and win overlapping
//! matches, so a fully-qualified panel path always beats the bare legacy
//! form at the same location. The legacy scripts expressed this with a
//! negative lookahead; priority plus overlap suppression encodes the same
//! rule without one.
//!
//! Normalization strips dialect wrappers and applies the canonical `/`
//! separator and suffix convention, so every textual encoding of one
//! logical reference maps to the same target key.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{RefscanError, RefscanResult};
use crate::scanner::region::QuoteDialect;

/// What a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceKind {
    /// A panel/object markup document (`objects/.../name.xml`).
    Panel,
    /// A script library include (`#uses "name"`).
    ScriptInclude,
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Panel => write!(f, "panel"),
            Self::ScriptInclude => write!(f, "script include"),
        }
    }
}

/// Canonical suffix appended to bare script include targets.
const SCRIPT_SUFFIX: &str = ".ctl";

/// A single compiled reference pattern.
///
/// If the regex has a capture group, group 1 is the raw target; otherwise
/// the whole match is. `dialect` is `Some` when the shape itself carries
/// quoting (e.g. `#uses &quot;...&quot;`); `None` means the dialect is
/// inferred from the enclosing string region at match time.
#[derive(Debug, Clone)]
pub struct RefPattern {
    pub regex: Regex,
    pub dialect: Option<QuoteDialect>,
    pub kind: ReferenceKind,
}

impl RefPattern {
    pub fn new(
        shape: &str,
        dialect: Option<QuoteDialect>,
        kind: ReferenceKind,
    ) -> RefscanResult<Self> {
        let regex = Regex::new(shape)
            .map_err(|e| RefscanError::pattern(format!("invalid shape '{}': {}", shape, e)))?;
        Ok(Self {
            regex,
            dialect,
            kind,
        })
    }
}

/// An ordered set of reference patterns. Order is priority: the first
/// pattern to claim a span wins; later same-kind matches overlapping it
/// are suppressed.
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<RefPattern>,
}

impl PatternSet {
    pub fn new(patterns: Vec<RefPattern>) -> Self {
        Self { patterns }
    }

    /// Compile a set from `(shape, dialect, kind)` tuples, preserving order.
    pub fn compile(
        defs: &[(&str, Option<QuoteDialect>, ReferenceKind)],
    ) -> RefscanResult<Self> {
        let mut patterns = Vec::with_capacity(defs.len());
        for (shape, dialect, kind) in defs {
            patterns.push(RefPattern::new(shape, *dialect, *kind)?);
        }
        Ok(Self { patterns })
    }

    pub fn patterns(&self) -> &[RefPattern] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// The built-in pattern set for panel-project documents.
    ///
    /// Priority order:
    /// 1. qualified panel path (`objects/objects_<CAB>/...xml`)
    /// 2. bare legacy panel path (`objects/...xml`)
    /// 3. script includes, one shape per quote dialect
    pub fn default_panels() -> Self {
        // Hardcoded shapes, validated by the test suite.
        let defs: &[(&str, Option<QuoteDialect>, ReferenceKind)] = &[
            (
                r#"objects/objects_[A-Za-z0-9_]+/[^\s"'<>&\\]+?\.xml"#,
                None,
                ReferenceKind::Panel,
            ),
            (
                r#"objects/[^\s"'<>&\\]+?\.xml"#,
                None,
                ReferenceKind::Panel,
            ),
            (
                r"#uses\s+&quot;([^&\s]+)&quot;",
                Some(QuoteDialect::Entity),
                ReferenceKind::ScriptInclude,
            ),
            (
                r#"#uses\s+\\"([^"\\\s]+)\\""#,
                Some(QuoteDialect::Backslash),
                ReferenceKind::ScriptInclude,
            ),
            (
                r##"#uses\s+"([^"\s]+)""##,
                Some(QuoteDialect::Plain),
                ReferenceKind::ScriptInclude,
            ),
        ];
        Self::compile(defs).expect("built-in patterns are valid")
    }
}

impl Default for PatternSet {
    fn default() -> Self {
        Self::default_panels()
    }
}

/// Normalize a raw matched target into its canonical artifact key.
///
/// Total and injective modulo dialect: two encodings of the same logical
/// reference always normalize identically, and distinct references never
/// collide. Strips entity and backslash escapes, canonicalizes the path
/// separator to `/`, and applies the suffix convention for kinds whose
/// bare form omits it.
pub fn normalize_target(raw: &str, kind: ReferenceKind) -> String {
    let mut s = decode_entities(raw);
    // Backslash separators and stray literal escapes both canonicalize
    s = s.replace("\\\\", "/").replace('\\', "/");

    match kind {
        ReferenceKind::Panel => s,
        ReferenceKind::ScriptInclude => {
            if s.rsplit('/').next().is_some_and(|name| name.contains('.')) {
                s
            } else {
                format!("{}{}", s, SCRIPT_SUFFIX)
            }
        }
    }
}

/// Decode the markup entities that can appear inside a reference.
fn decode_entities(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
