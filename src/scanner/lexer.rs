//! Lexical scanner: string/comment tracking and balanced-delimiter matching.
//!
//! A single left-to-right pass drives both modes:
//! - [`scan_regions`] partitions a document into code / string / comment
//!   regions covering every byte.
//! - [`find_matching_brace`] finds the closer for an opening brace while
//!   skipping braces inside strings (all three quote dialects) and comments.
//!
//! Transition priority while in code, evaluated at each position:
//! line comment, block comment, entity quote, backslash quote, plain quote.
//! The scanner is lexical only; it never builds a syntax tree.
//!
//! Malformed input is reported, not fatal: an opener with no closer before
//! end of document yields an `UnmatchedDelimiter` diagnostic and the
//! remainder of the document is classified as the open region.

use crate::error::{Diagnostic, OpenDelimiter};
use crate::scanner::region::{QuoteDialect, Region, RegionKind, RegionMap, Span};

/// Result of a region scan: the full partition plus any recoverable
/// conditions encountered along the way.
#[derive(Debug, Clone)]
pub struct RegionScan {
    pub map: RegionMap,
    pub diagnostics: Vec<Diagnostic>,
}

struct Lexer<'a> {
    key: &'a str,
    bytes: &'a [u8],
    pos: usize,
    regions: Vec<Region>,
    diagnostics: Vec<Diagnostic>,
    /// Start of the pending code region.
    code_start: usize,
    /// Whether to record regions (disabled in brace-matching mode).
    record: bool,
}

impl<'a> Lexer<'a> {
    fn new(key: &'a str, text: &'a str, start: usize, record: bool) -> Self {
        Self {
            key,
            bytes: text.as_bytes(),
            pos: start,
            regions: Vec::new(),
            diagnostics: Vec::new(),
            code_start: start,
            record,
        }
    }

    fn starts_with(&self, needle: &str) -> bool {
        self.bytes[self.pos..].starts_with(needle.as_bytes())
    }

    fn byte(&self) -> u8 {
        self.bytes[self.pos]
    }

    fn push_region(&mut self, span: Span, kind: RegionKind) {
        if self.record && !span.is_empty() {
            self.regions.push(Region { span, kind });
        }
    }

    /// Close the pending code region ending at `end`.
    fn flush_code(&mut self, end: usize) {
        let span = Span::new(self.code_start, end);
        self.push_region(span, RegionKind::Code);
    }

    /// Consume a `//` comment up to and including the line terminator.
    fn consume_line_comment(&mut self) {
        let open = self.pos;
        self.flush_code(open);
        while self.pos < self.bytes.len() {
            let b = self.byte();
            self.pos += 1;
            if b == b'\n' {
                break;
            }
        }
        self.push_region(Span::new(open, self.pos), RegionKind::LineComment);
        self.code_start = self.pos;
    }

    /// Consume a `/* ... */` comment. An unterminated comment swallows the
    /// rest of the document and is reported, not fatal.
    fn consume_block_comment(&mut self) {
        let open = self.pos;
        self.flush_code(open);
        self.pos += 2;
        loop {
            if self.pos >= self.bytes.len() {
                self.diagnostics.push(Diagnostic::UnmatchedDelimiter {
                    key: self.key.to_string(),
                    offset: open,
                    delimiter: OpenDelimiter::BlockComment,
                });
                break;
            }
            if self.starts_with("*/") {
                self.pos += 2;
                break;
            }
            self.pos += 1;
        }
        self.push_region(Span::new(open, self.pos), RegionKind::BlockComment);
        self.code_start = self.pos;
    }

    /// Consume a string literal of the given dialect, delimiters included.
    ///
    /// A backslash followed by any character is a literal escape and never
    /// changes state, so an escaped quote cannot close the string. In the
    /// backslash dialect the two-character closer is checked before escape
    /// consumption, since the closer itself starts with a backslash.
    fn consume_string(&mut self, dialect: QuoteDialect) {
        let open = self.pos;
        self.flush_code(open);
        self.pos += dialect.delimiter().len();

        let mut closed = false;
        while self.pos < self.bytes.len() {
            match dialect {
                QuoteDialect::Backslash => {
                    if self.starts_with("\\\"") {
                        self.pos += 2;
                        closed = true;
                        break;
                    }
                    if self.byte() == b'\\' && self.pos + 1 < self.bytes.len() {
                        self.pos += 2;
                        continue;
                    }
                }
                QuoteDialect::Plain => {
                    if self.byte() == b'\\' && self.pos + 1 < self.bytes.len() {
                        self.pos += 2;
                        continue;
                    }
                    if self.byte() == b'"' {
                        self.pos += 1;
                        closed = true;
                        break;
                    }
                }
                QuoteDialect::Entity => {
                    if self.byte() == b'\\' && self.pos + 1 < self.bytes.len() {
                        self.pos += 2;
                        continue;
                    }
                    if self.starts_with("&quot;") {
                        self.pos += 6;
                        closed = true;
                        break;
                    }
                }
            }
            self.pos += 1;
        }

        if !closed {
            self.pos = self.bytes.len();
            self.diagnostics.push(Diagnostic::UnmatchedDelimiter {
                key: self.key.to_string(),
                offset: open,
                delimiter: OpenDelimiter::StringLiteral(dialect),
            });
        }

        self.push_region(Span::new(open, self.pos), RegionKind::StringLiteral(dialect));
        self.code_start = self.pos;
    }

    /// If a comment or string starts at the current position, consume it and
    /// return true. Order encodes transition priority.
    fn consume_special(&mut self) -> bool {
        if self.starts_with("//") {
            self.consume_line_comment();
            return true;
        }
        if self.starts_with("/*") {
            self.consume_block_comment();
            return true;
        }
        if self.starts_with("&quot;") {
            self.consume_string(QuoteDialect::Entity);
            return true;
        }
        if self.starts_with("\\\"") {
            self.consume_string(QuoteDialect::Backslash);
            return true;
        }
        if self.byte() == b'"' {
            self.consume_string(QuoteDialect::Plain);
            return true;
        }
        false
    }
}

/// Produce the full region partition of a document.
///
/// The returned map's regions are sorted, non-overlapping, and cover every
/// byte of the document. A document with no strings or comments collapses
/// to a single code region.
pub fn scan_regions(key: &str, text: &str) -> RegionScan {
    let mut lex = Lexer::new(key, text, 0, true);

    while lex.pos < lex.bytes.len() {
        if lex.consume_special() {
            continue;
        }
        lex.pos += 1;
    }
    lex.flush_code(lex.bytes.len());

    RegionScan {
        map: RegionMap::new(lex.regions, text.len()),
        diagnostics: lex.diagnostics,
    }
}

/// Find the offset of the closing brace matching the opening brace at
/// `open_pos`, skipping braces inside strings and comments.
///
/// `open_pos` must point at the opening brace (or before it; the first
/// brace encountered in code opens the block). Returns an
/// `UnmatchedDelimiter` diagnostic when no closer exists before end of
/// document.
pub fn find_matching_brace(key: &str, text: &str, open_pos: usize) -> Result<usize, Diagnostic> {
    let mut lex = Lexer::new(key, text, open_pos, false);
    let mut depth: usize = 0;

    while lex.pos < lex.bytes.len() {
        if lex.consume_special() {
            continue;
        }
        match lex.byte() {
            b'{' => depth += 1,
            b'}' => {
                if depth > 0 {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(lex.pos);
                    }
                }
            }
            _ => {}
        }
        lex.pos += 1;
    }

    Err(Diagnostic::UnmatchedDelimiter {
        key: key.to_string(),
        offset: open_pos,
        delimiter: OpenDelimiter::Brace,
    })
}

/// Locate the next opening brace in code at or after `from`, skipping
/// whitespace and comments. Used to find the body of a guard statement.
pub fn next_block_open(text: &str, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b' ' | b'\t' | b'\r' | b'\n' => i += 1,
            b'/' if bytes[i..].starts_with(b"//") => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes[i..].starts_with(b"/*") => {
                i += 2;
                while i < bytes.len() && !bytes[i..].starts_with(b"*/") {
                    i += 1;
                }
                i = (i + 2).min(bytes.len());
            }
            b'{' => return Some(i),
            _ => return None,
        }
    }
    None
}
