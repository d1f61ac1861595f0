//! Query text normalization and comment handling
//!
//! Everything here works on raw text, before tokenization, and never fails.
//! A small scanner splits the text into code, quoted and comment segments so
//! that rewrites never touch the inside of string literals.

use once_cell::sync::Lazy;
use regex::Regex;

static PLAIN_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$").expect("Invalid identifier regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SegmentKind {
    Code,
    /// `'...'`
    StringLiteral,
    /// `"..."`
    DoubleQuoted,
    /// `` `...` ``
    Backticked,
    /// `/* ... */`
    BlockComment,
    /// `-- ...` or `# ...`, including the terminating newline.
    LineComment,
}

impl SegmentKind {
    #[inline]
    pub(crate) fn is_comment(self) -> bool {
        matches!(self, Self::BlockComment | Self::LineComment)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Segment<'a> {
    pub kind: SegmentKind,
    pub text: &'a str,
}

/// Split `sql` into consecutive segments covering the whole input.
///
/// Unterminated quotes and block comments run to the end of the input.
pub(crate) fn segments(sql: &str) -> Vec<Segment<'_>> {
    let bytes = sql.as_bytes();
    let mut segments = Vec::new();
    let mut code_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let (kind, end) = match bytes[i] {
            b'\'' => (SegmentKind::StringLiteral, quoted_end(bytes, i, b'\'')),
            b'"' => (SegmentKind::DoubleQuoted, quoted_end(bytes, i, b'"')),
            b'`' => (SegmentKind::Backticked, quoted_end(bytes, i, b'`')),
            b'/' if bytes.get(i + 1) == Some(&b'*') => (SegmentKind::BlockComment, block_end(bytes, i)),
            b'-' if bytes.get(i + 1) == Some(&b'-') => (SegmentKind::LineComment, line_end(bytes, i)),
            b'#' => (SegmentKind::LineComment, line_end(bytes, i)),
            _ => {
                i += 1;
                continue;
            }
        };
        if code_start < i {
            segments.push(Segment {
                kind: SegmentKind::Code,
                text: &sql[code_start..i],
            });
        }
        segments.push(Segment {
            kind,
            text: &sql[i..end],
        });
        i = end;
        code_start = end;
    }

    if code_start < bytes.len() {
        segments.push(Segment {
            kind: SegmentKind::Code,
            text: &sql[code_start..],
        });
    }
    segments
}

/// End (exclusive) of a quoted run starting at `start`. Doubled quotes and,
/// for string quotes, backslash escapes stay inside the run.
fn quoted_end(bytes: &[u8], start: usize, quote: u8) -> usize {
    let mut j = start + 1;
    while j < bytes.len() {
        if bytes[j] == b'\\' && quote != b'`' {
            j += 2;
            continue;
        }
        if bytes[j] == quote {
            if bytes.get(j + 1) == Some(&quote) {
                j += 2;
                continue;
            }
            return j + 1;
        }
        j += 1;
    }
    bytes.len()
}

fn block_end(bytes: &[u8], start: usize) -> usize {
    bytes[start + 2..]
        .windows(2)
        .position(|w| w == b"*/")
        .map_or(bytes.len(), |p| start + 2 + p + 2)
}

fn line_end(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |p| start + p + 1)
}

// ============================================================================
// Normalization
// ============================================================================

/// Normalize raw query text before tokenization.
///
/// - newlines outside literals and comments become spaces (a line comment
///   keeps its terminating newline)
/// - `"ident"` becomes `ident` when it is a plain identifier, `` `ident` ``
///   otherwise, so `"db"."table"` reads as `db.table`
/// - string literals, backticked identifiers and comments are copied as-is
pub fn preprocess_query(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    for segment in segments(sql) {
        match segment.kind {
            SegmentKind::Code => out.extend(segment.text.chars().map(|c| match c {
                '\n' | '\r' => ' ',
                other => other,
            })),
            SegmentKind::DoubleQuoted => {
                let inner = segment
                    .text
                    .strip_prefix('"')
                    .and_then(|s| s.strip_suffix('"'))
                    .unwrap_or(segment.text);
                if PLAIN_IDENTIFIER.is_match(inner) {
                    out.push_str(inner);
                } else {
                    out.push('`');
                    out.push_str(&inner.replace('`', "``"));
                    out.push('`');
                }
            }
            _ => out.push_str(segment.text),
        }
    }
    out
}

/// Every comment in `sql`, in order, with its delimiters.
pub fn extract_comments(sql: &str) -> Vec<String> {
    segments(sql)
        .into_iter()
        .filter(|s| s.kind.is_comment())
        .map(|s| s.text.to_string())
        .collect()
}

/// `sql` with comments removed and whitespace runs outside literals
/// collapsed to one space.
pub fn strip_comments(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut pending_space = false;

    for segment in segments(sql) {
        match segment.kind {
            SegmentKind::BlockComment | SegmentKind::LineComment => pending_space = true,
            SegmentKind::Code => {
                for c in segment.text.chars() {
                    if c.is_whitespace() {
                        pending_space = true;
                        continue;
                    }
                    if pending_space && !out.is_empty() {
                        out.push(' ');
                    }
                    pending_space = false;
                    out.push(c);
                }
            }
            _ => {
                if pending_space && !out.is_empty() {
                    out.push(' ');
                }
                pending_space = false;
                out.push_str(segment.text);
            }
        }
    }
    out
}
