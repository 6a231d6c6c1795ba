//! Order-independent multi-edit patch application.
//!
//! Quick fixes and content-change notifications both deliver a *batch* of range
//! edits measured against one snapshot of a cell's text. This module applies
//! such a batch in a single pass:
//!
//! - edits are sorted ascending by start position, so the result does not
//!   depend on the order the caller supplied them in
//! - the original text is scanned once with a cursor, emitting untouched spans
//!   and replacement text into one output buffer (O(total length))
//! - malformed or overlapping ranges are rejected up front, before any output
//!   is produced
//!
//! Coordinates are 1-based lines and 0-based columns (in `char`s), matching
//! the analyzer's text-range convention. Line terminators are `\n` only.

use std::fmt;

/// A position inside a text blob: 1-based line, 0-based column.
///
/// Columns count Unicode scalar values (`char`s), not bytes. The derived
/// ordering is lexicographic (line first, then column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TextPosition {
    /// 1-based line number.
    pub line: u32,
    /// 0-based column offset in `char`s.
    pub col: u32,
}

impl TextPosition {
    /// Create a new position.
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

impl fmt::Display for TextPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// A range between two [`TextPosition`]s; the end column is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRange {
    /// Range start position (inclusive).
    pub start: TextPosition,
    /// Range end position (exclusive in columns).
    pub end: TextPosition,
}

impl TextRange {
    /// Create a new range.
    pub fn new(start: TextPosition, end: TextPosition) -> Self {
        Self { start, end }
    }

    /// Convenience constructor from raw coordinates.
    pub fn at(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start: TextPosition::new(start_line, start_col),
            end: TextPosition::new(end_line, end_col),
        }
    }

    /// Returns `true` for a zero-length range (a pure insertion point).
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A single range edit: replace `range` with `new_text`.
///
/// A zero-length range is a pure insertion; empty `new_text` is a pure
/// deletion. `new_text` may contain newlines (splitting lines), and the range
/// may span lines (merging them).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    /// The range to replace, measured against the *original* text.
    pub range: TextRange,
    /// Replacement text (may be empty, may contain newlines).
    pub new_text: String,
}

impl TextEdit {
    /// Create a new edit.
    pub fn new(range: TextRange, new_text: impl Into<String>) -> Self {
        Self {
            range,
            new_text: new_text.into(),
        }
    }
}

/// Patch application error.
///
/// All variants signal a caller contract violation: the edit batch does not
/// match the text it claims to be measured against. Nothing is silently
/// clamped or repaired, because a mismatch here means the editor's document
/// state and this model have desynchronized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    /// The range's end position precedes its start position.
    InvertedRange(TextRange),
    /// The range references a line or column outside the text.
    OutOfBounds(TextRange),
    /// Two edits in the batch overlap.
    OverlappingEdits(TextRange, TextRange),
}

impl fmt::Display for PatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchError::InvertedRange(range) => {
                write!(f, "Edit range end precedes start: {}", range)
            }
            PatchError::OutOfBounds(range) => {
                write!(f, "Edit range out of bounds: {}", range)
            }
            PatchError::OverlappingEdits(a, b) => {
                write!(f, "Overlapping edits: {} and {}", a, b)
            }
        }
    }
}

impl std::error::Error for PatchError {}

/// Apply a batch of pairwise non-overlapping edits to `original`.
///
/// The result is identical regardless of the order the edits are supplied in;
/// edits sharing a start position (coincident insertion points) are ordered by
/// end position, then replacement text, so even those stay deterministic.
/// A multi-line range is replaced atomically; if the replacement leaves the
/// merged line with no content at all, the line is dropped rather than kept
/// empty (unless it is the last line of the text, which has no terminator to
/// consume).
pub fn apply_edits(original: &str, edits: &[TextEdit]) -> Result<String, PatchError> {
    if edits.is_empty() {
        return Ok(original.to_string());
    }

    let lines: Vec<&str> = original.split('\n').collect();

    let mut sorted: Vec<&TextEdit> = edits.iter().collect();
    sorted.sort_by(|a, b| {
        (a.range.start, a.range.end)
            .cmp(&(b.range.start, b.range.end))
            .then_with(|| a.new_text.cmp(&b.new_text))
    });

    for edit in &sorted {
        validate_range(&edit.range, &lines)?;
    }
    for pair in sorted.windows(2) {
        if pair[1].range.start < pair[0].range.end {
            return Err(PatchError::OverlappingEdits(pair[0].range, pair[1].range));
        }
    }

    let inserted: usize = sorted.iter().map(|edit| edit.new_text.len()).sum();
    let mut out = String::with_capacity(original.len() + inserted);
    let mut cursor = TextPosition::new(1, 0);

    let mut pending_merge = false;
    for (position, edit) in sorted.iter().enumerate() {
        emit_span(&mut out, &lines, cursor, edit.range.start);
        out.push_str(&edit.new_text);
        cursor = edit.range.end;
        if edit.range.end.line > edit.range.start.line {
            pending_merge = true;
        }
        // A later edit may still land on the merged line, so the drop
        // decision waits until the line's content is final.
        let merged_line_continues = sorted
            .get(position + 1)
            .is_some_and(|next| next.range.start <= cursor);
        if pending_merge && !merged_line_continues {
            cursor = drop_empty_merged_line(&out, &lines, cursor);
            pending_merge = false;
        }
    }

    let last_line = lines.len() as u32;
    let text_end = TextPosition::new(last_line, char_len(lines[lines.len() - 1]) as u32);
    emit_span(&mut out, &lines, cursor, text_end);

    Ok(out)
}

fn validate_range(range: &TextRange, lines: &[&str]) -> Result<(), PatchError> {
    if range.end < range.start {
        return Err(PatchError::InvertedRange(*range));
    }
    let in_bounds = |pos: &TextPosition| {
        pos.line >= 1
            && (pos.line as usize) <= lines.len()
            && (pos.col as usize) <= char_len(lines[pos.line as usize - 1])
    };
    if !in_bounds(&range.start) || !in_bounds(&range.end) {
        return Err(PatchError::OutOfBounds(*range));
    }
    Ok(())
}

/// Emit the untouched span `from..to` of `lines` into `out`.
fn emit_span(out: &mut String, lines: &[&str], from: TextPosition, to: TextPosition) {
    debug_assert!(from <= to);
    let mut line = from.line as usize;
    let mut col = from.col as usize;
    while line < to.line as usize {
        push_char_slice(out, lines[line - 1], col, char_len(lines[line - 1]));
        out.push('\n');
        line += 1;
        col = 0;
    }
    push_char_slice(out, lines[line - 1], col, to.col as usize);
}

/// After a multi-line edit, drop the merged line if it ended up empty.
///
/// The merged line is empty when both the emitted head (prefix + replacement
/// tail) and the remaining suffix of the edit's end line are empty. Dropping
/// means skipping the end line's terminator, so the cursor jumps to the start
/// of the following line. The last line has no terminator and is left as-is.
fn drop_empty_merged_line(out: &str, lines: &[&str], cursor: TextPosition) -> TextPosition {
    let merged_head = out.rsplit('\n').next().unwrap_or("");
    if !merged_head.is_empty() {
        return cursor;
    }
    let end_line = cursor.line as usize;
    let suffix_len = char_len(lines[end_line - 1]).saturating_sub(cursor.col as usize);
    if suffix_len == 0 && end_line < lines.len() {
        TextPosition::new(cursor.line + 1, 0)
    } else {
        cursor
    }
}

fn char_len(line: &str) -> usize {
    line.chars().count()
}

fn push_char_slice(out: &mut String, line: &str, from: usize, to: usize) {
    if from >= to {
        return;
    }
    out.extend(line.chars().skip(from).take(to - from));
}
