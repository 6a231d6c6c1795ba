//! Virtual-document build and line mapping.
//!
//! A notebook is analyzed as one flat "virtual document": the cells' texts
//! concatenated in order, separated by a sentinel delimiter line that tells
//! the analyzer not to treat adjacent cells as contiguous source. This module
//! builds that document together with a line index mapping every virtual line
//! back to its owning cell and cell-local line, and maps analyzer ranges back
//! into cell coordinates.
//!
//! The index is a fully-recomputed, versioned cache: it is valid only for the
//! notebook version it was built against and is rebuilt wholesale (lazily, by
//! [`crate::Notebook::line_index`]) after any mutation. There is no
//! incremental update path; documents here are editor-scale.

use crate::notebook::NotebookCell;
use crate::patch::{TextPosition, TextRange};
use std::fmt;

/// Default sentinel line inserted between consecutive cells.
///
/// The exact text is a contract with the analyzer: it recognizes this line as
/// a cell boundary and must not treat the surrounding lines as continuous
/// source. It occupies exactly one virtual line.
pub const DEFAULT_CELL_DELIMITER: &str = "#NOTEBOOK_CELL_DELIMITER";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LineEntry {
    /// Ordinal of the owning cell.
    cell: usize,
    /// 1-based line inside the owning cell.
    local_line: u32,
}

/// A virtual line resolved to its owning cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellLine<'a> {
    /// URI of the owning cell.
    pub cell_uri: &'a str,
    /// 1-based line inside the owning cell.
    pub line: u32,
}

/// A virtual-document range resolved into one cell's coordinate space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRange<'a> {
    /// URI of the owning cell.
    pub cell_uri: &'a str,
    /// The range in cell-local coordinates. Columns are unchanged from the
    /// virtual range; concatenation only shifts line numbers.
    pub range: TextRange,
}

/// Reverse-mapping failure. Mapped data races live edits, so these
/// are drop-and-log conditions, not hard errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    /// The virtual line has no entry in the current index (usually a result
    /// produced against an older notebook version).
    MissingLine(u32),
    /// The range's start and end resolve to different cells. The analyzer
    /// must never produce a range straddling a cell boundary.
    CrossCellRange {
        /// Cell owning the range start.
        start_cell: String,
        /// Cell owning the range end.
        end_cell: String,
    },
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::MissingLine(line) => {
                write!(f, "No index entry for virtual line {}", line)
            }
            MapError::CrossCellRange {
                start_cell,
                end_cell,
            } => {
                write!(
                    f,
                    "Range crosses a cell boundary ({} -> {})",
                    start_cell, end_cell
                )
            }
        }
    }
}

impl std::error::Error for MapError {}

/// Line index over one notebook version's virtual document.
#[derive(Debug, Clone)]
pub struct LineIndex {
    for_version: u64,
    text: String,
    cell_uris: Vec<String>,
    lines: Vec<LineEntry>,
}

impl LineIndex {
    /// Build the virtual document and its line index for `cells`.
    ///
    /// Virtual lines are numbered from 1. Each cell contributes its physical
    /// lines; after every cell except the last, the delimiter contributes one
    /// line attributed to the *following* cell's first local line. A cell
    /// whose text lacks a trailing terminator gets one inserted before the
    /// delimiter so the delimiter always starts a fresh line.
    pub fn build(cells: &[NotebookCell], delimiter: &str, for_version: u64) -> Self {
        let mut text = String::new();
        let mut lines = Vec::new();
        let mut cell_uris = Vec::with_capacity(cells.len());

        for (ordinal, cell) in cells.iter().enumerate() {
            cell_uris.push(cell.uri().to_string());

            let cell_text = cell.text();
            let last = ordinal + 1 == cells.len();
            let newline_count = cell_text.matches('\n').count();
            let terminated = cell_text.ends_with('\n');

            // For the last cell a trailing terminator yields a counted trailing
            // line; for earlier cells that line is taken over by the delimiter.
            let line_count = if terminated && !last {
                newline_count
            } else {
                newline_count + 1
            };
            for local in 1..=line_count {
                lines.push(LineEntry {
                    cell: ordinal,
                    local_line: local as u32,
                });
            }

            text.push_str(cell_text);
            if !last {
                if !terminated {
                    text.push('\n');
                }
                text.push_str(delimiter);
                text.push('\n');
                lines.push(LineEntry {
                    cell: ordinal + 1,
                    local_line: 1,
                });
            }
        }

        Self {
            for_version,
            text,
            cell_uris,
            lines,
        }
    }

    /// The notebook version this index was built against.
    pub fn for_version(&self) -> u64 {
        self.for_version
    }

    /// The concatenated virtual document. This is the exact payload the
    /// analyzer receives; all finding ranges are measured against it.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of indexed virtual lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Number of cells the index was built from.
    pub fn cell_count(&self) -> usize {
        self.cell_uris.len()
    }

    /// URIs of all cells, in notebook order.
    pub fn cell_uris(&self) -> impl Iterator<Item = &str> {
        self.cell_uris.iter().map(String::as_str)
    }

    /// Resolve a 1-based virtual line to its owning cell and local line.
    ///
    /// Delimiter lines resolve to the following cell's first line.
    pub fn cell_for_line(&self, virtual_line: u32) -> Option<CellLine<'_>> {
        let entry = self.entry(virtual_line)?;
        Some(CellLine {
            cell_uri: &self.cell_uris[entry.cell],
            line: entry.local_line,
        })
    }

    /// Map a virtual-document range into the coordinate space of its owning
    /// cell. Columns pass through unchanged.
    pub fn map_range(&self, range: &TextRange) -> Result<CellRange<'_>, MapError> {
        let start = self
            .entry(range.start.line)
            .ok_or(MapError::MissingLine(range.start.line))?;
        let end = self
            .entry(range.end.line)
            .ok_or(MapError::MissingLine(range.end.line))?;
        if start.cell != end.cell {
            return Err(MapError::CrossCellRange {
                start_cell: self.cell_uris[start.cell].clone(),
                end_cell: self.cell_uris[end.cell].clone(),
            });
        }
        Ok(CellRange {
            cell_uri: &self.cell_uris[start.cell],
            range: TextRange::new(
                TextPosition::new(start.local_line, range.start.col),
                TextPosition::new(end.local_line, range.end.col),
            ),
        })
    }

    fn entry(&self, virtual_line: u32) -> Option<LineEntry> {
        if virtual_line == 0 {
            return None;
        }
        self.lines.get(virtual_line as usize - 1).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(uri: &str, text: &str) -> NotebookCell {
        NotebookCell::new(uri, 1, text)
    }

    fn three_cell_index() -> LineIndex {
        let cells = vec![
            cell("cell:1", "a=1\n"),
            cell("cell:2", "b=2\n"),
            cell("cell:3", "c=3\n"),
        ];
        LineIndex::build(&cells, "#BOUNDARY", 1)
    }

    #[test]
    fn test_virtual_text_joins_cells_with_delimiter() {
        let index = three_cell_index();
        assert_eq!(
            index.text(),
            "a=1\n#BOUNDARY\nb=2\n#BOUNDARY\nc=3\n"
        );
    }

    #[test]
    fn test_absolute_line_resolves_to_owning_cell() {
        let index = three_cell_index();
        let resolved = index.cell_for_line(3).unwrap();
        assert_eq!(resolved.cell_uri, "cell:2");
        assert_eq!(resolved.line, 1);
    }

    #[test]
    fn test_delimiter_line_attributed_to_following_cell() {
        let index = three_cell_index();
        let resolved = index.cell_for_line(2).unwrap();
        assert_eq!(resolved.cell_uri, "cell:2");
        assert_eq!(resolved.line, 1);
    }

    #[test]
    fn test_line_count_matches_virtual_text() {
        let index = three_cell_index();
        // "a=1", "#BOUNDARY", "b=2", "#BOUNDARY", "c=3", "" (trailing).
        assert_eq!(index.line_count(), index.text().split('\n').count());
    }

    #[test]
    fn test_round_trip_every_cell_line() {
        let cells = vec![
            cell("cell:1", "one\ntwo\n"),
            cell("cell:2", "alpha\nbeta\ngamma"),
            cell("cell:3", ""),
        ];
        let index = LineIndex::build(&cells, DEFAULT_CELL_DELIMITER, 7);

        // Walk the virtual document and check each non-delimiter line maps to
        // the text it came from.
        let virtual_lines: Vec<&str> = index.text().split('\n').collect();
        let mut expected: Vec<(usize, &str, u32, &str)> = Vec::new();
        for (i, c) in cells.iter().enumerate() {
            for (local, line_text) in c.text().split('\n').enumerate() {
                expected.push((i, c.uri(), local as u32 + 1, line_text));
            }
        }

        for (virtual_line, line_text) in virtual_lines.iter().enumerate() {
            let virtual_line = virtual_line as u32 + 1;
            if *line_text == DEFAULT_CELL_DELIMITER {
                continue;
            }
            let resolved = index.cell_for_line(virtual_line).unwrap();
            assert!(
                expected
                    .iter()
                    .any(|(_, uri, local, text)| *uri == resolved.cell_uri
                        && *local == resolved.line
                        && text == line_text),
                "virtual line {} ({:?}) resolved to {:?}",
                virtual_line,
                line_text,
                resolved
            );
        }
    }

    #[test]
    fn test_unterminated_cell_gets_terminator_before_delimiter() {
        let cells = vec![cell("cell:1", "x\ny\nz"), cell("cell:2", "w\n")];
        let index = LineIndex::build(&cells, "#BOUNDARY", 1);
        assert_eq!(index.text(), "x\ny\nz\n#BOUNDARY\nw\n");
        assert_eq!(index.cell_for_line(3).unwrap().cell_uri, "cell:1");
        assert_eq!(index.cell_for_line(3).unwrap().line, 3);
        assert_eq!(index.cell_for_line(5).unwrap().cell_uri, "cell:2");
    }

    #[test]
    fn test_map_range_shifts_lines_but_not_columns() {
        let index = three_cell_index();
        let mapped = index.map_range(&TextRange::at(3, 2, 3, 3)).unwrap();
        assert_eq!(mapped.cell_uri, "cell:2");
        assert_eq!(mapped.range, TextRange::at(1, 2, 1, 3));
    }

    #[test]
    fn test_map_range_missing_line() {
        let index = three_cell_index();
        assert_eq!(
            index.map_range(&TextRange::at(42, 0, 42, 1)),
            Err(MapError::MissingLine(42))
        );
        assert_eq!(
            index.map_range(&TextRange::at(0, 0, 1, 0)),
            Err(MapError::MissingLine(0))
        );
    }

    #[test]
    fn test_map_range_across_cells_is_rejected() {
        let index = three_cell_index();
        let err = index.map_range(&TextRange::at(1, 0, 3, 1)).unwrap_err();
        assert_eq!(
            err,
            MapError::CrossCellRange {
                start_cell: "cell:1".to_string(),
                end_cell: "cell:2".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_notebook_has_empty_document() {
        let index = LineIndex::build(&[], DEFAULT_CELL_DELIMITER, 1);
        assert_eq!(index.text(), "");
        assert_eq!(index.line_count(), 0);
        assert!(index.cell_for_line(1).is_none());
    }

    #[test]
    fn test_single_cell_has_no_delimiter() {
        let index = LineIndex::build(&[cell("cell:1", "x\ny")], "#BOUNDARY", 1);
        assert_eq!(index.text(), "x\ny");
        assert_eq!(index.line_count(), 2);
    }
}
