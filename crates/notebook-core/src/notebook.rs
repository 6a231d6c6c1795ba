//! Cell / notebook document model.
//!
//! A [`Notebook`] owns an ordered collection of cells plus a uri lookup index
//! over them (arena + index, so structural changes stay cheap). Every mutation
//! increments the notebook version by exactly one and lazily invalidates the
//! cached [`LineIndex`]; mutations to one notebook are expected to be
//! serialized by the caller (the editor delivers ordered change notifications
//! over one logical channel), so the model itself takes no locks.
//!
//! Failed mutations leave the notebook untouched: a bad edit batch or an
//! unknown cell uri signals that the editor and this model have
//! desynchronized, and the call is rejected before any state changes.

use crate::line_index::{DEFAULT_CELL_DELIMITER, LineIndex};
use crate::patch::{self, PatchError, TextEdit};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// One independently editable unit of a notebook.
///
/// Cells are owned exclusively by their parent [`Notebook`]; text is replaced
/// wholesale on structural change and patched on content change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotebookCell {
    uri: String,
    version: i32,
    text: String,
}

impl NotebookCell {
    /// Create a cell from its editor document state.
    pub fn new(uri: impl Into<String>, version: i32, text: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            version,
            text: text.into(),
        }
    }

    /// The cell's document uri.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The cell's editor document version.
    pub fn version(&self) -> i32 {
        self.version
    }

    /// The cell's text, an opaque `\n`-terminated line sequence.
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A cell to insert at an ordinal position during a structure change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellInsertion {
    /// Ordinal position the cell lands at, applied after removals and after
    /// any earlier insertion in the same batch.
    pub position: usize,
    /// The cell to insert.
    pub cell: NotebookCell,
}

/// Notebook model error. Every variant is a caller contract violation and is
/// reported without mutating any state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotebookError {
    /// The notebook uri is not open.
    UnknownNotebook(String),
    /// The cell uri does not belong to the notebook.
    UnknownCell {
        /// The notebook that was addressed.
        notebook: String,
        /// The unknown cell uri.
        cell: String,
    },
    /// A cell uri would appear twice in the notebook.
    DuplicateCell(String),
    /// A structural insertion position is past the end of the cell list.
    InvalidCellPosition {
        /// The requested position.
        position: usize,
        /// The cell count the position was checked against.
        cell_count: usize,
    },
    /// A content-change edit batch failed to apply.
    Patch(PatchError),
}

impl fmt::Display for NotebookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotebookError::UnknownNotebook(uri) => write!(f, "Unknown notebook: {}", uri),
            NotebookError::UnknownCell { notebook, cell } => {
                write!(f, "Notebook {} has no cell {}", notebook, cell)
            }
            NotebookError::DuplicateCell(uri) => write!(f, "Duplicate cell uri: {}", uri),
            NotebookError::InvalidCellPosition {
                position,
                cell_count,
            } => write!(
                f,
                "Cell position {} out of range (cell count {})",
                position, cell_count
            ),
            NotebookError::Patch(err) => write!(f, "Content change failed: {}", err),
        }
    }
}

impl std::error::Error for NotebookError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NotebookError::Patch(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PatchError> for NotebookError {
    fn from(err: PatchError) -> Self {
        NotebookError::Patch(err)
    }
}

/// An open notebook document: ordered cells, a uri index, and a version that
/// strictly increases on every mutation.
#[derive(Debug)]
pub struct Notebook {
    uri: String,
    version: u64,
    cells: Vec<NotebookCell>,
    by_uri: HashMap<String, usize>,
    delimiter: String,
    index: Option<LineIndex>,
}

impl Notebook {
    /// Open a notebook with the default cell delimiter.
    pub fn open(uri: impl Into<String>, cells: Vec<NotebookCell>) -> Result<Self, NotebookError> {
        Self::open_with_delimiter(uri, cells, DEFAULT_CELL_DELIMITER)
    }

    /// Open a notebook with a custom cell delimiter (the analyzer contract).
    pub fn open_with_delimiter(
        uri: impl Into<String>,
        cells: Vec<NotebookCell>,
        delimiter: &str,
    ) -> Result<Self, NotebookError> {
        let mut by_uri = HashMap::with_capacity(cells.len());
        for (ordinal, cell) in cells.iter().enumerate() {
            if by_uri.insert(cell.uri.clone(), ordinal).is_some() {
                return Err(NotebookError::DuplicateCell(cell.uri.clone()));
            }
        }
        Ok(Self {
            uri: uri.into(),
            version: 1,
            cells,
            by_uri,
            delimiter: delimiter.to_string(),
            index: None,
        })
    }

    /// The notebook uri.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The current notebook version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// The cells in notebook order.
    pub fn cells(&self) -> &[NotebookCell] {
        &self.cells
    }

    /// Look up a cell by uri.
    pub fn cell(&self, uri: &str) -> Option<&NotebookCell> {
        self.by_uri.get(uri).map(|&ordinal| &self.cells[ordinal])
    }

    /// Returns `true` if `uri` names a cell of this notebook.
    pub fn contains_cell(&self, uri: &str) -> bool {
        self.by_uri.contains_key(uri)
    }

    /// Insert and remove whole cells.
    ///
    /// Removals happen first, then insertions in batch order. The call is
    /// atomic: everything is validated against the resulting shape before the
    /// first mutation, so either the whole change applies (bumping the
    /// version once) or none of it does.
    pub fn apply_structure_change(
        &mut self,
        opened: Vec<CellInsertion>,
        closed: &[String],
    ) -> Result<(), NotebookError> {
        let closed: HashSet<&str> = closed.iter().map(String::as_str).collect();
        {
            for uri in &closed {
                if !self.by_uri.contains_key(*uri) {
                    return Err(NotebookError::UnknownCell {
                        notebook: self.uri.clone(),
                        cell: (*uri).to_string(),
                    });
                }
            }
            let mut remaining: HashSet<&str> = self
                .cells
                .iter()
                .map(|cell| cell.uri.as_str())
                .filter(|uri| !closed.contains(uri))
                .collect();
            let mut cell_count = remaining.len();
            for insertion in &opened {
                if insertion.position > cell_count {
                    return Err(NotebookError::InvalidCellPosition {
                        position: insertion.position,
                        cell_count,
                    });
                }
                if !remaining.insert(insertion.cell.uri.as_str()) {
                    return Err(NotebookError::DuplicateCell(insertion.cell.uri.clone()));
                }
                cell_count += 1;
            }
        }

        self.cells.retain(|cell| !closed.contains(cell.uri.as_str()));
        for insertion in opened {
            self.cells.insert(insertion.position, insertion.cell);
        }
        self.reindex();
        self.version += 1;
        self.index = None;
        Ok(())
    }

    /// Apply a content-change edit batch to exactly one cell.
    ///
    /// Delegates to [`patch::apply_edits`] scoped to the cell's text; on
    /// success the cell's document version and the notebook version each
    /// advance by one. A failed batch mutates nothing.
    pub fn apply_content_change(
        &mut self,
        cell_uri: &str,
        edits: &[TextEdit],
    ) -> Result<(), NotebookError> {
        let Some(&ordinal) = self.by_uri.get(cell_uri) else {
            return Err(NotebookError::UnknownCell {
                notebook: self.uri.clone(),
                cell: cell_uri.to_string(),
            });
        };
        let patched = patch::apply_edits(&self.cells[ordinal].text, edits)?;
        let cell = &mut self.cells[ordinal];
        cell.text = patched;
        cell.version += 1;
        self.version += 1;
        self.index = None;
        Ok(())
    }

    /// The line index for the current version, rebuilding it if the cached
    /// one was invalidated by a mutation. Never serves a stale index.
    pub fn line_index(&mut self) -> &LineIndex {
        let stale = !matches!(&self.index, Some(index) if index.for_version() == self.version);
        if stale {
            self.index = None;
        }
        self.index
            .get_or_insert_with(|| LineIndex::build(&self.cells, &self.delimiter, self.version))
    }

    /// The concatenated virtual document for the current version.
    pub fn virtual_text(&mut self) -> &str {
        self.line_index().text()
    }

    fn reindex(&mut self) {
        self.by_uri.clear();
        for (ordinal, cell) in self.cells.iter().enumerate() {
            self.by_uri.insert(cell.uri.clone(), ordinal);
        }
    }
}
