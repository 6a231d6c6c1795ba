#![warn(missing_docs)]
//! Notebook Core - Virtual-Document Synchronization Kernel
//!
//! # Overview
//!
//! `notebook-core` lets a line-oriented, single-file static-analysis engine
//! analyze a multi-cell notebook: the cells are presented to the analyzer as
//! one concatenated "virtual document" (with sentinel delimiter lines marking
//! cell boundaries), and the analyzer's line-addressed results are mapped
//! back into the coordinate space of the individual, independently editable
//! cells. The analyzer itself, the editor-protocol transport, and any
//! persistence are external collaborators; this crate is purely in-memory
//! and entirely language-agnostic; cell text is an opaque line sequence.
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  NotebookRegistry (concurrent, per-uri)     │  ← Open documents
//! ├─────────────────────────────────────────────┤
//! │  Notebook / NotebookCell (versioned model)  │  ← Document state
//! ├─────────────────────────────────────────────┤
//! │  LineIndex (virtual document + mapping)     │  ← Coordinate transform
//! ├─────────────────────────────────────────────┤
//! │  Patch application (multi-edit batches)     │  ← Text mutation
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use notebook_core::{Notebook, NotebookCell, TextEdit, TextRange};
//!
//! let mut notebook = Notebook::open(
//!     "nb:demo",
//!     vec![
//!         NotebookCell::new("cell:1", 1, "a=1\n"),
//!         NotebookCell::new("cell:2", 1, "b=2\n"),
//!     ],
//! )
//! .unwrap();
//!
//! // The virtual document is what the analyzer sees.
//! assert!(notebook.virtual_text().contains("a=1\n"));
//!
//! // An analyzer line maps back to the owning cell.
//! let owner = notebook.line_index().cell_for_line(3).unwrap();
//! assert_eq!(owner.cell_uri, "cell:2");
//!
//! // Content changes are applied as order-independent edit batches.
//! notebook
//!     .apply_content_change(
//!         "cell:1",
//!         &[TextEdit::new(TextRange::at(1, 2, 1, 3), "42")],
//!     )
//!     .unwrap();
//! assert_eq!(notebook.cell("cell:1").unwrap().text(), "a=42\n");
//! ```
//!
//! # Module Description
//!
//! - [`patch`] - order-independent multi-edit patch application
//! - [`notebook`] - versioned cell / notebook document model
//! - [`line_index`] - virtual document build and reverse line mapping
//! - [`registry`] - concurrent registry of open notebooks

pub mod line_index;
pub mod notebook;
pub mod patch;
pub mod registry;

pub use line_index::{CellLine, CellRange, DEFAULT_CELL_DELIMITER, LineIndex, MapError};
pub use notebook::{CellInsertion, Notebook, NotebookCell, NotebookError};
pub use patch::{PatchError, TextEdit, TextPosition, TextRange, apply_edits};
pub use registry::NotebookRegistry;
