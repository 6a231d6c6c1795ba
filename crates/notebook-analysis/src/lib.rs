#![warn(missing_docs)]
//! Notebook Analysis - Analyzer-Facing Projection Layer
//!
//! # Overview
//!
//! `notebook-analysis` sits between `notebook-core` and the transport that
//! talks to an external static-analysis engine. It covers the synchronous
//! pre-step of an analysis round (building the virtual-document request
//! payload) and the synchronous post-step (projecting the analyzer's
//! findings and quick fixes back onto the owning cells, with explicit
//! stale-diagnostic cleanup). The analysis call itself is out-of-process and
//! asynchronous; nothing here blocks on it or schedules it.
//!
//! # Quick Start
//!
//! ```rust
//! use notebook_analysis::{Finding, NotebookAnalysisSession};
//! use notebook_core::{NotebookCell, TextRange};
//!
//! let session = NotebookAnalysisSession::new();
//! session
//!     .open(
//!         "nb:demo",
//!         vec![
//!             NotebookCell::new("cell:1", 1, "a=1\n"),
//!             NotebookCell::new("cell:2", 1, "b=2\n"),
//!         ],
//!     )
//!     .unwrap();
//!
//! // Pre-step: the payload for the analyzer.
//! let input = session.analysis_input("nb:demo").unwrap();
//! assert!(input.text.contains("a=1\n"));
//!
//! // Post-step: findings come back in virtual coordinates and are grouped
//! // per cell, with explicit empty sets for clean cells.
//! let finding = Finding {
//!     range: TextRange::at(3, 0, 3, 3),
//!     message: "unused".to_string(),
//!     rule_key: "python:S1481".to_string(),
//!     severity: None,
//!     flows: vec![],
//!     quick_fixes: vec![],
//! };
//! let projected = session.project_diagnostics("nb:demo", &[finding]).unwrap();
//! assert_eq!(projected["cell:2"].len(), 1);
//! assert!(projected["cell:1"].is_empty());
//! ```
//!
//! # Module Description
//!
//! - [`findings`] - finding/flow/quick-fix model and analyzer wire decoding
//! - [`projection`] - per-cell diagnostics projection and quick-fix fan-out
//! - [`session`] - the facade exposed to the editor-protocol layer

pub mod findings;
pub mod projection;
pub mod session;

pub use findings::{
    AnalysisInput, Finding, Flow, FlowLocation, NOTEBOOK_LANGUAGE_ID, QuickFix, QuickFixEdit,
    findings_from_value,
};
pub use projection::{
    CellDiagnostics, CellEditGroup, DiagnosticsProjector, ProjectedDiagnostic, ProjectedFlow,
    ProjectedFlowLocation, ProjectedQuickFix, project_quick_fix,
};
pub use session::{NotebookAnalysisSession, SessionConfig};
