//! Session facade: registry + projector + analyzer configuration.
//!
//! This is the surface the editor-protocol layer talks to. It owns the
//! concurrent notebook registry and the diagnostics projector, and carries
//! the two configuration values of the analyzer contract (the cell delimiter
//! text and the language tag). Everything here is synchronous and CPU-bound;
//! scheduling the actual analysis call is the transport layer's job.

use crate::findings::{AnalysisInput, Finding, NOTEBOOK_LANGUAGE_ID, QuickFix};
use crate::projection::{self, CellDiagnostics, DiagnosticsProjector, ProjectedQuickFix};
use log::debug;
use notebook_core::{
    CellInsertion, DEFAULT_CELL_DELIMITER, Notebook, NotebookCell, NotebookError,
    NotebookRegistry, TextEdit,
};

/// Analyzer-contract configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Sentinel line inserted between cells in the virtual document.
    pub cell_delimiter: String,
    /// Language/kind tag sent with every analysis request.
    pub language_id: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cell_delimiter: DEFAULT_CELL_DELIMITER.to_string(),
            language_id: NOTEBOOK_LANGUAGE_ID.to_string(),
        }
    }
}

/// One process-wide notebook analysis session.
///
/// Mutators for a single notebook must be called in editor notification
/// order (single writer per notebook); calls addressing different notebooks
/// may run concurrently.
#[derive(Debug, Default)]
pub struct NotebookAnalysisSession {
    registry: NotebookRegistry,
    projector: DiagnosticsProjector,
    config: SessionConfig,
}

impl NotebookAnalysisSession {
    /// Create a session with the default analyzer contract.
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    /// Create a session with a custom analyzer contract.
    pub fn with_config(config: SessionConfig) -> Self {
        Self {
            registry: NotebookRegistry::new(),
            projector: DiagnosticsProjector::new(),
            config,
        }
    }

    /// The underlying notebook registry.
    pub fn registry(&self) -> &NotebookRegistry {
        &self.registry
    }

    /// Open a notebook from its editor document state.
    pub fn open(&self, uri: &str, cells: Vec<NotebookCell>) -> Result<(), NotebookError> {
        let notebook = Notebook::open_with_delimiter(uri, cells, &self.config.cell_delimiter)?;
        debug!("Opened notebook {} ({} cells)", uri, notebook.cell_count());
        self.registry.open(notebook);
        Ok(())
    }

    /// Close a notebook, returning the empty diagnostic sets to publish for
    /// its cells. Idempotent: a repeated close returns `None` and publishes
    /// nothing, so the cleanup cannot re-fire.
    pub fn close(&self, uri: &str) -> Option<CellDiagnostics> {
        let notebook = self.registry.close(uri)?;
        debug!("Closed notebook {}", uri);
        Some(self.projector.remove_all(&notebook))
    }

    /// Insert/remove whole cells of an open notebook.
    pub fn apply_structure_change(
        &self,
        uri: &str,
        opened: Vec<CellInsertion>,
        closed: &[String],
    ) -> Result<(), NotebookError> {
        let mut notebook = self
            .registry
            .get_mut(uri)
            .ok_or_else(|| NotebookError::UnknownNotebook(uri.to_string()))?;
        notebook.apply_structure_change(opened, closed)
    }

    /// Apply a content-change edit batch to one cell of an open notebook.
    pub fn apply_content_change(
        &self,
        uri: &str,
        cell_uri: &str,
        edits: &[TextEdit],
    ) -> Result<(), NotebookError> {
        let mut notebook = self
            .registry
            .get_mut(uri)
            .ok_or_else(|| NotebookError::UnknownNotebook(uri.to_string()))?;
        notebook.apply_content_change(cell_uri, edits)
    }

    /// Build the analysis request payload for a notebook's current version.
    pub fn analysis_input(&self, uri: &str) -> Option<AnalysisInput> {
        let mut notebook = self.registry.get_mut(uri)?;
        Some(AnalysisInput {
            notebook_uri: notebook.uri().to_string(),
            language_id: self.config.language_id.clone(),
            text: notebook.virtual_text().to_string(),
        })
    }

    /// Project analyzer findings onto a notebook's cells.
    pub fn project_diagnostics(&self, uri: &str, findings: &[Finding]) -> Option<CellDiagnostics> {
        let mut notebook = self.registry.get_mut(uri)?;
        Some(self.projector.project(&mut notebook, findings))
    }

    /// Project one quick fix into per-cell edit groups.
    pub fn project_quick_fix(&self, uri: &str, fix: &QuickFix) -> Option<ProjectedQuickFix> {
        let mut notebook = self.registry.get_mut(uri)?;
        projection::project_quick_fix(notebook.line_index(), fix)
    }

    /// Resolve an absolute virtual-document line to the owning cell's uri
    /// (single-line lookup for navigation features).
    pub fn cell_uri_for_absolute_line(&self, uri: &str, line: u32) -> Option<String> {
        let mut notebook = self.registry.get_mut(uri)?;
        notebook
            .line_index()
            .cell_for_line(line)
            .map(|resolved| resolved.cell_uri.to_string())
    }

    /// Returns `true` if `cell_uri` names a cell of any open notebook.
    pub fn is_known_cell_uri(&self, cell_uri: &str) -> bool {
        self.registry.is_known_cell_uri(cell_uri)
    }

    /// Find the uri of the open notebook owning `cell_uri`.
    pub fn find_owning_notebook(&self, cell_uri: &str) -> Option<String> {
        self.registry.find_owning_notebook(cell_uri)
    }
}
