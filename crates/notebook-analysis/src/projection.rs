//! Projection of virtual-document findings back onto notebook cells.
//!
//! The analyzer answers in virtual-document coordinates; the editor wants
//! diagnostics per cell document. [`DiagnosticsProjector::project`] performs
//! that grouping, with two asymmetries:
//!
//! - **Explicit empty sets.** For the editor, omitting a cell from a publish
//!   round means "leave its diagnostics untouched", not "no issues". Every
//!   cell of the notebook therefore gets an entry on every pass, and cells
//!   that carried diagnostics on the previous pass but have disappeared from
//!   the notebook get an explicit empty entry as well.
//! - **Drop and log.** Analysis is asynchronous, so a result computed
//!   against version N may arrive after version N+1 exists. Unmappable or
//!   boundary-straddling ranges are dropped with a warning, never surfaced.
//!
//! Quick fixes are the one place fan-out is required: a single fix's edits
//! may land in different cells, and the per-cell groups must still be
//! presented (and applied) as one atomic fix.

use crate::findings::{Finding, Flow, QuickFix};
use dashmap::DashMap;
use log::warn;
use notebook_core::{LineIndex, MapError, Notebook, TextEdit, TextRange};
use std::collections::{BTreeMap, HashSet};

/// A finding projected into one cell's coordinate space.
///
/// Ephemeral: valid only for the notebook version it was computed against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedDiagnostic {
    /// Uri of the owning cell.
    pub cell_uri: String,
    /// Range in cell-local coordinates.
    pub range: TextRange,
    /// Human-readable message.
    pub message: String,
    /// Rule identifier.
    pub rule_key: String,
    /// Optional severity tag.
    pub severity: Option<String>,
    /// Projected secondary location chains.
    pub flows: Vec<ProjectedFlow>,
}

/// A [`Flow`] with every location resolved to its owning cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedFlow {
    /// The chain's locations, in analyzer order.
    pub locations: Vec<ProjectedFlowLocation>,
}

/// A single projected secondary location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedFlowLocation {
    /// Uri of the owning cell.
    pub cell_uri: String,
    /// Range in cell-local coordinates.
    pub range: TextRange,
    /// Optional step message.
    pub message: Option<String>,
}

/// A quick fix re-emitted as per-cell edit groups that together still form
/// one atomic fix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedQuickFix {
    /// Human-readable fix description.
    pub message: String,
    /// Edit groups, one per cell touched, in order of first appearance.
    pub cell_edits: Vec<CellEditGroup>,
}

/// The edits of one quick fix that land in one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellEditGroup {
    /// Uri of the cell the edits apply to.
    pub cell_uri: String,
    /// Edits in cell-local coordinates.
    pub edits: Vec<TextEdit>,
}

/// Diagnostics grouped per cell uri, ready for publishing.
pub type CellDiagnostics = BTreeMap<String, Vec<ProjectedDiagnostic>>;

/// Groups projected findings per cell and manages stale-diagnostic cleanup.
///
/// Tracks, per notebook, which cell uris carried diagnostics on the previous
/// pass; concurrent projections for *different* notebooks are safe.
#[derive(Debug, Default)]
pub struct DiagnosticsProjector {
    carried: DashMap<String, HashSet<String>>,
}

impl DiagnosticsProjector {
    /// Create a projector with no publication history.
    pub fn new() -> Self {
        Self {
            carried: DashMap::new(),
        }
    }

    /// Project `findings` onto the cells of `notebook`.
    ///
    /// The result has an entry for every cell of the notebook (explicitly
    /// empty when the cell has no findings) plus an empty entry for every
    /// cell that carried diagnostics on the previous pass but no longer
    /// exists. Unmappable findings are dropped with a warning.
    pub fn project(&self, notebook: &mut Notebook, findings: &[Finding]) -> CellDiagnostics {
        let notebook_uri = notebook.uri().to_string();
        let index = notebook.line_index();

        let mut out: CellDiagnostics = index
            .cell_uris()
            .map(|uri| (uri.to_string(), Vec::new()))
            .collect();

        for finding in findings {
            match project_finding(index, finding) {
                Ok(diagnostic) => {
                    out.entry(diagnostic.cell_uri.clone())
                        .or_default()
                        .push(diagnostic);
                }
                Err(err) => {
                    warn!(
                        "Dropping finding {} in {}: {}",
                        finding.rule_key, notebook_uri, err
                    );
                }
            }
        }

        let carried_now: HashSet<String> = out
            .iter()
            .filter(|(_, diagnostics)| !diagnostics.is_empty())
            .map(|(uri, _)| uri.clone())
            .collect();
        if let Some(previous) = self.carried.insert(notebook_uri, carried_now) {
            // Cells gone from the notebook must still regress to empty.
            for uri in previous {
                out.entry(uri).or_default();
            }
        }

        out
    }

    /// Publish an empty set for every cell of a closing notebook and forget
    /// its publication history. The caller invokes this once per actual
    /// close; [`notebook_core::NotebookRegistry::close`] being idempotent
    /// guarantees it cannot re-fire for a notebook already closed.
    pub fn remove_all(&self, notebook: &Notebook) -> CellDiagnostics {
        let mut out: CellDiagnostics = notebook
            .cells()
            .iter()
            .map(|cell| (cell.uri().to_string(), Vec::new()))
            .collect();
        if let Some((_, previous)) = self.carried.remove(notebook.uri()) {
            for uri in previous {
                out.entry(uri).or_default();
            }
        }
        out
    }
}

fn project_finding(index: &LineIndex, finding: &Finding) -> Result<ProjectedDiagnostic, MapError> {
    let mapped = index.map_range(&finding.range)?;

    let mut flows = Vec::with_capacity(finding.flows.len());
    for flow in &finding.flows {
        match project_flow(index, flow) {
            Ok(projected) => flows.push(projected),
            Err(err) => {
                warn!("Dropping flow of finding {}: {}", finding.rule_key, err);
            }
        }
    }

    Ok(ProjectedDiagnostic {
        cell_uri: mapped.cell_uri.to_string(),
        range: mapped.range,
        message: finding.message.clone(),
        rule_key: finding.rule_key.clone(),
        severity: finding.severity.clone(),
        flows,
    })
}

/// Project one flow; a flow with any unmappable location is rejected whole so
/// a partially-projected execution path is never shown.
fn project_flow(index: &LineIndex, flow: &Flow) -> Result<ProjectedFlow, MapError> {
    let mut locations = Vec::with_capacity(flow.locations.len());
    for location in &flow.locations {
        let mapped = index.map_range(&location.range)?;
        locations.push(ProjectedFlowLocation {
            cell_uri: mapped.cell_uri.to_string(),
            range: mapped.range,
            message: location.message.clone(),
        });
    }
    Ok(ProjectedFlow { locations })
}

/// Map a quick fix's edits onto their owning cells.
///
/// Each edit is mapped independently; edits are grouped per cell in order of
/// first appearance, preserving the fix's atomicity. A fix containing any
/// unmappable or boundary-straddling edit is dropped whole (with a warning),
/// since applying it partially would corrupt the document.
pub fn project_quick_fix(index: &LineIndex, fix: &QuickFix) -> Option<ProjectedQuickFix> {
    let mut cell_edits: Vec<CellEditGroup> = Vec::new();
    for edit in &fix.edits {
        let mapped = match index.map_range(&edit.range) {
            Ok(mapped) => mapped,
            Err(err) => {
                warn!("Dropping quick fix {:?}: {}", fix.message, err);
                return None;
            }
        };
        let text_edit = TextEdit::new(mapped.range, edit.new_text.clone());
        match cell_edits
            .iter_mut()
            .find(|group| group.cell_uri == mapped.cell_uri)
        {
            Some(group) => group.edits.push(text_edit),
            None => cell_edits.push(CellEditGroup {
                cell_uri: mapped.cell_uri.to_string(),
                edits: vec![text_edit],
            }),
        }
    }
    Some(ProjectedQuickFix {
        message: fix.message.clone(),
        cell_edits,
    })
}
