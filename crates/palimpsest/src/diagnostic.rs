//! Per-entry diagnostics for compositing passes.
//!
//! A compositing pass never aborts because one overlay entry cannot be placed.
//! Instead each mismatch becomes a [`Diagnostic`] handed to a
//! [`DiagnosticSink`], and the pass moves on to the next entry.
//!
//! Two sinks are provided:
//! - [`LogSink`] writes a warning through the `log` facade (the default).
//! - [`DiagnosticCollector`] keeps every diagnostic for later inspection.

use std::fmt;

use log::warn;

use palimpsest_core::identifier::CellId;

/// The kind of recoverable mismatch found while compositing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// No diagram node carries the entry's cell id.
    MissingTargetNode,
    /// The diagram node exists but contains nothing matching the mount selector.
    MissingContentMount,
    /// The overlay cell or value has no content section to transplant.
    MissingContent,
    /// An overlay cell does not declare which diagram cell it belongs to.
    MissingCellId,
}

impl DiagnosticKind {
    /// Returns a stable name for this kind.
    pub fn name(self) -> &'static str {
        match self {
            Self::MissingTargetNode => "missing-target-node",
            Self::MissingContentMount => "missing-content-mount",
            Self::MissingContent => "missing-content",
            Self::MissingCellId => "missing-cell-id",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One recoverable mismatch, identifying the offending cell when known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    kind: DiagnosticKind,
    cell_id: Option<CellId>,
    message: String,
}

impl Diagnostic {
    /// Creates a diagnostic for the given cell.
    pub fn new(kind: DiagnosticKind, cell_id: Option<CellId>) -> Self {
        let message = match (kind, cell_id) {
            (DiagnosticKind::MissingTargetNode, Some(id)) => {
                format!("cannot find target cell for cell id `{id}`")
            }
            (DiagnosticKind::MissingContentMount, Some(id)) => {
                format!("cannot find content mount inside cell `{id}`")
            }
            (DiagnosticKind::MissingContent, Some(id)) => {
                format!("cannot find content section to place into cell `{id}`")
            }
            (DiagnosticKind::MissingCellId, _) => "overlay cell has no cell id".to_string(),
            (kind, None) => format!("{kind} for an overlay entry without cell id"),
        };
        Self {
            kind,
            cell_id,
            message,
        }
    }

    /// Returns the diagnostic kind.
    pub fn kind(&self) -> DiagnosticKind {
        self.kind
    }

    /// Returns the offending cell id, if the entry had one.
    pub fn cell_id(&self) -> Option<CellId> {
        self.cell_id
    }

    /// Returns the human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Receiver of per-entry diagnostics.
pub trait DiagnosticSink {
    /// Accepts one diagnostic.
    fn emit(&mut self, diagnostic: Diagnostic);
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn emit(&mut self, diagnostic: Diagnostic) {
        (**self).emit(diagnostic);
    }
}

/// Sink that logs every diagnostic as a warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn emit(&mut self, diagnostic: Diagnostic) {
        match diagnostic.cell_id() {
            Some(cell_id) => warn!(
                kind:% = diagnostic.kind(),
                cell_id:% = cell_id;
                "{}", diagnostic.message()
            ),
            None => warn!(kind:% = diagnostic.kind(); "{}", diagnostic.message()),
        }
    }
}

/// A collector for accumulating diagnostics during a pass.
///
/// # Example
///
/// ```
/// # use palimpsest::diagnostic::{Diagnostic, DiagnosticCollector, DiagnosticKind, DiagnosticSink};
/// # use palimpsest_core::identifier::CellId;
/// let mut collector = DiagnosticCollector::new();
/// collector.emit(Diagnostic::new(DiagnosticKind::MissingTargetNode, Some(CellId::new("X"))));
///
/// assert_eq!(collector.len(), 1);
/// assert_eq!(collector.cell_ids(), vec![CellId::new("X")]);
/// ```
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collected diagnostics in emission order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Returns the number of collected diagnostics.
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Returns `true` if nothing was collected.
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Returns the cell ids named by the collected diagnostics, in order.
    pub fn cell_ids(&self) -> Vec<CellId> {
        self.diagnostics
            .iter()
            .filter_map(Diagnostic::cell_id)
            .collect()
    }

    /// Consumes the collector, returning the diagnostics.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl DiagnosticSink for DiagnosticCollector {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}
