//! Error types for Palimpsest operations.
//!
//! Per-entry mismatches are not errors; they go to a
//! [`DiagnosticSink`](crate::diagnostic::DiagnosticSink). [`OverlayError`]
//! covers the conditions that make a whole call fail.

use std::io;

use thiserror::Error;

use palimpsest_core::{identifier::CellId, markup::MarkupError, selector::SelectorError};

use crate::compositor::CompositeReport;

/// The main error type for Palimpsest operations.
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The mount selector could not be parsed. Raised before any mutation.
    #[error(transparent)]
    Selector(#[from] SelectorError),

    #[error("Markup error: {0}")]
    Markup(#[from] MarkupError),

    /// Strict mode only: the pass was applied, but some entries could not be
    /// placed.
    #[error("{} overlay entries could not be placed", report.unmatched().len())]
    Unmatched { report: Box<CompositeReport> },
}

impl OverlayError {
    /// Returns the ids of the entries that could not be placed, if this is an
    /// [`OverlayError::Unmatched`] error.
    pub fn unmatched_ids(&self) -> Vec<CellId> {
        match self {
            Self::Unmatched { report } => report.unmatched_ids(),
            _ => Vec::new(),
        }
    }

    /// Returns the report of a strict-mode failure.
    pub fn report(&self) -> Option<&CompositeReport> {
        match self {
            Self::Unmatched { report } => Some(report),
            _ => None,
        }
    }
}
