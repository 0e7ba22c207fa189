//! Error adapter for converting OverlayError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI. Selector errors
//! are rendered with a label pointing into the selector text.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, SourceSpan};

use palimpsest::{OverlayError, selector::SelectorError};

/// Adapter for a selector parse error.
pub struct SelectorAdapter<'a> {
    /// The wrapped error
    err: &'a SelectorError,
    /// Selector text for displaying the snippet
    src: &'a str,
}

impl<'a> SelectorAdapter<'a> {
    /// Create a new selector adapter.
    pub fn new(err: &'a SelectorError) -> Self {
        Self {
            err,
            src: err.selector(),
        }
    }
}

impl fmt::Debug for SelectorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectorAdapter")
            .field("err", &self.err)
            .finish()
    }
}

impl fmt::Display for SelectorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid mount selector `{}`", self.src)
    }
}

impl std::error::Error for SelectorAdapter<'_> {}

impl MietteDiagnostic for SelectorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("palimpsest::selector"))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(
            "supported: type, .class, #id and [attr] / [attr=value] selectors joined by spaces",
        ))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let offset = self.err.offset();
        let len = usize::from(offset < self.src.len());
        let span = SourceSpan::new(offset.into(), len);
        Some(Box::new(std::iter::once(LabeledSpan::new_primary_with_span(
            Some(self.err.reason().to_string()),
            span,
        ))))
    }
}

/// Adapter for [`OverlayError`] variants without source text.
pub struct ErrorAdapter<'a>(pub &'a OverlayError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            OverlayError::Io(_) => "palimpsest::io",
            OverlayError::Selector(_) => "palimpsest::selector",
            OverlayError::Markup(_) => "palimpsest::markup",
            OverlayError::Unmatched { .. } => "palimpsest::unmatched",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let ids = self.0.unmatched_ids();
        if ids.is_empty() {
            return None;
        }
        let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
        Some(Box::new(format!("unplaced cells: {}", ids.join(", "))))
    }
}

/// A reportable error that can be rendered by miette.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A selector error with a span into the selector text.
    Selector(SelectorAdapter<'a>),
    /// A simple error without source location.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Selector(s) => fmt::Display::fmt(s, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Selector(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Selector(s) => s.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Selector(s) => s.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Selector(s) => s.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Selector(s) => s.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

/// Convert an [`OverlayError`] into a list of reportable errors.
pub fn to_reportables(err: &OverlayError) -> Vec<Reportable<'_>> {
    match err {
        OverlayError::Selector(selector_err) => {
            vec![Reportable::Selector(SelectorAdapter::new(selector_err))]
        }
        _ => vec![Reportable::Error(ErrorAdapter(err))],
    }
}
