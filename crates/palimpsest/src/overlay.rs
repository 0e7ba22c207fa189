//! Overlay entries and their normalization.
//!
//! Overlay content reaches the compositor in one of the shapes described by
//! [`OverlaySource`]. Whatever the shape, [`OverlaySource::normalize`] turns it
//! into a single ordered sequence of [`OverlayEntry`] values, which is all the
//! compositing core ever sees.

use indexmap::IndexMap;
use log::trace;

use palimpsest_core::{
    element::{Element, ElementLike},
    identifier::CellId,
};

use crate::{
    config::MarkupConfig,
    diagnostic::{Diagnostic, DiagnosticKind, DiagnosticSink},
};

/// A piece of overlay content addressed to one diagram cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayEntry {
    id: CellId,
    content: Element,
}

impl OverlayEntry {
    /// Creates an entry placing `content` into the cell `id`.
    pub fn new(id: impl Into<CellId>, content: Element) -> Self {
        Self {
            id: id.into(),
            content,
        }
    }

    /// Returns the target cell id.
    pub fn id(&self) -> CellId {
        self.id
    }

    /// Returns the content to place.
    pub fn content(&self) -> &Element {
        &self.content
    }

    /// Splits the entry into its id and content.
    pub fn into_parts(self) -> (CellId, Element) {
        (self.id, self.content)
    }
}

/// The shapes in which callers hand overlay content to the compositor.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlaySource {
    /// Overlay cells that each carry their cell id attribute and hold a
    /// content section, in the order they should be applied.
    Cells(Vec<Element>),

    /// A sparse mapping from cell id to a node holding (or being) the content
    /// section. `None` values are skipped without any diagnostic.
    Keyed(IndexMap<CellId, Option<Element>>),

    /// Entries that are already normalized.
    Entries(Vec<OverlayEntry>),
}

impl OverlaySource {
    /// Collects every overlay cell from a holder element, in document order.
    ///
    /// Cells are recognised by the configured overlay cell class; cells nested
    /// inside another cell are not collected separately.
    pub fn from_holder(holder: Element, markup: &MarkupConfig) -> Self {
        let class = markup.overlay_cell_class();
        Self::Cells(holder.take_all(&|element| element.has_class(class)))
    }

    /// Returns the number of raw items in this source, before normalization.
    pub fn len(&self) -> usize {
        match self {
            Self::Cells(cells) => cells.len(),
            Self::Keyed(keyed) => keyed.len(),
            Self::Entries(entries) => entries.len(),
        }
    }

    /// Returns `true` if the source holds no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Produces the ordered entry sequence.
    ///
    /// Order follows the source's natural iteration order and duplicate ids
    /// are kept, so the last entry for an id wins once placed. Every content
    /// node is tagged with the configured content class so that it can be
    /// found again by later passes. Cells without an id and cells or values
    /// without a content section are reported to `sink` and skipped.
    pub fn normalize(
        self,
        markup: &MarkupConfig,
        sink: &mut dyn DiagnosticSink,
    ) -> Vec<OverlayEntry> {
        let content_class = markup.content_class();

        let entries: Vec<OverlayEntry> = match self {
            Self::Cells(cells) => cells
                .into_iter()
                .filter_map(|cell| {
                    let Some(id) = cell.attribute(markup.cell_id_attribute()).map(CellId::new)
                    else {
                        sink.emit(Diagnostic::new(DiagnosticKind::MissingCellId, None));
                        return None;
                    };
                    extract_content(cell, id, content_class, sink)
                })
                .collect(),
            Self::Keyed(keyed) => keyed
                .into_iter()
                .filter_map(|(id, value)| {
                    let value = value?;
                    extract_content(value, id, content_class, sink)
                })
                .collect(),
            Self::Entries(entries) => entries
                .into_iter()
                .map(|OverlayEntry { id, mut content }| {
                    content.add_class(content_class);
                    OverlayEntry { id, content }
                })
                .collect(),
        };

        trace!(entries = entries.len(); "Normalized overlay entries");
        entries
    }
}

impl From<Vec<OverlayEntry>> for OverlaySource {
    fn from(entries: Vec<OverlayEntry>) -> Self {
        Self::Entries(entries)
    }
}

impl From<IndexMap<CellId, Option<Element>>> for OverlaySource {
    fn from(keyed: IndexMap<CellId, Option<Element>>) -> Self {
        Self::Keyed(keyed)
    }
}

fn extract_content(
    holder: Element,
    id: CellId,
    content_class: &str,
    sink: &mut dyn DiagnosticSink,
) -> Option<OverlayEntry> {
    match holder.take_first(&|element| element.has_class(content_class)) {
        Some(content) => Some(OverlayEntry { id, content }),
        None => {
            sink.emit(Diagnostic::new(DiagnosticKind::MissingContent, Some(id)));
            None
        }
    }
}
