//! The compositing core.
//!
//! One pass runs `cleanup -> normalize -> (resolve -> place)*` over a
//! [`DiagramTree`]:
//!
//! 1. **Cleanup**: in [`RenderMode::Fresh`] every overlay content node under
//!    any mount is detached first; [`RenderMode::Incremental`] leaves the
//!    tree alone.
//! 2. **Normalize**: the [`OverlaySource`] becomes an ordered entry list.
//! 3. **Resolve**: each entry's cell id is looked up in a [`CellIndex`] built
//!    once for the pass, then the mount is the first node inside the cell
//!    matching the mount selector.
//! 4. **Place**: the sizing callback sees the mount's bounding box, then the
//!    content replaces the mount's current content or is appended to it.
//!
//! Resolution failures are reported per entry and never abort the pass.

use std::{collections::HashMap, fmt};

use indexmap::IndexMap;
use log::{debug, info};

use palimpsest_core::{
    element::{Element, ElementLike},
    identifier::CellId,
    selector::Selector,
    tree::{DiagramTree, NodeId},
};

use crate::{
    config::{AppConfig, MarkupConfig},
    diagnostic::{Diagnostic, DiagnosticKind, DiagnosticSink, LogSink},
    error::OverlayError,
    overlay::OverlaySource,
    sizing::SizeContent,
};

/// Cleanup policy for one compositing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderMode {
    /// The diagram was regenerated: purge all mounted content, then place.
    #[default]
    Fresh,
    /// Targeted update: place only, leaving other mounts as they are.
    Incremental,
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fresh => f.write_str("fresh"),
            Self::Incremental => f.write_str("incremental"),
        }
    }
}

/// Lookup from cell id to the diagram node carrying it.
///
/// When several nodes carry the same id the first in document order wins.
/// Mounted overlay content is not indexed, so ids inside placed content never
/// shadow the renderer's own cells.
#[derive(Debug, Default)]
pub struct CellIndex {
    cells: HashMap<CellId, NodeId>,
}

impl CellIndex {
    /// Indexes every element under (and including) the root of `tree`.
    pub fn build(tree: &DiagramTree, markup: &MarkupConfig) -> Self {
        let mut cells = HashMap::new();
        let mut stack = vec![tree.root()];

        while let Some(id) = stack.pop() {
            let Some(element) = tree.element(id) else {
                continue;
            };
            if element.has_class(markup.content_class()) {
                continue;
            }
            if let Some(cell_id) = element.attribute(markup.cell_id_attribute()) {
                cells.entry(CellId::new(cell_id)).or_insert(id);
            }
            stack.extend(tree.children(id).iter().rev().copied());
        }

        Self { cells }
    }

    /// Returns the node carrying `id`.
    pub fn get(&self, id: CellId) -> Option<NodeId> {
        self.cells.get(&id).copied()
    }

    /// Returns the number of indexed cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if no cell was found.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A resolved placement target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentMount {
    cell: NodeId,
    mount: NodeId,
}

impl ContentMount {
    /// Returns the diagram node carrying the cell id.
    pub fn cell(&self) -> NodeId {
        self.cell
    }

    /// Returns the mount node inside the cell.
    pub fn mount(&self) -> NodeId {
        self.mount
    }
}

/// An entry that could not be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unmatched {
    cell_id: Option<CellId>,
    kind: DiagnosticKind,
}

impl Unmatched {
    /// Returns the entry's cell id, if it had one.
    pub fn cell_id(&self) -> Option<CellId> {
        self.cell_id
    }

    /// Returns why the entry was skipped.
    pub fn kind(&self) -> DiagnosticKind {
        self.kind
    }
}

/// Outcome of one compositing pass.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CompositeReport {
    placed: Vec<CellId>,
    unmatched: Vec<Unmatched>,
    detached: Vec<Element>,
}

impl CompositeReport {
    /// Cell ids whose content was placed, in placement order.
    pub fn placed(&self) -> &[CellId] {
        &self.placed
    }

    /// Entries that were skipped, in the order they were found.
    pub fn unmatched(&self) -> &[Unmatched] {
        &self.unmatched
    }

    /// Ids of the skipped entries that had one.
    pub fn unmatched_ids(&self) -> Vec<CellId> {
        self.unmatched.iter().filter_map(Unmatched::cell_id).collect()
    }

    /// Content removed from the diagram by the purge or by replacement.
    pub fn detached(&self) -> &[Element] {
        &self.detached
    }

    /// Takes ownership of the removed content.
    pub fn into_detached(self) -> Vec<Element> {
        self.detached
    }
}

/// Forwards diagnostics to the caller's sink while recording them in the report.
struct RecordingSink<'a> {
    inner: &'a mut dyn DiagnosticSink,
    unmatched: Vec<Unmatched>,
}

impl DiagnosticSink for RecordingSink<'_> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.unmatched.push(Unmatched {
            cell_id: diagnostic.cell_id(),
            kind: diagnostic.kind(),
        });
        self.inner.emit(diagnostic);
    }
}

/// Locates the mount for `id`.
///
/// # Errors
///
/// Returns [`DiagnosticKind::MissingTargetNode`] when no node carries `id`,
/// and [`DiagnosticKind::MissingContentMount`] when the node contains nothing
/// matching `selector` outside already mounted content.
pub fn resolve(
    tree: &DiagramTree,
    index: &CellIndex,
    id: CellId,
    selector: &Selector,
    markup: &MarkupConfig,
) -> Result<ContentMount, DiagnosticKind> {
    let cell = index.get(id).ok_or(DiagnosticKind::MissingTargetNode)?;
    let content_class = markup.content_class();

    let mount = tree
        .descendants(cell)
        .find(|&node| {
            selector.matches(tree, node) && !is_within_content(tree, node, cell, content_class)
        })
        .ok_or(DiagnosticKind::MissingContentMount)?;

    Ok(ContentMount { cell, mount })
}

/// Places `content` into `mount`, returning the content it displaced.
///
/// The sizing callback runs exactly once, before the content is attached,
/// with the mount's bounding box computed without any mounted content. If the
/// mount already holds content, the first content node is swapped in place
/// and any further ones are detached, so the mount ends up with exactly one.
pub fn place(
    tree: &mut DiagramTree,
    mount: NodeId,
    mut content: Element,
    sizer: &mut dyn SizeContent,
    markup: &MarkupConfig,
) -> Vec<Element> {
    let content_class = markup.content_class();

    let bounds = tree
        .subtree_bounds(mount, &|element| element.has_class(content_class))
        .unwrap_or_default();
    sizer.size_content(bounds, &mut content);

    let mut existing = content_nodes(tree, mount, content_class).into_iter();
    let mut displaced = Vec::new();

    match existing.next() {
        Some(first) => {
            if let Some((_, old)) = tree.replace(first, content) {
                displaced.push(old);
            }
        }
        None => {
            tree.append(mount, content);
        }
    }
    displaced.extend(existing.filter_map(|extra| tree.detach(extra)));

    displaced
}

/// Detaches all overlay content under every node matching `selector`.
pub fn purge(tree: &mut DiagramTree, selector: &Selector, markup: &MarkupConfig) -> Vec<Element> {
    let content_class = markup.content_class();
    let stale: Vec<NodeId> = selector
        .select_all(tree, tree.root())
        .into_iter()
        .flat_map(|mount| content_nodes(tree, mount, content_class))
        .collect();

    stale.into_iter().filter_map(|node| tree.detach(node)).collect()
}

/// Outermost overlay content nodes below `scope`, in document order.
fn content_nodes(tree: &DiagramTree, scope: NodeId, content_class: &str) -> Vec<NodeId> {
    let mut found = Vec::new();
    let mut stack: Vec<NodeId> = tree.children(scope).iter().rev().copied().collect();

    while let Some(id) = stack.pop() {
        let Some(element) = tree.element(id) else {
            continue;
        };
        if element.has_class(content_class) {
            found.push(id);
        } else {
            stack.extend(tree.children(id).iter().rev().copied());
        }
    }
    found
}

fn is_within_content(tree: &DiagramTree, node: NodeId, cell: NodeId, content_class: &str) -> bool {
    std::iter::once(node)
        .chain(tree.ancestors(node).take_while(|&ancestor| ancestor != cell))
        .any(|id| {
            tree.element(id)
                .is_some_and(|element| element.has_class(content_class))
        })
}

/// Runs one full pass. Shared by every public entry point.
fn run_pass(
    tree: &mut DiagramTree,
    source: OverlaySource,
    mode: RenderMode,
    selector: &Selector,
    markup: &MarkupConfig,
    sizer: &mut dyn SizeContent,
    sink: &mut dyn DiagnosticSink,
) -> CompositeReport {
    info!(mode:% = mode, selector:% = selector, items = source.len(); "Compositing overlays");

    let mut report = CompositeReport::default();

    if mode == RenderMode::Fresh {
        let purged = purge(tree, selector, markup);
        debug!(purged = purged.len(); "Purged existing overlay content");
        report.detached.extend(purged);
    }

    let mut recording = RecordingSink {
        inner: sink,
        unmatched: Vec::new(),
    };

    let entries = source.normalize(markup, &mut recording);
    let index = CellIndex::build(tree, markup);

    for entry in entries {
        let (id, content) = entry.into_parts();
        match resolve(tree, &index, id, selector, markup) {
            Ok(target) => {
                let displaced = place(tree, target.mount, content, sizer, markup);
                debug!(cell_id:% = id, replaced = !displaced.is_empty(); "Placed overlay content");
                report.detached.extend(displaced);
                report.placed.push(id);
            }
            Err(kind) => recording.emit(Diagnostic::new(kind, Some(id))),
        }
    }

    report.unmatched = recording.unmatched;

    let reclaimed = tree.compact();
    debug!(reclaimed; "Compacted diagram arena");

    info!(
        placed = report.placed.len(),
        unmatched = report.unmatched.len();
        "Compositing finished"
    );
    report
}

/// Composites overlay content onto diagram trees.
///
/// A compositor holds the parsed mount selector and the markup conventions,
/// and can be reused for any number of passes over any number of trees.
///
/// # Example
///
/// ```
/// # use palimpsest::{Compositor, config::MarkupConfig, sizing::FitToBounds};
/// # use palimpsest_core::{element::Element, tree::DiagramTree};
/// let mut tree = DiagramTree::from_svg(
///     r#"<svg><g data-cell-id="A"><g class="mount"><rect width="10" height="10"/></g></g></svg>"#,
/// )
/// .unwrap();
/// let cell = Element::new("g")
///     .with_attribute("data-cell-id", "A")
///     .with_child(Element::new("svg").with_attribute("class", "content"));
///
/// let compositor = Compositor::new(".mount", MarkupConfig::default()).unwrap();
/// let report = compositor
///     .composite_fresh(&mut tree, vec![cell], &mut FitToBounds::default())
///     .unwrap();
///
/// assert_eq!(report.placed().len(), 1);
/// assert!(tree.to_svg().contains(r#"class="content""#));
/// ```
#[derive(Debug, Clone)]
pub struct Compositor {
    selector: Selector,
    markup: MarkupConfig,
    strict: bool,
}

impl Compositor {
    /// Creates a compositor placing content into nodes matching `selector`.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::Selector`] if `selector` cannot be parsed.
    pub fn new(selector: &str, markup: MarkupConfig) -> Result<Self, OverlayError> {
        let selector = Selector::parse(selector)?;
        Ok(Self {
            selector,
            markup,
            strict: false,
        })
    }

    /// Creates a compositor from the application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::Selector`] if `selector` cannot be parsed.
    pub fn from_config(selector: &str, config: &AppConfig) -> Result<Self, OverlayError> {
        Ok(Self::new(selector, config.markup().clone())?.with_strict(config.compositor().strict()))
    }

    /// Enables or disables strict mode.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Returns the mount selector.
    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Returns the markup conventions.
    pub fn markup(&self) -> &MarkupConfig {
        &self.markup
    }

    /// Returns `true` if unplaced entries fail the call.
    pub fn strict(&self) -> bool {
        self.strict
    }

    /// Runs one compositing pass.
    ///
    /// Per-entry mismatches go to `sink` and never stop the pass. The tree is
    /// compacted at the end of the pass, so node ids taken before the call are
    /// not valid after it.
    ///
    /// # Errors
    ///
    /// In strict mode, returns [`OverlayError::Unmatched`] when at least one
    /// entry could not be placed. The tree has been updated for every entry
    /// that could.
    pub fn composite(
        &self,
        tree: &mut DiagramTree,
        source: OverlaySource,
        mode: RenderMode,
        sizer: &mut dyn SizeContent,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<CompositeReport, OverlayError> {
        let report = run_pass(
            tree,
            source,
            mode,
            &self.selector,
            &self.markup,
            sizer,
            sink,
        );

        if self.strict && !report.unmatched().is_empty() {
            return Err(OverlayError::Unmatched {
                report: Box::new(report),
            });
        }
        Ok(report)
    }

    /// Purges all mounted content, then places each overlay cell.
    ///
    /// Mismatches are logged as warnings.
    ///
    /// # Errors
    ///
    /// See [`Compositor::composite`].
    pub fn composite_fresh(
        &self,
        tree: &mut DiagramTree,
        cells: Vec<Element>,
        sizer: &mut dyn SizeContent,
    ) -> Result<CompositeReport, OverlayError> {
        self.composite(
            tree,
            OverlaySource::Cells(cells),
            RenderMode::Fresh,
            sizer,
            &mut LogSink,
        )
    }

    /// Places each present value of a sparse id-to-content map, leaving every
    /// other mount untouched.
    ///
    /// Mismatches are logged as warnings.
    ///
    /// # Errors
    ///
    /// See [`Compositor::composite`].
    pub fn composite_incremental(
        &self,
        tree: &mut DiagramTree,
        keyed: IndexMap<CellId, Option<Element>>,
        sizer: &mut dyn SizeContent,
    ) -> Result<CompositeReport, OverlayError> {
        self.composite(
            tree,
            OverlaySource::Keyed(keyed),
            RenderMode::Incremental,
            sizer,
            &mut LogSink,
        )
    }
}
