//! A diagram view wiring the state hub to the compositor.
//!
//! [`DiagramView`] owns a rendered diagram and its [`StateHub`]. It reacts to
//! two channels:
//!
//! - `overlayData`: every publish runs a compositing pass with the published
//!   entries. The pass is [`RenderMode::Incremental`] while an instance is
//!   selected and [`RenderMode::Fresh`] otherwise.
//! - `hoveredCallout`: the highlight class moves to the cell of the hovered
//!   callout, or is cleared when nothing is hovered.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use log::{debug, warn};

use palimpsest_core::{identifier::CellId, tree::DiagramTree};

use crate::{
    compositor::{CellIndex, CompositeReport, Compositor, RenderMode},
    diagnostic::LogSink,
    overlay::{OverlayEntry, OverlaySource},
    sizing::SizeContent,
    state::{Callout, StateHub, Subscription},
};

/// A rendered diagram together with the shared state driving its overlays.
pub struct DiagramView {
    tree: Rc<RefCell<DiagramTree>>,
    hub: StateHub,
    last_report: Rc<RefCell<Option<CompositeReport>>>,
    _subscriptions: Vec<Subscription>,
}

impl DiagramView {
    /// Creates a view over `tree`.
    ///
    /// No pass runs until overlay data is first published.
    pub fn new(tree: DiagramTree, compositor: Compositor, sizer: impl SizeContent + 'static) -> Self {
        let tree = Rc::new(RefCell::new(tree));
        let hub = StateHub::new();
        let last_report = Rc::new(RefCell::new(None));
        let compositor = Rc::new(compositor);

        let overlays = Self::watch_overlay_data(
            &hub,
            Rc::clone(&tree),
            Rc::clone(&compositor),
            Box::new(sizer),
            Rc::clone(&last_report),
        );
        let hover = Self::watch_hovered_callout(&hub, Rc::clone(&tree), compositor);

        Self {
            tree,
            hub,
            last_report,
            _subscriptions: vec![overlays, hover],
        }
    }

    /// Returns the view's state hub.
    pub fn hub(&self) -> &StateHub {
        &self.hub
    }

    /// Runs `f` with read access to the diagram.
    ///
    /// # Panics
    ///
    /// Panics if called from a subscriber while a pass is running.
    pub fn with_tree<R>(&self, f: impl FnOnce(&DiagramTree) -> R) -> R {
        f(&self.tree.borrow())
    }

    /// Returns the report of the most recent pass.
    pub fn last_report(&self) -> Option<CompositeReport> {
        self.last_report.borrow().clone()
    }

    fn watch_overlay_data(
        hub: &StateHub,
        tree: Rc<RefCell<DiagramTree>>,
        compositor: Rc<Compositor>,
        sizer: Box<dyn SizeContent>,
        last_report: Rc<RefCell<Option<CompositeReport>>>,
    ) -> Subscription {
        let selected_instance = hub.selected_instance().clone();
        let sizer = RefCell::new(sizer);
        let primed = Cell::new(false);

        hub.overlay_data().subscribe(move |entries: &Vec<OverlayEntry>| {
            if !primed.replace(true) {
                return;
            }

            let mode = if selected_instance.with(Option::is_some) {
                RenderMode::Incremental
            } else {
                RenderMode::Fresh
            };

            let result = compositor.composite(
                &mut tree.borrow_mut(),
                OverlaySource::Entries(entries.clone()),
                mode,
                sizer.borrow_mut().as_mut(),
                &mut LogSink,
            );

            let report = match result {
                Ok(report) => Some(report),
                Err(err) => {
                    warn!(err:%; "Overlay pass failed");
                    err.report().cloned()
                }
            };
            *last_report.borrow_mut() = report;
        })
    }

    fn watch_hovered_callout(
        hub: &StateHub,
        tree: Rc<RefCell<DiagramTree>>,
        compositor: Rc<Compositor>,
    ) -> Subscription {
        let highlighted: Cell<Option<CellId>> = Cell::new(None);

        hub.hovered_callout().subscribe(move |callout: &Option<Callout>| {
            let target = callout.as_ref().map(Callout::cell_id);
            let previous = highlighted.replace(target);
            if previous.is_none() && target.is_none() {
                return;
            }

            let markup = compositor.markup();
            let mut tree = tree.borrow_mut();
            let index = CellIndex::build(&tree, markup);

            if let Some(node) = previous.and_then(|id| index.get(id)) {
                tree.remove_class(node, markup.highlight_class());
            }
            match target.and_then(|id| index.get(id)) {
                Some(node) => {
                    tree.add_class(node, markup.highlight_class());
                }
                None => {
                    if let Some(id) = target {
                        debug!(cell_id:% = id; "Hovered callout has no diagram cell");
                    }
                }
            }
        })
    }
}
