//! Palimpsest - composites overlay content onto rendered diagrams.
//!
//! A diagram renderer and an overlay producer work independently of each
//! other. They agree on one convention only: diagram nodes and overlay cells
//! carry the same cell identifier. This crate projects each piece of overlay
//! content onto the mount point inside the matching diagram node, tolerating
//! entries that do not match anything, and replacing content in place so that
//! repeated passes are idempotent.
//!
//! The main entry points are:
//!
//! - [`Compositor`] for one-off compositing passes over a [`DiagramTree`](tree::DiagramTree).
//! - [`view::DiagramView`] for a long-lived diagram driven through a
//!   [`state::StateHub`].
//!
//! # Example
//!
//! ```
//! use indexmap::IndexMap;
//! use palimpsest::{Compositor, config::AppConfig, sizing::FitToBounds};
//! use palimpsest_core::{element::Element, identifier::CellId, tree::DiagramTree};
//!
//! let mut tree = DiagramTree::from_svg(
//!     r#"<svg><g data-cell-id="A"><g class="box"/></g><g data-cell-id="B"><g class="box"/></g></svg>"#,
//! )
//! .unwrap();
//!
//! let mut overlays = IndexMap::new();
//! overlays.insert(CellId::new("A"), Some(Element::new("text").with_attribute("class", "content")));
//! overlays.insert(CellId::new("B"), None);
//!
//! let compositor = Compositor::from_config(".box", &AppConfig::default()).unwrap();
//! let report = compositor
//!     .composite_incremental(&mut tree, overlays, &mut FitToBounds::default())
//!     .unwrap();
//!
//! assert_eq!(report.placed(), &[CellId::new("A")]);
//! ```

pub mod compositor;
pub mod config;
pub mod diagnostic;
pub mod overlay;
pub mod sizing;
pub mod state;
pub mod view;

mod error;

pub use palimpsest_core::{element, geometry, identifier, markup, selector, tree};

pub use compositor::{CompositeReport, Compositor, RenderMode};
pub use error::OverlayError;
pub use overlay::{OverlayEntry, OverlaySource};
