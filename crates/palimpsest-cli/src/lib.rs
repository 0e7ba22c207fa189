//! CLI logic for the Palimpsest overlay compositor.
//!
//! Reads a rendered diagram and an overlay holder document, composites the
//! overlay cells onto the diagram and writes the result.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, Mode};

use std::fs;

use log::{info, warn};

use palimpsest::{
    Compositor, OverlayError, OverlaySource, diagnostic::LogSink, markup, sizing::FitToBounds,
    tree::DiagramTree,
};

/// Run the Palimpsest CLI application
///
/// This function composites the overlay document onto the diagram and writes
/// the resulting SVG to the output file. Nothing is written when the call
/// fails.
///
/// # Errors
///
/// Returns `OverlayError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Invalid mount selectors
/// - Unreadable SVG documents
/// - Unplaced overlay cells in strict mode
pub fn run(args: &Args) -> Result<(), OverlayError> {
    info!(
        diagram_path = args.diagram,
        overlay_path = args.overlay,
        output_path = args.output;
        "Processing overlay"
    );

    // Configuration first; --strict only ever tightens it
    let mut app_config = config::load_config(args.config.as_ref())?;
    if args.strict {
        app_config = app_config.with_strict(true);
    }

    // Reject a bad selector before reading either document
    let compositor = Compositor::from_config(&args.mount, &app_config)?;

    let diagram = fs::read_to_string(&args.diagram)?;
    let overlay = fs::read_to_string(&args.overlay)?;

    let mut tree = DiagramTree::from_svg(&diagram)?;
    let holder = markup::read_element(&overlay)?;
    let source = OverlaySource::from_holder(holder, app_config.markup());
    if source.is_empty() {
        warn!(overlay_path = args.overlay; "Overlay document holds no overlay cells");
    }

    let mut sizer = FitToBounds::new(app_config.compositor().padding());
    let report = compositor.composite(
        &mut tree,
        source,
        args.mode.into(),
        &mut sizer,
        &mut LogSink,
    )?;

    // Only reached when the pass succeeded
    fs::write(&args.output, tree.to_svg())?;

    info!(
        placed = report.placed().len(),
        unmatched = report.unmatched().len(),
        output_file = args.output;
        "SVG exported successfully"
    );

    Ok(())
}
