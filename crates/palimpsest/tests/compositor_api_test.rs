//! Integration tests for the Compositor API
//!
//! These tests drive whole compositing passes over SVG documents through the
//! public API only.

use float_cmp::approx_eq;
use indexmap::IndexMap;

use palimpsest::{
    CompositeReport, Compositor, OverlayEntry, OverlayError, OverlaySource, RenderMode,
    config::{AppConfig, CompositorConfig, MarkupConfig},
    diagnostic::{DiagnosticCollector, DiagnosticKind},
    element::{Element, ElementLike},
    geometry::Bounds,
    identifier::CellId,
    markup,
    sizing::FitToBounds,
    tree::DiagramTree,
};

const DIAGRAM: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 400 100">
  <g data-cell-id="A" class="cell">
    <rect class="outer" x="0" y="0" width="100" height="80"/>
    <g class="inner"><rect x="10" y="10" width="80" height="40"/></g>
  </g>
  <g data-cell-id="B" class="cell">
    <rect class="outer" x="120" y="0" width="100" height="80"/>
    <g class="inner"><rect x="130" y="10" width="80" height="40"/></g>
  </g>
  <g data-cell-id="C" class="cell">
    <rect class="outer" x="240" y="0" width="100" height="80"/>
  </g>
</svg>"#;

fn diagram() -> DiagramTree {
    DiagramTree::from_svg(DIAGRAM).expect("Failed to read diagram")
}

fn compositor() -> Compositor {
    Compositor::new(".inner", MarkupConfig::default()).expect("Failed to parse selector")
}

fn content(label: &str) -> Element {
    Element::new("g")
        .with_attribute("class", "content")
        .with_attribute("data-label", label)
}

fn overlay_cell(id: &str, label: &str) -> Element {
    Element::new("div")
        .with_attribute("class", "overlay-cell")
        .with_attribute("data-cell-id", id)
        .with_child(content(label))
}

/// Labels of every mounted content node inside cell `id`, in document order.
fn mounted(tree: &DiagramTree, id: &str) -> Vec<String> {
    let Some(cell) = tree.descendants(tree.root()).find(|&node| {
        tree.element(node)
            .is_some_and(|element| element.attribute("data-cell-id") == Some(id))
    }) else {
        return Vec::new();
    };

    tree.descendants(cell)
        .filter_map(|node| tree.element(node))
        .filter(|element| element.has_class("content"))
        .filter_map(|element| element.attribute("data-label").map(str::to_string))
        .collect()
}

fn no_sizing() -> impl FnMut(Bounds, &mut Element) {
    |_: Bounds, _: &mut Element| {}
}

#[test]
fn test_single_entry_lands_in_empty_mount() {
    let mut tree = diagram();

    let report = compositor()
        .composite_fresh(&mut tree, vec![overlay_cell("A", "nodeA")], &mut no_sizing())
        .expect("Compositing should succeed");

    assert_eq!(report.placed(), &[CellId::new("A")]);
    assert_eq!(mounted(&tree, "A"), vec!["nodeA"]);

    let inner = tree
        .descendants(tree.root())
        .find(|&node| {
            tree.element(node).is_some_and(|e| e.has_class("inner"))
                && tree
                    .ancestors(node)
                    .any(|a| tree.element(a).is_some_and(|e| e.attribute("data-cell-id") == Some("A")))
        })
        .expect("Cell A should have a mount");
    let last_child = *tree.children(inner).last().expect("Mount should have children");
    assert_eq!(tree.element(last_child).unwrap().attribute("data-label"), Some("nodeA"));
}

#[test]
fn test_duplicate_ids_last_entry_wins() {
    let mut tree = diagram();

    compositor()
        .composite_fresh(
            &mut tree,
            vec![overlay_cell("A", "n1"), overlay_cell("A", "n2")],
            &mut no_sizing(),
        )
        .expect("Compositing should succeed");

    assert_eq!(mounted(&tree, "A"), vec!["n2"]);
}

#[test]
fn test_sparse_mapping_skips_absent_values() {
    let mut tree = diagram();
    let before_b = mounted(&tree, "B");

    let mut keyed = IndexMap::new();
    keyed.insert(CellId::new("A"), Some(content("nodeA")));
    keyed.insert(CellId::new("B"), None);

    let report = compositor()
        .composite_incremental(&mut tree, keyed, &mut no_sizing())
        .expect("Compositing should succeed");

    assert_eq!(report.placed(), &[CellId::new("A")]);
    assert!(report.unmatched().is_empty());
    assert_eq!(mounted(&tree, "B"), before_b);
}

#[test]
fn test_missing_target_does_not_block_other_entries() {
    let mut tree = diagram();
    let mut sink = DiagnosticCollector::new();
    let source = OverlaySource::Cells(vec![
        overlay_cell("Ghost", "g"),
        overlay_cell("C", "c"),
        overlay_cell("B", "b"),
    ]);

    let report = compositor()
        .composite(&mut tree, source, RenderMode::Fresh, &mut no_sizing(), &mut sink)
        .expect("Non-strict passes should not fail");

    assert_eq!(report.placed(), &[CellId::new("B")]);
    assert_eq!(mounted(&tree, "B"), vec!["b"]);

    let kinds: Vec<_> = sink.diagnostics().iter().map(|d| d.kind()).collect();
    assert_eq!(
        kinds,
        vec![DiagnosticKind::MissingTargetNode, DiagnosticKind::MissingContentMount]
    );
    assert_eq!(sink.cell_ids(), vec![CellId::new("Ghost"), CellId::new("C")]);
}

#[test]
fn test_fresh_purges_ids_absent_from_new_entries() {
    let mut tree = diagram();
    let compositor = compositor();

    compositor
        .composite_fresh(
            &mut tree,
            vec![overlay_cell("A", "a1"), overlay_cell("B", "b1")],
            &mut no_sizing(),
        )
        .expect("First pass should succeed");
    let report = compositor
        .composite_fresh(&mut tree, vec![overlay_cell("A", "a2")], &mut no_sizing())
        .expect("Second pass should succeed");

    assert_eq!(mounted(&tree, "A"), vec!["a2"]);
    assert!(mounted(&tree, "B").is_empty());
    assert_eq!(report.detached().len(), 2);
}

#[test]
fn test_incremental_leaves_absent_ids_untouched() {
    let mut tree = diagram();
    let compositor = compositor();

    compositor
        .composite_fresh(
            &mut tree,
            vec![overlay_cell("A", "a1"), overlay_cell("B", "b1")],
            &mut no_sizing(),
        )
        .expect("First pass should succeed");

    let mut keyed = IndexMap::new();
    keyed.insert(CellId::new("A"), Some(content("a2")));
    let report = compositor
        .composite_incremental(&mut tree, keyed, &mut no_sizing())
        .expect("Second pass should succeed");

    assert_eq!(mounted(&tree, "A"), vec!["a2"]);
    assert_eq!(mounted(&tree, "B"), vec!["b1"]);
    assert_eq!(report.detached(), &[content("a1")]);
}

#[test]
fn test_fresh_twice_is_idempotent() {
    let cells = || vec![overlay_cell("A", "a"), overlay_cell("B", "b")];
    let compositor = compositor();

    let mut once = diagram();
    compositor
        .composite_fresh(&mut once, cells(), &mut FitToBounds::new(2.0))
        .expect("Compositing should succeed");

    let mut twice = diagram();
    compositor
        .composite_fresh(&mut twice, cells(), &mut FitToBounds::new(2.0))
        .expect("Compositing should succeed");
    compositor
        .composite_fresh(&mut twice, cells(), &mut FitToBounds::new(2.0))
        .expect("Compositing should succeed");

    assert_eq!(once.to_svg(), twice.to_svg());
}

#[test]
fn test_sizer_called_once_per_placed_entry_with_mount_bounds() {
    let mut tree = diagram();
    let mut calls: Vec<(String, Bounds)> = Vec::new();
    let mut sizer = |bounds: Bounds, content: &mut Element| {
        let label = content.attribute("data-label").unwrap_or_default().to_string();
        calls.push((label, bounds));
    };

    compositor()
        .composite_fresh(
            &mut tree,
            vec![
                overlay_cell("A", "a"),
                overlay_cell("Ghost", "g"),
                overlay_cell("B", "b"),
            ],
            &mut sizer,
        )
        .expect("Compositing should succeed");

    assert_eq!(calls.len(), 2);
    let (label, bounds) = &calls[1];
    assert_eq!(label, "b");
    assert!(approx_eq!(f32, bounds.min_x(), 130.0));
    assert!(approx_eq!(f32, bounds.min_y(), 10.0));
    assert!(approx_eq!(f32, bounds.width(), 80.0));
    assert!(approx_eq!(f32, bounds.height(), 40.0));
}

#[test]
fn test_fit_to_bounds_positions_content() {
    let mut tree = diagram();

    compositor()
        .composite_fresh(&mut tree, vec![overlay_cell("A", "a")], &mut FitToBounds::new(5.0))
        .expect("Compositing should succeed");

    let svg = tree.to_svg();
    let reread = markup::read_element(&svg).expect("Output should be readable");
    let placed = reread
        .find(&|element| element.attribute("data-label") == Some("a"))
        .expect("Content should be in the output");
    assert_eq!(placed.attribute("x"), Some("15"));
    assert_eq!(placed.attribute("width"), Some("70"));
}

#[test]
fn test_strict_mode_reports_unmatched_after_applying() {
    let mut tree = diagram();
    let config = AppConfig::new(MarkupConfig::default(), CompositorConfig::new(true, 0.0));
    let compositor = Compositor::from_config(".inner", &config).expect("Selector should parse");

    let result = compositor.composite(
        &mut tree,
        OverlaySource::from(vec![
            OverlayEntry::new("A", content("a")),
            OverlayEntry::new("Ghost", content("g")),
        ]),
        RenderMode::Incremental,
        &mut no_sizing(),
        &mut DiagnosticCollector::new(),
    );

    let err = result.expect_err("Strict mode should fail");
    assert!(matches!(err, OverlayError::Unmatched { .. }));
    assert_eq!(err.unmatched_ids(), vec![CellId::new("Ghost")]);
    assert_eq!(err.report().map(CompositeReport::placed), Some(&[CellId::new("A")][..]));
    assert_eq!(mounted(&tree, "A"), vec!["a"]);
}

#[test]
fn test_invalid_selector_is_rejected_up_front() {
    let result = Compositor::new("g > .inner", MarkupConfig::default());
    assert!(matches!(result, Err(OverlayError::Selector(_))));
}

#[test]
fn test_descendant_selector_reaches_above_cell() {
    let mut tree = diagram();
    let compositor =
        Compositor::new("svg .cell .inner", MarkupConfig::default()).expect("Selector should parse");

    let report = compositor
        .composite_fresh(&mut tree, vec![overlay_cell("A", "a")], &mut no_sizing())
        .expect("Compositing should succeed");

    assert_eq!(report.placed(), &[CellId::new("A")]);
}

#[test]
fn test_overlay_holder_document() {
    let holder = markup::read_element(
        r#"<div>
             <div class="overlay-cell" data-cell-id="A"><svg class="content"><text>12</text></svg></div>
             <div class="overlay-cell" data-cell-id="B"><span>no content</span></div>
           </div>"#,
    )
    .expect("Holder should be readable");
    let config = MarkupConfig::default();
    let mut tree = diagram();
    let mut sink = DiagnosticCollector::new();

    let report = compositor()
        .composite(
            &mut tree,
            OverlaySource::from_holder(holder, &config),
            RenderMode::Fresh,
            &mut no_sizing(),
            &mut sink,
        )
        .expect("Compositing should succeed");

    assert_eq!(report.placed(), &[CellId::new("A")]);
    assert_eq!(sink.diagnostics()[0].kind(), DiagnosticKind::MissingContent);
    assert!(tree.to_svg().contains("<text>12</text>"));
}
