//! Property tests for compositing passes.

use proptest::prelude::*;

use palimpsest::{
    Compositor, OverlayEntry, OverlaySource, RenderMode,
    config::MarkupConfig,
    diagnostic::DiagnosticCollector,
    element::{Element, ElementLike},
    geometry::Bounds,
    tree::DiagramTree,
};

const CELLS: [&str; 4] = ["A", "B", "C", "D"];

fn diagram() -> DiagramTree {
    let root = CELLS.iter().fold(Element::new("svg"), |root, id| {
        root.with_child(
            Element::new("g").with_attribute("data-cell-id", *id).with_child(
                Element::new("g")
                    .with_attribute("class", "mount")
                    .with_child(Element::new("rect").with_attribute("width", "10")),
            ),
        )
    });
    DiagramTree::from_element(root)
}

/// Entries addressing known cells (and one unknown) with distinct labels.
fn entries_strategy() -> impl Strategy<Value = Vec<(usize, u32)>> {
    prop::collection::vec((0..=CELLS.len(), any::<u32>()), 0..12)
}

fn to_entries(raw: &[(usize, u32)]) -> Vec<OverlayEntry> {
    raw.iter()
        .map(|&(cell, label)| {
            let id = CELLS.get(cell).copied().unwrap_or("Unknown");
            OverlayEntry::new(
                id,
                Element::new("g").with_attribute("data-label", label.to_string()),
            )
        })
        .collect()
}

fn run(tree: &mut DiagramTree, raw: &[(usize, u32)], mode: RenderMode) {
    let compositor = Compositor::new(".mount", MarkupConfig::default()).expect("valid selector");
    compositor
        .composite(
            tree,
            OverlaySource::from(to_entries(raw)),
            mode,
            &mut |_: Bounds, _: &mut Element| {},
            &mut DiagnosticCollector::new(),
        )
        .expect("non-strict passes succeed");
}

/// Labels of the content nodes mounted under cell `id`.
fn mounted(tree: &DiagramTree, id: &str) -> Vec<String> {
    let root = tree.root();
    let Some(&cell) = tree.children(root).iter().find(|&&node| {
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

fn check_last_entry_wins(raw: Vec<(usize, u32)>) -> Result<(), TestCaseError> {
    let mut tree = diagram();
    run(&mut tree, &raw, RenderMode::Fresh);

    for (index, id) in CELLS.iter().enumerate() {
        let expected: Vec<String> = raw
            .iter()
            .rev()
            .find(|(cell, _)| *cell == index)
            .map(|(_, label)| label.to_string())
            .into_iter()
            .collect();
        prop_assert_eq!(mounted(&tree, id), expected);
    }
    Ok(())
}

fn check_fresh_is_idempotent(raw: Vec<(usize, u32)>) -> Result<(), TestCaseError> {
    let mut once = diagram();
    run(&mut once, &raw, RenderMode::Fresh);

    let mut twice = diagram();
    run(&mut twice, &raw, RenderMode::Fresh);
    run(&mut twice, &raw, RenderMode::Fresh);

    prop_assert_eq!(once.to_svg(), twice.to_svg());
    Ok(())
}

fn check_incremental_keeps_other_cells(
    first: Vec<(usize, u32)>,
    second: Vec<(usize, u32)>,
) -> Result<(), TestCaseError> {
    let mut tree = diagram();
    run(&mut tree, &first, RenderMode::Fresh);
    let before: Vec<Vec<String>> = CELLS.iter().map(|id| mounted(&tree, id)).collect();

    run(&mut tree, &second, RenderMode::Incremental);

    for (index, id) in CELLS.iter().enumerate() {
        let now = mounted(&tree, id);
        prop_assert!(now.len() <= 1, "mount {} holds {:?}", id, now);
        if !second.iter().any(|(cell, _)| *cell == index) {
            prop_assert_eq!(&now, &before[index]);
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn last_entry_wins(raw in entries_strategy()) {
        check_last_entry_wins(raw)?;
    }

    #[test]
    fn fresh_is_idempotent(raw in entries_strategy()) {
        check_fresh_is_idempotent(raw)?;
    }

    #[test]
    fn incremental_keeps_other_cells(first in entries_strategy(), second in entries_strategy()) {
        check_incremental_keeps_other_cells(first, second)?;
    }
}
