//! Arena representation of a rendered diagram.
//!
//! A [`DiagramTree`] holds every node of a rendered diagram in a flat arena
//! addressed by [`NodeId`]. Parent and child links are indices into the arena,
//! which keeps lookups cheap and lets the compositor keep per-pass indexes
//! (such as cell id to node) without borrowing the tree.
//!
//! # Node lifetime
//!
//! Nodes that are detached from the tree stay in the arena as tombstones until
//! [`DiagramTree::compact`] runs. Between compactions a `NodeId` is never
//! reused, so a stale id can be detected with [`DiagramTree::is_attached`]
//! instead of silently pointing at a new node. Compaction renumbers every
//! node; ids taken before it must not be used after it.

use indexmap::IndexMap;

use crate::{
    element::{Element, ElementLike, Node},
    geometry::{Bounds, Point, Size},
};

/// Type-safe index of a node inside a [`DiagramTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
enum NodeData {
    Element {
        name: String,
        attributes: IndexMap<String, String>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct Slot {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attached: bool,
}

/// Borrowed view of an element node inside a [`DiagramTree`].
#[derive(Debug, Clone, Copy)]
pub struct ElementRef<'a> {
    name: &'a str,
    attributes: &'a IndexMap<String, String>,
}

impl<'a> ElementRef<'a> {
    /// Returns the attributes in document order.
    pub fn attributes(&self) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Returns the geometry this element declares through its own attributes.
    ///
    /// Only basic shapes and positioned boxes carry geometry: `rect`, `image`,
    /// `use`, `svg` and `foreignObject` (`x`, `y`, `width`, `height`), `circle`
    /// (`cx`, `cy`, `r`), `ellipse` (`cx`, `cy`, `rx`, `ry`) and `line`
    /// (`x1`, `y1`, `x2`, `y2`). Transforms are not applied.
    pub fn own_bounds(&self) -> Option<Bounds> {
        let num = |name: &str| parse_length(self.attributes.get(name)?);
        let num_or_zero = |name: &str| num(name).unwrap_or(0.0);

        match self.name {
            "rect" | "image" | "use" | "svg" | "foreignObject" => {
                let size = Size::new(num("width")?, num("height")?);
                let top_left = Point::new(num_or_zero("x"), num_or_zero("y"));
                Some(Bounds::new_from_top_left(top_left, size))
            }
            "circle" => {
                let r = num("r")?;
                let center = Point::new(num_or_zero("cx"), num_or_zero("cy"));
                Some(Bounds::new_from_top_left(
                    center.add_point(Point::new(-r, -r)),
                    Size::new(2.0 * r, 2.0 * r),
                ))
            }
            "ellipse" => {
                let (rx, ry) = (num("rx")?, num("ry")?);
                let center = Point::new(num_or_zero("cx"), num_or_zero("cy"));
                Some(Bounds::new_from_top_left(
                    center.add_point(Point::new(-rx, -ry)),
                    Size::new(2.0 * rx, 2.0 * ry),
                ))
            }
            "line" => Some(Bounds::from_corners(
                Point::new(num_or_zero("x1"), num_or_zero("y1")),
                Point::new(num_or_zero("x2"), num_or_zero("y2")),
            )),
            _ => None,
        }
    }
}

impl ElementLike for ElementRef<'_> {
    fn name(&self) -> &str {
        self.name
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

fn parse_length(value: &str) -> Option<f32> {
    value.trim().trim_end_matches("px").parse().ok()
}

/// A rendered diagram held as an arena of nodes.
///
/// # Examples
///
/// ```
/// use palimpsest_core::{element::Element, tree::DiagramTree};
///
/// let svg = Element::new("svg")
///     .with_child(Element::new("g").with_attribute("data-cell-id", "A"));
/// let mut tree = DiagramTree::from_element(svg);
///
/// let cell = tree.children(tree.root())[0];
/// tree.append(cell, Element::new("g").with_attribute("class", "content"));
///
/// assert_eq!(tree.children(cell).len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct DiagramTree {
    slots: Vec<Slot>,
    root: NodeId,
}

impl DiagramTree {
    /// Builds a tree whose root is the given element.
    pub fn from_element(root: Element) -> Self {
        let mut tree = Self {
            slots: Vec::new(),
            root: NodeId(0),
        };
        tree.root = tree.insert_element(root, None);
        tree
    }

    /// Rebuilds an owned element from the attached part of the tree.
    pub fn to_element(&self) -> Element {
        self.build_element(self.root)
            .unwrap_or_else(|| Element::new(""))
    }

    /// Returns the root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the number of nodes currently attached to the tree.
    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.attached).count()
    }

    /// Returns the number of arena slots, detached tombstones included.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the node is still part of the tree.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.slots.get(id.0).is_some_and(|slot| slot.attached)
    }

    /// Returns the element view of a node, or `None` for text and unknown nodes.
    pub fn element(&self, id: NodeId) -> Option<ElementRef<'_>> {
        match &self.slots.get(id.0)?.data {
            NodeData::Element { name, attributes } => Some(ElementRef { name, attributes }),
            NodeData::Text(_) => None,
        }
    }

    /// Returns the text of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.slots.get(id.0)?.data {
            NodeData::Text(text) => Some(text),
            NodeData::Element { .. } => None,
        }
    }

    /// Returns the parent of a node; the root and detached nodes have none.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slots.get(id.0)?.parent
    }

    /// Returns the children of a node in document order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.slots
            .get(id.0)
            .map(|slot| slot.children.as_slice())
            .unwrap_or_default()
    }

    /// Iterates over the descendants of a node in document order, excluding
    /// the node itself.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let stack = self.children(id).iter().rev().copied().collect();
        Descendants { tree: self, stack }
    }

    /// Iterates over the ancestors of a node from the nearest upward,
    /// excluding the node itself.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&current| self.parent(current))
    }

    /// Sets an attribute on an element node. Text nodes are left untouched.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let Some(attributes) = self.attributes_mut(id) {
            attributes.insert(name.to_string(), value.into());
        }
    }

    /// Adds a class to an element node's `class` attribute.
    ///
    /// Returns `true` if the class was added.
    pub fn add_class(&mut self, id: NodeId, class: &str) -> bool {
        let Some(attributes) = self.attributes_mut(id) else {
            return false;
        };
        let existing = attributes.get("class").map(String::as_str).unwrap_or("");
        if existing.split_whitespace().any(|c| c == class) {
            return false;
        }
        let updated = if existing.trim().is_empty() {
            class.to_string()
        } else {
            format!("{} {class}", existing.trim())
        };
        attributes.insert("class".to_string(), updated);
        true
    }

    /// Removes a class from an element node's `class` attribute, dropping the
    /// attribute when it becomes empty.
    ///
    /// Returns `true` if the class was present.
    pub fn remove_class(&mut self, id: NodeId, class: &str) -> bool {
        let Some(attributes) = self.attributes_mut(id) else {
            return false;
        };
        let Some(existing) = attributes.get("class") else {
            return false;
        };
        if !existing.split_whitespace().any(|c| c == class) {
            return false;
        }
        let remaining: Vec<&str> = existing.split_whitespace().filter(|c| *c != class).collect();
        if remaining.is_empty() {
            attributes.shift_remove("class");
        } else {
            let remaining = remaining.join(" ");
            attributes.insert("class".to_string(), remaining);
        }
        true
    }

    /// Appends an element as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, element: Element) -> NodeId {
        let id = self.insert_element(element, Some(parent));
        self.slots[parent.0].children.push(id);
        id
    }

    /// Detaches a node and its subtree, returning it as an owned element.
    ///
    /// Returns `None` for the root, for text nodes and for nodes that are
    /// already detached.
    pub fn detach(&mut self, id: NodeId) -> Option<Element> {
        let parent = self.parent(id)?;
        if !self.is_attached(id) {
            return None;
        }
        let element = self.build_element(id)?;
        self.slots[parent.0].children.retain(|&child| child != id);
        self.mark_detached(id);
        Some(element)
    }

    /// Replaces a node with a new element in the same child position.
    ///
    /// Returns the id of the inserted node together with the detached element,
    /// or `None` (leaving the tree untouched) when `old` cannot be detached.
    pub fn replace(&mut self, old: NodeId, element: Element) -> Option<(NodeId, Element)> {
        let parent = self.parent(old)?;
        if !self.is_attached(old) {
            return None;
        }
        let detached = self.build_element(old)?;
        let position = self.slots[parent.0]
            .children
            .iter()
            .position(|&child| child == old)?;

        let new_id = self.insert_element(element, Some(parent));
        self.slots[parent.0].children[position] = new_id;
        self.mark_detached(old);

        Some((new_id, detached))
    }

    /// Returns the union of the declared geometry of `id` and its descendants.
    ///
    /// Subtrees whose root satisfies `skip` are ignored entirely. Returns `None`
    /// when nothing in the visited part of the subtree declares geometry.
    pub fn subtree_bounds(
        &self,
        id: NodeId,
        skip: &impl Fn(&ElementRef<'_>) -> bool,
    ) -> Option<Bounds> {
        let element = self.element(id)?;
        let mut bounds = element.own_bounds();
        for &child in self.children(id) {
            let Some(child_element) = self.element(child) else {
                continue;
            };
            if skip(&child_element) {
                continue;
            }
            if let Some(child_bounds) = self.subtree_bounds(child, skip) {
                bounds = Some(match bounds {
                    Some(existing) => existing.merge(&child_bounds),
                    None => child_bounds,
                });
            }
        }
        bounds
    }

    /// Drops detached tombstones and renumbers the attached nodes in document
    /// order, so the root becomes `NodeId` 0.
    ///
    /// Returns the number of reclaimed slots. Every `NodeId` obtained before
    /// the call is invalidated when anything was reclaimed.
    pub fn compact(&mut self) -> usize {
        let before = self.slots.len();
        if self.slots.iter().all(|slot| slot.attached) {
            return 0;
        }

        let mut remap: Vec<Option<NodeId>> = vec![None; before];
        let mut order = Vec::with_capacity(before);
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            remap[id.0] = Some(NodeId(order.len()));
            order.push(id);
            stack.extend(self.slots[id.0].children.iter().rev().copied());
        }

        let mut old: Vec<Option<Slot>> = std::mem::take(&mut self.slots)
            .into_iter()
            .map(Some)
            .collect();
        self.slots = order
            .into_iter()
            .filter_map(|id| old[id.0].take())
            .map(|mut slot| {
                slot.parent = slot.parent.and_then(|parent| remap[parent.0]);
                slot.children = slot
                    .children
                    .iter()
                    .filter_map(|child| remap[child.0])
                    .collect();
                slot
            })
            .collect();
        self.root = NodeId(0);

        before - self.slots.len()
    }

    fn attributes_mut(&mut self, id: NodeId) -> Option<&mut IndexMap<String, String>> {
        match &mut self.slots.get_mut(id.0)?.data {
            NodeData::Element { attributes, .. } => Some(attributes),
            NodeData::Text(_) => None,
        }
    }

    fn insert_element(&mut self, element: Element, parent: Option<NodeId>) -> NodeId {
        let (name, attributes, children) = element.into_parts();
        let id = self.push_slot(NodeData::Element { name, attributes }, parent);
        for child in children {
            let child_id = match child {
                Node::Element(element) => self.insert_element(element, Some(id)),
                Node::Text(text) => self.push_slot(NodeData::Text(text), Some(id)),
            };
            self.slots[id.0].children.push(child_id);
        }
        id
    }

    fn push_slot(&mut self, data: NodeData, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.slots.len());
        self.slots.push(Slot {
            data,
            parent,
            children: Vec::new(),
            attached: true,
        });
        id
    }

    fn build_element(&self, id: NodeId) -> Option<Element> {
        let slot = self.slots.get(id.0)?;
        let NodeData::Element { name, attributes } = &slot.data else {
            return None;
        };
        let children = slot
            .children
            .iter()
            .filter_map(|&child| match &self.slots[child.0].data {
                NodeData::Element { .. } => self.build_element(child).map(Node::Element),
                NodeData::Text(text) => Some(Node::Text(text.clone())),
            })
            .collect();
        Some(Element::from_parts(
            name.clone(),
            attributes.clone(),
            children,
        ))
    }

    fn mark_detached(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let slot = &mut self.slots[current.0];
            slot.attached = false;
            stack.extend(slot.children.iter().copied());
        }
        self.slots[id.0].parent = None;
    }
}

/// Pre-order iterator over the descendants of a node.
///
/// Created by [`DiagramTree::descendants`].
#[derive(Debug)]
pub struct Descendants<'a> {
    tree: &'a DiagramTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(next).iter().rev().copied());
        Some(next)
    }
}
