//! Owned markup fragments.
//!
//! An [`Element`] is a self-contained piece of markup: a tag name, its
//! attributes in document order, and child nodes. Overlay content travels as
//! an `Element` until it is transplanted into a [`DiagramTree`], and content
//! detached from a tree is handed back as an `Element` again.
//!
//! [`DiagramTree`]: crate::tree::DiagramTree

use indexmap::IndexMap;

/// Read access to an element's name and attributes.
///
/// Implemented by owned [`Element`]s and by element nodes inside a
/// [`DiagramTree`](crate::tree::DiagramTree) so that selector matching works
/// on both.
pub trait ElementLike {
    /// Returns the tag name.
    fn name(&self) -> &str;

    /// Returns the value of the named attribute, if present.
    fn attribute(&self, name: &str) -> Option<&str>;

    /// Returns `true` if the whitespace-separated `class` attribute contains `class`.
    fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }
}

/// A child of an [`Element`]: either a nested element or a run of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    /// Returns the element if this node is one.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

/// An owned markup element with ordered attributes and children.
///
/// # Examples
///
/// ```
/// use palimpsest_core::element::{Element, ElementLike};
///
/// let content = Element::new("g")
///     .with_attribute("class", "content")
///     .with_child(Element::new("rect").with_attribute("width", "10"));
///
/// assert!(content.has_class("content"));
/// assert_eq!(content.children().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: IndexMap<String, String>,
    children: Vec<Node>,
}

impl Element {
    /// Creates an element with the given tag name and nothing else.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Sets an attribute (builder style).
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Appends a child element (builder style).
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Appends a text run (builder style).
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Sets an attribute, replacing any existing value in place.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Removes an attribute, returning its previous value.
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        self.attributes.shift_remove(name)
    }

    /// Returns the attributes in document order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Returns the child nodes.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Appends a child node.
    pub fn push_child(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    /// Returns the first element in pre-order (this element included) that
    /// satisfies `predicate`.
    pub fn find(&self, predicate: &impl Fn(&Element) -> bool) -> Option<&Element> {
        if predicate(self) {
            return Some(self);
        }
        self.children
            .iter()
            .filter_map(Node::as_element)
            .find_map(|child| child.find(predicate))
    }

    /// Collects every element in pre-order (this element included) that
    /// satisfies `predicate`, without descending into matched elements.
    pub fn find_all(&self, predicate: &impl Fn(&Element) -> bool) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect_matching(predicate, &mut found);
        found
    }

    fn collect_matching<'a>(
        &'a self,
        predicate: &impl Fn(&Element) -> bool,
        found: &mut Vec<&'a Element>,
    ) {
        if predicate(self) {
            found.push(self);
            return;
        }
        for child in self.children.iter().filter_map(Node::as_element) {
            child.collect_matching(predicate, found);
        }
    }

    /// Consumes the element and returns the first element in pre-order (this
    /// element included) that satisfies `predicate`, moving it out.
    pub fn take_first(self, predicate: &impl Fn(&Element) -> bool) -> Option<Element> {
        if predicate(&self) {
            return Some(self);
        }
        self.children.into_iter().find_map(|child| match child {
            Node::Element(element) => element.take_first(predicate),
            Node::Text(_) => None,
        })
    }

    /// Consumes the element and moves out every element (this element
    /// included) that satisfies `predicate`, in pre-order. Matched elements
    /// are not searched further.
    pub fn take_all(self, predicate: &impl Fn(&Element) -> bool) -> Vec<Element> {
        let mut taken = Vec::new();
        self.take_matching(predicate, &mut taken);
        taken
    }

    fn take_matching(self, predicate: &impl Fn(&Element) -> bool, taken: &mut Vec<Element>) {
        if predicate(&self) {
            taken.push(self);
            return;
        }
        for child in self.children {
            if let Node::Element(element) = child {
                element.take_matching(predicate, taken);
            }
        }
    }

    /// Adds a class to the `class` attribute if it is not already present.
    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let classes = match self.attributes.get("class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_string(),
        };
        self.set_attribute("class", classes);
    }

    pub(crate) fn into_parts(self) -> (String, IndexMap<String, String>, Vec<Node>) {
        (self.name, self.attributes, self.children)
    }

    pub(crate) fn from_parts(
        name: String,
        attributes: IndexMap<String, String>,
        children: Vec<Node>,
    ) -> Self {
        Self {
            name,
            attributes,
            children,
        }
    }
}

impl ElementLike for Element {
    fn name(&self) -> &str {
        &self.name
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}
