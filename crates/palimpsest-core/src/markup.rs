//! Reading and writing SVG markup.
//!
//! Rendered diagrams and overlay holder documents arrive as SVG text. This
//! module turns such text into an owned [`Element`] tree using the `svg`
//! crate's event parser, and writes an [`Element`] back out through the `svg`
//! crate's node model.
//!
//! Comments, declarations and processing instructions are dropped, as are
//! whitespace-only text runs. Attributes arrive unordered from the parser and
//! are stored sorted by name so that reading the same document twice always
//! yields identical trees.

use svg::{
    Node as _,
    node::{Text as SvgText, element::Element as SvgElement, element::tag::Type},
    parser::Event,
};
use thiserror::Error;

use crate::{
    element::{Element, ElementLike, Node},
    tree::DiagramTree,
};

/// Errors produced while reading markup.
#[derive(Debug, Error)]
pub enum MarkupError {
    #[error("malformed markup: {0}")]
    Parse(String),

    #[error("closing tag `{found}` does not match open element `{expected}`")]
    MismatchedClose { expected: String, found: String },

    #[error("unexpected closing tag `{0}`")]
    UnexpectedClose(String),

    #[error("element `{0}` is never closed")]
    Unclosed(String),

    #[error("document has no root element")]
    Empty,

    #[error("document has more than one root element")]
    MultipleRoots,
}

/// Reads a markup document into its root element.
///
/// # Errors
///
/// Returns [`MarkupError`] when the text is not well formed or does not have
/// exactly one root element.
///
/// # Example
///
/// ```
/// # use palimpsest_core::{element::ElementLike, markup};
/// let root = markup::read_element(r#"<svg width="10"><rect class="a"/></svg>"#).unwrap();
/// assert_eq!(root.name(), "svg");
/// assert_eq!(root.attribute("width"), Some("10"));
/// assert_eq!(root.children().len(), 1);
/// ```
pub fn read_element(content: &str) -> Result<Element, MarkupError> {
    let parser = svg::read(content).map_err(|err| MarkupError::Parse(err.to_string()))?;

    let mut open: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    for event in parser {
        match event {
            Event::Error(err) => return Err(MarkupError::Parse(err.to_string())),
            Event::Tag(name, Type::Start, attributes) => {
                open.push(element_from_event(name, &attributes));
            }
            Event::Tag(name, Type::Empty, attributes) => {
                attach(&mut open, &mut root, element_from_event(name, &attributes))?;
            }
            Event::Tag(name, Type::End, _) => {
                let element = open
                    .pop()
                    .ok_or_else(|| MarkupError::UnexpectedClose(name.to_string()))?;
                if element.name() != name {
                    return Err(MarkupError::MismatchedClose {
                        expected: element.name().to_string(),
                        found: name.to_string(),
                    });
                }
                attach(&mut open, &mut root, element)?;
            }
            Event::Text(text) => {
                if text.trim().is_empty() {
                    continue;
                }
                if let Some(parent) = open.last_mut() {
                    parent.push_child(Node::Text(unescape(text)));
                }
            }
            _ => {}
        }
    }

    if let Some(unclosed) = open.pop() {
        return Err(MarkupError::Unclosed(unclosed.name().to_string()));
    }

    root.ok_or(MarkupError::Empty)
}

/// Writes an element and its subtree as markup text.
///
/// # Example
///
/// ```
/// # use palimpsest_core::{element::Element, markup};
/// let rect = Element::new("rect").with_attribute("width", "10");
/// assert_eq!(markup::write_element(&rect), r#"<rect width="10"/>"#);
/// ```
pub fn write_element(element: &Element) -> String {
    to_svg_element(element).to_string()
}

impl DiagramTree {
    /// Reads a rendered diagram document into a tree.
    ///
    /// # Errors
    ///
    /// Returns [`MarkupError`] under the same conditions as [`read_element`].
    pub fn from_svg(content: &str) -> Result<Self, MarkupError> {
        read_element(content).map(Self::from_element)
    }

    /// Writes the attached part of the tree back out as markup text.
    pub fn to_svg(&self) -> String {
        write_element(&self.to_element())
    }
}

fn to_svg_element(element: &Element) -> SvgElement {
    let mut node = SvgElement::new(element.name());
    for (name, value) in element.attributes() {
        node.assign(name, value);
    }
    for child in element.children() {
        match child {
            Node::Element(child) => node.append(to_svg_element(child)),
            Node::Text(text) => node.append(SvgText::new(text.as_str())),
        }
    }
    node
}

fn element_from_event(name: &str, attributes: &svg::node::Attributes) -> Element {
    let mut sorted: Vec<(&String, String)> = attributes
        .iter()
        .map(|(name, value)| (name, unescape(&value.to_string())))
        .collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    sorted
        .into_iter()
        .fold(Element::new(name), |element, (name, value)| {
            element.with_attribute(name.as_str(), value)
        })
}

fn attach(
    open: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), MarkupError> {
    match open.last_mut() {
        Some(parent) => parent.push_child(element),
        None if root.is_some() => return Err(MarkupError::MultipleRoots),
        None => *root = Some(element),
    }
    Ok(())
}

fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIAGRAM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 200 100">
  <!-- cells -->
  <g data-cell-id="A" class="cell">
    <rect class="outer" x="0" y="0" width="100" height="50"/>
    <text x="5" y="20">Sales</text>
  </g>
  <g data-cell-id="B" class="cell"/>
</svg>"#;

    #[test]
    fn test_read_structure() {
        let root = read_element(DIAGRAM).unwrap();
        assert_eq!(root.name(), "svg");
        assert_eq!(root.children().len(), 2);

        let cell = root.children()[0].as_element().unwrap();
        assert_eq!(cell.attribute("data-cell-id"), Some("A"));
        assert_eq!(cell.children().len(), 2);

        let text = cell.children()[1].as_element().unwrap();
        assert_eq!(text.children(), &[Node::Text("Sales".to_string())]);
    }

    #[test]
    fn test_read_sorts_attributes() {
        let root = read_element(r#"<rect y="2" x="1" class="c"/>"#).unwrap();
        let names: Vec<_> = root.attributes().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["class", "x", "y"]);
    }

    #[test]
    fn test_read_unescapes_entities() {
        let root = read_element("<text>a &lt; b &amp;&amp; c</text>").unwrap();
        assert_eq!(root.children(), &[Node::Text("a < b && c".to_string())]);
    }

    #[test]
    fn test_write_then_read_preserves_tree() {
        let root = read_element(DIAGRAM).unwrap();
        let written = write_element(&root);
        assert_eq!(read_element(&written).unwrap(), root);
    }

    #[test]
    fn test_read_rejects_mismatched_close() {
        let err = read_element("<svg><g></svg>").unwrap_err();
        assert!(matches!(err, MarkupError::MismatchedClose { .. }), "{err}");
    }

    #[test]
    fn test_read_rejects_unclosed() {
        let err = read_element("<svg><g/>").unwrap_err();
        assert!(matches!(err, MarkupError::Unclosed(name) if name == "svg"));
    }

    #[test]
    fn test_read_rejects_empty_document() {
        let err = read_element("   ").unwrap_err();
        assert!(matches!(err, MarkupError::Empty));
    }

    #[test]
    fn test_read_rejects_multiple_roots() {
        let err = read_element("<g/><g/>").unwrap_err();
        assert!(matches!(err, MarkupError::MultipleRoots));
    }

    #[test]
    fn test_tree_from_svg_skips_detached_nodes_on_write() {
        let mut tree = DiagramTree::from_svg(DIAGRAM).unwrap();
        let cell_b = tree.children(tree.root())[1];
        tree.detach(cell_b);

        let written = tree.to_svg();
        assert!(written.contains(r#"data-cell-id="A""#));
        assert!(!written.contains(r#"data-cell-id="B""#));
    }
}
