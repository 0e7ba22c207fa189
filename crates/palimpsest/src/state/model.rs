//! Values carried by the state hub channels.

use palimpsest_core::identifier::CellId;

/// An overlay diagram chosen for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramRef {
    id: i64,
    name: String,
}

impl DiagramRef {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A saved instance of a diagram, with its own callouts.
///
/// While an instance is selected, overlay passes are incremental.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceRef {
    id: i64,
    diagram_id: i64,
    name: String,
}

impl InstanceRef {
    pub fn new(id: i64, diagram_id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            diagram_id,
            name: name.into(),
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn diagram_id(&self) -> i64 {
        self.diagram_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// An annotation attached to one diagram cell of an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callout {
    id: i64,
    instance_id: i64,
    cell_id: CellId,
    title: String,
    content: String,
    start_color: String,
    end_color: String,
}

impl Callout {
    /// Creates a callout with empty body text and colors.
    pub fn new(id: i64, instance_id: i64, cell_id: impl Into<CellId>, title: impl Into<String>) -> Self {
        Self {
            id,
            instance_id,
            cell_id: cell_id.into(),
            title: title.into(),
            content: String::new(),
            start_color: String::new(),
            end_color: String::new(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Sets the gradient colors used to draw the callout marker.
    pub fn with_colors(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start_color = start.into();
        self.end_color = end.into();
        self
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn instance_id(&self) -> i64 {
        self.instance_id
    }

    /// Returns the diagram cell the callout points at.
    pub fn cell_id(&self) -> CellId {
        self.cell_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn start_color(&self) -> &str {
        &self.start_color
    }

    pub fn end_color(&self) -> &str {
        &self.end_color
    }
}

/// The overlay widget currently feeding the diagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetRef {
    key: String,
    label: String,
}

impl WidgetRef {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}
