//! Configuration types for overlay compositing.
//!
//! This module provides the configuration structures that name the markup
//! conventions shared between the diagram renderer and the overlay producer,
//! and tune how compositing passes behave. All types implement
//! [`serde::Deserialize`] for loading from external sources.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining markup and compositor settings.
//! - [`MarkupConfig`] - Attribute and class names used to find cells and content.
//! - [`CompositorConfig`] - Strictness and sizing options.
//!
//! # Example
//!
//! ```
//! # use palimpsest::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.markup().cell_id_attribute(), "data-cell-id");
//! assert!(!config.compositor().strict());
//! ```

use serde::Deserialize;

/// Top-level configuration combining markup and compositor settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Markup conventions section.
    #[serde(default)]
    markup: MarkupConfig,

    /// Compositor behavior section.
    #[serde(default)]
    compositor: CompositorConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(markup: MarkupConfig, compositor: CompositorConfig) -> Self {
        Self { markup, compositor }
    }

    /// Returns the markup configuration.
    pub fn markup(&self) -> &MarkupConfig {
        &self.markup
    }

    /// Returns the compositor configuration.
    pub fn compositor(&self) -> &CompositorConfig {
        &self.compositor
    }

    /// Overrides strict mode, keeping everything else.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.compositor.strict = strict;
        self
    }
}

/// Attribute and class names shared by the diagram renderer and the overlay
/// producer.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarkupConfig {
    /// Attribute carrying the cell identifier on diagram nodes and overlay cells.
    cell_id_attribute: String,

    /// Class marking overlay content, both in overlay cells and once mounted.
    content_class: String,

    /// Class marking overlay cells inside an overlay holder document.
    overlay_cell_class: String,

    /// Class toggled on the cell of the hovered callout.
    highlight_class: String,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            cell_id_attribute: "data-cell-id".to_string(),
            content_class: "content".to_string(),
            overlay_cell_class: "overlay-cell".to_string(),
            highlight_class: "highlight".to_string(),
        }
    }
}

impl MarkupConfig {
    /// Returns the cell identifier attribute name.
    pub fn cell_id_attribute(&self) -> &str {
        &self.cell_id_attribute
    }

    /// Returns the overlay content class.
    pub fn content_class(&self) -> &str {
        &self.content_class
    }

    /// Returns the overlay cell class.
    pub fn overlay_cell_class(&self) -> &str {
        &self.overlay_cell_class
    }

    /// Returns the hover highlight class.
    pub fn highlight_class(&self) -> &str {
        &self.highlight_class
    }
}

/// Compositing pass options.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CompositorConfig {
    /// Fail the pass with [`OverlayError::Unmatched`] when any entry could not
    /// be placed, instead of only logging it.
    ///
    /// [`OverlayError::Unmatched`]: crate::OverlayError::Unmatched
    strict: bool,

    /// Padding kept between the mount box and content sized by
    /// [`FitToBounds`](crate::sizing::FitToBounds).
    padding: f32,
}

impl CompositorConfig {
    /// Creates a new [`CompositorConfig`].
    pub fn new(strict: bool, padding: f32) -> Self {
        Self { strict, padding }
    }

    /// Returns `true` if strict mode is enabled.
    pub fn strict(&self) -> bool {
        self.strict
    }

    /// Returns the content padding.
    pub fn padding(&self) -> f32 {
        self.padding
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.markup().content_class(), "content");
        assert_eq!(config.markup().overlay_cell_class(), "overlay-cell");
        assert_eq!(config.markup().highlight_class(), "highlight");
        assert_eq!(config.compositor().padding(), 0.0);
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [markup]
            cell_id_attribute = "data-id"

            [compositor]
            strict = true
            padding = 2.5
            "#,
        )
        .unwrap();

        assert_eq!(config.markup().cell_id_attribute(), "data-id");
        assert_eq!(config.markup().content_class(), "content");
        assert!(config.compositor().strict());
        assert_eq!(config.compositor().padding(), 2.5);
    }

    #[test]
    fn test_with_strict_overrides() {
        let config = AppConfig::default().with_strict(true);
        assert!(config.compositor().strict());
    }
}
