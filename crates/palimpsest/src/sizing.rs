//! Sizing callbacks run on overlay content before it is mounted.
//!
//! The compositor never decides how content should fit its mount. It reads
//! the mount's bounding box and hands it, together with the content, to a
//! [`SizeContent`] implementation supplied by the caller. Any
//! `FnMut(Bounds, &mut Element)` closure qualifies; [`FitToBounds`] is the
//! stock implementation that stretches content over the box.

use palimpsest_core::{
    element::Element,
    geometry::{Bounds, Insets},
};

/// Adjusts overlay content to the bounding box of the mount it is placed in.
pub trait SizeContent {
    /// Mutates the layout attributes of `content` to fit `bounds`.
    fn size_content(&mut self, bounds: Bounds, content: &mut Element);
}

impl<F> SizeContent for F
where
    F: FnMut(Bounds, &mut Element),
{
    fn size_content(&mut self, bounds: Bounds, content: &mut Element) {
        self(bounds, content)
    }
}

/// Positions content over the whole mount box, minus uniform padding.
///
/// Sets `x`, `y`, `width` and `height` on the content element.
///
/// # Example
///
/// ```
/// # use palimpsest::sizing::{FitToBounds, SizeContent};
/// # use palimpsest_core::{element::{Element, ElementLike}, geometry::{Bounds, Point, Size}};
/// let mut content = Element::new("svg");
/// let bounds = Bounds::new_from_top_left(Point::new(10.0, 20.0), Size::new(100.0, 40.0));
///
/// FitToBounds::new(5.0).size_content(bounds, &mut content);
///
/// assert_eq!(content.attribute("x"), Some("15"));
/// assert_eq!(content.attribute("width"), Some("90"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FitToBounds {
    padding: Insets,
}

impl FitToBounds {
    /// Creates a sizer keeping `padding` units between box edge and content.
    pub fn new(padding: f32) -> Self {
        Self {
            padding: Insets::uniform(padding),
        }
    }
}

impl SizeContent for FitToBounds {
    fn size_content(&mut self, bounds: Bounds, content: &mut Element) {
        let inner = bounds.shrink(self.padding);
        content.set_attribute("x", inner.min_x().to_string());
        content.set_attribute("y", inner.min_y().to_string());
        content.set_attribute("width", inner.width().to_string());
        content.set_attribute("height", inner.height().to_string());
    }
}

#[cfg(test)]
mod tests {
    use palimpsest_core::{
        element::ElementLike,
        geometry::{Point, Size},
    };

    use super::*;

    #[test]
    fn test_fit_without_padding() {
        let mut content = Element::new("svg").with_attribute("class", "content");
        let bounds = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(120.0, 60.5));

        FitToBounds::default().size_content(bounds, &mut content);

        assert_eq!(content.attribute("x"), Some("0"));
        assert_eq!(content.attribute("y"), Some("0"));
        assert_eq!(content.attribute("width"), Some("120"));
        assert_eq!(content.attribute("height"), Some("60.5"));
        assert_eq!(content.attribute("class"), Some("content"));
    }

    #[test]
    fn test_closures_are_sizers() {
        let mut seen = Vec::new();
        let mut sizer = |bounds: Bounds, content: &mut Element| {
            seen.push(bounds.width());
            content.set_attribute("data-sized", "yes");
        };

        let mut content = Element::new("g");
        let bounds = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(7.0, 7.0));
        sizer.size_content(bounds, &mut content);

        assert_eq!(content.attribute("data-sized"), Some("yes"));
        assert_eq!(seen, vec![7.0]);
    }
}
