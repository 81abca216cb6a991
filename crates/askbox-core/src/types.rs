//! Core selection types: boundary points, ranges, anchors.
//!
//! These types are platform-agnostic. `N` is whatever handle the page
//! implementation uses for a node (`NodeId` for `MemDom`, `web_sys::Node`
//! in the browser).

use smol_str::SmolStr;

/// What a node is, as far as selection handling cares.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    /// Comments, processing instructions, doctype...
    Other,
}

/// A position inside a node.
///
/// For text nodes the offset counts UTF-16 code units (browser semantics).
/// For elements it is a child index: `offset == 2` sits between the second
/// and third child.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundaryPoint<N> {
    pub container: N,
    pub offset: usize,
}

impl<N> BoundaryPoint<N> {
    pub fn new(container: N, offset: usize) -> Self {
        Self { container, offset }
    }
}

/// An ordered pair of boundary points, start before or equal to end in
/// document order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomRange<N> {
    pub start: BoundaryPoint<N>,
    pub end: BoundaryPoint<N>,
}

impl<N: PartialEq> DomRange<N> {
    pub fn new(start: BoundaryPoint<N>, end: BoundaryPoint<N>) -> Self {
        Self { start, end }
    }

    /// Create a range from raw container/offset pairs.
    pub fn from_parts(
        start_container: N,
        start_offset: usize,
        end_container: N,
        end_offset: usize,
    ) -> Self {
        Self {
            start: BoundaryPoint::new(start_container, start_offset),
            end: BoundaryPoint::new(end_container, end_offset),
        }
    }

    /// Check if start and end are the same point.
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// Serializable projection of a boundary point.
///
/// `element_id` names the nearest enclosing element with an id, `offset`
/// counts UTF-16 code units from the start of that element's first text node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AnchorDescriptor {
    pub element_id: SmolStr,
    pub offset: usize,
}

impl AnchorDescriptor {
    pub fn new(element_id: impl Into<SmolStr>, offset: usize) -> Self {
        Self {
            element_id: element_id.into(),
            offset,
        }
    }
}

/// Start and end anchors of a tracked selection.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AnchorPair {
    pub start: AnchorDescriptor,
    pub end: AnchorDescriptor,
}

/// Viewport-relative rectangle of a rendered line box.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct ClientRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl ClientRect {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// Which wrapper element a highlight marker uses.
///
/// The choice only keeps nesting valid: markers around text go inline,
/// markers around whole elements go block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkerKind {
    Inline,
    Block,
}

impl MarkerKind {
    pub fn tag(self) -> &'static str {
        match self {
            MarkerKind::Inline => "span",
            MarkerKind::Block => "div",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_collapsed() {
        let range = DomRange::from_parts(3usize, 4, 3usize, 4);
        assert!(range.is_collapsed());

        let range = DomRange::from_parts(3usize, 4, 3usize, 5);
        assert!(!range.is_collapsed());

        // Same offset, different container.
        let range = DomRange::from_parts(3usize, 4, 5usize, 4);
        assert!(!range.is_collapsed());
    }

    #[test]
    fn test_marker_tags() {
        assert_eq!(MarkerKind::Inline.tag(), "span");
        assert_eq!(MarkerKind::Block.tag(), "div");
    }

    #[test]
    fn test_rect_height() {
        let rect = ClientRect::new(0.0, 10.0, 50.0, 28.5);
        assert_eq!(rect.height(), 18.5);
    }
}
