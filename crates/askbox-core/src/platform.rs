//! Platform abstraction traits for the page the widget is embedded in.
//!
//! These traits define the interface between the selection logic and the
//! actual document (browser DOM, in-memory tree). This keeps the tracker,
//! partitioner, highlighter and codec testable without a live browser.

use smol_str::SmolStr;

use crate::error::Result;
use crate::types::{ClientRect, DomRange, MarkerKind, NodeKind};

/// Read and mutate access to a document tree.
///
/// Only the operations the widget needs are required. Structural helpers
/// (`first_child`, `index_in_parent`, ...) have default implementations in
/// terms of `parent` and `children`.
pub trait DomTree {
    /// Handle to a node. Cheap to clone, compared by identity.
    type Node: Clone + PartialEq + std::fmt::Debug;

    /// Parent of a node, `None` for the root or detached nodes.
    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Child nodes in document order.
    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

    fn kind(&self, node: &Self::Node) -> NodeKind;

    /// Character data of a text node, `None` for anything else.
    fn text(&self, node: &Self::Node) -> Option<String>;

    /// The element's `id` attribute, if set and non-empty.
    fn element_id(&self, node: &Self::Node) -> Option<SmolStr>;

    fn has_class(&self, node: &Self::Node, class: &str) -> bool;

    /// Resolve an id to the single attached element carrying it.
    ///
    /// Returns `None` when no element, or more than one, has the id.
    fn element_by_id(&self, id: &str) -> Option<Self::Node>;

    /// All attached elements with the class, in document order.
    fn elements_by_class(&self, class: &str) -> Vec<Self::Node>;

    /// Wrap the contents of `range` in a new marker element.
    ///
    /// Text nodes at the boundaries are split as needed. Fails with
    /// `Error::NonContiguous` if the boundaries do not end up under the
    /// same parent.
    fn surround(
        &mut self,
        range: &DomRange<Self::Node>,
        marker: MarkerKind,
        class: &str,
    ) -> Result<Self::Node>;

    /// Replace an element with its children in place. Returns the parent the
    /// children were moved into.
    fn unwrap(&mut self, node: &Self::Node) -> Result<Self::Node>;

    /// Merge adjacent text nodes and drop empty ones in the subtree.
    fn normalize(&mut self, node: &Self::Node);

    /// Hook called before the tree is mutated for highlighting.
    ///
    /// Browsers collapse the live selection when the DOM around it changes;
    /// implementations make that explicit here.
    fn invalidate_live_selection(&mut self) {}

    fn first_child(&self, node: &Self::Node) -> Option<Self::Node> {
        self.children(node).into_iter().next()
    }

    fn last_child(&self, node: &Self::Node) -> Option<Self::Node> {
        self.children(node).pop()
    }

    /// Position of a node among its parent's children.
    fn index_in_parent(&self, node: &Self::Node) -> Option<usize> {
        let parent = self.parent(node)?;
        self.children(&parent).iter().position(|c| c == node)
    }

    /// DOM node length: UTF-16 length for text, child count otherwise.
    fn node_length(&self, node: &Self::Node) -> usize {
        match self.kind(node) {
            NodeKind::Text => self
                .text(node)
                .map(|t| t.encode_utf16().count())
                .unwrap_or(0),
            _ => self.children(node).len(),
        }
    }

    fn is_text(&self, node: &Self::Node) -> bool {
        self.kind(node) == NodeKind::Text
    }
}

/// Access to the live user selection and its rendered geometry.
pub trait SelectionHost: DomTree {
    /// The first range of the current selection, copied out of the live
    /// selection object. `None` when nothing is selected.
    fn live_range(&self) -> Option<DomRange<Self::Node>>;

    /// Line-box rectangles of a range, viewport relative.
    ///
    /// `None` means the platform cannot report geometry at all.
    fn client_rects(&self, range: &DomRange<Self::Node>) -> Option<Vec<ClientRect>>;

    /// Height of the visible viewport in CSS pixels.
    fn viewport_height(&self) -> f64;

    /// Make `range` the live selection again.
    fn restore_live_selection(&mut self, range: &DomRange<Self::Node>) -> Result<()>;
}
