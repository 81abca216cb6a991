//! `web_sys` implementation of the core DOM traits.
//!
//! Node handles are plain `web_sys::Node`s, compared by identity. Live
//! collections are copied into vectors so that mutating the document while
//! iterating (unwrapping markers, for one) cannot skip nodes.

use askbox_core::{
    BoundaryPoint, ClientRect, DomRange, DomTree, Error, MarkerKind, NodeKind, Result,
    SelectionHost, SmolStr,
};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Node, Text, Window};

/// The live page document.
#[derive(Debug, Clone)]
pub struct BrowserDom {
    window: Window,
    document: Document,
}

impl BrowserDom {
    /// Attach to the current window's document.
    pub fn new() -> Result<Self> {
        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        Ok(Self { window, document })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Build a native `Range` from a core range.
    pub fn to_native_range(&self, range: &DomRange<Node>) -> Result<web_sys::Range> {
        let native = self
            .document
            .create_range()
            .map_err(|e| format!("create_range failed: {:?}", e))?;
        native
            .set_start(&range.start.container, range.start.offset as u32)
            .map_err(|e| format!("set_start failed: {:?}", e))?;
        native
            .set_end(&range.end.container, range.end.offset as u32)
            .map_err(|e| format!("set_end failed: {:?}", e))?;
        Ok(native)
    }

    fn selection(&self) -> Option<web_sys::Selection> {
        self.window.get_selection().ok().flatten()
    }

    fn boundary_parent(&self, point: &BoundaryPoint<Node>) -> Option<Node> {
        if self.is_text(&point.container) {
            point.container.parent_node()
        } else {
            Some(point.container.clone())
        }
    }

    /// Turn a boundary point into a `(parent, child index)` position,
    /// splitting its text node when the point falls inside one.
    ///
    /// The third value is the index of the split text node, if a split
    /// happened.
    fn settle(&self, point: &BoundaryPoint<Node>) -> Result<(Node, usize, Option<usize>)> {
        let Some(text) = point.container.dyn_ref::<Text>() else {
            return Ok((point.container.clone(), point.offset, None));
        };
        let parent = point.container.parent_node().ok_or(Error::Detached)?;
        let index = self
            .index_in_parent(&point.container)
            .ok_or(Error::Detached)?;
        let len = self.node_length(&point.container);

        if point.offset == 0 {
            Ok((parent, index, None))
        } else if point.offset >= len {
            Ok((parent, index + 1, None))
        } else {
            text.split_text(point.offset as u32)
                .map_err(|e| format!("split_text failed: {:?}", e))?;
            Ok((parent, index + 1, Some(index)))
        }
    }
}

/// Escape a value for use inside a double-quoted CSS attribute selector.
fn css_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\a "),
            c => out.push(c),
        }
    }
    out
}

impl DomTree for BrowserDom {
    type Node = Node;

    fn parent(&self, node: &Node) -> Option<Node> {
        node.parent_node()
    }

    fn children(&self, node: &Node) -> Vec<Node> {
        let list = node.child_nodes();
        (0..list.length()).filter_map(|i| list.get(i)).collect()
    }

    fn kind(&self, node: &Node) -> NodeKind {
        match node.node_type() {
            Node::ELEMENT_NODE => NodeKind::Element,
            Node::TEXT_NODE => NodeKind::Text,
            _ => NodeKind::Other,
        }
    }

    fn text(&self, node: &Node) -> Option<String> {
        if node.node_type() == Node::TEXT_NODE {
            node.node_value()
        } else {
            None
        }
    }

    fn element_id(&self, node: &Node) -> Option<SmolStr> {
        let id = node.dyn_ref::<Element>()?.id();
        if id.is_empty() {
            None
        } else {
            Some(SmolStr::new(id))
        }
    }

    fn has_class(&self, node: &Node, class: &str) -> bool {
        node.dyn_ref::<Element>()
            .is_some_and(|element| element.class_list().contains(class))
    }

    fn element_by_id(&self, id: &str) -> Option<Node> {
        let selector = format!("[id=\"{}\"]", css_string(id));
        let matches = self.document.query_selector_all(&selector).ok()?;
        if matches.length() != 1 {
            tracing::debug!(
                target: "askbox::dom",
                id,
                count = matches.length(),
                "id does not name exactly one element"
            );
            return None;
        }
        matches.get(0)
    }

    fn elements_by_class(&self, class: &str) -> Vec<Node> {
        let live = self.document.get_elements_by_class_name(class);
        (0..live.length())
            .filter_map(|i| live.item(i))
            .map(Node::from)
            .collect()
    }

    fn surround(&mut self, range: &DomRange<Node>, marker: MarkerKind, class: &str) -> Result<Node> {
        // Split text at the boundaries ourselves so the original text nodes
        // keep their leading part, then surround whole children.
        if self.boundary_parent(&range.start) != self.boundary_parent(&range.end) {
            return Err(Error::NonContiguous);
        }
        let (end_parent, mut end_index, _) = self.settle(&range.end)?;
        let (start_parent, start_index, start_split) = self.settle(&range.start)?;
        if let Some(split_at) = start_split {
            if start_parent == end_parent && split_at < end_index {
                end_index += 1;
            }
        }
        if start_parent != end_parent || start_index > end_index {
            return Err(Error::NonContiguous);
        }

        let native = self
            .document
            .create_range()
            .map_err(|e| format!("create_range failed: {:?}", e))?;
        native
            .set_start(&start_parent, start_index as u32)
            .map_err(|e| format!("set_start failed: {:?}", e))?;
        native
            .set_end(&end_parent, end_index as u32)
            .map_err(|e| format!("set_end failed: {:?}", e))?;

        let element = self
            .document
            .create_element(marker.tag())
            .map_err(|e| format!("create_element failed: {:?}", e))?;
        element.set_class_name(class);

        native.surround_contents(&element).map_err(|e| {
            tracing::trace!(target: "askbox::dom", error = ?e, "surround_contents rejected range");
            Error::NonContiguous
        })?;
        Ok(element.into())
    }

    fn unwrap(&mut self, node: &Node) -> Result<Node> {
        let parent = node.parent_node().ok_or(Error::Detached)?;
        while let Some(child) = node.first_child() {
            parent
                .insert_before(&child, Some(node))
                .map_err(|e| format!("insert_before failed: {:?}", e))?;
        }
        parent
            .remove_child(node)
            .map_err(|e| format!("remove_child failed: {:?}", e))?;
        Ok(parent)
    }

    fn normalize(&mut self, node: &Node) {
        node.normalize();
    }

    fn invalidate_live_selection(&mut self) {
        let Some(selection) = self.selection() else {
            return;
        };
        if let Err(e) = selection.remove_all_ranges() {
            tracing::debug!(target: "askbox::dom", error = ?e, "remove_all_ranges failed");
        }
    }
}

impl SelectionHost for BrowserDom {
    fn live_range(&self) -> Option<DomRange<Node>> {
        let selection = self.selection()?;
        if selection.range_count() == 0 {
            return None;
        }
        let native = selection.get_range_at(0).ok()?;
        Some(DomRange::from_parts(
            native.start_container().ok()?,
            native.start_offset().ok()? as usize,
            native.end_container().ok()?,
            native.end_offset().ok()? as usize,
        ))
    }

    fn client_rects(&self, range: &DomRange<Node>) -> Option<Vec<ClientRect>> {
        let native = self.to_native_range(range).ok()?;
        let rects = native.get_client_rects()?;
        let mut result = Vec::new();
        for i in 0..rects.length() {
            if let Some(rect) = rects.get(i) {
                let rect: web_sys::DomRect = rect;
                result.push(ClientRect::new(
                    rect.x(),
                    rect.y(),
                    rect.x() + rect.width(),
                    rect.y() + rect.height(),
                ));
            }
        }
        Some(result)
    }

    fn viewport_height(&self) -> f64 {
        self.window
            .inner_height()
            .ok()
            .and_then(|h| h.as_f64())
            .unwrap_or(0.0)
    }

    fn restore_live_selection(&mut self, range: &DomRange<Node>) -> Result<()> {
        let native = self.to_native_range(range)?;
        let selection = self.selection().ok_or("no selection object")?;
        selection
            .remove_all_ranges()
            .map_err(|e| format!("remove_all_ranges failed: {:?}", e))?;
        selection
            .add_range(&native)
            .map_err(|e| format!("add_range failed: {:?}", e))?;
        Ok(())
    }
}
