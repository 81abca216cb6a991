//! Arena-backed document tree.
//!
//! `MemDom` implements `DomTree` and `SelectionHost` without a browser. It
//! follows DOM semantics where the widget depends on them: UTF-16 text
//! offsets, child-index element offsets, `surroundContents`-style wrapping
//! and `normalize()`. Removed nodes stay in the arena, detached.

use smol_str::SmolStr;

use crate::error::{Error, Result};
use crate::platform::{DomTree, SelectionHost};
use crate::tree::{descendants, utf16_len, utf16_to_byte};
use crate::types::{BoundaryPoint, ClientRect, DomRange, MarkerKind, NodeKind};

/// Handle to a node in a `MemDom`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Clone, Debug)]
enum NodeData {
    Element {
        tag: SmolStr,
        id: Option<SmolStr>,
        classes: Vec<SmolStr>,
    },
    Text(String),
}

#[derive(Clone, Debug)]
struct MemNode {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// In-memory document with a simulated live selection.
#[derive(Clone, Debug)]
pub struct MemDom {
    nodes: Vec<MemNode>,
    root: NodeId,
    live_selection: Option<DomRange<NodeId>>,
    /// `None` simulates a platform without range geometry.
    client_rects: Option<Vec<ClientRect>>,
    viewport_height: f64,
}

impl Default for MemDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemDom {
    /// Create a document holding an empty `body` root.
    pub fn new() -> Self {
        let root = MemNode {
            parent: None,
            children: Vec::new(),
            data: NodeData::Element {
                tag: SmolStr::new_static("body"),
                id: None,
                classes: Vec::new(),
            },
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            live_selection: None,
            client_rects: Some(Vec::new()),
            viewport_height: 768.0,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Append a new element as the last child of `parent`.
    pub fn append_element(&mut self, parent: &NodeId, tag: &str) -> NodeId {
        let node = self.alloc(NodeData::Element {
            tag: SmolStr::new(tag),
            id: None,
            classes: Vec::new(),
        });
        self.attach(*parent, usize::MAX, node);
        node
    }

    /// Append a new text node as the last child of `parent`.
    pub fn append_text(&mut self, parent: &NodeId, text: &str) -> NodeId {
        let node = self.alloc(NodeData::Text(text.to_string()));
        self.attach(*parent, usize::MAX, node);
        node
    }

    pub fn set_id(&mut self, node: &NodeId, new_id: &str) {
        if let Some(NodeData::Element { id, .. }) = self.data_mut(*node) {
            *id = Some(SmolStr::new(new_id));
        }
    }

    pub fn add_class(&mut self, node: &NodeId, class: &str) {
        if let Some(NodeData::Element { classes, .. }) = self.data_mut(*node) {
            if !classes.iter().any(|c| c == class) {
                classes.push(SmolStr::new(class));
            }
        }
    }

    /// Tag name of an element.
    pub fn tag(&self, node: &NodeId) -> Option<&str> {
        match &self.nodes.get(node.0)?.data {
            NodeData::Element { tag, .. } => Some(tag.as_str()),
            NodeData::Text(_) => None,
        }
    }

    /// Check if the node is reachable from the root.
    pub fn is_attached(&self, node: &NodeId) -> bool {
        let mut current = *node;
        loop {
            if current == self.root {
                return true;
            }
            match self.nodes.get(current.0).and_then(|n| n.parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Concatenated text of a subtree.
    pub fn text_content(&self, node: &NodeId) -> String {
        descendants(self, node)
            .iter()
            .filter_map(|n| self.text(n))
            .collect()
    }

    /// Serialize a subtree to HTML-ish markup. Attribute values and text
    /// are written verbatim.
    pub fn to_html(&self, node: &NodeId) -> String {
        let mut out = String::new();
        self.write_html(*node, &mut out);
        out
    }

    /// Replace the simulated live selection.
    pub fn select(&mut self, range: Option<DomRange<NodeId>>) {
        self.live_selection = range;
    }

    /// Replace the geometry reported for every range.
    pub fn set_client_rects(&mut self, rects: Option<Vec<ClientRect>>) {
        self.client_rects = rects;
    }

    pub fn set_viewport_height(&mut self, height: f64) {
        self.viewport_height = height;
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let Some(entry) = self.nodes.get(node.0) else {
            return;
        };
        match &entry.data {
            NodeData::Text(text) => out.push_str(text),
            NodeData::Element { tag, id, classes } => {
                out.push('<');
                out.push_str(tag);
                if let Some(id) = id {
                    out.push_str(&format!(" id=\"{id}\""));
                }
                if !classes.is_empty() {
                    out.push_str(&format!(" class=\"{}\"", classes.join(" ")));
                }
                out.push('>');
                for child in &entry.children {
                    self.write_html(*child, out);
                }
                out.push_str(&format!("</{tag}>"));
            }
        }
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(MemNode {
            parent: None,
            children: Vec::new(),
            data,
        });
        NodeId(self.nodes.len() - 1)
    }

    fn data_mut(&mut self, node: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(node.0).map(|n| &mut n.data)
    }

    /// Insert `child` into `parent` at `index` (clamped to the end).
    fn attach(&mut self, parent: NodeId, index: usize, child: NodeId) {
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
    }

    fn check_point(&self, point: &BoundaryPoint<NodeId>) -> Result<()> {
        if point.container.0 >= self.nodes.len() || !self.is_attached(&point.container) {
            return Err(Error::Detached);
        }
        let len = self.node_length(&point.container);
        if point.offset > len {
            return Err(Error::OffsetOutOfBounds {
                offset: point.offset,
                len,
            });
        }
        Ok(())
    }

    /// Split a text node at a UTF-16 offset. The original node keeps the
    /// head, the returned node holds the tail and follows it.
    fn split_text(&mut self, node: NodeId, offset: usize) -> Result<NodeId> {
        let NodeData::Text(text) = &self.nodes[node.0].data else {
            return Err(Error::Platform("split_text on a non-text node".into()));
        };
        let len = utf16_len(text);
        let byte = utf16_to_byte(text, offset).ok_or(Error::OffsetOutOfBounds { offset, len })?;
        let tail = text[byte..].to_string();
        let head = text[..byte].to_string();

        let parent = self.nodes[node.0].parent.ok_or(Error::Detached)?;
        let index = self.index_in_parent(&node).ok_or(Error::Detached)?;

        self.nodes[node.0].data = NodeData::Text(head);
        let new_node = self.alloc(NodeData::Text(tail));
        self.attach(parent, index + 1, new_node);
        Ok(new_node)
    }

    /// Turn a boundary point into a (parent, child index) position, splitting
    /// the container if the point falls strictly inside a text node.
    ///
    /// Returns the index of the split node when a split happened.
    fn resolve_boundary(
        &mut self,
        point: &BoundaryPoint<NodeId>,
    ) -> Result<(NodeId, usize, Option<usize>)> {
        let container = point.container;
        if !self.is_text(&container) {
            return Ok((container, point.offset, None));
        }
        let parent = self.parent(&container).ok_or(Error::Detached)?;
        let index = self.index_in_parent(&container).ok_or(Error::Detached)?;
        let len = self.node_length(&container);
        if point.offset == 0 {
            Ok((parent, index, None))
        } else if point.offset >= len {
            Ok((parent, index + 1, None))
        } else {
            self.split_text(container, point.offset)?;
            Ok((parent, index + 1, Some(index)))
        }
    }

    fn boundary_parent(&self, point: &BoundaryPoint<NodeId>) -> Option<NodeId> {
        if self.is_text(&point.container) {
            self.parent(&point.container)
        } else {
            Some(point.container)
        }
    }
}

impl DomTree for MemDom {
    type Node = NodeId;

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.nodes.get(node.0)?.parent
    }

    fn children(&self, node: &NodeId) -> Vec<NodeId> {
        self.nodes
            .get(node.0)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn kind(&self, node: &NodeId) -> NodeKind {
        match self.nodes.get(node.0).map(|n| &n.data) {
            Some(NodeData::Element { .. }) => NodeKind::Element,
            Some(NodeData::Text(_)) => NodeKind::Text,
            None => NodeKind::Other,
        }
    }

    fn text(&self, node: &NodeId) -> Option<String> {
        match &self.nodes.get(node.0)?.data {
            NodeData::Text(text) => Some(text.clone()),
            NodeData::Element { .. } => None,
        }
    }

    fn element_id(&self, node: &NodeId) -> Option<SmolStr> {
        match &self.nodes.get(node.0)?.data {
            NodeData::Element { id, .. } => id.clone().filter(|id| !id.is_empty()),
            NodeData::Text(_) => None,
        }
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        match self.nodes.get(node.0).map(|n| &n.data) {
            Some(NodeData::Element { classes, .. }) => classes.iter().any(|c| c == class),
            _ => false,
        }
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        let mut matches = descendants(self, &self.root)
            .into_iter()
            .filter(|n| self.element_id(n).is_some_and(|eid| eid == id));
        let found = matches.next()?;
        matches.next().is_none().then_some(found)
    }

    fn elements_by_class(&self, class: &str) -> Vec<NodeId> {
        descendants(self, &self.root)
            .into_iter()
            .filter(|n| self.has_class(n, class))
            .collect()
    }

    fn surround(
        &mut self,
        range: &DomRange<NodeId>,
        marker: MarkerKind,
        class: &str,
    ) -> Result<NodeId> {
        self.check_point(&range.start)?;
        self.check_point(&range.end)?;

        let start_parent = self.boundary_parent(&range.start);
        if start_parent.is_none() || start_parent != self.boundary_parent(&range.end) {
            return Err(Error::NonContiguous);
        }

        // End first: splitting the end container never moves the start.
        let (parent, mut end_index, _) = self.resolve_boundary(&range.end)?;
        let (_, start_index, split_at) = self.resolve_boundary(&range.start)?;
        if let Some(split) = split_at {
            if end_index > split {
                end_index += 1;
            }
        }
        if start_index > end_index {
            return Err(Error::NonContiguous);
        }

        let wrapper = self.alloc(NodeData::Element {
            tag: SmolStr::new_static(marker.tag()),
            id: None,
            classes: vec![SmolStr::new(class)],
        });
        let moved: Vec<NodeId> = self.nodes[parent.0]
            .children
            .drain(start_index..end_index)
            .collect();
        for child in &moved {
            self.nodes[child.0].parent = Some(wrapper);
        }
        self.nodes[wrapper.0].children = moved;
        self.attach(parent, start_index, wrapper);

        tracing::trace!(
            target: "askbox::mem",
            ?parent,
            start_index,
            end_index,
            tag = marker.tag(),
            "wrapped children"
        );
        Ok(wrapper)
    }

    fn unwrap(&mut self, node: &NodeId) -> Result<NodeId> {
        let parent = self.parent(node).ok_or(Error::Detached)?;
        let index = self.index_in_parent(node).ok_or(Error::Detached)?;
        let children = std::mem::take(&mut self.nodes[node.0].children);
        for child in &children {
            self.nodes[child.0].parent = Some(parent);
        }
        self.nodes[node.0].parent = None;
        let siblings = &mut self.nodes[parent.0].children;
        siblings.remove(index);
        for (i, child) in children.into_iter().enumerate() {
            siblings.insert(index + i, child);
        }
        Ok(parent)
    }

    fn normalize(&mut self, node: &NodeId) {
        let elements: Vec<NodeId> = descendants(self, node)
            .into_iter()
            .filter(|n| self.kind(n) == NodeKind::Element)
            .collect();

        for element in elements {
            let mut kept: Vec<NodeId> = Vec::new();
            for child in self.children(&element) {
                let Some(text) = self.text(&child) else {
                    kept.push(child);
                    continue;
                };
                if text.is_empty() {
                    self.nodes[child.0].parent = None;
                    continue;
                }
                match kept.last().copied() {
                    Some(prev) if self.is_text(&prev) => {
                        if let NodeData::Text(prev_text) = &mut self.nodes[prev.0].data {
                            prev_text.push_str(&text);
                        }
                        self.nodes[child.0].parent = None;
                    }
                    _ => kept.push(child),
                }
            }
            self.nodes[element.0].children = kept;
        }
    }

    fn invalidate_live_selection(&mut self) {
        self.live_selection = None;
    }
}

impl SelectionHost for MemDom {
    fn live_range(&self) -> Option<DomRange<NodeId>> {
        self.live_selection.clone()
    }

    fn client_rects(&self, _range: &DomRange<NodeId>) -> Option<Vec<ClientRect>> {
        self.client_rects.clone()
    }

    fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    fn restore_live_selection(&mut self, range: &DomRange<NodeId>) -> Result<()> {
        self.check_point(&range.start)?;
        self.check_point(&range.end)?;
        self.live_selection = Some(range.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(dom: &mut MemDom, id: &str, text: &str) -> (NodeId, NodeId) {
        let body = dom.root();
        let p = dom.append_element(&body, "p");
        dom.set_id(&p, id);
        let t = dom.append_text(&p, text);
        (p, t)
    }

    #[test]
    fn test_to_html() {
        let mut dom = MemDom::new();
        let (p, _) = paragraph(&mut dom, "a", "hello");
        dom.add_class(&p, "askable");
        dom.add_class(&p, "askable");
        insta::assert_snapshot!(dom.to_html(&dom.root()), @r#"<body><p id="a" class="askable">hello</p></body>"#);
    }

    #[test]
    fn test_element_by_id_requires_unique() {
        let mut dom = MemDom::new();
        let (a, _) = paragraph(&mut dom, "a", "one");
        paragraph(&mut dom, "b", "two");
        paragraph(&mut dom, "b", "three");

        assert_eq!(dom.element_by_id("a"), Some(a));
        assert_eq!(dom.element_by_id("b"), None);
        assert_eq!(dom.element_by_id("zzz"), None);
    }

    #[test]
    fn test_surround_inside_text() {
        let mut dom = MemDom::new();
        let (p, t) = paragraph(&mut dom, "a", "hello world");
        let range = DomRange::from_parts(t, 2, t, 7);

        let marker = dom.surround(&range, MarkerKind::Inline, "hl").unwrap();
        assert_eq!(dom.text_content(&marker), "llo w");
        insta::assert_snapshot!(dom.to_html(&p), @r#"<p id="a">he<span class="hl">llo w</span>orld</p>"#);
    }

    #[test]
    fn test_surround_whole_text_does_not_split() {
        let mut dom = MemDom::new();
        let (p, t) = paragraph(&mut dom, "a", "hello");
        let range = DomRange::from_parts(t, 0, t, 5);

        dom.surround(&range, MarkerKind::Inline, "hl").unwrap();
        assert_eq!(dom.children(&p).len(), 1);
        insta::assert_snapshot!(dom.to_html(&p), @r#"<p id="a"><span class="hl">hello</span></p>"#);
    }

    #[test]
    fn test_surround_across_parents_fails_without_mutation() {
        let mut dom = MemDom::new();
        let (_, t1) = paragraph(&mut dom, "a", "first");
        let (_, t2) = paragraph(&mut dom, "b", "second");
        let before = dom.to_html(&dom.root());

        let range = DomRange::from_parts(t1, 2, t2, 3);
        assert_eq!(
            dom.surround(&range, MarkerKind::Inline, "hl"),
            Err(Error::NonContiguous)
        );
        assert_eq!(dom.to_html(&dom.root()), before);
    }

    #[test]
    fn test_surround_rejects_bad_offset() {
        let mut dom = MemDom::new();
        let (_, t) = paragraph(&mut dom, "a", "abc");
        let range = DomRange::from_parts(t, 0, t, 9);
        assert_eq!(
            dom.surround(&range, MarkerKind::Inline, "hl"),
            Err(Error::OffsetOutOfBounds { offset: 9, len: 3 })
        );
    }

    #[test]
    fn test_unwrap_and_normalize_restore_text_nodes() {
        let mut dom = MemDom::new();
        let (p, t) = paragraph(&mut dom, "a", "hello world");
        let range = DomRange::from_parts(t, 6, t, 11);

        let marker = dom.surround(&range, MarkerKind::Inline, "hl").unwrap();
        let parent = dom.unwrap(&marker).unwrap();
        assert_eq!(parent, p);
        assert!(!dom.is_attached(&marker));
        // Split text is still split until normalized.
        assert_eq!(dom.children(&p).len(), 2);

        dom.normalize(&p);
        assert_eq!(dom.children(&p), vec![t]);
        assert_eq!(dom.text(&t).as_deref(), Some("hello world"));
    }

    #[test]
    fn test_normalize_drops_empty_text() {
        let mut dom = MemDom::new();
        let (p, _) = paragraph(&mut dom, "a", "");
        dom.append_text(&p, "x");
        dom.append_text(&p, "");
        dom.append_text(&p, "y");

        dom.normalize(&p);
        assert_eq!(dom.children(&p).len(), 1);
        assert_eq!(dom.text_content(&p), "xy");
    }

    #[test]
    fn test_mutation_invalidates_selection() {
        let mut dom = MemDom::new();
        let (_, t) = paragraph(&mut dom, "a", "abc");
        dom.select(Some(DomRange::from_parts(t, 0, t, 2)));
        assert!(dom.live_range().is_some());

        dom.invalidate_live_selection();
        assert_eq!(dom.live_range(), None);
    }
}
