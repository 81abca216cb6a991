//! Generic tree walks over any `DomTree`.
//!
//! All walks are iterative so deeply nested documents cannot exhaust the stack.

use smol_str::SmolStr;

use crate::error::{Error, Result};
use crate::platform::DomTree;
use crate::types::{BoundaryPoint, DomRange, NodeKind};

/// The node itself followed by each ancestor up to the root.
pub fn ancestors_inclusive<D: DomTree>(dom: &D, node: &D::Node) -> Vec<D::Node> {
    let mut chain = vec![node.clone()];
    let mut current = node.clone();
    while let Some(parent) = dom.parent(&current) {
        chain.push(parent.clone());
        current = parent;
    }
    chain
}

/// Deepest node that contains both `a` and `b` (inclusive).
pub fn common_ancestor<D: DomTree>(dom: &D, a: &D::Node, b: &D::Node) -> Option<D::Node> {
    let a_chain = ancestors_inclusive(dom, a);
    let mut current = Some(b.clone());
    while let Some(node) = current {
        if a_chain.contains(&node) {
            return Some(node);
        }
        current = dom.parent(&node);
    }
    None
}

/// Child-index path from the root down to `node`.
fn node_path<D: DomTree>(dom: &D, node: &D::Node) -> Vec<usize> {
    let mut path = Vec::new();
    let mut current = node.clone();
    while let Some(index) = dom.index_in_parent(&current) {
        path.push(index);
        match dom.parent(&current) {
            Some(parent) => current = parent,
            None => break,
        }
    }
    path.reverse();
    path
}

/// Sort key for a boundary point.
///
/// Lexicographic order of keys is document order of points: a point
/// `(element, k)` sorts before anything inside child `k`, and after
/// anything inside child `k - 1`.
pub fn point_key<D: DomTree>(dom: &D, point: &BoundaryPoint<D::Node>) -> Vec<usize> {
    let mut key = node_path(dom, &point.container);
    key.push(point.offset);
    key
}

/// All nodes of a subtree in document order, the root first.
pub fn descendants<D: DomTree>(dom: &D, root: &D::Node) -> Vec<D::Node> {
    let mut out = Vec::new();
    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
        let mut children = dom.children(&node);
        children.reverse();
        stack.extend(children);
        out.push(node);
    }
    out
}

/// Text nodes of a subtree in document order.
pub fn text_descendants<D: DomTree>(dom: &D, root: &D::Node) -> Vec<D::Node> {
    descendants(dom, root)
        .into_iter()
        .filter(|n| dom.kind(n) == NodeKind::Text)
        .collect()
}

/// First text node in a depth-first walk of the subtree.
pub fn first_text_descendant<D: DomTree>(dom: &D, root: &D::Node) -> Option<D::Node> {
    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
        if dom.kind(&node) == NodeKind::Text {
            return Some(node);
        }
        let mut children = dom.children(&node);
        children.reverse();
        stack.extend(children);
    }
    None
}

/// Text covered by a range, concatenated in document order.
pub fn text_in_range<D: DomTree>(dom: &D, range: &DomRange<D::Node>) -> String {
    let Some(ancestor) = common_ancestor(dom, &range.start.container, &range.end.container) else {
        return String::new();
    };
    let start_key = point_key(dom, &range.start);
    let end_key = point_key(dom, &range.end);

    let mut out = String::new();
    for node in text_descendants(dom, &ancestor) {
        let Some(text) = dom.text(&node) else {
            continue;
        };
        let len = utf16_len(&text);
        let mut node_start = node_path(dom, &node);
        let mut node_end = node_start.clone();
        node_start.push(0);
        node_end.push(len);

        let from = if range.start.container == node {
            range.start.offset
        } else if start_key <= node_start {
            0
        } else {
            len
        };
        let to = if range.end.container == node {
            range.end.offset
        } else if end_key >= node_end {
            len
        } else {
            0
        };

        if from < to {
            out.push_str(&utf16_slice(&text, from, to.min(len)));
        }
    }
    out
}

/// The element a boundary container belongs to: itself, or its parent for
/// text and other character data.
pub fn enclosing_element<D: DomTree>(dom: &D, node: &D::Node) -> Option<D::Node> {
    match dom.kind(node) {
        NodeKind::Element => Some(node.clone()),
        _ => dom.parent(node),
    }
}

/// Check if the node or any ancestor carries `class`.
pub fn within_class<D: DomTree>(dom: &D, node: &D::Node, class: &str) -> bool {
    ancestors_inclusive(dom, node)
        .iter()
        .any(|n| dom.kind(n) == NodeKind::Element && dom.has_class(n, class))
}

/// Nearest element (inclusive) with a non-empty id.
pub fn nearest_identified<D: DomTree>(dom: &D, node: &D::Node) -> Option<(D::Node, SmolStr)> {
    let start = enclosing_element(dom, node)?;
    ancestors_inclusive(dom, &start)
        .into_iter()
        .find_map(|n| dom.element_id(&n).map(|id| (n, id)))
}

/// Find the text position `target` UTF-16 units into an element's text.
///
/// Counting starts at the element's first text node. A target that lands
/// exactly between two text nodes resolves to the end of the earlier one,
/// so offsets inside the first text node map straight onto it.
pub fn locate_text_offset<D: DomTree>(
    dom: &D,
    element: &D::Node,
    target: usize,
) -> Result<BoundaryPoint<D::Node>> {
    let texts = text_descendants(dom, element);
    if texts.is_empty() {
        return Err(Error::NoTextNode(
            dom.element_id(element).unwrap_or_default(),
        ));
    }

    let mut accumulated = 0;
    for node in texts {
        let len = dom.text(&node).map(|t| utf16_len(&t)).unwrap_or(0);
        if accumulated + len >= target {
            return Ok(BoundaryPoint::new(node, target - accumulated));
        }
        accumulated += len;
    }

    Err(Error::OffsetOutOfBounds {
        offset: target,
        len: accumulated,
    })
}

pub fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}

/// Byte index of a UTF-16 offset. `None` if the offset is past the end or
/// splits a surrogate pair.
pub fn utf16_to_byte(s: &str, offset: usize) -> Option<usize> {
    let mut units = 0;
    for (byte, ch) in s.char_indices() {
        if units == offset {
            return Some(byte);
        }
        if units > offset {
            return None;
        }
        units += ch.len_utf16();
    }
    (units == offset).then_some(s.len())
}

/// Substring between two UTF-16 offsets.
pub fn utf16_slice(s: &str, from: usize, to: usize) -> String {
    let units: Vec<u16> = s.encode_utf16().skip(from).take(to.saturating_sub(from)).collect();
    String::from_utf16_lossy(&units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mem::MemDom;

    #[test]
    fn test_utf16_offsets() {
        let s = "a😀b";
        assert_eq!(utf16_len(s), 4);
        assert_eq!(utf16_to_byte(s, 0), Some(0));
        assert_eq!(utf16_to_byte(s, 1), Some(1));
        // Inside the surrogate pair.
        assert_eq!(utf16_to_byte(s, 2), None);
        assert_eq!(utf16_to_byte(s, 3), Some(5));
        assert_eq!(utf16_to_byte(s, 4), Some(6));
        assert_eq!(utf16_to_byte(s, 5), None);
        assert_eq!(utf16_slice(s, 1, 3), "😀");
    }

    #[test]
    fn test_common_ancestor() {
        let mut dom = MemDom::new();
        let body = dom.root();
        let div = dom.append_element(&body, "div");
        let p1 = dom.append_element(&div, "p");
        let p2 = dom.append_element(&div, "p");
        let t1 = dom.append_text(&p1, "one");
        let t2 = dom.append_text(&p2, "two");

        assert_eq!(common_ancestor(&dom, &t1, &t2), Some(div));
        assert_eq!(common_ancestor(&dom, &t1, &t1), Some(t1));
        assert_eq!(common_ancestor(&dom, &t1, &p1), Some(p1));
    }

    #[test]
    fn test_text_in_range_across_elements() {
        let mut dom = MemDom::new();
        let body = dom.root();
        let p1 = dom.append_element(&body, "p");
        let t1 = dom.append_text(&p1, "hello there");
        let p2 = dom.append_element(&body, "p");
        dom.append_text(&p2, "middle");
        let p3 = dom.append_element(&body, "p");
        let t3 = dom.append_text(&p3, "general kenobi");

        let range = DomRange::from_parts(t1, 6, t3, 7);
        assert_eq!(text_in_range(&dom, &range), "theremiddlegeneral");

        // Element boundaries select whole children.
        let range = DomRange::from_parts(body.clone(), 1, body, 2);
        assert_eq!(text_in_range(&dom, &range), "middle");
    }

    #[test]
    fn test_first_text_descendant_depth_first() {
        let mut dom = MemDom::new();
        let body = dom.root();
        let div = dom.append_element(&body, "div");
        let em = dom.append_element(&div, "em");
        let inner = dom.append_text(&em, "inner");
        dom.append_text(&div, "outer");

        let hr = dom.append_element(&body, "hr");

        assert_eq!(first_text_descendant(&dom, &div), Some(inner));
        assert_eq!(first_text_descendant(&dom, &hr), None);
    }

    #[test]
    fn test_locate_text_offset() {
        let mut dom = MemDom::new();
        let body = dom.root();
        let p = dom.append_element(&body, "p");
        let a = dom.append_text(&p, "abc");
        let b_el = dom.append_element(&p, "b");
        let b = dom.append_text(&b_el, "def");

        assert_eq!(locate_text_offset(&dom, &p, 2), Ok(BoundaryPoint::new(a.clone(), 2)));
        assert_eq!(locate_text_offset(&dom, &p, 3), Ok(BoundaryPoint::new(a, 3)));
        assert_eq!(locate_text_offset(&dom, &p, 5), Ok(BoundaryPoint::new(b, 2)));
        assert_eq!(
            locate_text_offset(&dom, &p, 9),
            Err(Error::OffsetOutOfBounds { offset: 9, len: 6 })
        );

        let empty = dom.append_element(&body, "div");
        dom.set_id(&empty, "empty");
        assert_eq!(
            locate_text_offset(&dom, &empty, 0),
            Err(Error::NoTextNode("empty".into()))
        );
    }

    #[test]
    fn test_nearest_identified() {
        let mut dom = MemDom::new();
        let body = dom.root();
        let section = dom.append_element(&body, "section");
        dom.set_id(&section, "s1");
        let p = dom.append_element(&section, "p");
        let t = dom.append_text(&p, "text");

        assert_eq!(
            nearest_identified(&dom, &t),
            Some((section, SmolStr::new("s1")))
        );
        dom.set_id(&p, "p1");
        assert_eq!(nearest_identified(&dom, &t), Some((p, SmolStr::new("p1"))));
    }
}
