//! Visual highlighting of a selection with marker elements.

use smol_str::SmolStr;

use crate::partition::partition;
use crate::platform::DomTree;
use crate::types::{DomRange, MarkerKind};

/// Wraps selections in marker elements and removes them again.
#[derive(Debug, Clone)]
pub struct Highlighter {
    marker_class: SmolStr,
}

impl Highlighter {
    pub fn new(marker_class: impl Into<SmolStr>) -> Self {
        Self {
            marker_class: marker_class.into(),
        }
    }

    pub fn marker_class(&self) -> &str {
        &self.marker_class
    }

    /// Highlight `range` by wrapping each of its safe pieces in a marker.
    ///
    /// This mutates the tree around the live selection, which invalidates
    /// it: callers must not rely on the live selection surviving this call
    /// (keep a copy of the range if it needs restoring later). Pieces that
    /// cannot be wrapped are skipped. Returns the number of markers added.
    pub fn apply<D: DomTree>(&self, dom: &mut D, range: &DomRange<D::Node>) -> usize {
        let pieces = partition(dom, range);
        dom.invalidate_live_selection();

        // Last piece first: wrapping only shifts positions after the wrapped
        // region, so the boundaries of earlier pieces stay valid.
        let mut added = 0;
        for piece in pieces.iter().rev() {
            if piece.is_collapsed() {
                continue;
            }
            let marker = if dom.is_text(&piece.start.container) || dom.is_text(&piece.end.container)
            {
                MarkerKind::Inline
            } else {
                MarkerKind::Block
            };
            match dom.surround(piece, marker, &self.marker_class) {
                Ok(_) => added += 1,
                Err(error) => {
                    tracing::debug!(
                        target: "askbox::highlight",
                        %error,
                        ?piece,
                        "skipping piece that cannot be wrapped"
                    );
                }
            }
        }

        tracing::debug!(
            target: "askbox::highlight",
            pieces = pieces.len(),
            added,
            "applied highlight"
        );
        added
    }

    /// Remove every marker in the document, restoring the original text
    /// nodes. Returns the number of markers removed.
    pub fn clear<D: DomTree>(&self, dom: &mut D) -> usize {
        let markers = dom.elements_by_class(&self.marker_class);
        let mut parents: Vec<D::Node> = Vec::new();
        let mut removed = 0;

        for marker in &markers {
            match dom.unwrap(marker) {
                Ok(parent) => {
                    removed += 1;
                    if !parents.contains(&parent) {
                        parents.push(parent);
                    }
                }
                Err(error) => {
                    tracing::debug!(target: "askbox::highlight", %error, "could not unwrap marker");
                }
            }
        }
        for parent in &parents {
            dom.normalize(parent);
        }

        if removed > 0 {
            tracing::debug!(target: "askbox::highlight", removed, "cleared highlight");
        }
        removed
    }

    /// Number of markers currently in the document.
    pub fn marker_count<D: DomTree>(&self, dom: &D) -> usize {
        dom.elements_by_class(&self.marker_class).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mem::{MemDom, NodeId};
    use crate::platform::SelectionHost;
    use crate::tree::text_in_range;

    fn highlighter() -> Highlighter {
        Highlighter::new("askboxHighlight")
    }

    /// Shape of a subtree: (tag or text, children), used to compare the
    /// node structure before and after highlighting.
    fn shape(dom: &MemDom, node: &NodeId) -> String {
        match dom.text(node) {
            Some(text) => format!("{text:?}"),
            None => {
                let children: Vec<String> =
                    dom.children(node).iter().map(|c| shape(dom, c)).collect();
                format!("{}[{}]", dom.tag(node).unwrap_or("?"), children.join(","))
            }
        }
    }

    #[test]
    fn test_single_paragraph_scenario() {
        let mut dom = MemDom::new();
        let body = dom.root();
        let p = dom.append_element(&body, "p");
        let t = dom.append_text(&p, "say hello world now");
        let range = DomRange::from_parts(t, 4, t, 15);
        assert_eq!(text_in_range(&dom, &range), "hello world");
        assert_eq!(partition(&dom, &range).len(), 1);

        let before = shape(&dom, &body);
        let hl = highlighter();

        assert_eq!(hl.apply(&mut dom, &range), 1);
        assert_eq!(hl.marker_count(&dom), 1);
        insta::assert_snapshot!(
            dom.to_html(&p),
            @r#"<p>say <span class="askboxHighlight">hello world</span> now</p>"#
        );

        assert_eq!(hl.clear(&mut dom), 1);
        assert_eq!(hl.marker_count(&dom), 0);
        assert_eq!(shape(&dom, &body), before);
    }

    #[test]
    fn test_multi_paragraph_round_trip() {
        // <div><p>alpha beta</p><p>gamma delta</p><p>ab<em>cd</em>ef</p></div>
        let mut dom = MemDom::new();
        let body = dom.root();
        let div = dom.append_element(&body, "div");
        let p1 = dom.append_element(&div, "p");
        let t1 = dom.append_text(&p1, "alpha beta");
        let p2 = dom.append_element(&div, "p");
        dom.append_text(&p2, "gamma delta");
        let p3 = dom.append_element(&div, "p");
        dom.append_text(&p3, "ab");
        let em = dom.append_element(&p3, "em");
        let cd = dom.append_text(&em, "cd");
        dom.append_text(&p3, "ef");

        let range = DomRange::from_parts(t1, 6, cd, 1);
        let expected = text_in_range(&dom, &range);
        assert_eq!(expected, "betagamma deltaabc");

        let before = shape(&dom, &body);
        let before_text = dom.text_content(&body);
        let hl = highlighter();

        let added = hl.apply(&mut dom, &range);
        assert_eq!(added, 4);
        let marked: String = dom
            .elements_by_class("askboxHighlight")
            .iter()
            .map(|m| dom.text_content(m))
            .collect();
        assert_eq!(marked, expected);
        assert_eq!(dom.text_content(&body), before_text);

        hl.clear(&mut dom);
        assert_eq!(shape(&dom, &body), before);
    }

    #[test]
    fn test_block_marker_for_element_pieces() {
        let mut dom = MemDom::new();
        let body = dom.root();
        let div = dom.append_element(&body, "div");
        for text in ["one", "two", "three"] {
            let p = dom.append_element(&div, "p");
            dom.append_text(&p, text);
        }
        let first = dom.first_child(&dom.first_child(&div).unwrap()).unwrap();
        let last = dom.first_child(&dom.last_child(&div).unwrap()).unwrap();

        let hl = highlighter();
        hl.apply(&mut dom, &DomRange::from_parts(first, 1, last, 2));

        let tags: Vec<_> = dom
            .elements_by_class("askboxHighlight")
            .iter()
            .map(|m| dom.tag(m).unwrap_or_default().to_string())
            .collect();
        assert_eq!(tags, vec!["span", "div", "span"]);
    }

    #[test]
    fn test_apply_invalidates_live_selection() {
        let mut dom = MemDom::new();
        let body = dom.root();
        let p = dom.append_element(&body, "p");
        let t = dom.append_text(&p, "selected");
        let range = DomRange::from_parts(t, 0, t, 8);
        dom.select(Some(range.clone()));

        highlighter().apply(&mut dom, &range);
        assert_eq!(dom.live_range(), None);
    }

    #[test]
    fn test_unwrappable_piece_is_skipped() {
        let mut dom = MemDom::new();
        let body = dom.root();
        let div = dom.append_element(&body, "div");
        let p = dom.append_element(&div, "p");
        let t = dom.append_text(&p, "inner");

        // Start container is the common ancestor: the range comes back
        // unpartitioned and crosses the paragraph boundary.
        let range = DomRange::from_parts(div, 0, t, 3);
        let hl = highlighter();
        assert_eq!(hl.apply(&mut dom, &range), 0);
        assert_eq!(hl.marker_count(&dom), 0);
        assert_eq!(dom.text_content(&body), "inner");
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut dom = MemDom::new();
        let hl = highlighter();
        assert_eq!(hl.clear(&mut dom), 0);
        assert_eq!(hl.clear(&mut dom), 0);
    }
}
