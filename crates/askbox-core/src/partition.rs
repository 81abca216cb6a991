//! Range partitioning.
//!
//! A user selection can start deep inside one element and end deep inside
//! another. Wrapping such a range in a single marker is impossible without
//! breaking the tree, so it is broken into pieces that each sit under a
//! single parent:
//!
//! ```text
//! <div>
//!   <p>al[pha <em>beta</em></p>       start chain: text, p
//!   [<p>middle</p>]                   middle: siblings between the chains
//!   <p>[gam]ma</p>                    end chain: text, p
//! </div>
//! ```

use crate::platform::DomTree;
use crate::tree::common_ancestor;
use crate::types::{BoundaryPoint, DomRange};

/// Split a range into sub-ranges that do not cross element boundaries.
///
/// Pure: only reads the tree. Pieces come back in document order and
/// together cover exactly the text of `range`. Zero-width pieces produced by
/// the chain construction are dropped. A range whose start or end container
/// is the common ancestor itself is returned unchanged.
pub fn partition<D: DomTree>(dom: &D, range: &DomRange<D::Node>) -> Vec<DomRange<D::Node>> {
    let pieces = match split_chains(dom, range) {
        Some(pieces) => pieces,
        None => return vec![range.clone()],
    };

    let pieces: Vec<_> = pieces.into_iter().filter(|p| !p.is_collapsed()).collect();
    tracing::trace!(
        target: "askbox::partition",
        pieces = pieces.len(),
        "partitioned selection range"
    );
    pieces
}

fn split_chains<D: DomTree>(
    dom: &D,
    range: &DomRange<D::Node>,
) -> Option<Vec<DomRange<D::Node>>> {
    let ancestor = common_ancestor(dom, &range.start.container, &range.end.container)?;
    let start_chain = chain_below(dom, &range.start.container, &ancestor);
    let end_chain = chain_below(dom, &range.end.container, &ancestor);

    let start_outer = start_chain.last()?;
    let end_outer = end_chain.last()?;

    let mut pieces = Vec::with_capacity(start_chain.len() + end_chain.len() + 1);

    for (i, node) in start_chain.iter().enumerate() {
        let start = if i == 0 {
            range.start.clone()
        } else {
            after(dom, &start_chain[i - 1])?
        };
        let end = if i == 0 && dom.is_text(node) {
            after(dom, node)?
        } else {
            BoundaryPoint::new(node.clone(), dom.node_length(node))
        };
        pieces.push(DomRange::new(start, end));
    }

    pieces.push(DomRange::new(after(dom, start_outer)?, before(dom, end_outer)?));

    let mut end_pieces = Vec::with_capacity(end_chain.len());
    for (i, node) in end_chain.iter().enumerate() {
        let start = if i == 0 && dom.is_text(node) {
            before(dom, node)?
        } else {
            BoundaryPoint::new(node.clone(), 0)
        };
        let end = if i == 0 {
            range.end.clone()
        } else {
            before(dom, &end_chain[i - 1])?
        };
        end_pieces.push(DomRange::new(start, end));
    }
    pieces.extend(end_pieces.into_iter().rev());

    Some(pieces)
}

/// `node` and its ancestors strictly below `ancestor`, innermost first.
fn chain_below<D: DomTree>(dom: &D, node: &D::Node, ancestor: &D::Node) -> Vec<D::Node> {
    let mut chain = Vec::new();
    let mut current = Some(node.clone());
    while let Some(n) = current {
        if &n == ancestor {
            break;
        }
        current = dom.parent(&n);
        chain.push(n);
    }
    chain
}

/// The point immediately after `node` in its parent.
fn after<D: DomTree>(dom: &D, node: &D::Node) -> Option<BoundaryPoint<D::Node>> {
    let parent = dom.parent(node)?;
    let index = dom.index_in_parent(node)?;
    Some(BoundaryPoint::new(parent, index + 1))
}

/// The point immediately before `node` in its parent.
fn before<D: DomTree>(dom: &D, node: &D::Node) -> Option<BoundaryPoint<D::Node>> {
    let parent = dom.parent(node)?;
    let index = dom.index_in_parent(node)?;
    Some(BoundaryPoint::new(parent, index))
}
