//! Hit testing: document point → node lookup.
//!
//! Walks the nodes in reverse document order (last added = drawn on top)
//! and returns the first whose footprint contains the point.

use crate::id::NodeId;
use crate::model::CanvasDocument;
use kurbo::Point;

/// Find the topmost node at `p` (document coordinates).
/// Returns `None` if no node is hit (background).
pub fn hit_test(doc: &CanvasDocument, p: Point) -> Option<NodeId> {
    doc.topmost_first()
        .find(|node| node.footprint.is_some_and(|fp| fp.contains(p)))
        .map(|node| node.id)
}
