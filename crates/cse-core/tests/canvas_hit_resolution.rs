//! Integration tests: canvas JSON → document → screen point → hit node.
//!
//! Exercises the full `cse-core` pipeline the node locator relies on.

use cse_core::geometry::{ElementFrame, screen_to_document_point};
use cse_core::id::NodeId;
use cse_core::model::*;
use cse_core::{Point, hit_test};
use pretty_assertions::assert_eq;

fn board() -> CanvasDocument {
    CanvasDocument::from_json(include_str!("fixtures/board.canvas")).unwrap()
}

#[test]
fn board_parses_every_node_kind() {
    let doc = board();
    assert_eq!(doc.nodes.len(), 4);
    assert_eq!(doc.edges.len(), 1);

    let kinds: Vec<NodeKind> = doc.nodes.iter().map(|n| n.kind.clone()).collect();
    assert_eq!(
        kinds,
        vec![
            NodeKind::Other("group".into()),
            NodeKind::Text,
            NodeKind::File,
            NodeKind::File,
        ]
    );

    let editable: Vec<&str> = doc
        .nodes
        .iter()
        .filter(|n| n.is_text_bearing())
        .map(|n| n.id.as_str())
        .collect();
    assert_eq!(editable, vec!["9f8e7d6c5b4a3f2e", "0011223344556677"]);
}

#[test]
fn hits_cards_above_the_group() {
    let doc = board();
    let at = |x, y| hit_test(&doc, Point::new(x, y)).map(|id| id.as_str().to_string());

    assert_eq!(at(-100.0, -100.0).as_deref(), Some("9f8e7d6c5b4a3f2e"));
    assert_eq!(at(400.0, 0.0).as_deref(), Some("0011223344556677"));
    // nested pos/size footprint
    assert_eq!(at(300.0, 350.0).as_deref(), Some("8899aabbccddeeff"));
    // only the group underneath
    assert_eq!(at(700.0, 500.0).as_deref(), Some("1a2b3c4d5e6f7a8b"));
    assert_eq!(at(2000.0, 2000.0), None);
}

#[test]
fn zoomed_screen_point_resolves_to_card() {
    let doc = board();
    let viewport = ElementFrame::new(Point::new(10.0, 10.0), None);
    let zoom = ElementFrame::new(
        Point::new(10.0, 10.0),
        Some("matrix(0.5, 0, 0, 0.5, 100, 50)"),
    );

    // document (400, 0) → screen (400 * 0.5 + 100 + 10, 0 * 0.5 + 50 + 10)
    let p = screen_to_document_point([&zoom], Some(&viewport), Point::new(310.0, 60.0));
    assert_eq!(p, Point::new(400.0, 0.0));
    assert_eq!(hit_test(&doc, p), Some(NodeId::intern("0011223344556677")));
}

#[test]
fn patched_board_keeps_other_nodes_and_edges() {
    let raw = include_str!("fixtures/board.canvas");
    let id = NodeId::intern("9f8e7d6c5b4a3f2e");
    let patched = patch_node_text(raw, id, "# Goals\n\n- shipped").unwrap();

    let before = board();
    let after = CanvasDocument::from_json(&patched).unwrap();
    assert_eq!(after.edges, before.edges);
    for (a, b) in after.nodes.iter().zip(&before.nodes) {
        if a.id == id {
            assert_eq!(a.text.as_deref(), Some("# Goals\n\n- shipped"));
        } else {
            assert_eq!(a, b);
        }
    }
}
