//! Hit testing: world point → node lookup.
//!
//! Nodes paint in ascending `z_index`, later-in-list on top for equal
//! indices, so the topmost hit is the last one in that order.

use sc_core::cull::intersects;
use sc_core::{Node, NodeId, NodeKind, Point, Rect};

/// Whether `p` lies inside the node's outline. Edges count as inside.
pub fn contains(node: &Node, p: Point) -> bool {
    let b = node.bounds();
    if p.x < b.x0 || p.x > b.x1 || p.y < b.y0 || p.y > b.y1 {
        return false;
    }
    let c = b.center();
    let rx = b.width() / 2.0;
    let ry = b.height() / 2.0;
    match node.kind {
        NodeKind::Ellipse => {
            let dx = (p.x - c.x) / rx;
            let dy = (p.y - c.y) / ry;
            dx * dx + dy * dy <= 1.0
        }
        NodeKind::Diamond => (p.x - c.x).abs() / rx + (p.y - c.y).abs() / ry <= 1.0,
        NodeKind::Rect | NodeKind::Note | NodeKind::Image | NodeKind::Frame => true,
    }
}

/// Find the topmost node at `p`. Returns `None` for background.
pub fn hit_test(nodes: &[Node], p: Point) -> Option<NodeId> {
    nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| contains(n, p))
        .max_by_key(|(i, n)| (n.z_index, *i))
        .map(|(_, n)| n.id)
}

/// All nodes whose bounds intersect `rect`, in input order.
/// Used for marquee selection.
pub fn hit_test_rect(nodes: &[Node], rect: Rect) -> Vec<NodeId> {
    nodes
        .iter()
        .filter(|n| intersects(n.bounds(), rect))
        .map(|n| n.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn node(id: &str, kind: NodeKind, x: f64, y: f64, w: f64, h: f64) -> Node {
        Node::new(id.into(), kind, x, y, w, h).unwrap()
    }

    #[test]
    fn hit_test_basic() {
        let nodes = vec![
            node("a", NodeKind::Rect, 10.0, 10.0, 100.0, 100.0),
            node("b", NodeKind::Rect, 200.0, 200.0, 50.0, 50.0),
        ];
        assert_eq!(hit_test(&nodes, Point::new(50.0, 50.0)), Some("a".into()));
        assert_eq!(hit_test(&nodes, Point::new(225.0, 225.0)), Some("b".into()));
        assert_eq!(hit_test(&nodes, Point::new(150.0, 150.0)), None);
    }

    #[test]
    fn topmost_wins() {
        let nodes = vec![
            node("front", NodeKind::Rect, 0.0, 0.0, 100.0, 100.0).with_z_index(2),
            node("back", NodeKind::Rect, 0.0, 0.0, 100.0, 100.0),
            node("later", NodeKind::Rect, 0.0, 0.0, 100.0, 100.0),
        ];
        assert_eq!(hit_test(&nodes, Point::new(50.0, 50.0)), Some("front".into()));
        assert_eq!(hit_test(&nodes[1..], Point::new(50.0, 50.0)), Some("later".into()));
    }

    #[test]
    fn ellipse_and_diamond_use_true_outline() {
        let ellipse = node("e", NodeKind::Ellipse, 0.0, 0.0, 100.0, 100.0);
        assert!(contains(&ellipse, Point::new(50.0, 50.0)));
        assert!(contains(&ellipse, Point::new(50.0, 0.0)));
        assert!(!contains(&ellipse, Point::new(5.0, 5.0)));

        let diamond = node("d", NodeKind::Diamond, 0.0, 0.0, 100.0, 60.0);
        assert!(contains(&diamond, Point::new(50.0, 30.0)));
        assert!(contains(&diamond, Point::new(25.0, 30.0)));
        assert!(!contains(&diamond, Point::new(10.0, 5.0)));
    }

    #[test]
    fn rect_query_returns_input_order() {
        let nodes = vec![
            node("a", NodeKind::Rect, 0.0, 0.0, 10.0, 10.0),
            node("b", NodeKind::Rect, 100.0, 100.0, 10.0, 10.0),
            node("c", NodeKind::Rect, 5.0, 5.0, 10.0, 10.0),
        ];
        let hits = hit_test_rect(&nodes, Rect::new(-1.0, -1.0, 6.0, 6.0));
        assert_eq!(hits, vec![NodeId::intern("a"), NodeId::intern("c")]);
    }
}
