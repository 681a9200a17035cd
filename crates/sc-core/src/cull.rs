//! Visible-set culling.
//!
//! Given the camera, the surface size, and the full node set, keep only
//! the nodes whose bounds intersect the padded visible world rectangle.
//! Pure filter: recomputed whenever the camera or node set changes.

use crate::geometry::visible_world_rect;
use crate::model::{CameraState, Node, Surface};
use kurbo::Rect;
use serde::Serialize;

/// Summary counts for observability. `visible + culled == total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CullStats {
    pub total: usize,
    pub visible: usize,
    pub culled: usize,
}

/// Result of a culling pass: the visible nodes (input order) and counts.
#[derive(Debug, Clone)]
pub struct CullResult<'a> {
    pub region: Rect,
    pub visible: Vec<&'a Node>,
    pub stats: CullStats,
}

impl<'a> CullResult<'a> {
    /// Visible nodes in paint order (ascending `z_index`, stable).
    pub fn paint_order(&self) -> Vec<&'a Node> {
        let mut nodes = self.visible.clone();
        nodes.sort_by_key(|n| n.z_index);
        nodes
    }
}

/// The world rectangle used for culling: visible rect grown by `padding`.
pub fn cull_region(camera: &CameraState, surface: Surface, padding: f64) -> Rect {
    visible_world_rect(camera, surface).inflate(padding, padding)
}

/// Edge contact counts as intersection.
pub fn intersects(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

/// Select the nodes intersecting the padded viewport.
pub fn cull<'a>(
    nodes: &'a [Node],
    camera: &CameraState,
    surface: Surface,
    padding: f64,
) -> CullResult<'a> {
    let region = cull_region(camera, surface, padding);
    let visible: Vec<&Node> = nodes
        .iter()
        .filter(|n| intersects(n.bounds(), region))
        .collect();
    let stats = CullStats {
        total: nodes.len(),
        visible: visible.len(),
        culled: nodes.len() - visible.len(),
    };
    log::trace!(
        "cull: {}/{} visible in {:?}",
        stats.visible,
        stats.total,
        region
    );
    CullResult {
        region,
        visible,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::NodeId;
    use crate::model::NodeKind;
    use pretty_assertions::assert_eq;

    fn node(id: &str, x: f64, y: f64, z: i32) -> Node {
        Node::new(NodeId::intern(id), NodeKind::Rect, x, y, 50.0, 50.0)
            .unwrap()
            .with_z_index(z)
    }

    #[test]
    fn culls_far_nodes() {
        let nodes = vec![
            node("near", 0.0, 0.0, 0),
            node("edge", 590.0, 0.0, 0),
            node("far", 5_000.0, 5_000.0, 0),
        ];
        let result = cull(&nodes, &CameraState::default(), Surface::new(800.0, 600.0), 200.0);
        let ids: Vec<&str> = result.visible.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "edge"]);
        assert_eq!(
            result.stats,
            CullStats {
                total: 3,
                visible: 2,
                culled: 1
            }
        );
    }

    #[test]
    fn zoomed_out_sees_more() {
        let nodes = vec![node("far", 1_500.0, 0.0, 0)];
        let surface = Surface::new(800.0, 600.0);
        assert_eq!(cull(&nodes, &CameraState::default(), surface, 0.0).stats.visible, 0);
        let zoomed_out = CameraState::new(0.0, 0.0, 0.25);
        assert_eq!(cull(&nodes, &zoomed_out, surface, 0.0).stats.visible, 1);
    }

    #[test]
    fn paint_order_sorts_by_z() {
        let nodes = vec![node("top", 0.0, 0.0, 5), node("bottom", 10.0, 0.0, -1)];
        let result = cull(&nodes, &CameraState::default(), Surface::default(), 0.0);
        let order: Vec<&str> = result.paint_order().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(order, vec!["bottom", "top"]);
    }
}
