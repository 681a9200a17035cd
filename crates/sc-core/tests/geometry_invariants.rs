//! Property-based invariant tests for the geometry kernel and culler.
//!
//! 1. screen_to_world ∘ world_to_screen is the identity.
//! 2. snap_to_grid is idempotent.
//! 3. clamp_pan keeps pan inside ±max_pan_offset for every valid scale.
//! 4. Ray anchors lie on the rectangle boundary.
//! 5. Culling partitions the node set consistently with the padded region.

use proptest::prelude::*;
use sc_core::cull::{cull, cull_region, intersects};
use sc_core::geometry::*;
use sc_core::{CameraState, Node, NodeId, NodeKind, Point, Rect, Surface, Vec2, WorldBounds};

// ── Helpers ─────────────────────────────────────────────────────────────

fn camera_strategy() -> impl Strategy<Value = CameraState> {
    (-20_000.0f64..20_000.0, -20_000.0f64..20_000.0, 0.25f64..=5.0)
        .prop_map(|(x, y, s)| CameraState::new(x, y, s))
}

fn point_strategy() -> impl Strategy<Value = Point> {
    (-10_000.0f64..10_000.0, -10_000.0f64..10_000.0).prop_map(|(x, y)| Point::new(x, y))
}

fn nodes_strategy() -> impl Strategy<Value = Vec<Node>> {
    prop::collection::vec(
        (
            -3_000.0f64..3_000.0,
            -3_000.0f64..3_000.0,
            1.0f64..400.0,
            1.0f64..400.0,
        ),
        0..40,
    )
    .prop_map(|shapes| {
        shapes
            .into_iter()
            .enumerate()
            .map(|(i, (x, y, w, h))| {
                Node::new(NodeId::intern(&format!("p{i}")), NodeKind::Rect, x, y, w, h)
                    .expect("strategy only yields positive sizes")
            })
            .collect()
    })
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Round-trip law
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn screen_world_roundtrip(p in point_strategy(), camera in camera_strategy()) {
        let back = screen_to_world(world_to_screen(p, &camera), &camera);
        prop_assert!((back - p).hypot() < 1e-6, "{:?} -> {:?}", p, back);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Snap idempotence
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn snap_is_idempotent(v in -50_000.0f64..50_000.0, s in 0.25f64..=5.0, g in 1.0f64..100.0) {
        let once = snap_to_grid(v, s, g);
        let twice = snap_to_grid(once, s, g);
        prop_assert!((once - twice).abs() < 1e-9, "{} vs {}", once, twice);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Pan clamp bounds
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn clamped_pan_within_max_offset(
        camera in camera_strategy(),
        w in 100.0f64..4_000.0,
        h in 100.0f64..4_000.0,
    ) {
        let world = WorldBounds::default();
        let surface = Surface::new(w, h);
        let pan = clamp_pan(camera.pan, camera.scale, &world, surface);
        let mx = max_pan_offset(world.extent().width, camera.scale, w);
        let my = max_pan_offset(world.extent().height, camera.scale, h);
        prop_assert!(pan.x.abs() <= mx + 1e-9);
        prop_assert!(pan.y.abs() <= my + 1e-9);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Anchors on the boundary
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn ray_anchor_on_boundary(
        x in -500.0f64..500.0,
        y in -500.0f64..500.0,
        w in 1.0f64..300.0,
        h in 1.0f64..300.0,
        angle in 0.0f64..std::f64::consts::TAU,
    ) {
        let rect = Rect::new(x, y, x + w, y + h);
        let p = intersect_ray_with_rect(rect, Vec2::new(angle.cos(), angle.sin()));
        let eps = 1e-6;
        let on_vertical = ((p.x - rect.x0).abs() < eps || (p.x - rect.x1).abs() < eps)
            && p.y >= rect.y0 - eps && p.y <= rect.y1 + eps;
        let on_horizontal = ((p.y - rect.y0).abs() < eps || (p.y - rect.y1).abs() < eps)
            && p.x >= rect.x0 - eps && p.x <= rect.x1 + eps;
        prop_assert!(on_vertical || on_horizontal, "{:?} not on {:?}", p, rect);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Culling partition
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn cull_partitions_nodes(
        nodes in nodes_strategy(),
        camera in camera_strategy(),
        padding in 0.0f64..500.0,
    ) {
        let surface = Surface::new(800.0, 600.0);
        let result = cull(&nodes, &camera, surface, padding);
        let region = cull_region(&camera, surface, padding);

        prop_assert_eq!(result.stats.visible + result.stats.culled, result.stats.total);
        prop_assert_eq!(result.stats.total, nodes.len());
        for node in &nodes {
            let kept = result.visible.iter().any(|v| v.id == node.id);
            prop_assert_eq!(kept, intersects(node.bounds(), region), "node {:?}", node.id);
        }
    }
}

#[test]
fn culled_nodes_are_fully_outside_padded_rect() {
    let nodes = vec![
        Node::new("inside".into(), NodeKind::Rect, 0.0, 0.0, 10.0, 10.0).unwrap(),
        Node::new("outside".into(), NodeKind::Rect, 700.0, 0.0, 10.0, 10.0).unwrap(),
    ];
    let result = cull(&nodes, &CameraState::default(), Surface::new(800.0, 600.0), 100.0);
    // Padded region is x ∈ [-500, 500]; "outside" starts at 700.
    assert_eq!(result.visible.len(), 1);
    assert_eq!(result.visible[0].id.as_str(), "inside");
}
