//! Integration tests: SpatialCanvas input routing and background results.
//!
//! Uses a `Vec<HostEvent>` host to record callbacks in order.

use pretty_assertions::assert_eq;
use sc_compute::ComputationBridge;
use sc_core::{
    CameraState, CanvasConfig, Connection, Node, NodeId, NodeKind, NodeUpdate, Point, Rect, Surface,
};
use sc_editor::{HostEvent, InputEvent, Modifiers, PointerButton, SpatialCanvas};
use std::time::{Duration, Instant};

fn square(id: &str, x: f64, y: f64) -> Node {
    Node::new(id.into(), NodeKind::Rect, x, y, 100.0, 100.0).unwrap()
}

fn canvas_with(bridge: ComputationBridge) -> SpatialCanvas<Vec<HostEvent>> {
    let mut canvas = SpatialCanvas::with_bridge(
        CanvasConfig::default(),
        Surface::new(800.0, 600.0),
        Vec::new(),
        bridge,
    );
    canvas.set_scene(
        vec![square("A", 0.0, 0.0), square("B", 500.0, 0.0)],
        vec![Connection::new("A", "B")],
    );
    canvas.viewport_mut().set_animations_enabled(false);
    canvas
}

fn offline() -> SpatialCanvas<Vec<HostEvent>> {
    canvas_with(ComputationBridge::unavailable(Duration::from_secs(1)))
}

/// Surface point over world `(x, y)` at the default camera.
fn at(x: f64, y: f64) -> (f64, f64) {
    (x + 400.0, y + 300.0)
}

fn middle(down: bool, x: f64, y: f64) -> InputEvent {
    if down {
        InputEvent::PointerDown { x, y, button: PointerButton::Middle, modifiers: Modifiers::NONE }
    } else {
        InputEvent::PointerUp { x, y, button: PointerButton::Middle, modifiers: Modifiers::NONE }
    }
}

fn updates(canvas: &SpatialCanvas<Vec<HostEvent>>) -> usize {
    canvas
        .host()
        .iter()
        .filter(|e| matches!(e, HostEvent::UpdateItem { .. }))
        .count()
}

fn bounds_of(canvas: &SpatialCanvas<Vec<HostEvent>>, id: NodeId) -> Rect {
    canvas.nodes().iter().find(|n| n.id == id).map(Node::bounds).unwrap()
}

/// `p` lies on the outline of `r`, within rounding.
fn on_outline(p: Point, r: Rect) -> bool {
    let eps = 1e-6;
    let inside = p.x >= r.x0 - eps && p.x <= r.x1 + eps && p.y >= r.y0 - eps && p.y <= r.y1 + eps;
    let on_edge = [p.x - r.x0, p.x - r.x1, p.y - r.y0, p.y - r.y1]
        .iter()
        .any(|d| d.abs() < eps);
    inside && on_edge
}

fn tick_until_idle(canvas: &mut SpatialCanvas<Vec<HostEvent>>) {
    let started = Instant::now();
    while canvas.has_pending_work() {
        canvas.tick(0.016);
        assert!(started.elapsed() < Duration::from_secs(5), "background work never finished");
        std::thread::sleep(Duration::from_millis(1));
    }
}

// ─── Selection and drag ──────────────────────────────────────────────────

#[test]
fn click_drag_release_reports_in_order() {
    let mut canvas = offline();
    let (x, y) = at(50.0, 50.0);
    canvas.handle_event(&InputEvent::pointer_down(x, y));
    canvas.handle_event(&InputEvent::pointer_move(x + 10.0, y + 5.0));
    canvas.handle_event(&InputEvent::pointer_up(x + 10.0, y + 5.0));

    assert_eq!(
        canvas.host().as_slice(),
        &[
            HostEvent::SelectItem(NodeId::intern("A")),
            HostEvent::UpdateItem {
                id: NodeId::intern("A"),
                update: NodeUpdate::position(10.0, 5.0),
            },
        ]
    );
    assert_eq!(canvas.nodes()[0].x, 10.0);
}

#[test]
fn modifier_click_multi_selects() {
    let mut canvas = offline();
    let (ax, ay) = at(50.0, 50.0);
    let (bx, by) = at(550.0, 50.0);
    canvas.handle_event(&InputEvent::pointer_down(ax, ay));
    canvas.handle_event(&InputEvent::pointer_up(ax, ay));
    canvas.handle_event(&InputEvent::PointerDown {
        x: bx,
        y: by,
        button: PointerButton::Primary,
        modifiers: Modifiers {
            meta: true,
            ..Modifiers::NONE
        },
    });

    assert_eq!(
        canvas.host().last(),
        Some(&HostEvent::MultiSelectItem {
            id: NodeId::intern("B"),
            additive: true
        })
    );
    assert_eq!(canvas.selection().len(), 2);
}

#[test]
fn empty_space_reports_background() {
    let mut canvas = offline();
    let (x, y) = at(300.0, 250.0);
    canvas.handle_event(&InputEvent::pointer_down(x, y));
    assert_eq!(canvas.host().as_slice(), &[HostEvent::BackgroundInteraction]);
}

#[test]
fn space_drag_pans_instead_of_selecting() {
    let mut canvas = offline();
    let (x, y) = at(50.0, 50.0);
    canvas.handle_event(&InputEvent::key_down(" "));
    canvas.handle_event(&InputEvent::pointer_down(x, y));
    canvas.handle_event(&InputEvent::pointer_move(x + 30.0, y));
    canvas.handle_event(&InputEvent::pointer_up(x + 30.0, y));
    canvas.handle_event(&InputEvent::key_up(" "));

    assert!(canvas.host().is_empty());
    assert_eq!(canvas.viewport().camera().pan.x, 30.0);
    assert!(!canvas.viewport().pan_modifier());
}

#[test]
fn pan_mid_drag_releases_the_drag() {
    let mut canvas = offline();
    let (x, y) = at(50.0, 50.0);
    canvas.handle_event(&InputEvent::pointer_down(x, y));
    assert!(canvas.tool().is_dragging());

    canvas.handle_event(&middle(true, 600.0, 500.0));
    canvas.handle_event(&InputEvent::pointer_move(620.0, 500.0));
    canvas.handle_event(&middle(false, 620.0, 500.0));
    assert!(!canvas.tool().is_dragging());

    // No button held: later moves must not drag A.
    canvas.handle_event(&InputEvent::pointer_move(x + 80.0, y + 40.0));
    assert_eq!(updates(&canvas), 0);
    let a = &canvas.nodes()[0];
    assert_eq!((a.x, a.y), (0.0, 0.0));
    assert_eq!(canvas.selection(), &[NodeId::intern("A")]);
}

#[test]
fn context_menu_is_suppressed() {
    assert!(offline().handle_context_menu());
}

#[test]
fn shortcuts_drive_the_view() {
    let mut canvas = offline();
    canvas.handle_event(&InputEvent::key_down("+"));
    assert!((canvas.viewport().camera().scale - 1.1).abs() < 1e-12);
    canvas.handle_event(&InputEvent::key_down("0"));
    assert_eq!(canvas.viewport().camera().scale, 1.0);

    canvas.handle_event(&InputEvent::key_down("1"));
    // Scene spans x ∈ [0, 600], y ∈ [0, 100].
    let center = canvas.viewport().surface_to_world(Point::new(400.0, 300.0));
    assert!((center - Point::new(300.0, 50.0)).hypot() < 1e-9);

    canvas.handle_event(&InputEvent::key_down("ArrowRight"));
    canvas.handle_event(&InputEvent::key_down("0"));
    canvas.handle_event(&InputEvent::key_down("ArrowRight"));
    assert_eq!(canvas.viewport().camera().pan.x, -50.0);
}

#[test]
fn culling_follows_camera() {
    let mut canvas = offline();
    assert_eq!(canvas.visible_nodes().stats.visible, 2);
    // Padded region becomes x ∈ [-900, 300]: B drops out.
    canvas.viewport_mut().pan_by(sc_core::Vec2::new(300.0, 0.0));
    let visible = canvas.visible_nodes();
    assert_eq!(visible.stats.visible, 1);
    assert_eq!(visible.stats.culled, 1);
    assert_eq!(visible.visible[0].id, NodeId::intern("A"));
}

// ─── Background work ─────────────────────────────────────────────────────

#[test]
fn auto_arrange_offline_uses_grid_fallback() {
    let mut canvas = offline();
    canvas.request_auto_arrange();
    assert!(canvas.tick(0.0));
    assert!(!canvas.has_pending_work());

    // Region is the 800x600 view grown to a 660 minimum height, so it
    // starts at world (-400, -330); grid starts 50 in.
    let a = &canvas.nodes()[0];
    assert_eq!((a.x, a.y), (-350.0, -280.0));
    assert_eq!(updates(&canvas), 2);
    assert_eq!(canvas.bridge_stats().fallbacks, 1);
}

#[test]
fn connectors_anchor_on_facing_edges() {
    let mut canvas = canvas_with(ComputationBridge::spawn(Duration::from_secs(5)));
    canvas.request_connectors();
    tick_until_idle(&mut canvas);

    let connectors = canvas.connectors();
    assert_eq!(connectors.len(), 1);
    assert_eq!(connectors[0].start.x, 100.0);
    assert_eq!(connectors[0].end.x, 500.0);
    assert_eq!(canvas.bridge_stats().fallbacks, 0);
}

#[test]
fn auto_arrange_on_worker_updates_every_node() {
    let mut canvas = canvas_with(ComputationBridge::spawn(Duration::from_secs(5)));
    canvas.request_auto_arrange();
    tick_until_idle(&mut canvas);

    let moved: Vec<NodeId> = canvas
        .host()
        .iter()
        .filter_map(|e| match e {
            HostEvent::UpdateItem { id, .. } => Some(*id),
            _ => None,
        })
        .collect();
    assert_eq!(moved, vec![NodeId::intern("A"), NodeId::intern("B")]);
    assert_eq!(canvas.bridge_stats().completed, 1);
}

#[test]
fn connectors_requested_with_arrange_follow_the_new_positions() {
    let mut canvas = canvas_with(ComputationBridge::spawn(Duration::from_secs(5)));
    canvas.request_auto_arrange();
    canvas.request_connectors();
    tick_until_idle(&mut canvas);

    let a = bounds_of(&canvas, NodeId::intern("A"));
    let b = bounds_of(&canvas, NodeId::intern("B"));
    assert_ne!(a.origin(), Point::new(0.0, 0.0), "layout should have moved A");
    let connectors = canvas.connectors();
    assert_eq!(connectors.len(), 1);
    assert!(on_outline(connectors[0].start, a), "{:?} not on {a:?}", connectors[0].start);
    assert!(on_outline(connectors[0].end, b), "{:?} not on {b:?}", connectors[0].end);
}

#[test]
fn auto_arrange_at_max_zoom_keeps_nodes_apart() {
    let mut canvas = canvas_with(ComputationBridge::spawn(Duration::from_secs(5)));
    canvas.set_scene(
        vec![square("A", 0.0, 0.0), square("B", 500.0, 0.0), square("C", 0.0, 300.0)],
        vec![Connection::new("A", "B")],
    );
    canvas.viewport_mut().set_camera(CameraState::new(0.0, 0.0, 5.0));
    canvas.request_auto_arrange();
    tick_until_idle(&mut canvas);

    assert_eq!(updates(&canvas), 3);
    let rects: Vec<Rect> = canvas.nodes().iter().map(Node::bounds).collect();
    for (i, r) in rects.iter().enumerate() {
        for other in &rects[i + 1..] {
            let overlap = r.intersect(*other);
            assert!(
                overlap.width() <= 1e-9 || overlap.height() <= 1e-9,
                "{r:?} overlaps {other:?}"
            );
        }
    }
}

#[test]
fn replacing_the_scene_drops_pending_results() {
    let mut canvas = offline();
    canvas.request_auto_arrange();
    canvas.request_connectors();
    canvas.set_scene(
        vec![square("A", 1_000.0, 1_000.0), square("B", 1_500.0, 1_000.0)],
        vec![Connection::new("A", "B")],
    );
    assert!(!canvas.has_pending_work());

    canvas.tick(0.0);
    assert_eq!(updates(&canvas), 0);
    assert!(canvas.connectors().is_empty());
    let a = &canvas.nodes()[0];
    assert_eq!((a.x, a.y), (1_000.0, 1_000.0));
}
