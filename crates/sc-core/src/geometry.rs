//! Geometry kernel: camera transforms, grid snapping, ray/rect anchoring,
//! and Bézier evaluation.
//!
//! Everything here is pure. View coordinates are surface pixels relative to
//! the surface center, so `view = pan + world * scale`.

use crate::model::{CameraState, Surface, WorldBounds};
use kurbo::{Affine, CubicBez, Line, ParamCurve, Point, QuadBez, Rect, Vec2};

/// Directions shorter than this are treated as zero-length.
const DEGENERATE_EPSILON: f64 = 1e-9;

// ─── Camera transform ────────────────────────────────────────────────────

/// The view←world affine map for a pan offset and uniform scale.
pub fn compose_transform(pan: Vec2, scale: f64) -> Affine {
    Affine::translate(pan) * Affine::scale(scale)
}

/// Map a world point into view coordinates.
pub fn world_to_screen(point: Point, camera: &CameraState) -> Point {
    Point::new(
        point.x * camera.scale + camera.pan.x,
        point.y * camera.scale + camera.pan.y,
    )
}

/// Map a view point back into world coordinates.
pub fn screen_to_world(point: Point, camera: &CameraState) -> Point {
    Point::new(
        (point.x - camera.pan.x) / camera.scale,
        (point.y - camera.pan.y) / camera.scale,
    )
}

/// The world rectangle visible on `surface`, from the inverse-transformed
/// surface corners.
pub fn visible_world_rect(camera: &CameraState, surface: Surface) -> Rect {
    let hw = surface.width / 2.0;
    let hh = surface.height / 2.0;
    let corners = [
        Point::new(-hw, -hh),
        Point::new(hw, -hh),
        Point::new(hw, hh),
        Point::new(-hw, hh),
    ]
    .map(|c| screen_to_world(c, camera));

    let first = Rect::from_points(corners[0], corners[0]);
    corners[1..]
        .iter()
        .fold(first, |acc, p| acc.union_pt(*p))
}

// ─── Boundary clamping ───────────────────────────────────────────────────

/// Largest pan displacement (per axis) that keeps the visible rectangle
/// inside the world: `(world_extent * scale - surface_extent) / 2`.
///
/// When the scaled world is smaller than the surface there is no room to
/// pan, so the result is clamped at zero.
pub fn max_pan_offset(world_extent: f64, scale: f64, surface_extent: f64) -> f64 {
    ((world_extent * scale - surface_extent) / 2.0).max(0.0)
}

/// Clamp `pan` so the visible world rectangle stays within `world`.
///
/// For the usual origin-centered world the allowed range is
/// `[-max_pan_offset, max_pan_offset]` on each axis.
pub fn clamp_pan(pan: Vec2, scale: f64, world: &WorldBounds, surface: Surface) -> Vec2 {
    let extent = world.extent();
    let center = world.center();
    let mx = max_pan_offset(extent.width, scale, surface.width);
    let my = max_pan_offset(extent.height, scale, surface.height);
    // Pan that puts the world center at the view center.
    let cx = -center.x * scale;
    let cy = -center.y * scale;
    Vec2::new(
        pan.x.max(cx - mx).min(cx + mx),
        pan.y.max(cy - my).min(cy + my),
    )
}

/// Whether `point` lies within `margin` world units of any world edge.
pub fn near_boundary(point: Point, world: &WorldBounds, margin: f64) -> bool {
    point.x - world.min_x < margin
        || world.max_x - point.x < margin
        || point.y - world.min_y < margin
        || world.max_y - point.y < margin
}

// ─── Grid ────────────────────────────────────────────────────────────────

/// Round `value` to the nearest grid line.
///
/// The effective grid size is `base_grid_size / scale`, which keeps the
/// rendered grid density constant across zoom levels. Non-positive scale
/// or grid size leaves the value untouched.
pub fn snap_to_grid(value: f64, scale: f64, base_grid_size: f64) -> f64 {
    if scale <= 0.0 || base_grid_size <= 0.0 || !value.is_finite() {
        return value;
    }
    let grid = base_grid_size / scale;
    (value / grid).round() * grid
}

/// Snap both coordinates of `point` with [`snap_to_grid`].
pub fn snap_point(point: Point, scale: f64, base_grid_size: f64) -> Point {
    Point::new(
        snap_to_grid(point.x, scale, base_grid_size),
        snap_to_grid(point.y, scale, base_grid_size),
    )
}

// ─── Anchoring ───────────────────────────────────────────────────────────

/// Where a ray cast from the center of `rect` along `direction` leaves the
/// rectangle. A zero-length direction yields the center.
pub fn intersect_ray_with_rect(rect: Rect, direction: Vec2) -> Point {
    let center = rect.center();
    if direction.hypot() < DEGENERATE_EPSILON {
        return center;
    }
    let hw = rect.width() / 2.0;
    let hh = rect.height() / 2.0;

    let tx = if direction.x.abs() > DEGENERATE_EPSILON {
        hw / direction.x.abs()
    } else {
        f64::INFINITY
    };
    let ty = if direction.y.abs() > DEGENERATE_EPSILON {
        hh / direction.y.abs()
    } else {
        f64::INFINITY
    };
    center + direction * tx.min(ty)
}

// ─── Curves ──────────────────────────────────────────────────────────────

/// Evaluate the curve from `start` to `end` at `t ∈ [0, 1]`.
///
/// No control point gives a straight line, one a quadratic, two a cubic.
/// Controls past the second are ignored.
pub fn evaluate_bezier(start: Point, controls: &[Point], end: Point, t: f64) -> Point {
    let t = t.clamp(0.0, 1.0);
    match controls {
        [] => Line::new(start, end).eval(t),
        [c] => QuadBez::new(start, *c, end).eval(t),
        [c1, c2, rest @ ..] => {
            if !rest.is_empty() {
                log::debug!("evaluate_bezier: ignoring {} extra control points", rest.len());
            }
            CubicBez::new(start, *c1, *c2, end).eval(t)
        }
    }
}
