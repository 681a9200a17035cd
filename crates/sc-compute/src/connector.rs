//! Connector routing and curve tessellation.
//!
//! Connectors are anchored where the center-to-center ray leaves each
//! rectangle, so lines meet node edges instead of disappearing under them.

use crate::protocol::{
    BezierRequest, BezierResponse, ConnectorGeometry, ConnectorRequest, ConnectorResponse,
};
use sc_core::geometry::{evaluate_bezier, intersect_ray_with_rect};
use sc_core::{PathData, Point, Rect, resolve_connections};

/// Vertical lift of the control point, as a fraction of the horizontal span.
pub const CURVE_LIFT: f64 = 0.2;

/// Edge anchors for a connector from `source` to `target`.
pub fn anchor_points(source: Rect, target: Rect) -> (Point, Point) {
    let direction = target.center() - source.center();
    let start = intersect_ray_with_rect(source, direction);
    let end = intersect_ray_with_rect(target, -direction);
    (start, end)
}

/// Control point for a gentle arc between two anchors.
pub fn control_point(start: Point, end: Point) -> Point {
    let mid = start.midpoint(end);
    Point::new(mid.x, mid.y - (end.x - start.x).abs() * CURVE_LIFT)
}

/// Route every connection whose endpoints are both present.
pub fn smart_connectors(request: &ConnectorRequest) -> ConnectorResponse {
    let connectors: Vec<ConnectorGeometry> =
        resolve_connections(&request.nodes, &request.connections)
            .into_iter()
            .map(|(conn, from, to)| {
                let (start, end) = anchor_points(from.bounds(), to.bounds());
                let control = control_point(start, end);
                ConnectorGeometry {
                    from: conn.from,
                    to: conn.to,
                    start,
                    end,
                    control,
                    path: PathData::curve(start, &[control], end).to_string(),
                }
            })
            .collect();
    let dropped = request.connections.len() - connectors.len();
    if dropped > 0 {
        log::debug!("connectors: omitted {dropped} connection(s) with missing endpoints");
    }
    ConnectorResponse { connectors }
}

/// Sample the requested curve at `segments + 1` evenly spaced parameters.
pub fn tessellate(request: &BezierRequest) -> BezierResponse {
    let segments = request.sample_segments();
    let controls = &request.control_points[..];
    let points = (0..=segments)
        .map(|i| {
            let t = f64::from(i) / f64::from(segments);
            evaluate_bezier(request.start, controls, request.end, t)
        })
        .collect();
    BezierResponse {
        points,
        path: PathData::curve(request.start, controls, request.end).to_string(),
    }
}
