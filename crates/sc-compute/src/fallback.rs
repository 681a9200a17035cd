//! Local, synchronous, lower-quality substitutes for each task kind.
//!
//! These run on the interactive thread when the worker is unavailable, a
//! task times out, or the worker reports an error. They must stay cheap.

use crate::protocol::{
    BezierRequest, BezierResponse, ConnectorGeometry, ConnectorRequest, ConnectorResponse,
    LayoutRequest, LayoutResponse, NodePosition,
};
use sc_core::geometry::evaluate_bezier;
use sc_core::{PathData, resolve_connections};

const GRID_GAP: f64 = 40.0;
const GRID_MARGIN: f64 = 50.0;

/// Row-major grid in input order, `ceil(sqrt(n))` columns, uniform cells
/// sized to the largest node.
pub fn grid_layout(request: &LayoutRequest) -> LayoutResponse {
    let n = request.nodes.len();
    if n == 0 {
        return LayoutResponse::default();
    }
    let cols = (n as f64).sqrt().ceil() as usize;
    let cell_w = request.nodes.iter().map(|n| n.width).fold(0.0, f64::max) + GRID_GAP;
    let cell_h = request.nodes.iter().map(|n| n.height).fold(0.0, f64::max) + GRID_GAP;

    let positions = request
        .nodes
        .iter()
        .enumerate()
        .map(|(i, node)| NodePosition {
            id: node.id,
            x: GRID_MARGIN + (i % cols) as f64 * cell_w,
            y: GRID_MARGIN + (i / cols) as f64 * cell_h,
            cluster: None,
            node_type: None,
        })
        .collect();
    LayoutResponse { positions }
}

/// The straight segment from start to end, sampled like the real curve.
pub fn straight_curve(request: &BezierRequest) -> BezierResponse {
    let segments = request.sample_segments();
    let points = (0..=segments)
        .map(|i| {
            let t = f64::from(i) / f64::from(segments);
            evaluate_bezier(request.start, &[], request.end, t)
        })
        .collect();
    BezierResponse {
        points,
        path: PathData::curve(request.start, &[], request.end).to_string(),
    }
}

/// Center-to-center lines for every resolvable connection.
pub fn center_lines(request: &ConnectorRequest) -> ConnectorResponse {
    let connectors = resolve_connections(&request.nodes, &request.connections)
        .into_iter()
        .map(|(conn, from, to)| {
            let start = from.center();
            let end = to.center();
            ConnectorGeometry {
                from: conn.from,
                to: conn.to,
                start,
                end,
                control: start.midpoint(end),
                path: PathData::curve(start, &[], end).to_string(),
            }
        })
        .collect();
    ConnectorResponse { connectors }
}
