//! Cluster-aware force-directed layout.
//!
//! Runs on the background worker. Each node gets a cluster key (the
//! smallest id among its direct neighbors, or its own id when isolated);
//! nodes in different clusters repel harder, nodes in the same cluster
//! are drawn toward their centroid and connected by shorter springs.
//!
//! The simulation is fully deterministic: iteration order follows the
//! input node order and there is no randomness, so identical requests
//! produce identical positions.

use crate::protocol::{LayoutRequest, LayoutResponse, NodePosition, NodeType};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use sc_core::{Node, NodeId, Point, Vec2};
use std::collections::HashMap;

pub const DEFAULT_ITERATIONS: u32 = 150;

/// Pull toward the canvas center, per unit of distance.
const CENTERING: f64 = 0.005;
const REPULSION: f64 = 60_000.0;
/// Repulsion multiplier for pairs in different clusters.
const CROSS_CLUSTER_REPULSION: f64 = 1.8;
/// Fraction of the distance to the cluster centroid applied per iteration.
const COHESION: f64 = 0.02;
const SPRING: f64 = 0.04;
const REST_LENGTH_SAME_CLUSTER: f64 = 180.0;
const REST_LENGTH_CROSS_CLUSTER: f64 = 320.0;
const DAMPING: f64 = 0.9;
/// Per-iteration displacement cap.
const MAX_STEP: f64 = 60.0;
const CANVAS_MARGIN: f64 = 50.0;
const MIN_DISTANCE: f64 = 1.0;
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Graph facts derived once per request.
#[derive(Debug, Clone)]
pub struct ClusterAssignment {
    /// Cluster key per node, in input order.
    pub keys: Vec<NodeId>,
    /// Dense cluster slot per node, in input order.
    pub slots: Vec<usize>,
    pub slot_count: usize,
    pub node_types: Vec<NodeType>,
    /// Resolved connections as `(from, to)` input indices, self-loops removed.
    pub edges: Vec<(usize, usize)>,
}

impl ClusterAssignment {
    pub fn compute(request: &LayoutRequest) -> Self {
        let nodes = &request.nodes;
        let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(nodes.len(), request.connections.len());
        let indices: Vec<NodeIndex> = (0..nodes.len()).map(|i| graph.add_node(i)).collect();
        let by_id: HashMap<NodeId, usize> = nodes.iter().enumerate().map(|(i, n)| (n.id, i)).collect();

        let mut edges = Vec::with_capacity(request.connections.len());
        for conn in &request.connections {
            let (Some(&a), Some(&b)) = (by_id.get(&conn.from), by_id.get(&conn.to)) else {
                log::trace!("layout: dropping connection {} -> {}", conn.from, conn.to);
                continue;
            };
            if a == b {
                continue;
            }
            graph.add_edge(indices[a], indices[b], ());
            edges.push((a, b));
        }

        let keys: Vec<NodeId> = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| {
                graph
                    .neighbors_undirected(indices[i])
                    .map(|nb| nodes[graph[nb]].id)
                    .min()
                    .unwrap_or(node.id)
            })
            .collect();

        let node_types = indices
            .iter()
            .map(|&ix| {
                let has_in = graph.neighbors_directed(ix, Direction::Incoming).next().is_some();
                let has_out = graph.neighbors_directed(ix, Direction::Outgoing).next().is_some();
                match (has_in, has_out) {
                    (false, true) => NodeType::Root,
                    (true, false) => NodeType::Leaf,
                    _ => NodeType::Branch,
                }
            })
            .collect();

        let mut slot_of: HashMap<NodeId, usize> = HashMap::new();
        let slots: Vec<usize> = keys
            .iter()
            .map(|key| {
                let next = slot_of.len();
                *slot_of.entry(*key).or_insert(next)
            })
            .collect();

        Self {
            keys,
            slots,
            slot_count: slot_of.len(),
            node_types,
            edges,
        }
    }
}

/// Smallest square side that seats `nodes` in a `ceil(sqrt(n))` grid with
/// same-cluster spacing between cells and the margin on both sides.
pub fn min_extent(nodes: &[Node]) -> f64 {
    if nodes.is_empty() {
        return 0.0;
    }
    let cols = (nodes.len() as f64).sqrt().ceil();
    let largest = nodes
        .iter()
        .map(|n| n.width.max(n.height))
        .fold(0.0, f64::max);
    cols * (largest + REST_LENGTH_SAME_CLUSTER) + 2.0 * CANVAS_MARGIN
}

/// Run the simulation and return final top-left positions in input order.
pub fn calculate_layout(request: &LayoutRequest) -> LayoutResponse {
    let nodes = &request.nodes;
    let n = nodes.len();
    if n == 0 {
        return LayoutResponse::default();
    }

    let clusters = ClusterAssignment::compute(request);
    let iterations = request.iterations.unwrap_or(DEFAULT_ITERATIONS);
    let center = Point::new(request.width / 2.0, request.height / 2.0);

    let half: Vec<Vec2> = nodes
        .iter()
        .map(|n| Vec2::new(n.width / 2.0, n.height / 2.0))
        .collect();
    let mut pos: Vec<Point> = nodes.iter().map(|n| n.center()).collect();
    let mut vel = vec![Vec2::ZERO; n];
    let mut forces = vec![Vec2::ZERO; n];
    let mut centroid_sum = vec![Vec2::ZERO; clusters.slot_count];
    let mut cluster_size = vec![0usize; clusters.slot_count];

    log::debug!(
        "layout: {n} nodes, {} edges, {} clusters, {iterations} iterations",
        clusters.edges.len(),
        clusters.slot_count
    );

    for _ in 0..iterations {
        forces.fill(Vec2::ZERO);

        // (a) centering
        for (f, p) in forces.iter_mut().zip(&pos) {
            *f += (center - *p) * CENTERING;
        }

        // (b) pairwise repulsion, stronger across clusters
        for i in 0..n {
            for j in (i + 1)..n {
                let mut delta = pos[i] - pos[j];
                let mut dist = delta.hypot();
                if dist < MIN_DISTANCE {
                    let angle = (i * n + j) as f64 * GOLDEN_ANGLE;
                    delta = Vec2::new(angle.cos(), angle.sin()) * MIN_DISTANCE;
                    dist = MIN_DISTANCE;
                }
                let mut strength = REPULSION / (dist * dist);
                if clusters.slots[i] != clusters.slots[j] {
                    strength *= CROSS_CLUSTER_REPULSION;
                }
                let f = delta * (strength / dist);
                forces[i] += f;
                forces[j] -= f;
            }
        }

        // (c) cluster cohesion
        centroid_sum.fill(Vec2::ZERO);
        cluster_size.fill(0);
        for (p, &slot) in pos.iter().zip(&clusters.slots) {
            centroid_sum[slot] += p.to_vec2();
            cluster_size[slot] += 1;
        }
        for i in 0..n {
            let slot = clusters.slots[i];
            if cluster_size[slot] > 1 {
                let centroid = (centroid_sum[slot] / cluster_size[slot] as f64).to_point();
                forces[i] += (centroid - pos[i]) * COHESION;
            }
        }

        // (d) springs along connections
        for &(a, b) in &clusters.edges {
            let delta = pos[b] - pos[a];
            let dist = delta.hypot().max(MIN_DISTANCE);
            let rest = if clusters.slots[a] == clusters.slots[b] {
                REST_LENGTH_SAME_CLUSTER
            } else {
                REST_LENGTH_CROSS_CLUSTER
            };
            let f = delta * ((dist - rest) * SPRING / dist);
            forces[a] += f;
            forces[b] -= f;
        }

        for i in 0..n {
            let mut v = (vel[i] + forces[i]) * DAMPING;
            let speed = v.hypot();
            if speed > MAX_STEP {
                v = v * (MAX_STEP / speed);
            }
            vel[i] = v;
            pos[i] = clamp_center(pos[i] + v, half[i], request.width, request.height);
        }
    }

    let positions = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| NodePosition {
            id: node.id,
            x: pos[i].x - half[i].x,
            y: pos[i].y - half[i].y,
            cluster: Some(clusters.keys[i]),
            node_type: Some(clusters.node_types[i]),
        })
        .collect();
    LayoutResponse { positions }
}

/// Keep the node's rectangle within the margin-bounded canvas. Nodes larger
/// than the usable area are pinned to the top-left margin.
fn clamp_center(center: Point, half: Vec2, width: f64, height: f64) -> Point {
    let clamp_axis = |c: f64, h: f64, extent: f64| {
        let lo = CANVAS_MARGIN + h;
        let hi = extent - CANVAS_MARGIN - h;
        if hi < lo { lo } else { c.clamp(lo, hi) }
    };
    Point::new(
        clamp_axis(center.x, half.x, width),
        clamp_axis(center.y, half.y, height),
    )
}
