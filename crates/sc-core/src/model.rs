//! Canvas data model.
//!
//! Nodes and connections are created and destroyed by the caller; the core
//! only reads them and relocates nodes (drag, auto-arrange). Position and
//! size belong to whichever component last committed an update.
//!
//! Coordinate frames used throughout the workspace:
//!
//! - **surface**: host pixels, origin at the surface top-left.
//! - **view**: surface pixels relative to the surface center.
//! - **world**: canvas units. `view = pan + world * scale`.

use crate::id::NodeId;
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

// ─── Errors ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("node {id} has non-positive size {width}x{height}")]
    NonPositiveSize { id: NodeId, width: f64, height: f64 },
    #[error("node {id} has a non-finite coordinate")]
    NonFinite { id: NodeId },
}

// ─── Node kinds ──────────────────────────────────────────────────────────

/// The closed set of node shapes the canvas knows about.
///
/// Shape matters to the core only for hit testing; everything else
/// (layout, culling, anchoring) works on the bounding rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    #[default]
    Rect,
    Ellipse,
    Diamond,
    /// Sticky note.
    Note,
    Image,
    /// Visible grouping container.
    Frame,
}

// ─── Node ────────────────────────────────────────────────────────────────

/// A discrete visual item on the canvas. `(x, y)` is the top-left corner
/// in world units. Any caller payload stays with the caller, keyed by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    #[serde(default)]
    pub kind: NodeKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub z_index: i32,
}

impl Node {
    /// Create a node, rejecting non-positive sizes and non-finite coordinates.
    pub fn new(
        id: NodeId,
        kind: NodeKind,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<Self, ModelError> {
        let node = Self {
            id,
            kind,
            x,
            y,
            width,
            height,
            z_index: 0,
        };
        node.validate()?;
        Ok(node)
    }

    #[must_use]
    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    /// Check the `width, height > 0` invariant (deserialized nodes skip `new`).
    pub fn validate(&self) -> Result<(), ModelError> {
        if ![self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(ModelError::NonFinite { id: self.id });
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(ModelError::NonPositiveSize {
                id: self.id,
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// World-space bounding rectangle.
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Apply the fields present in `update`.
    pub fn apply(&mut self, update: &NodeUpdate) {
        if let Some(x) = update.x {
            self.x = x;
        }
        if let Some(y) = update.y {
            self.y = y;
        }
        if let Some(w) = update.width {
            self.width = w;
        }
        if let Some(h) = update.height {
            self.height = h;
        }
    }
}

/// Partial node fields delivered through `on_update_item`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl NodeUpdate {
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.width.is_none() && self.height.is_none()
    }
}

// ─── Connections ─────────────────────────────────────────────────────────

/// A directional link between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    #[serde(alias = "fromNodeId")]
    pub from: NodeId,
    #[serde(alias = "toNodeId")]
    pub to: NodeId,
}

impl Connection {
    pub fn new(from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Pair each connection with its endpoint nodes.
///
/// Connections naming a node that is not in `nodes` are dropped: partial
/// graphs are a normal transient state during incremental edits.
pub fn resolve_connections<'a>(
    nodes: &'a [Node],
    connections: &'a [Connection],
) -> Vec<(&'a Connection, &'a Node, &'a Node)> {
    let index: HashMap<NodeId, &Node> = nodes.iter().map(|n| (n.id, n)).collect();
    connections
        .iter()
        .filter_map(|c| {
            let from = index.get(&c.from)?;
            let to = index.get(&c.to)?;
            Some((c, *from, *to))
        })
        .collect()
}

// ─── Camera & world ──────────────────────────────────────────────────────

/// Pan offset (view pixels) and uniform scale of the camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraState {
    pub pan: Vec2,
    pub scale: f64,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl CameraState {
    pub fn new(pan_x: f64, pan_y: f64, scale: f64) -> Self {
        Self {
            pan: Vec2::new(pan_x, pan_y),
            scale,
        }
    }
}

/// Fixed outer limit of the world. Independent of content.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self::symmetric(10_000.0)
    }
}

impl WorldBounds {
    /// Bounds spanning `±half_extent` on both axes.
    pub fn symmetric(half_extent: f64) -> Self {
        Self {
            min_x: -half_extent,
            min_y: -half_extent,
            max_x: half_extent,
            max_y: half_extent,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.min_x, self.min_y, self.max_x, self.max_y)
    }

    pub fn extent(&self) -> Size {
        Size::new(self.max_x - self.min_x, self.max_y - self.min_y)
    }

    pub fn center(&self) -> Point {
        self.rect().center()
    }
}

/// Pixel dimensions of the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub width: f64,
    pub height: f64,
}

impl Default for Surface {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

impl Surface {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Convert a surface point (top-left origin) into view coordinates.
    pub fn to_view(&self, p: Point) -> Point {
        Point::new(p.x - self.width / 2.0, p.y - self.height / 2.0)
    }

    /// Convert a view point back to surface coordinates.
    pub fn to_surface(&self, p: Point) -> Point {
        Point::new(p.x + self.width / 2.0, p.y + self.height / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn node_rejects_non_positive_size() {
        let err = Node::new(NodeId::intern("bad"), NodeKind::Rect, 0.0, 0.0, 0.0, 10.0);
        assert!(matches!(err, Err(ModelError::NonPositiveSize { .. })));
        let err = Node::new(NodeId::intern("nan"), NodeKind::Rect, f64::NAN, 0.0, 5.0, 10.0);
        assert!(matches!(err, Err(ModelError::NonFinite { .. })));
    }

    #[test]
    fn node_deserializes_from_host_json() {
        let node: Node = serde_json::from_str(
            r#"{"id":"n1","kind":"ellipse","x":10,"y":20,"width":30,"height":40,"zIndex":3}"#,
        )
        .unwrap();
        assert_eq!(node.id, NodeId::intern("n1"));
        assert_eq!(node.kind, NodeKind::Ellipse);
        assert_eq!(node.z_index, 3);
        assert_eq!(node.center(), Point::new(25.0, 40.0));
    }

    #[test]
    fn connection_accepts_long_field_names() {
        let c: Connection = serde_json::from_str(r#"{"fromNodeId":"a","toNodeId":"b"}"#).unwrap();
        assert_eq!(c, Connection::new("a", "b"));
    }

    #[test]
    fn resolve_drops_dangling_connections() {
        let nodes = vec![
            Node::new("a".into(), NodeKind::Rect, 0.0, 0.0, 10.0, 10.0).unwrap(),
            Node::new("b".into(), NodeKind::Rect, 50.0, 0.0, 10.0, 10.0).unwrap(),
        ];
        let conns = vec![
            Connection::new("a", "b"),
            Connection::new("a", "ghost"),
            Connection::new("ghost", "b"),
        ];
        let resolved = resolve_connections(&nodes, &conns);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].1.id, NodeId::intern("a"));
        assert_eq!(resolved[0].2.id, NodeId::intern("b"));
    }

    #[test]
    fn update_applies_only_present_fields() {
        let mut node = Node::new("u".into(), NodeKind::Note, 1.0, 2.0, 3.0, 4.0).unwrap();
        node.apply(&NodeUpdate::position(9.0, 8.0));
        assert_eq!((node.x, node.y, node.width, node.height), (9.0, 8.0, 3.0, 4.0));
        assert!(NodeUpdate::default().is_empty());
    }

    #[test]
    fn surface_view_conversion_roundtrips() {
        let s = Surface::new(800.0, 600.0);
        let p = Point::new(10.0, 590.0);
        assert_eq!(s.to_view(p), Point::new(-390.0, 290.0));
        assert_eq!(s.to_surface(s.to_view(p)), p);
    }
}
