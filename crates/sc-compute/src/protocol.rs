//! Wire protocol between the interactive thread and the background worker.
//!
//! Outbound: `{kind, payload, id}`. Inbound: `{kind: "<kind>_RESULT",
//! payload, id}` or `{kind: "<kind>_ERROR", payload: {error}, id}`.
//! Frames cross the thread boundary as MessagePack (named fields), so each
//! task carries a full snapshot of its inputs.

use sc_core::{Connection, Node, NodeId, Point};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smallvec::SmallVec;
use std::fmt;
use thiserror::Error;

pub const RESULT_SUFFIX: &str = "_RESULT";
pub const ERROR_SUFFIX: &str = "_ERROR";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("failed to encode frame: {0}")]
    Encode(String),
    #[error("failed to decode frame: {0}")]
    Decode(String),
    #[error("unknown task kind `{0}`")]
    UnknownKind(String),
    #[error("bad payload for {kind}: {message}")]
    Payload { kind: TaskKind, message: String },
}

// ─── Task kinds ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    CalculateLayout,
    CalculateBezier,
    CalculateSmartConnectors,
}

impl TaskKind {
    pub const ALL: [TaskKind; 3] = [
        TaskKind::CalculateLayout,
        TaskKind::CalculateBezier,
        TaskKind::CalculateSmartConnectors,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::CalculateLayout => "CALCULATE_LAYOUT",
            TaskKind::CalculateBezier => "CALCULATE_BEZIER",
            TaskKind::CalculateSmartConnectors => "CALCULATE_SMART_CONNECTORS",
        }
    }

    pub fn parse(kind: &str) -> Result<Self, ProtocolError> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == kind)
            .ok_or_else(|| ProtocolError::UnknownKind(kind.to_string()))
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Envelope ────────────────────────────────────────────────────────────

/// A request or response frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub kind: String,
    pub payload: Value,
    pub id: String,
}

/// How a response frame resolved its task.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Result(Value),
    Error(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct ErrorPayload {
    error: String,
}

impl Envelope {
    pub fn request(kind: &str, payload: Value, id: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            payload,
            id: id.into(),
        }
    }

    pub fn result(kind: &str, payload: Value, id: impl Into<String>) -> Self {
        Self {
            kind: format!("{kind}{RESULT_SUFFIX}"),
            payload,
            id: id.into(),
        }
    }

    pub fn error(kind: &str, message: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: format!("{kind}{ERROR_SUFFIX}"),
            payload: serde_json::json!({ "error": message.into() }),
            id: id.into(),
        }
    }

    /// Classify a response frame. Returns the base kind and the reply, or
    /// `None` if the frame is not a response.
    pub fn reply(self) -> Option<(String, Reply)> {
        if let Some(base) = self.kind.strip_suffix(RESULT_SUFFIX) {
            return Some((base.to_string(), Reply::Result(self.payload)));
        }
        if let Some(base) = self.kind.strip_suffix(ERROR_SUFFIX) {
            let message = serde_json::from_value::<ErrorPayload>(self.payload)
                .map(|p| p.error)
                .unwrap_or_else(|_| "unspecified worker error".to_string());
            return Some((base.to_string(), Reply::Error(message)));
        }
        None
    }

    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        rmp_serde::to_vec_named(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        rmp_serde::from_slice(bytes).map_err(|e| ProtocolError::Decode(e.to_string()))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

// ─── Payloads ────────────────────────────────────────────────────────────

fn default_extent() -> f64 {
    2_000.0
}

/// `CALCULATE_LAYOUT` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRequest {
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default = "default_extent")]
    pub width: f64,
    #[serde(default = "default_extent")]
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u32>,
}

/// Position of a node in a node's connection neighborhood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Root,
    Leaf,
    Branch,
}

/// Final top-left position of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePosition {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<NodeType>,
}

/// `CALCULATE_LAYOUT` result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutResponse {
    pub positions: Vec<NodePosition>,
}

fn default_segments() -> u32 {
    20
}

/// `CALCULATE_BEZIER` request: a curve with zero, one, or two controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BezierRequest {
    pub start: Point,
    pub end: Point,
    #[serde(default)]
    pub control_points: SmallVec<[Point; 2]>,
    #[serde(default = "default_segments")]
    pub segments: u32,
}

impl BezierRequest {
    /// Upper bound on sampled segments per curve.
    pub const MAX_SEGMENTS: u32 = 10_000;

    /// Requested segment count, clamped to `1..=MAX_SEGMENTS`.
    pub fn sample_segments(&self) -> u32 {
        self.segments.clamp(1, Self::MAX_SEGMENTS)
    }
}

/// `CALCULATE_BEZIER` result: sampled polyline plus path descriptor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BezierResponse {
    pub points: Vec<Point>,
    pub path: String,
}

/// `CALCULATE_SMART_CONNECTORS` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorRequest {
    pub nodes: Vec<Node>,
    pub connections: Vec<Connection>,
}

/// Geometry for one routed connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorGeometry {
    pub from: NodeId,
    pub to: NodeId,
    pub start: Point,
    pub end: Point,
    pub control: Point,
    pub path: String,
}

/// `CALCULATE_SMART_CONNECTORS` result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConnectorResponse {
    pub connectors: Vec<ConnectorGeometry>,
}
