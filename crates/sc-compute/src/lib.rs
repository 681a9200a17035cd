//! SC background computation: force-directed layout, connector routing,
//! curve tessellation, and the bridge that runs them off the interactive
//! thread with local fallbacks.

pub mod bridge;
pub mod connector;
pub mod error;
pub mod fallback;
pub mod layout;
pub mod protocol;
pub mod strategy;
pub mod worker;

pub use bridge::{BridgeStats, BridgeStatus, ComputationBridge, Deferred};
pub use error::TaskError;
pub use protocol::{
    BezierRequest, BezierResponse, ConnectorGeometry, ConnectorRequest, ConnectorResponse,
    Envelope, LayoutRequest, LayoutResponse, NodePosition, NodeType, ProtocolError, TaskKind,
};
pub use strategy::{ComputeTask, Resolved, Source};
pub use worker::{GraphCompute, TaskHandler};
