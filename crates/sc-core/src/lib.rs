//! SC (Spatial Canvas) core: data model, geometry kernel, configuration,
//! visible-set culling, and path descriptors.

pub mod config;
pub mod cull;
pub mod geometry;
pub mod id;
pub mod model;
pub mod path;

pub use config::{CanvasConfig, ConfigError, ZoomLimits};
pub use cull::{CullResult, CullStats, cull};
pub use id::NodeId;
pub use model::*;
pub use path::{PathCmd, PathData, PathParseError};

// Re-export kurbo primitives so downstream crates share one geometry vocabulary.
pub use kurbo::{Affine, Point, Rect, Size, Vec2};
