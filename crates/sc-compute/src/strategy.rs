//! Strategy pairs: every task kind has a primary computation (run on the
//! worker) and a local fallback (run on the caller's thread).
//!
//! The bridge never decides *how* to degrade; it asks the task.

use crate::connector::{smart_connectors, tessellate};
use crate::error::TaskError;
use crate::fallback::{center_lines, grid_layout, straight_curve};
use crate::layout::calculate_layout;
use crate::protocol::{
    BezierRequest, BezierResponse, ConnectorRequest, ConnectorResponse, LayoutRequest,
    LayoutResponse, TaskKind,
};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub trait ComputeTask: Serialize + Send + 'static {
    const KIND: TaskKind;
    type Output: Serialize + DeserializeOwned + Send + 'static;

    /// Full-quality computation. Runs on the background worker.
    fn primary(&self) -> Self::Output;

    /// Cheap local substitute.
    fn fallback(&self) -> Self::Output;
}

impl ComputeTask for LayoutRequest {
    const KIND: TaskKind = TaskKind::CalculateLayout;
    type Output = LayoutResponse;

    fn primary(&self) -> LayoutResponse {
        calculate_layout(self)
    }

    fn fallback(&self) -> LayoutResponse {
        grid_layout(self)
    }
}

impl ComputeTask for BezierRequest {
    const KIND: TaskKind = TaskKind::CalculateBezier;
    type Output = BezierResponse;

    fn primary(&self) -> BezierResponse {
        tessellate(self)
    }

    fn fallback(&self) -> BezierResponse {
        straight_curve(self)
    }
}

impl ComputeTask for ConnectorRequest {
    const KIND: TaskKind = TaskKind::CalculateSmartConnectors;
    type Output = ConnectorResponse;

    fn primary(&self) -> ConnectorResponse {
        smart_connectors(self)
    }

    fn fallback(&self) -> ConnectorResponse {
        center_lines(self)
    }
}

/// Which side of the strategy pair produced a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Primary,
    Fallback(TaskError),
}

/// A typed task result that always carries a value.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    pub source: Source,
}

impl<T> Resolved<T> {
    pub fn primary(value: T) -> Self {
        Self {
            value,
            source: Source::Primary,
        }
    }

    pub fn fallback(value: T, reason: TaskError) -> Self {
        Self {
            value,
            source: Source::Fallback(reason),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.source, Source::Fallback(_))
    }

    pub fn into_value(self) -> T {
        self.value
    }
}
