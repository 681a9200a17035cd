//! Tunable canvas constants.
//!
//! Hosts usually deserialize this from JSON (camelCase keys); every field
//! has a default so partial documents are accepted.

use crate::model::WorldBounds;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("zoom limits inverted or non-positive: min={min} max={max}")]
    ZoomLimits { min: f64, max: f64 },
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("world bounds are empty")]
    EmptyWorld,
    #[error("invalid config JSON: {0}")]
    Json(String),
}

/// Allowed camera scale range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomLimits {
    pub min: f64,
    pub max: f64,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self { min: 0.25, max: 5.0 }
    }
}

impl ZoomLimits {
    /// Clamp `scale` into the limits. Never panics: inverted limits resolve
    /// to `max`, and NaN bounds are ignored.
    pub fn clamp(&self, scale: f64) -> f64 {
        scale.max(self.min).min(self.max)
    }
}

/// Configuration for the viewport, culling, and computation subsystems.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CanvasConfig {
    pub zoom_limits: ZoomLimits,
    /// Grid spacing at scale 1.0; the effective spacing is `grid_base_size / scale`.
    pub grid_base_size: f64,
    pub world_bounds: WorldBounds,
    /// World units added on every side of the visible rectangle before culling.
    pub viewport_padding: f64,
    pub layout_iterations: u32,
    pub task_timeout_ms: u64,
    /// Screen pixels from a world edge at which the near-boundary flag is raised.
    pub boundary_margin: f64,
    /// Relative scale change per wheel notch.
    pub zoom_step: f64,
    /// Relative scale change per wheel notch while the precision modifier is held.
    pub precision_zoom_step: f64,
    /// Snap dragged nodes to the grid.
    pub snap_to_grid: bool,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            zoom_limits: ZoomLimits::default(),
            grid_base_size: 20.0,
            world_bounds: WorldBounds::default(),
            viewport_padding: 200.0,
            layout_iterations: 150,
            task_timeout_ms: 10_000,
            boundary_margin: 100.0,
            zoom_step: 0.1,
            precision_zoom_step: 0.02,
            snap_to_grid: false,
        }
    }
}

impl CanvasConfig {
    /// Parse and validate a JSON config document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| ConfigError::Json(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn task_timeout(&self) -> Duration {
        Duration::from_millis(self.task_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ZoomLimits { min, max } = self.zoom_limits;
        if !(min > 0.0 && min <= max) {
            return Err(ConfigError::ZoomLimits { min, max });
        }
        let positives = [
            ("gridBaseSize", self.grid_base_size),
            ("zoomStep", self.zoom_step),
            ("precisionZoomStep", self.precision_zoom_step),
            ("taskTimeoutMs", self.task_timeout_ms as f64),
            ("layoutIterations", f64::from(self.layout_iterations)),
        ];
        for (field, value) in positives {
            if value <= 0.0 {
                return Err(ConfigError::NotPositive { field, value });
            }
        }
        if self.viewport_padding < 0.0 {
            return Err(ConfigError::NotPositive {
                field: "viewportPadding",
                value: self.viewport_padding,
            });
        }
        let extent = self.world_bounds.extent();
        if extent.width <= 0.0 || extent.height <= 0.0 {
            return Err(ConfigError::EmptyWorld);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn zoom_clamp_tolerates_bad_limits() {
        let inverted = ZoomLimits { min: 4.0, max: 0.5 };
        assert_eq!(inverted.clamp(1.0), 0.5);
        let nan = ZoomLimits { min: f64::NAN, max: 2.0 };
        assert_eq!(nan.clamp(1.5), 1.5);
        assert_eq!(nan.clamp(3.0), 2.0);
        assert_eq!(ZoomLimits::default().clamp(1.0), 1.0);
    }

    #[test]
    fn defaults_are_valid() {
        let config = CanvasConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.task_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config =
            CanvasConfig::from_json(r#"{"zoomLimits":{"min":0.5,"max":2.0},"taskTimeoutMs":250}"#)
                .unwrap();
        assert_eq!(config.zoom_limits, ZoomLimits { min: 0.5, max: 2.0 });
        assert_eq!(config.task_timeout_ms, 250);
        assert_eq!(config.layout_iterations, 150);
        assert_eq!(config.world_bounds, WorldBounds::symmetric(10_000.0));
    }

    #[test]
    fn inverted_limits_rejected() {
        let err = CanvasConfig::from_json(r#"{"zoomLimits":{"min":3.0,"max":2.0}}"#);
        assert_eq!(err, Err(ConfigError::ZoomLimits { min: 3.0, max: 2.0 }));
    }

    #[test]
    fn zero_grid_rejected() {
        let config = CanvasConfig {
            grid_base_size: 0.0,
            ..CanvasConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive {
                field: "gridBaseSize",
                ..
            })
        ));
    }

    #[test]
    fn malformed_json_reports_error() {
        assert!(matches!(
            CanvasConfig::from_json("{not json"),
            Err(ConfigError::Json(_))
        ));
    }
}
