//! Eased camera transitions for keyboard and programmatic view changes.

use sc_core::CameraState;

/// Default length of an animated view change, in seconds.
pub const DEFAULT_DURATION: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    #[default]
    EaseInOut,
}

impl Easing {
    /// Map linear progress `t ∈ [0, 1]` onto the curve.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
        }
    }
}

/// Interpolates pan and scale from one camera to another.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraAnimation {
    from: CameraState,
    to: CameraState,
    duration: f64,
    elapsed: f64,
    easing: Easing,
}

impl CameraAnimation {
    pub fn new(from: CameraState, to: CameraState, duration: f64, easing: Easing) -> Self {
        Self {
            from,
            to,
            duration: duration.max(0.0),
            elapsed: 0.0,
            easing,
        }
    }

    pub fn target(&self) -> CameraState {
        self.to
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Step forward by `dt` seconds and return the camera for the new time.
    pub fn advance(&mut self, dt: f64) -> CameraState {
        if dt.is_finite() && dt > 0.0 {
            self.elapsed = (self.elapsed + dt).min(self.duration);
        }
        self.sample()
    }

    pub fn sample(&self) -> CameraState {
        if self.is_finished() {
            return self.to;
        }
        let k = self.easing.apply(self.elapsed / self.duration);
        CameraState {
            pan: self.from.pan.lerp(self.to.pan, k),
            scale: self.from.scale + (self.to.scale - self.from.scale) * k,
        }
    }
}
