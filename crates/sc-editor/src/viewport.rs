//! Viewport controller: pan and zoom state machine.
//!
//! Owns the camera. Pointer positions arrive in surface pixels and are
//! converted to view coordinates (relative to the surface center) before
//! any camera math. Every camera change is followed by a pan clamp, so the
//! visible world rectangle never leaves the world bounds.

use crate::animation::{CameraAnimation, DEFAULT_DURATION, Easing};
use crate::input::{InputEvent, Modifiers, PointerButton};
use sc_core::geometry::{clamp_pan, near_boundary, screen_to_world, world_to_screen};
use sc_core::{CameraState, CanvasConfig, Point, Rect, Surface, Vec2, WorldBounds, ZoomLimits};

/// Margin kept around content by `zoom_to_fit`, in surface pixels.
const FIT_PADDING: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportState {
    Idle,
    /// `last` is the previous pointer position in surface pixels.
    Panning { last: Point },
}

#[derive(Debug, Clone)]
pub struct ViewportController {
    camera: CameraState,
    surface: Surface,
    world: WorldBounds,
    limits: ZoomLimits,
    zoom_step: f64,
    precision_zoom_step: f64,
    boundary_margin: f64,
    state: ViewportState,
    pan_modifier: bool,
    near_boundary: bool,
    animation: Option<CameraAnimation>,
    animate: bool,
}

impl ViewportController {
    pub fn new(config: &CanvasConfig, surface: Surface) -> Self {
        let mut viewport = Self {
            camera: CameraState::default(),
            surface,
            world: config.world_bounds,
            limits: config.zoom_limits,
            zoom_step: config.zoom_step,
            precision_zoom_step: config.precision_zoom_step,
            boundary_margin: config.boundary_margin,
            state: ViewportState::Idle,
            pan_modifier: false,
            near_boundary: false,
            animation: None,
            animate: true,
        };
        viewport.camera = viewport.clamped(viewport.camera);
        viewport
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn camera(&self) -> CameraState {
        self.camera
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    pub fn world(&self) -> WorldBounds {
        self.world
    }

    pub fn state(&self) -> ViewportState {
        self.state
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.state, ViewportState::Panning { .. })
    }

    /// Advisory: the pointer is close to the world edge.
    pub fn near_boundary(&self) -> bool {
        self.near_boundary
    }

    pub fn pan_modifier(&self) -> bool {
        self.pan_modifier
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// When disabled, view commands jump straight to their target.
    pub fn set_animations_enabled(&mut self, enabled: bool) {
        self.animate = enabled;
        if !enabled {
            self.finish_animation();
        }
    }

    // ─── Coordinate conversion ───────────────────────────────────────────

    pub fn surface_to_world(&self, p: Point) -> Point {
        screen_to_world(self.surface.to_view(p), &self.camera)
    }

    pub fn world_to_surface(&self, p: Point) -> Point {
        self.surface.to_surface(world_to_screen(p, &self.camera))
    }

    // ─── Direct manipulation ─────────────────────────────────────────────

    /// Replace the camera, clamping scale and pan.
    pub fn set_camera(&mut self, camera: CameraState) {
        self.animation = None;
        self.camera = self.clamped(camera);
    }

    pub fn set_pan_modifier(&mut self, held: bool) {
        self.pan_modifier = held;
    }

    /// New surface size. Pan is re-clamped for the new extent.
    pub fn resize(&mut self, surface: Surface) {
        if !(surface.width > 0.0 && surface.height > 0.0) {
            log::debug!("viewport: ignoring degenerate resize {surface:?}");
            return;
        }
        self.surface = surface;
        self.camera = self.clamped(self.camera);
        if let Some(anim) = &self.animation {
            let target = self.clamped(anim.target());
            self.animation = Some(CameraAnimation::new(
                self.camera,
                target,
                DEFAULT_DURATION,
                Easing::default(),
            ));
        }
    }

    /// Shift the camera by a surface-pixel delta.
    ///
    /// The delta is applied to `pan` as-is, not divided by scale.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.animation = None;
        let pan = self.camera.pan + delta;
        self.camera.pan = clamp_pan(pan, self.camera.scale, &self.world, self.surface);
    }

    /// Zoom to `target_scale` keeping the world point under `anchor`
    /// (surface pixels) fixed.
    pub fn zoom_at(&mut self, anchor: Point, target_scale: f64) {
        self.animation = None;
        self.camera = self.zoomed_about(self.camera, anchor, target_scale);
    }

    fn zoomed_about(&self, camera: CameraState, anchor: Point, target_scale: f64) -> CameraState {
        let old = camera.scale;
        let new = self.limits.clamp(target_scale);
        if !new.is_finite() || new == old {
            return camera;
        }
        let cursor = self.surface.to_view(anchor).to_vec2();
        let pan = camera.pan - (cursor - camera.pan) * ((new - old) / old);
        CameraState {
            pan: clamp_pan(pan, new, &self.world, self.surface),
            scale: new,
        }
    }

    // ─── Event handling ──────────────────────────────────────────────────

    /// Feed an input event. Returns `true` when the viewport consumed it.
    pub fn handle_event(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::PointerDown { x, y, button, .. } => {
                if !self.starts_pan(*button) {
                    return false;
                }
                self.animation = None;
                self.state = ViewportState::Panning {
                    last: Point::new(*x, *y),
                };
                log::trace!("viewport: pan start at ({x}, {y})");
                true
            }
            InputEvent::PointerMove { x, y, .. } => {
                let p = Point::new(*x, *y);
                self.update_near_boundary(p);
                let ViewportState::Panning { last } = self.state else {
                    return false;
                };
                self.pan_by(p - last);
                self.state = ViewportState::Panning { last: p };
                true
            }
            InputEvent::PointerUp { .. } => {
                if !self.is_panning() {
                    return false;
                }
                self.state = ViewportState::Idle;
                true
            }
            InputEvent::PointerLeave { buttons_held } => {
                if self.is_panning() && !buttons_held {
                    self.state = ViewportState::Idle;
                    return true;
                }
                false
            }
            InputEvent::Wheel {
                x,
                y,
                delta_y,
                modifiers,
            } => {
                self.wheel_zoom(Point::new(*x, *y), *delta_y, *modifiers);
                true
            }
            InputEvent::KeyDown { key, .. } if key == " " => {
                self.pan_modifier = true;
                true
            }
            InputEvent::KeyUp { key, .. } if key == " " => {
                self.pan_modifier = false;
                true
            }
            _ => false,
        }
    }

    fn starts_pan(&self, button: PointerButton) -> bool {
        match button {
            PointerButton::Primary => self.pan_modifier,
            PointerButton::Middle | PointerButton::Secondary => true,
        }
    }

    fn wheel_zoom(&mut self, at: Point, delta_y: f64, modifiers: Modifiers) {
        if delta_y == 0.0 || !delta_y.is_finite() {
            return;
        }
        let step = if modifiers.shift {
            self.precision_zoom_step
        } else {
            self.zoom_step
        };
        let factor = if delta_y < 0.0 { 1.0 + step } else { 1.0 - step };
        self.zoom_at(at, self.camera.scale * factor);
        self.update_near_boundary(at);
    }

    fn update_near_boundary(&mut self, surface_point: Point) {
        let world_point = self.surface_to_world(surface_point);
        let margin = self.boundary_margin / self.camera.scale;
        self.near_boundary = near_boundary(world_point, &self.world, margin);
    }

    // ─── Animated view commands ──────────────────────────────────────────

    pub fn zoom_in(&mut self) {
        self.zoom_by_step(1.0 + self.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_by_step(1.0 - self.zoom_step);
    }

    fn zoom_by_step(&mut self, factor: f64) {
        let from = self.target_camera();
        let target = self.zoomed_about(from, self.surface_center(), from.scale * factor);
        self.animate_to(target);
    }

    pub fn reset_view(&mut self) {
        self.animate_to(CameraState::default());
    }

    /// Fit a world rectangle into the surface, centered. A degenerate
    /// rectangle is centered at the current scale.
    pub fn zoom_to_fit(&mut self, rect: Rect) {
        let scale = if rect.width() > 0.0 && rect.height() > 0.0 {
            let sx = (self.surface.width - 2.0 * FIT_PADDING).max(1.0) / rect.width();
            let sy = (self.surface.height - 2.0 * FIT_PADDING).max(1.0) / rect.height();
            sx.min(sy)
        } else {
            self.target_camera().scale
        };
        let scale = self.limits.clamp(scale);
        let pan = -rect.center().to_vec2() * scale;
        self.animate_to(CameraState { pan, scale });
    }

    /// Start an eased transition (or jump, if animations are off).
    pub fn animate_to(&mut self, target: CameraState) {
        let target = self.clamped(target);
        if !self.animate {
            self.animation = None;
            self.camera = target;
            return;
        }
        self.animation = Some(CameraAnimation::new(
            self.camera,
            target,
            DEFAULT_DURATION,
            Easing::default(),
        ));
    }

    /// Step the running animation by `dt` seconds. Returns whether the
    /// camera changed.
    pub fn advance(&mut self, dt: f64) -> bool {
        let Some(anim) = self.animation.as_mut() else {
            return false;
        };
        let camera = anim.advance(dt);
        let finished = anim.is_finished();
        self.camera = self.clamped(camera);
        if finished {
            self.animation = None;
        }
        true
    }

    fn finish_animation(&mut self) {
        if let Some(anim) = self.animation.take() {
            self.camera = self.clamped(anim.target());
        }
    }

    /// Where the camera is heading: the animation target, or the camera itself.
    fn target_camera(&self) -> CameraState {
        self.animation
            .as_ref()
            .map(CameraAnimation::target)
            .unwrap_or(self.camera)
    }

    fn surface_center(&self) -> Point {
        Point::new(self.surface.width / 2.0, self.surface.height / 2.0)
    }

    fn clamped(&self, camera: CameraState) -> CameraState {
        let scale = if camera.scale.is_finite() && camera.scale > 0.0 {
            self.limits.clamp(camera.scale)
        } else {
            self.camera.scale
        };
        let pan = if camera.pan.is_finite() {
            camera.pan
        } else {
            self.camera.pan
        };
        CameraState {
            pan: clamp_pan(pan, scale, &self.world, self.surface),
            scale,
        }
    }
}
