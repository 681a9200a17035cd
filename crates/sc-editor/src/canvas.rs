//! `SpatialCanvas`: the host-facing facade.
//!
//! Holds a snapshot of the host's nodes and connections, the viewport, the
//! select tool, and a computation bridge. Input is routed viewport-first;
//! whatever the viewport does not consume goes to the tool. Background
//! results are collected on `tick`, never awaited.

use crate::host::CanvasHost;
use crate::hit::hit_test;
use crate::input::InputEvent;
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::tools::{SelectTool, Tool, ToolContext, ToolEffect};
use crate::viewport::ViewportController;
use sc_compute::{
    BezierRequest, BezierResponse, BridgeStats, ComputationBridge, ConnectorGeometry,
    ConnectorRequest, ConnectorResponse, Deferred, LayoutRequest, LayoutResponse, Resolved,
};
use sc_core::{
    CanvasConfig, ConfigError, Connection, CullResult, Node, NodeId, NodeUpdate, Rect, Surface,
    Vec2, cull,
};

/// Surface pixels moved per arrow-key press.
const NUDGE_STEP: f64 = 50.0;

pub struct SpatialCanvas<H: CanvasHost> {
    config: CanvasConfig,
    nodes: Vec<Node>,
    connections: Vec<Connection>,
    viewport: ViewportController,
    tool: SelectTool,
    bridge: ComputationBridge,
    host: H,
    /// Pending layout and the world offset its positions are relative to.
    pending_layout: Option<(Deferred<Resolved<LayoutResponse>>, Vec2)>,
    pending_connectors: Option<Deferred<Resolved<ConnectorResponse>>>,
    connectors: Vec<ConnectorGeometry>,
}

impl<H: CanvasHost> SpatialCanvas<H> {
    /// Validate `config` and start a background worker.
    pub fn new(config: CanvasConfig, surface: Surface, host: H) -> Result<Self, ConfigError> {
        config.validate()?;
        let bridge = ComputationBridge::from_config(&config);
        Ok(Self::with_bridge(config, surface, host, bridge))
    }

    /// Use an existing bridge (e.g. an unavailable one, or a custom handler).
    pub fn with_bridge(
        config: CanvasConfig,
        surface: Surface,
        host: H,
        bridge: ComputationBridge,
    ) -> Self {
        let viewport = ViewportController::new(&config, surface);
        Self {
            config,
            nodes: Vec::new(),
            connections: Vec::new(),
            viewport,
            tool: SelectTool::new(),
            bridge,
            host,
            pending_layout: None,
            pending_connectors: None,
            connectors: Vec::new(),
        }
    }

    // ─── Scene ───────────────────────────────────────────────────────────

    /// Replace the scene snapshot. Invalid nodes are skipped with a warning.
    pub fn set_scene(&mut self, nodes: Vec<Node>, connections: Vec<Connection>) {
        let total = nodes.len();
        self.nodes = nodes
            .into_iter()
            .filter(|n| match n.validate() {
                Ok(()) => true,
                Err(e) => {
                    log::warn!("canvas: skipping node: {e}");
                    false
                }
            })
            .collect();
        if self.nodes.len() < total {
            log::debug!("canvas: kept {} of {total} nodes", self.nodes.len());
        }
        self.connections = connections;
        self.tool.retain_existing(&self.nodes);
        self.connectors.clear();
        if self.has_pending_work() {
            log::debug!("canvas: scene replaced, dropping pending background results");
        }
        self.pending_layout = None;
        self.pending_connectors = None;
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Routed connector geometry from the last completed request.
    pub fn connectors(&self) -> &[ConnectorGeometry] {
        &self.connectors
    }

    pub fn selection(&self) -> &[NodeId] {
        self.tool.selected()
    }

    pub fn tool(&self) -> &SelectTool {
        &self.tool
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut ViewportController {
        &mut self.viewport
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn bridge_stats(&self) -> BridgeStats {
        self.bridge.stats()
    }

    pub fn bridge(&self) -> &ComputationBridge {
        &self.bridge
    }

    /// Nodes intersecting the padded viewport, for drawing.
    pub fn visible_nodes(&self) -> CullResult<'_> {
        cull(
            &self.nodes,
            &self.viewport.camera(),
            self.viewport.surface(),
            self.config.viewport_padding,
        )
    }

    pub fn resize(&mut self, surface: Surface) {
        self.viewport.resize(surface);
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Feed a host input event. Returns whether the canvas needs a redraw.
    pub fn handle_event(&mut self, event: &InputEvent) -> bool {
        if let InputEvent::KeyDown { key, modifiers } = event
            && let Some(action) = ShortcutMap::resolve(key, *modifiers)
        {
            return self.run_shortcut(action, event);
        }
        if self.viewport.handle_event(event) {
            if matches!(
                event,
                InputEvent::PointerDown { .. }
                    | InputEvent::PointerUp { .. }
                    | InputEvent::PointerLeave { .. }
            ) {
                self.tool.cancel_gesture();
            }
            return true;
        }
        if self.viewport.is_panning() {
            return false;
        }

        let hit = event
            .position()
            .and_then(|p| hit_test(&self.nodes, self.viewport.surface_to_world(p)));
        let ctx = ToolContext {
            nodes: &self.nodes,
            viewport: &self.viewport,
            snap_grid: self.config.snap_to_grid.then_some(self.config.grid_base_size),
        };
        let effects = self.tool.handle(event, hit, &ctx);
        let changed = !effects.is_empty() || self.tool.marquee().is_some();
        for effect in effects {
            self.apply(effect);
        }
        changed
    }

    /// Whether the host should suppress its native context menu. The
    /// secondary button pans, so the menu is always suppressed.
    pub fn handle_context_menu(&self) -> bool {
        true
    }

    fn run_shortcut(&mut self, action: ShortcutAction, event: &InputEvent) -> bool {
        log::trace!("canvas: shortcut {action:?}");
        match action {
            ShortcutAction::ZoomIn => self.viewport.zoom_in(),
            ShortcutAction::ZoomOut => self.viewport.zoom_out(),
            ShortcutAction::ResetView => self.viewport.reset_view(),
            ShortcutAction::ZoomToFit => self.zoom_to_fit(),
            ShortcutAction::PanModifier => return self.viewport.handle_event(event),
            ShortcutAction::PanLeft => self.viewport.pan_by(Vec2::new(NUDGE_STEP, 0.0)),
            ShortcutAction::PanRight => self.viewport.pan_by(Vec2::new(-NUDGE_STEP, 0.0)),
            ShortcutAction::PanUp => self.viewport.pan_by(Vec2::new(0.0, NUDGE_STEP)),
            ShortcutAction::PanDown => self.viewport.pan_by(Vec2::new(0.0, -NUDGE_STEP)),
        }
        true
    }

    /// Fit all nodes into view, or reset when there are none.
    pub fn zoom_to_fit(&mut self) {
        let mut bounds = self.nodes.iter().map(Node::bounds);
        match bounds.next() {
            Some(first) => {
                let all = bounds.fold(first, |acc, b| acc.union(b));
                self.viewport.zoom_to_fit(all);
            }
            None => self.viewport.reset_view(),
        }
    }

    fn apply(&mut self, effect: ToolEffect) {
        match effect {
            ToolEffect::Select(id) => self.host.on_select_item(id),
            ToolEffect::MultiSelect { id, additive } => {
                self.host.on_multi_select_item(id, additive)
            }
            ToolEffect::Move { id, x, y } => self.update_node(id, NodeUpdate::position(x, y)),
            ToolEffect::BackgroundInteraction => self.host.on_canvas_background_interaction(),
        }
    }

    fn update_node(&mut self, id: NodeId, update: NodeUpdate) {
        let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) else {
            log::debug!("canvas: update for unknown node {id}");
            return;
        };
        node.apply(&update);
        self.host.on_update_item(id, update);
    }

    // ─── Background computations ─────────────────────────────────────────

    /// Lay out the whole scene into the currently visible region, grown
    /// around its center to at least the content's minimum extent so deep
    /// zoom cannot squeeze nodes together. Replaces any layout in flight.
    pub fn request_auto_arrange(&mut self) {
        let visible: Rect = sc_core::geometry::visible_world_rect(
            &self.viewport.camera(),
            self.viewport.surface(),
        );
        let floor = sc_compute::layout::min_extent(&self.nodes);
        let region = Rect::from_center_size(
            visible.center(),
            (visible.width().max(floor), visible.height().max(floor)),
        );
        let request = LayoutRequest {
            nodes: self.nodes.clone(),
            connections: self.connections.clone(),
            width: region.width(),
            height: region.height(),
            iterations: Some(self.config.layout_iterations),
        };
        let deferred = self.bridge.submit(request);
        log::debug!(
            "canvas: auto-arrange requested as {} over {:.0}x{:.0}",
            deferred.id(),
            region.width(),
            region.height()
        );
        self.pending_layout = Some((deferred, region.origin().to_vec2()));
    }

    /// Route connectors for the current scene.
    pub fn request_connectors(&mut self) {
        let request = ConnectorRequest {
            nodes: self.nodes.clone(),
            connections: self.connections.clone(),
        };
        self.pending_connectors = Some(self.bridge.submit(request));
    }

    /// Tessellate an arbitrary curve. Poll the returned handle after `tick`.
    pub fn request_curve(&mut self, request: BezierRequest) -> Deferred<Resolved<BezierResponse>> {
        self.bridge.submit(request)
    }

    pub fn has_pending_work(&self) -> bool {
        self.pending_layout.is_some() || self.pending_connectors.is_some()
    }

    /// Advance animations by `dt` seconds and collect finished background
    /// work. Never blocks. Returns whether anything visible changed.
    pub fn tick(&mut self, dt: f64) -> bool {
        let mut changed = self.viewport.advance(dt);
        self.bridge.pump();

        if let Some((deferred, offset)) = self.pending_layout.as_mut()
            && let Some(resolved) = deferred.try_take()
        {
            let offset = *offset;
            self.pending_layout = None;
            self.apply_layout(resolved, offset);
            changed = true;
        }

        if let Some(deferred) = self.pending_connectors.as_mut()
            && let Some(resolved) = deferred.try_take()
        {
            self.pending_connectors = None;
            if resolved.is_fallback() {
                log::debug!("canvas: connectors from fallback routing");
            }
            self.connectors = resolved.into_value().connectors;
            changed = true;
        }
        changed
    }

    fn apply_layout(&mut self, resolved: Resolved<LayoutResponse>, offset: Vec2) {
        if resolved.is_fallback() {
            log::warn!("canvas: auto-arrange used the grid fallback");
        }
        let positions = resolved.into_value().positions;
        for pos in positions {
            self.update_node(pos.id, NodeUpdate::position(pos.x + offset.x, pos.y + offset.y));
        }
        if !self.connectors.is_empty() || self.pending_connectors.is_some() {
            self.request_connectors();
        }
    }
}

impl<H: CanvasHost> std::fmt::Debug for SpatialCanvas<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialCanvas")
            .field("nodes", &self.nodes.len())
            .field("connections", &self.connections.len())
            .field("camera", &self.viewport.camera())
            .field("bridge", &self.bridge)
            .finish()
    }
}
