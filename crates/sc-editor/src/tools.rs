//! Tool system for canvas interactions.
//!
//! A tool translates pointer events into `ToolEffect`s; the canvas applies
//! them to its node snapshot and forwards them to the host.
//!
//! ## Modifier behaviors
//!
//! | Modifier | Click | Drag |
//! |----------|-------|------|
//! | **Shift / Ctrl / ⌘** | Toggle node in selection | Shift: axis-constrain |

use crate::hit::hit_test_rect;
use crate::input::{InputEvent, PointerButton};
use crate::viewport::ViewportController;
use sc_core::geometry::snap_point;
use sc_core::{Node, NodeId, Point, Rect};
use smallvec::{SmallVec, smallvec};

/// What a tool wants to happen.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolEffect {
    /// Replace the selection with one node.
    Select(NodeId),
    /// A node joined (`additive`) or left the selection.
    MultiSelect { id: NodeId, additive: bool },
    /// Move a node's top-left corner to a world position.
    Move { id: NodeId, x: f64, y: f64 },
    BackgroundInteraction,
}

pub type Effects = SmallVec<[ToolEffect; 4]>;

/// Read-only scene state a tool may consult.
pub struct ToolContext<'a> {
    pub nodes: &'a [Node],
    pub viewport: &'a ViewportController,
    /// Base grid size when drags snap to the grid.
    pub snap_grid: Option<f64>,
}

impl ToolContext<'_> {
    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    fn scale(&self) -> f64 {
        self.viewport.camera().scale
    }
}

/// Trait for tools that handle input and produce effects.
pub trait Tool {
    /// Handle an event. `hit` is the topmost node under the pointer.
    fn handle(&mut self, event: &InputEvent, hit: Option<NodeId>, ctx: &ToolContext<'_>) -> Effects;
}

// ─── Select Tool ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Drag {
    /// Pointer position at drag start, surface pixels.
    start: Point,
    /// Top-left of every dragged node at drag start.
    origins: SmallVec<[(NodeId, Point); 4]>,
}

/// Rubber-band selection, in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marquee {
    pub start: Point,
    pub current: Point,
}

impl Marquee {
    pub fn rect(&self) -> Rect {
        Rect::from_points(self.start, self.current)
    }
}

#[derive(Debug, Default)]
pub struct SelectTool {
    selected: SmallVec<[NodeId; 4]>,
    drag: Option<Drag>,
    marquee: Option<Marquee>,
}

impl SelectTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> &[NodeId] {
        &self.selected
    }

    pub fn is_selected(&self, id: NodeId) -> bool {
        self.selected.contains(&id)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn marquee(&self) -> Option<Marquee> {
        self.marquee
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Drop selected ids that no longer exist in `nodes`.
    pub fn retain_existing(&mut self, nodes: &[Node]) {
        self.selected.retain(|id| nodes.iter().any(|n| n.id == *id));
        self.drag = None;
    }

    /// Abandon any drag or marquee in progress. Selection is kept.
    pub fn cancel_gesture(&mut self) {
        let had_drag = self.drag.take().is_some();
        let had_marquee = self.marquee.take().is_some();
        if had_drag || had_marquee {
            log::trace!("select: gesture cancelled");
        }
    }

    fn begin_drag(&mut self, at: Point, ctx: &ToolContext<'_>) {
        let origins: SmallVec<[(NodeId, Point); 4]> = self
            .selected
            .iter()
            .filter_map(|id| ctx.node(*id).map(|n| (*id, Point::new(n.x, n.y))))
            .collect();
        self.drag = (!origins.is_empty()).then_some(Drag { start: at, origins });
    }

    fn pointer_down(&mut self, at: Point, hit: Option<NodeId>, additive: bool, ctx: &ToolContext<'_>) -> Effects {
        self.drag = None;
        self.marquee = None;

        let Some(id) = hit else {
            if !additive {
                self.selected.clear();
            }
            let world = ctx.viewport.surface_to_world(at);
            self.marquee = Some(Marquee {
                start: world,
                current: world,
            });
            return smallvec![ToolEffect::BackgroundInteraction];
        };

        let effects = if additive {
            let added = match self.selected.iter().position(|s| *s == id) {
                Some(pos) => {
                    self.selected.remove(pos);
                    false
                }
                None => {
                    self.selected.push(id);
                    true
                }
            };
            smallvec![ToolEffect::MultiSelect { id, additive: added }]
        } else if !self.selected.contains(&id) {
            self.selected = smallvec![id];
            smallvec![ToolEffect::Select(id)]
        } else {
            // Already selected: keep the group for dragging.
            Effects::new()
        };

        if self.selected.contains(&id) {
            self.begin_drag(at, ctx);
        }
        effects
    }

    fn drag_to(&self, drag: &Drag, at: Point, constrain: bool, ctx: &ToolContext<'_>) -> Effects {
        let scale = ctx.scale();
        let mut delta = (at - drag.start) / scale;
        if constrain {
            if delta.x.abs() > delta.y.abs() {
                delta.y = 0.0;
            } else {
                delta.x = 0.0;
            }
        }

        drag.origins
            .iter()
            .filter_map(|(id, origin)| {
                let mut target = *origin + delta;
                if let Some(grid) = ctx.snap_grid {
                    target = snap_point(target, scale, grid);
                }
                let node = ctx.node(*id)?;
                (node.x != target.x || node.y != target.y).then_some(ToolEffect::Move {
                    id: *id,
                    x: target.x,
                    y: target.y,
                })
            })
            .collect()
    }

    fn finish_marquee(&mut self, marquee: Marquee, ctx: &ToolContext<'_>) -> Effects {
        let rect = marquee.rect();
        if rect.area() <= 0.0 {
            return Effects::new();
        }
        let mut effects = Effects::new();
        for id in hit_test_rect(ctx.nodes, rect) {
            if !self.selected.contains(&id) {
                self.selected.push(id);
                effects.push(ToolEffect::MultiSelect { id, additive: true });
            }
        }
        log::debug!("select: marquee picked {} node(s)", effects.len());
        effects
    }
}

impl Tool for SelectTool {
    fn handle(&mut self, event: &InputEvent, hit: Option<NodeId>, ctx: &ToolContext<'_>) -> Effects {
        match event {
            InputEvent::PointerDown {
                x,
                y,
                button: PointerButton::Primary,
                modifiers,
            } => self.pointer_down(Point::new(*x, *y), hit, modifiers.additive(), ctx),
            InputEvent::PointerMove { x, y, modifiers } => {
                let at = Point::new(*x, *y);
                if let Some(marquee) = self.marquee.as_mut() {
                    marquee.current = ctx.viewport.surface_to_world(at);
                    return Effects::new();
                }
                match &self.drag {
                    Some(drag) => self.drag_to(drag, at, modifiers.shift, ctx),
                    None => Effects::new(),
                }
            }
            InputEvent::PointerUp {
                button: PointerButton::Primary,
                ..
            } => {
                self.drag = None;
                match self.marquee.take() {
                    Some(marquee) => self.finish_marquee(marquee, ctx),
                    None => Effects::new(),
                }
            }
            InputEvent::PointerLeave { buttons_held: false } => {
                self.drag = None;
                self.marquee = None;
                Effects::new()
            }
            _ => Effects::new(),
        }
    }
}
