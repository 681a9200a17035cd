//! Host callback surface.
//!
//! The canvas never owns the authoritative scene; it reports intent back to
//! the host, which applies it to its own model.

use sc_core::{NodeId, NodeUpdate};

/// Callbacks the canvas fires. All are optional no-ops by default.
pub trait CanvasHost {
    /// A node moved or was resized.
    fn on_update_item(&mut self, _id: NodeId, _update: NodeUpdate) {}

    /// A single node was selected, replacing the selection.
    fn on_select_item(&mut self, _id: NodeId) {}

    /// A node joined (`additive == true`) or left the selection.
    fn on_multi_select_item(&mut self, _id: NodeId, _additive: bool) {}

    /// Pointer pressed on empty canvas.
    fn on_canvas_background_interaction(&mut self) {}
}

/// A host that ignores everything.
impl CanvasHost for () {}

/// A recorded callback, for hosts that queue events.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    UpdateItem { id: NodeId, update: NodeUpdate },
    SelectItem(NodeId),
    MultiSelectItem { id: NodeId, additive: bool },
    BackgroundInteraction,
}

/// Queue every callback in order.
impl CanvasHost for Vec<HostEvent> {
    fn on_update_item(&mut self, id: NodeId, update: NodeUpdate) {
        self.push(HostEvent::UpdateItem { id, update });
    }

    fn on_select_item(&mut self, id: NodeId) {
        self.push(HostEvent::SelectItem(id));
    }

    fn on_multi_select_item(&mut self, id: NodeId, additive: bool) {
        self.push(HostEvent::MultiSelectItem { id, additive });
    }

    fn on_canvas_background_interaction(&mut self) {
        self.push(HostEvent::BackgroundInteraction);
    }
}
