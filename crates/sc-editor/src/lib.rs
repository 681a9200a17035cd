//! SC editor: viewport state machine, input tools, hit testing, and the
//! `SpatialCanvas` facade hosts talk to.

pub mod animation;
pub mod canvas;
pub mod hit;
pub mod host;
pub mod input;
pub mod shortcuts;
pub mod tools;
pub mod viewport;

pub use animation::{CameraAnimation, Easing};
pub use canvas::SpatialCanvas;
pub use host::{CanvasHost, HostEvent};
pub use input::{InputEvent, Modifiers, PointerButton};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use tools::{SelectTool, Tool, ToolEffect};
pub use viewport::{ViewportController, ViewportState};
