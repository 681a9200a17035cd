//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. Zoom keys
//! work bare or with Ctrl/⌘, since `+` needs Shift on most layouts.

use crate::input::Modifiers;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    ZoomIn,
    ZoomOut,
    ResetView,
    ZoomToFit,
    /// Space: hold to pan with the primary button.
    PanModifier,
    PanLeft,
    PanRight,
    PanUp,
    PanDown,
}

/// Resolves key events into shortcut actions.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the host key value (e.g. `"+"`, `"ArrowUp"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        let zoom = match key {
            "=" | "+" => Some(ShortcutAction::ZoomIn),
            "-" | "_" => Some(ShortcutAction::ZoomOut),
            "0" => Some(ShortcutAction::ResetView),
            "1" => Some(ShortcutAction::ZoomToFit),
            _ => None,
        };
        if zoom.is_some() || modifiers.command() {
            return zoom;
        }

        match key {
            " " => Some(ShortcutAction::PanModifier),
            "ArrowLeft" => Some(ShortcutAction::PanLeft),
            "ArrowRight" => Some(ShortcutAction::PanRight),
            "ArrowUp" => Some(ShortcutAction::PanUp),
            "ArrowDown" => Some(ShortcutAction::PanDown),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CMD: Modifiers = Modifiers {
        meta: true,
        ..Modifiers::NONE
    };
    const CTRL: Modifiers = Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    };

    #[test]
    fn resolve_zoom() {
        assert_eq!(
            ShortcutMap::resolve("=", Modifiers::NONE),
            Some(ShortcutAction::ZoomIn)
        );
        assert_eq!(
            ShortcutMap::resolve("+", Modifiers::SHIFT),
            Some(ShortcutAction::ZoomIn)
        );
        assert_eq!(ShortcutMap::resolve("-", CMD), Some(ShortcutAction::ZoomOut));
        assert_eq!(
            ShortcutMap::resolve("0", CTRL),
            Some(ShortcutAction::ResetView)
        );
        assert_eq!(
            ShortcutMap::resolve("1", Modifiers::NONE),
            Some(ShortcutAction::ZoomToFit)
        );
    }

    #[test]
    fn resolve_pan_keys() {
        assert_eq!(
            ShortcutMap::resolve(" ", Modifiers::NONE),
            Some(ShortcutAction::PanModifier)
        );
        assert_eq!(
            ShortcutMap::resolve("ArrowLeft", Modifiers::SHIFT),
            Some(ShortcutAction::PanLeft)
        );
        assert_eq!(
            ShortcutMap::resolve("ArrowDown", Modifiers::NONE),
            Some(ShortcutAction::PanDown)
        );
    }

    #[test]
    fn resolve_modifier_precedence() {
        // Command combos only bind the zoom keys.
        assert_eq!(ShortcutMap::resolve("ArrowLeft", CMD), None);
        assert_eq!(ShortcutMap::resolve(" ", CTRL), None);
    }

    #[test]
    fn resolve_unknown_key() {
        assert_eq!(ShortcutMap::resolve("q", Modifiers::NONE), None);
        assert_eq!(ShortcutMap::resolve("7", Modifiers::NONE), None);
    }
}
