//! Controller classification
//!
//! Decides which device kind wraps a controller and, for gamepads, which
//! layout table interprets its buttons. Classification is best-effort: the
//! backend only reports which components exist, so a controller the
//! heuristics cannot place ends up on [`GamepadLayout::Generic`].

use crate::backend::{Axis, ControllerInfo, ControllerKind, Identifier};
use crate::device::DeviceKind;
use crate::mapping::gamepad::DIRECT_INPUT;
use crate::mapping::GamepadLayout;

pub trait LayoutClassifier: Send + Sync {
    /// Device kind for a controller, `None` to skip it.
    fn device_kind(&self, info: &ControllerInfo) -> Option<DeviceKind> {
        match info.kind {
            ControllerKind::Gamepad | ControllerKind::Stick => Some(DeviceKind::Gamepad),
            ControllerKind::Pointer => Some(DeviceKind::Pointer),
            ControllerKind::Keyboard => Some(DeviceKind::Keyboard),
            ControllerKind::Other => None,
        }
    }

    fn layout(&self, info: &ControllerInfo) -> GamepadLayout;
}

/// Component-inventory heuristics
///
/// ```text
/// X Y Z RX RY RZ present ──► XInput (navigation if POV + _8 + _9)
/// > 10 DirectInput buttons or named aliases ──► DirectInput
/// anything else ──► Generic
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicClassifier;

const XINPUT_AXES: [Axis; 6] = [Axis::X, Axis::Y, Axis::Z, Axis::RX, Axis::RY, Axis::RZ];

impl LayoutClassifier for HeuristicClassifier {
    fn layout(&self, info: &ControllerInfo) -> GamepadLayout {
        if XINPUT_AXES.iter().all(|axis| info.has_axis(*axis)) {
            let navigation = info.has_axis(Axis::Pov)
                && info.has(Identifier::Button(8))
                && info.has(Identifier::Button(9));
            return GamepadLayout::XInput { navigation };
        }

        let mapped = info
            .components
            .iter()
            .filter(|id| DIRECT_INPUT.contains(**id))
            .count();
        let named = info
            .components
            .iter()
            .any(|id| matches!(id, Identifier::Named(_)) && DIRECT_INPUT.contains(*id));

        if mapped > 10 || named {
            GamepadLayout::DirectInput
        } else {
            GamepadLayout::Generic
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NamedButton;

    fn info(kind: ControllerKind, components: Vec<Identifier>) -> ControllerInfo {
        ControllerInfo::new("pad", kind, components)
    }

    fn buttons(count: u8) -> impl Iterator<Item = Identifier> {
        (0..count).map(Identifier::Button)
    }

    #[test]
    fn six_axes_make_an_xinput_pad() {
        let mut components: Vec<Identifier> = XINPUT_AXES.iter().copied().map(Identifier::Axis).collect();
        components.extend(buttons(10));
        components.push(Identifier::Axis(Axis::Pov));

        let layout = HeuristicClassifier.layout(&info(ControllerKind::Gamepad, components.clone()));
        assert_eq!(layout, GamepadLayout::XInput { navigation: true });

        components.retain(|id| *id != Identifier::Axis(Axis::Pov));
        let layout = HeuristicClassifier.layout(&info(ControllerKind::Gamepad, components));
        assert_eq!(layout, GamepadLayout::XInput { navigation: false });
    }

    #[test]
    fn many_buttons_make_a_direct_input_pad() {
        let mut components = vec![Identifier::Axis(Axis::X), Identifier::Axis(Axis::Y)];
        components.extend(buttons(13));
        let layout = HeuristicClassifier.layout(&info(ControllerKind::Gamepad, components));
        assert_eq!(layout, GamepadLayout::DirectInput);
    }

    #[test]
    fn named_aliases_make_a_direct_input_pad() {
        let components = vec![
            Identifier::Named(NamedButton::A),
            Identifier::Named(NamedButton::B),
        ];
        let layout = HeuristicClassifier.layout(&info(ControllerKind::Gamepad, components));
        assert_eq!(layout, GamepadLayout::DirectInput);
    }

    #[test]
    fn small_pads_fall_back_to_generic() {
        let layout = HeuristicClassifier.layout(&info(ControllerKind::Stick, buttons(10).collect()));
        assert_eq!(layout, GamepadLayout::Generic);

        let layout = HeuristicClassifier.layout(&info(ControllerKind::Stick, Vec::new()));
        assert_eq!(layout, GamepadLayout::Generic);
    }

    #[test]
    fn device_kinds_follow_controller_kind() {
        let classify = |kind| HeuristicClassifier.device_kind(&info(kind, Vec::new()));
        assert_eq!(classify(ControllerKind::Gamepad), Some(DeviceKind::Gamepad));
        assert_eq!(classify(ControllerKind::Stick), Some(DeviceKind::Gamepad));
        assert_eq!(classify(ControllerKind::Pointer), Some(DeviceKind::Pointer));
        assert_eq!(classify(ControllerKind::Keyboard), Some(DeviceKind::Keyboard));
        assert_eq!(classify(ControllerKind::Other), None);
    }
}
