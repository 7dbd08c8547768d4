//! Gamepad translation
//!
//! Raw samples are routed by the device's [`GamepadLayout`]:
//!
//! ```text
//! Axis::Pov            ──► quantize_pov ──► POV release/press
//! stick axis           ──► dead zone ──► (flip y) ──► quantize_stick ──► stick push
//! trigger axis (XInput)──► trigger push + synthetic L2/R2 at 1.0 / 0.0
//! button identifier    ──► layout table ──► edge detection ──► press/release
//! ```
//!
//! State changes happen under the state lock. Listeners and the cursor
//! collaborator are called after the lock is released.

use super::{device_lifecycle, CursorEmulation, DeviceCore, DeviceError, DeviceKind, Driver};
use crate::backend::{Axis, ControllerHandle, Identifier, RawEvent};
use crate::direction::{apply_dead_zone, quantize_pov, quantize_stick, Direction, MAX_DEAD_ZONE};
use crate::event::{
    ButtonEvent, DeviceFault, DeviceId, EventSource, PovEvent, StickEvent, TriggerEvent,
};
use crate::listener::{GamepadListener, ListenerSet};
use crate::mapping::{ButtonState, GamepadButton, GamepadLayout, MouseButton, Stick, Trigger};
use crate::output::CursorControl;
use crate::sync::{lock, read, write};
use chrono::Local;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, trace, warn};

pub const DEFAULT_DEAD_ZONE: f32 = 0.1;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct StickPosition {
    x: f32,
    y: f32,
}

fn stick_index(stick: Stick) -> usize {
    match stick {
        Stick::Left => 0,
        Stick::Right => 1,
    }
}

fn trigger_index(trigger: Trigger) -> usize {
    match trigger {
        Trigger::Left => 0,
        Trigger::Right => 1,
    }
}

#[derive(Debug)]
struct GamepadState {
    buttons: ButtonState,
    pov: Option<Direction>,
    sticks: [StickPosition; 2],
    triggers: [f32; 2],
    dead_zone: f32,
    cursor: CursorEmulation,
}

/// Outcome of one raw sample, replayed to listeners after unlocking.
#[derive(Debug, Clone, PartialEq)]
enum Notification {
    ButtonPress(GamepadButton),
    ButtonRelease(GamepadButton),
    PovPress(Direction),
    PovRelease(Direction),
    StickPush {
        stick: Stick,
        direction: Option<Direction>,
        intensity: f32,
        x: f32,
        y: f32,
    },
    TriggerPush(Trigger, f32),
    MousePress(MouseButton),
    MouseRelease(MouseButton),
}

pub(crate) struct GamepadShared {
    layout: GamepadLayout,
    state: Mutex<GamepadState>,
    listeners: ListenerSet<dyn GamepadListener>,
    cursor_control: RwLock<Option<Arc<dyn CursorControl>>>,
}

impl GamepadShared {
    fn new(layout: GamepadLayout, dead_zone: f32) -> Self {
        Self {
            layout,
            state: Mutex::new(GamepadState {
                buttons: ButtonState::for_table(layout.buttons()),
                pov: None,
                sticks: [StickPosition::default(); 2],
                triggers: [0.0; 2],
                dead_zone: clamp_dead_zone(dead_zone),
                cursor: CursorEmulation::default(),
            }),
            listeners: ListenerSet::new(),
            cursor_control: RwLock::new(None),
        }
    }

    fn translate(&self, event: RawEvent) -> Vec<Notification> {
        let mut state = lock(&self.state);
        let mut notes = Vec::new();

        match event.id {
            Identifier::Axis(Axis::Pov) => Self::pov(&mut state, event.value, &mut notes),
            Identifier::Axis(axis) => {
                if let Some(trigger) = self.layout.trigger_for_axis(axis) {
                    Self::trigger(&mut state, trigger, event.value, &mut notes);
                } else if let Some((stick, is_y)) = self.layout.stick_for_axis(axis) {
                    self.stick(&mut state, stick, is_y, event.value, &mut notes);
                } else {
                    trace!("Ignoring axis {:?} on {} layout", axis, self.layout);
                }
            }
            id => match self.layout.buttons().lookup(id) {
                Some(button) => Self::button(&mut state, button, event.value, &mut notes),
                None => trace!("Ignoring unmapped {:?} on {} layout", id, self.layout),
            },
        }

        notes
    }

    fn button(state: &mut GamepadState, button: GamepadButton, value: f32, notes: &mut Vec<Notification>) {
        let mouse = state
            .cursor
            .enabled
            .then(|| state.cursor.mouse_button_for(button))
            .flatten();

        if value >= 1.0 {
            if !state.buttons.set(button, true) {
                debug!("Button {} pressed", button);
                notes.push(Notification::ButtonPress(button));
                notes.extend(mouse.map(Notification::MousePress));
            }
        } else if value <= 0.0 && state.buttons.set(button, false) {
            debug!("Button {} released", button);
            notes.push(Notification::ButtonRelease(button));
            notes.extend(mouse.map(Notification::MouseRelease));
        }
    }

    fn pov(state: &mut GamepadState, value: f32, notes: &mut Vec<Notification>) {
        let next = quantize_pov(value);
        if next == state.pov {
            return;
        }

        debug!("POV {:?} -> {:?}", state.pov, next);
        notes.extend(state.pov.map(Notification::PovRelease));
        notes.extend(next.map(Notification::PovPress));
        state.pov = next;
    }

    fn stick(
        &self,
        state: &mut GamepadState,
        stick: Stick,
        is_y: bool,
        value: f32,
        notes: &mut Vec<Notification>,
    ) {
        let raw = if is_y && self.layout.y_axis_up() { -value } else { value };
        let filtered = apply_dead_zone(raw, state.dead_zone);

        let position = &mut state.sticks[stick_index(stick)];
        if is_y {
            position.y = filtered;
        } else {
            position.x = filtered;
        }

        // Direction is suppressed by the unfiltered sample only.
        let (x, y) = (position.x, position.y);
        let (direction, intensity) = quantize_stick(raw, x, y);
        if intensity > state.dead_zone {
            trace!("{:?} stick ({:.3}, {:.3}) {:?} {:.3}", stick, x, y, direction, intensity);
            notes.push(Notification::StickPush {
                stick,
                direction,
                intensity,
                x,
                y,
            });
        }
    }

    fn trigger(state: &mut GamepadState, trigger: Trigger, value: f32, notes: &mut Vec<Notification>) {
        state.triggers[trigger_index(trigger)] = value;
        notes.push(Notification::TriggerPush(trigger, value));
        Self::button(state, trigger.button(), value, notes);
    }

    fn dispatch(&self, source: &EventSource, notes: Vec<Notification>) {
        if notes.is_empty() {
            return;
        }

        let timestamp = Local::now();
        let cursor = read(&self.cursor_control).clone();

        for note in notes {
            match note {
                Notification::ButtonPress(button) => {
                    let event = ButtonEvent {
                        source: source.clone(),
                        button,
                        timestamp,
                    };
                    self.listeners.for_each(|l| l.on_button_press(&event));
                }
                Notification::ButtonRelease(button) => {
                    let event = ButtonEvent {
                        source: source.clone(),
                        button,
                        timestamp,
                    };
                    self.listeners.for_each(|l| l.on_button_release(&event));
                }
                Notification::PovPress(direction) => {
                    let event = PovEvent {
                        source: source.clone(),
                        direction,
                        timestamp,
                    };
                    self.listeners.for_each(|l| l.on_pov_press(&event));
                }
                Notification::PovRelease(direction) => {
                    let event = PovEvent {
                        source: source.clone(),
                        direction,
                        timestamp,
                    };
                    self.listeners.for_each(|l| l.on_pov_release(&event));
                }
                Notification::StickPush {
                    stick,
                    direction,
                    intensity,
                    x,
                    y,
                } => {
                    let event = StickEvent {
                        source: source.clone(),
                        stick,
                        direction,
                        intensity,
                        x,
                        y,
                        timestamp,
                    };
                    self.listeners.for_each(|l| l.on_analog_stick_push(&event));
                }
                Notification::TriggerPush(trigger, value) => {
                    let event = TriggerEvent {
                        source: source.clone(),
                        trigger,
                        value,
                        timestamp,
                    };
                    self.listeners.for_each(|l| l.on_trigger_push(&event));
                }
                Notification::MousePress(button) => {
                    if let Some(cursor) = &cursor {
                        cursor.press_button(button);
                    }
                }
                Notification::MouseRelease(button) => {
                    if let Some(cursor) = &cursor {
                        cursor.release_button(button);
                    }
                }
            }
        }
    }
}

impl Driver for GamepadShared {
    fn on_event(&self, source: &EventSource, event: RawEvent) {
        let notes = self.translate(event);
        self.dispatch(source, notes);
    }

    fn on_tick(&self, _source: &EventSource) {
        let step = {
            let state = lock(&self.state);
            let position = state.sticks[stick_index(state.cursor.stick)];
            state.cursor.step(position.x, position.y)
        };

        if let Some((dx, dy)) = step {
            if let Some(cursor) = read(&self.cursor_control).as_ref() {
                cursor.move_by(dx, dy);
            }
        }
    }

    fn dispatch_removed(&self, source: &EventSource) {
        self.listeners.for_each(|l| l.on_remove(source));
    }

    fn dispatch_fault(&self, fault: &DeviceFault) {
        self.listeners.for_each(|l| l.on_fault(fault));
    }
}

fn clamp_dead_zone(value: f32) -> f32 {
    if value.is_nan() {
        warn!("NaN dead zone replaced with {}", DEFAULT_DEAD_ZONE);
        return DEFAULT_DEAD_ZONE;
    }
    value.clamp(0.0, MAX_DEAD_ZONE)
}

/// Gamepad, joystick or other stick-and-buttons controller.
#[derive(Clone)]
pub struct Gamepad {
    core: Arc<DeviceCore>,
    shared: Arc<GamepadShared>,
}

device_lifecycle!(Gamepad);

impl Gamepad {
    pub(crate) fn new(
        id: DeviceId,
        handle: Arc<dyn ControllerHandle>,
        layout: GamepadLayout,
        dead_zone: f32,
    ) -> Self {
        Self {
            core: Arc::new(DeviceCore::new(id, DeviceKind::Gamepad, handle)),
            shared: Arc::new(GamepadShared::new(layout, dead_zone)),
        }
    }

    pub fn layout(&self) -> GamepadLayout {
        self.shared.layout
    }

    pub fn add_listener(&self, listener: Arc<dyn GamepadListener>) {
        self.shared.listeners.add(listener);
    }

    pub fn remove_listener(&self, listener: &Arc<dyn GamepadListener>) -> bool {
        self.shared.listeners.remove(listener)
    }

    pub fn listener(&self, index: usize) -> Option<Arc<dyn GamepadListener>> {
        self.shared.listeners.get(index)
    }

    pub fn listener_count(&self) -> usize {
        self.shared.listeners.len()
    }

    /// Controls on this controller that the layout recognizes as buttons.
    pub fn button_count(&self) -> usize {
        let table = self.shared.layout.buttons();
        self.core
            .handle()
            .info()
            .components
            .iter()
            .filter(|id| table.contains(**id))
            .count()
    }

    pub fn is_button_down(&self, button: GamepadButton) -> bool {
        lock(&self.shared.state).buttons.is_down(button)
    }

    pub fn pov_direction(&self) -> Option<Direction> {
        lock(&self.shared.state).pov
    }

    /// Filtered `(x, y)` of a stick, y growing downwards.
    pub fn stick_position(&self, stick: Stick) -> (f32, f32) {
        let position = lock(&self.shared.state).sticks[stick_index(stick)];
        (position.x, position.y)
    }

    pub fn trigger_value(&self, trigger: Trigger) -> f32 {
        lock(&self.shared.state).triggers[trigger_index(trigger)]
    }

    pub fn dead_zone(&self) -> f32 {
        lock(&self.shared.state).dead_zone
    }

    /// Clamped to `0.0..=MAX_DEAD_ZONE`.
    pub fn set_dead_zone(&self, dead_zone: f32) {
        let dead_zone = clamp_dead_zone(dead_zone);
        lock(&self.shared.state).dead_zone = dead_zone;
        debug!("Dead zone of {} set to {}", self.source(), dead_zone);
    }

    pub fn can_rumble(&self) -> bool {
        self.core.handle().rumbler_count() > 0
    }

    pub fn rumbler_count(&self) -> usize {
        self.core.handle().rumbler_count()
    }

    /// Drives every actuator with `intensity`, clamped to `0.0..=1.0`.
    /// Without actuators this does nothing.
    pub fn rumble(&self, intensity: f32) -> Result<(), DeviceError> {
        if !self.can_rumble() {
            debug!("{} has no rumblers", self.source());
            return Ok(());
        }
        let intensity = if intensity.is_nan() { 0.0 } else { intensity.clamp(0.0, 1.0) };
        self.core.handle().rumble(intensity)?;
        Ok(())
    }

    pub fn set_cursor_control(&self, control: Option<Arc<dyn CursorControl>>) {
        *write(&self.shared.cursor_control) = control;
    }

    pub fn cursor_emulation(&self) -> CursorEmulation {
        lock(&self.shared.state).cursor.clone()
    }

    pub fn set_cursor_emulation(&self, emulation: CursorEmulation) {
        lock(&self.shared.state).cursor = emulation;
    }

    pub fn set_cursor_emulation_enabled(&self, enabled: bool) {
        lock(&self.shared.state).cursor.enabled = enabled;
    }

    pub fn set_cursor_stick(&self, stick: Stick) {
        lock(&self.shared.state).cursor.stick = stick;
    }

    pub fn set_cursor_sensitivity(&self, sensitivity: f32) {
        lock(&self.shared.state).cursor.sensitivity = sensitivity;
    }

    pub fn set_cursor_button(&self, mouse: MouseButton, button: Option<GamepadButton>) {
        lock(&self.shared.state).cursor.set_button(mouse, button);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NamedButton;
    use super::Notification::*;

    fn feed(shared: &GamepadShared, id: Identifier, value: f32) -> Vec<Notification> {
        shared.translate(RawEvent::new(id, value))
    }

    fn pov(shared: &GamepadShared, value: f32) -> Vec<Notification> {
        feed(shared, Identifier::Axis(Axis::Pov), value)
    }

    #[test]
    fn button_edges_fire_once() {
        let pad = GamepadShared::new(GamepadLayout::DirectInput, DEFAULT_DEAD_ZONE);
        let start = Identifier::Button(9);

        assert_eq!(feed(&pad, start, 1.0), vec![ButtonPress(GamepadButton::Start)]);
        assert_eq!(feed(&pad, start, 1.0), vec![]);
        assert_eq!(feed(&pad, start, 0.5), vec![]);
        assert_eq!(feed(&pad, start, 0.0), vec![ButtonRelease(GamepadButton::Start)]);
        assert_eq!(feed(&pad, start, 0.0), vec![]);
    }

    #[test]
    fn named_alias_shares_state_with_numbered_button() {
        let pad = GamepadShared::new(GamepadLayout::DirectInput, DEFAULT_DEAD_ZONE);
        assert_eq!(feed(&pad, Identifier::Button(2), 1.0), vec![ButtonPress(GamepadButton::A)]);
        assert_eq!(feed(&pad, Identifier::Named(NamedButton::A), 1.0), vec![]);
        assert_eq!(
            feed(&pad, Identifier::Named(NamedButton::A), 0.0),
            vec![ButtonRelease(GamepadButton::A)]
        );
    }

    #[test]
    fn unmapped_identifiers_change_nothing() {
        let pad = GamepadShared::new(GamepadLayout::Generic, DEFAULT_DEAD_ZONE);
        assert_eq!(feed(&pad, Identifier::Button(12), 1.0), vec![]);
        assert_eq!(feed(&pad, Identifier::Axis(Axis::Slider), 1.0), vec![]);
        assert!(!lock(&pad.state).buttons.any_down());
    }

    #[test]
    fn pov_transitions_release_before_press() {
        let pad = GamepadShared::new(GamepadLayout::DirectInput, DEFAULT_DEAD_ZONE);

        assert_eq!(pov(&pad, 0.25), vec![PovPress(Direction::North)]);
        assert_eq!(
            pov(&pad, 0.375),
            vec![PovRelease(Direction::North), PovPress(Direction::NorthEast)]
        );
        assert_eq!(pov(&pad, 0.375), vec![]);
        assert_eq!(pov(&pad, 0.0), vec![PovRelease(Direction::NorthEast)]);
        assert_eq!(pov(&pad, 0.3), vec![]);
        assert_eq!(pov(&pad, 0.25), vec![PovPress(Direction::North)]);
    }

    #[test]
    fn stick_push_is_gated_by_dead_zone() {
        let pad = GamepadShared::new(GamepadLayout::DirectInput, DEFAULT_DEAD_ZONE);

        assert_eq!(feed(&pad, Identifier::Axis(Axis::X), 0.05), vec![]);
        assert_eq!(lock(&pad.state).sticks[0].x, 0.0);

        let notes = feed(&pad, Identifier::Axis(Axis::X), 1.0);
        assert_eq!(
            notes,
            vec![StickPush {
                stick: Stick::Left,
                direction: Some(Direction::East),
                intensity: 1.0,
                x: 1.0,
                y: 0.0,
            }]
        );
    }

    #[test]
    fn idle_axis_noise_keeps_the_direction() {
        let pad = GamepadShared::new(GamepadLayout::DirectInput, DEFAULT_DEAD_ZONE);
        feed(&pad, Identifier::Axis(Axis::X), 0.8);

        let notes = feed(&pad, Identifier::Axis(Axis::Y), 0.05);
        assert_eq!(lock(&pad.state).sticks[0].y, 0.0);
        assert!(matches!(
            notes.as_slice(),
            [StickPush { stick: Stick::Left, direction: Some(Direction::East), .. }]
        ));

        let notes = feed(&pad, Identifier::Axis(Axis::Y), 0.0);
        assert!(matches!(notes.as_slice(), [StickPush { direction: None, .. }]));
    }

    #[test]
    fn direct_input_right_stick_uses_z_axes() {
        let pad = GamepadShared::new(GamepadLayout::DirectInput, DEFAULT_DEAD_ZONE);
        let notes = feed(&pad, Identifier::Axis(Axis::RZ), -1.0);
        assert!(matches!(
            notes.as_slice(),
            [StickPush { stick: Stick::Right, direction: Some(Direction::North), .. }]
        ));
    }

    #[test]
    fn xinput_sticks_are_flipped_to_screen_orientation() {
        let pad = GamepadShared::new(GamepadLayout::XInput { navigation: true }, DEFAULT_DEAD_ZONE);

        let notes = feed(&pad, Identifier::Axis(Axis::Y), 1.0);
        assert!(matches!(
            notes.as_slice(),
            [StickPush { stick: Stick::Left, direction: Some(Direction::North), .. }]
        ));

        let notes = feed(&pad, Identifier::Axis(Axis::RX), 0.7);
        assert!(matches!(
            notes.as_slice(),
            [StickPush { stick: Stick::Right, direction: Some(Direction::East), .. }]
        ));
    }

    #[test]
    fn xinput_triggers_synthesize_l2_r2() {
        let pad = GamepadShared::new(GamepadLayout::XInput { navigation: true }, DEFAULT_DEAD_ZONE);

        assert_eq!(
            feed(&pad, Identifier::Axis(Axis::Z), 0.5),
            vec![TriggerPush(Trigger::Left, 0.5)]
        );
        assert_eq!(
            feed(&pad, Identifier::Axis(Axis::Z), 1.0),
            vec![TriggerPush(Trigger::Left, 1.0), ButtonPress(GamepadButton::L2)]
        );
        assert_eq!(
            feed(&pad, Identifier::Axis(Axis::Z), 0.0),
            vec![TriggerPush(Trigger::Left, 0.0), ButtonRelease(GamepadButton::L2)]
        );
        assert_eq!(
            feed(&pad, Identifier::Axis(Axis::RZ), 0.0),
            vec![TriggerPush(Trigger::Right, 0.0)]
        );
    }

    #[test]
    fn cursor_buttons_follow_emulation_flag() {
        let pad = GamepadShared::new(GamepadLayout::DirectInput, DEFAULT_DEAD_ZONE);
        let x = Identifier::Button(3);

        assert_eq!(feed(&pad, x, 1.0), vec![ButtonPress(GamepadButton::X)]);
        assert_eq!(feed(&pad, x, 0.0), vec![ButtonRelease(GamepadButton::X)]);

        lock(&pad.state).cursor.enabled = true;
        assert_eq!(
            feed(&pad, x, 1.0),
            vec![ButtonPress(GamepadButton::X), MousePress(MouseButton::Left)]
        );
        assert_eq!(
            feed(&pad, x, 0.0),
            vec![ButtonRelease(GamepadButton::X), MouseRelease(MouseButton::Left)]
        );
    }

    #[test]
    fn dead_zone_is_clamped() {
        assert_eq!(clamp_dead_zone(-1.0), 0.0);
        assert_eq!(clamp_dead_zone(2.0), MAX_DEAD_ZONE);
        assert_eq!(clamp_dead_zone(f32::NAN), DEFAULT_DEAD_ZONE);
        assert_eq!(clamp_dead_zone(0.25), 0.25);
    }
}
