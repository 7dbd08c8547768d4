mod common;

use common::{direct_input_pad, fast_settings, keyboard, mouse, registry_with, wait_until, xinput_pad, Recorder};
use inputnorm::backend::memory::MemoryBackend;
use inputnorm::backend::{ControllerHandle, ControllerInfo, ControllerKind, Identifier};
use inputnorm::registry::LayoutClassifier;
use inputnorm::{DeviceKind, DeviceRegistry, GamepadLayout, GamepadListener, InputEvent, InputSettings};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn removals(recorder: &Recorder) -> usize {
    recorder.count(|e| matches!(e, InputEvent::Removed(_)))
}

#[test]
fn hot_unplug_notifies_once_and_evicts() {
    let (backend, controllers, registry) = registry_with(vec![direct_input_pad("Pad")]);
    let gamepad = registry.gamepads().remove(0);
    let recorder = Recorder::new();
    gamepad.add_listener(recorder.clone());
    gamepad.start_listening().unwrap();

    assert!(backend.remove_controller(controllers[0].id()));

    assert!(wait_until(|| removals(&recorder) == 1));
    assert!(wait_until(|| registry.is_empty()));
    assert!(wait_until(|| !gamepad.is_listening()));
    thread::sleep(Duration::from_millis(20));

    assert_eq!(removals(&recorder), 1);
    assert!(!gamepad.is_connected());
    assert!(gamepad.start_listening().is_err());
}

#[test]
fn unplug_of_an_idle_device_still_notifies() {
    let (backend, controllers, registry) = registry_with(vec![mouse("Mouse")]);
    let pointer = registry.pointers().remove(0);
    let recorder = Recorder::new();
    pointer.add_listener(recorder.clone());

    backend.remove_controller(controllers[0].id());

    assert!(wait_until(|| removals(&recorder) == 1));
    assert!(wait_until(|| registry.is_empty()));
}

#[test]
fn hot_plug_add_creates_a_device() {
    let backend = Arc::new(MemoryBackend::new());
    let registry = DeviceRegistry::new(
        backend.clone(),
        Some(InputSettings {
            auto_listen: true,
            ..fast_settings().unwrap()
        }),
    );
    registry.create().unwrap();
    assert!(registry.is_empty());

    backend.add_controller(xinput_pad("Late Pad"));
    assert!(wait_until(|| registry.len() == 1));

    let gamepad = registry.gamepads_by_name("Late Pad").remove(0);
    assert_eq!(gamepad.layout(), GamepadLayout::XInput { navigation: true });
    assert!(gamepad.is_listening());
    assert_eq!(gamepad.poll_interval(), Duration::from_millis(1));
}

#[test]
fn create_and_destroy_are_idempotent() {
    let (backend, _controllers, registry) = registry_with(vec![direct_input_pad("Pad"), mouse("Mouse")]);
    registry.create().unwrap();
    assert_eq!(registry.len(), 2);
    assert!(backend.is_subscribed());

    registry.start_listening().unwrap();
    let devices = registry.devices();

    registry.destroy();
    registry.destroy();
    assert!(!registry.is_created());
    assert!(registry.is_empty());
    assert!(!backend.is_subscribed());
    assert!(devices.iter().all(|d| !d.is_listening()));

    registry.create().unwrap();
    assert_eq!(registry.len(), 2);
}

#[test]
fn unavailable_backend_yields_no_devices() {
    let backend = Arc::new(MemoryBackend::unavailable("no driver"));
    let registry = DeviceRegistry::new(backend, None);
    registry.create().unwrap();
    assert!(registry.is_empty());
    assert!(registry.gamepads().is_empty());
}

#[test]
fn names_are_trimmed_and_not_unique() {
    let (_backend, _controllers, registry) =
        registry_with(vec![direct_input_pad("  Pad "), direct_input_pad("Pad"), keyboard("Keys")]);

    let pads = registry.gamepads_by_name("Pad");
    assert_eq!(pads.len(), 2);
    assert_ne!(pads[0].id(), pads[1].id());
    assert_eq!(registry.keyboards_by_name("Keys").len(), 1);
    assert_eq!(registry.devices_by_name("Pad").len(), 2);
    assert!(registry.pointers_by_name("Pad").is_empty());

    let id = pads[1].id();
    assert_eq!(registry.device(id).map(|d| d.kind()), Some(DeviceKind::Gamepad));
}

#[test]
fn controllers_are_classified() {
    let small = ControllerInfo::new("Small", ControllerKind::Stick, (0..4).map(Identifier::Button).collect());
    let other = ControllerInfo::new("Wheel", ControllerKind::Other, Vec::new());
    let (_backend, _controllers, registry) = registry_with(vec![
        xinput_pad("X"),
        direct_input_pad("D"),
        small,
        other,
        mouse("M"),
        keyboard("K"),
    ]);

    let layout = |name: &str| registry.gamepads_by_name(name).remove(0).layout();
    assert_eq!(layout("X"), GamepadLayout::XInput { navigation: true });
    assert_eq!(layout("D"), GamepadLayout::DirectInput);
    assert_eq!(layout("Small"), GamepadLayout::Generic);
    assert!(registry.devices_by_name("Wheel").is_empty());
    assert_eq!(registry.pointers().len(), 1);
    assert_eq!(registry.keyboards().len(), 1);
    assert_eq!(registry.len(), 5);
}

struct AlwaysGeneric;

impl LayoutClassifier for AlwaysGeneric {
    fn layout(&self, _info: &ControllerInfo) -> GamepadLayout {
        GamepadLayout::Generic
    }
}

#[test]
fn custom_classifier_is_used() {
    let backend = Arc::new(MemoryBackend::new());
    backend.add_controller(xinput_pad("X"));
    let registry = DeviceRegistry::with_classifier(backend, None, Box::new(AlwaysGeneric));
    registry.create().unwrap();
    assert_eq!(registry.gamepads()[0].layout(), GamepadLayout::Generic);
}

#[test]
fn broadcast_listeners_reach_every_gamepad() {
    let (_backend, _controllers, registry) =
        registry_with(vec![direct_input_pad("A"), direct_input_pad("B"), mouse("M")]);
    let recorder: Arc<dyn GamepadListener> = Recorder::new();

    registry.add_gamepad_listener(recorder.clone());
    assert!(registry.gamepads().iter().all(|g| g.listener_count() == 1));

    assert_eq!(registry.remove_gamepad_listener(&recorder), 2);
    assert_eq!(registry.remove_gamepad_listener(&recorder), 0);
}

#[test]
fn registries_are_independent() {
    let (_first_backend, _c1, first) = registry_with(vec![direct_input_pad("A")]);
    let (_second_backend, _c2, second) = registry_with(vec![mouse("M"), keyboard("K")]);

    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 2);
    drop(first);
    assert_eq!(second.len(), 2);
}
