//! gilrs adapter
//!
//! `Gilrs` lives on a dedicated pump thread. The pump drains gilrs events into
//! per-controller queues, turns Connected/Disconnected into hot-plug
//! notifications and executes rumble commands:
//!
//! ```text
//! gilrs ──► pump thread ──► GilrsController queue ──► device polling thread
//!               │   ▲
//!               │   └── Command::Rumble ◄── Gamepad::rumble()
//!               └──► HotplugEvent ──► registry watcher
//! ```
//!
//! Every gilrs pad is described as an XInput pad with navigation buttons:
//!
//! | gilrs                         | Identifier         |
//! |-------------------------------|--------------------|
//! | South/East/West/North         | `_0`/`_1`/`_2`/`_3`|
//! | LeftTrigger/RightTrigger      | `_4`/`_5`          |
//! | Select/Start                  | `_6`/`_7`          |
//! | LeftThumb/RightThumb          | `_8`/`_9`          |
//! | Mode                          | `Named(Mode)`      |
//! | LeftStick X/Y, RightStick X/Y | X/Y, RX/RY         |
//! | LeftTrigger2/RightTrigger2    | Z/RZ               |
//! | D-pad                         | POV scalar         |

use super::{
    Axis, BackendError, ControllerHandle, ControllerId, ControllerInfo, ControllerKind,
    HotplugEvent, Identifier, InputBackend, NamedButton, PollStatus, RawEvent,
};
use crate::direction::Direction;
use crate::sync::lock;
use gilrs::ff::{BaseEffect, BaseEffectType, Effect, EffectBuilder};
use gilrs::{Button, Event, EventType, GamepadId, Gilrs};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc as std_mpsc, Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

const PUMP_INTERVAL: Duration = Duration::from_millis(2);

enum Command {
    Rumble(GamepadId, f32),
}

fn controller_id(id: GamepadId) -> ControllerId {
    ControllerId(usize::from(id) as u64)
}

fn components() -> Vec<Identifier> {
    let mut components: Vec<Identifier> = [Axis::X, Axis::Y, Axis::Z, Axis::RX, Axis::RY, Axis::RZ, Axis::Pov]
        .into_iter()
        .map(Identifier::Axis)
        .collect();
    components.extend((0..10).map(Identifier::Button));
    components.push(Identifier::Named(NamedButton::Mode));
    components
}

fn button_identifier(button: Button) -> Option<Identifier> {
    let id = match button {
        Button::South => Identifier::Button(0),
        Button::East => Identifier::Button(1),
        Button::West => Identifier::Button(2),
        Button::North => Identifier::Button(3),
        Button::LeftTrigger => Identifier::Button(4),
        Button::RightTrigger => Identifier::Button(5),
        Button::Select => Identifier::Button(6),
        Button::Start => Identifier::Button(7),
        Button::LeftThumb => Identifier::Button(8),
        Button::RightThumb => Identifier::Button(9),
        Button::Mode => Identifier::Named(NamedButton::Mode),
        _ => return None,
    };
    Some(id)
}

fn axis_identifier(axis: gilrs::Axis) -> Option<Identifier> {
    let axis = match axis {
        gilrs::Axis::LeftStickX => Axis::X,
        gilrs::Axis::LeftStickY => Axis::Y,
        gilrs::Axis::RightStickX => Axis::RX,
        gilrs::Axis::RightStickY => Axis::RY,
        gilrs::Axis::LeftZ => Axis::Z,
        gilrs::Axis::RightZ => Axis::RZ,
        _ => return None,
    };
    Some(Identifier::Axis(axis))
}

#[derive(Debug, Default, Clone, Copy)]
struct DPad {
    up: bool,
    right: bool,
    down: bool,
    left: bool,
}

impl DPad {
    /// Updates one arrow and returns the POV scalar for the new state.
    fn set(&mut self, button: Button, pressed: bool) -> Option<f32> {
        match button {
            Button::DPadUp => self.up = pressed,
            Button::DPadRight => self.right = pressed,
            Button::DPadDown => self.down = pressed,
            Button::DPadLeft => self.left = pressed,
            _ => return None,
        }
        let direction = Direction::from_dpad(self.up, self.right, self.down, self.left);
        Some(direction.map(Direction::to_pov).unwrap_or(0.0))
    }
}

pub struct GilrsController {
    id: ControllerId,
    gamepad: GamepadId,
    info: ControllerInfo,
    queue: Mutex<VecDeque<RawEvent>>,
    dpad: Mutex<DPad>,
    connected: AtomicBool,
    rumblers: usize,
    commands: mpsc::UnboundedSender<Command>,
}

impl GilrsController {
    fn push(&self, id: Identifier, value: f32) {
        lock(&self.queue).push_back(RawEvent::new(id, value));
    }

    fn button(&self, button: Button, pressed: bool) {
        let pov = lock(&self.dpad).set(button, pressed);
        if let Some(pov) = pov {
            self.push(Identifier::Axis(Axis::Pov), pov);
        } else if let Some(id) = button_identifier(button) {
            self.push(id, if pressed { 1.0 } else { 0.0 });
        }
    }

    fn translate(&self, event: EventType) {
        match event {
            EventType::ButtonPressed(button, _) => self.button(button, true),
            EventType::ButtonReleased(button, _) => self.button(button, false),
            EventType::ButtonChanged(Button::LeftTrigger2, value, _) => {
                self.push(Identifier::Axis(Axis::Z), value)
            }
            EventType::ButtonChanged(Button::RightTrigger2, value, _) => {
                self.push(Identifier::Axis(Axis::RZ), value)
            }
            EventType::AxisChanged(axis, value, _) => match axis_identifier(axis) {
                Some(id) => self.push(id, value),
                None => trace!("Unmapped gilrs axis {:?}", axis),
            },
            _ => {}
        }
    }
}

impl std::fmt::Debug for GilrsController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GilrsController")
            .field("id", &self.id)
            .field("name", &self.info.name)
            .field("rumblers", &self.rumblers)
            .finish()
    }
}

impl ControllerHandle for GilrsController {
    fn id(&self) -> ControllerId {
        self.id
    }

    fn info(&self) -> &ControllerInfo {
        &self.info
    }

    fn poll(&self) -> Result<PollStatus, BackendError> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(PollStatus::Connected)
        } else {
            Ok(PollStatus::Disconnected)
        }
    }

    fn next_event(&self) -> Option<RawEvent> {
        lock(&self.queue).pop_front()
    }

    fn rumbler_count(&self) -> usize {
        self.rumblers
    }

    fn rumble(&self, intensity: f32) -> Result<(), BackendError> {
        self.commands
            .send(Command::Rumble(self.gamepad, intensity))
            .map_err(|_| BackendError::ForceFeedbackError("gilrs pump thread is gone".to_string()))
    }
}

#[derive(Default)]
struct Shared {
    controllers: Mutex<HashMap<ControllerId, Arc<GilrsController>>>,
    subscriber: Mutex<Option<mpsc::UnboundedSender<HotplugEvent>>>,
}

impl Shared {
    fn notify(&self, event: HotplugEvent) {
        if let Some(sender) = lock(&self.subscriber).as_ref() {
            if sender.send(event).is_err() {
                warn!("Hot-plug receiver dropped");
            }
        }
    }
}

struct Pump {
    gilrs: Gilrs,
    shared: Arc<Shared>,
    commands: mpsc::UnboundedReceiver<Command>,
    command_sender: mpsc::UnboundedSender<Command>,
    effects: HashMap<GamepadId, Effect>,
    stop: Arc<AtomicBool>,
}

impl Pump {
    fn attach(&mut self, id: GamepadId, announce: bool) {
        let gamepad = self.gilrs.gamepad(id);
        let controller = Arc::new(GilrsController {
            id: controller_id(id),
            gamepad: id,
            info: ControllerInfo::new(gamepad.name(), ControllerKind::Gamepad, components()),
            queue: Mutex::new(VecDeque::new()),
            dpad: Mutex::new(DPad::default()),
            connected: AtomicBool::new(true),
            rumblers: if gamepad.is_ff_supported() { 1 } else { 0 },
            commands: self.command_sender.clone(),
        });
        info!("gilrs pad {} connected: {}", controller.id, controller.info.name);

        lock(&self.shared.controllers).insert(controller.id, Arc::clone(&controller));
        if announce {
            self.shared.notify(HotplugEvent::Added(controller));
        }
    }

    fn detach(&mut self, id: GamepadId) {
        self.effects.remove(&id);
        let Some(controller) = lock(&self.shared.controllers).remove(&controller_id(id)) else {
            return;
        };
        controller.connected.store(false, Ordering::SeqCst);
        info!("gilrs pad {} disconnected", controller.id);
        self.shared.notify(HotplugEvent::Removed(controller.id));
    }

    fn rumble(&mut self, id: GamepadId, intensity: f32) {
        if intensity <= 0.0 {
            self.effects.remove(&id);
            return;
        }

        let magnitude = (intensity.clamp(0.0, 1.0) * f32::from(u16::MAX)) as u16;
        let effect = EffectBuilder::new()
            .add_effect(BaseEffect {
                kind: BaseEffectType::Strong { magnitude },
                ..Default::default()
            })
            .gamepads(&[id])
            .finish(&mut self.gilrs);

        match effect.and_then(|effect| effect.play().map(|_| effect)) {
            Ok(effect) => {
                self.effects.insert(id, effect);
            }
            Err(e) => warn!("Rumble on gilrs pad {} failed: {}", controller_id(id), e),
        }
    }

    fn run(mut self) {
        while !self.stop.load(Ordering::SeqCst) {
            while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
                match event {
                    EventType::Connected => self.attach(id, true),
                    EventType::Disconnected => self.detach(id),
                    event => {
                        let controller = lock(&self.shared.controllers).get(&controller_id(id)).cloned();
                        match controller {
                            Some(controller) => controller.translate(event),
                            None => trace!("Event for unknown gilrs pad {}", controller_id(id)),
                        }
                    }
                }
            }

            while let Ok(Command::Rumble(id, intensity)) = self.commands.try_recv() {
                self.rumble(id, intensity);
            }

            thread::sleep(PUMP_INTERVAL);
        }
        debug!("gilrs pump exiting");
    }
}

/// Hardware backend over gilrs.
pub struct GilrsBackend {
    shared: Arc<Shared>,
    stop: Arc<AtomicBool>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl GilrsBackend {
    /// Starts the pump thread and waits until the connected pads are known.
    pub fn new() -> Result<Self, BackendError> {
        let shared = Arc::new(Shared::default());
        let stop = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = std_mpsc::channel::<Result<(), String>>();

        let pump_shared = Arc::clone(&shared);
        let pump_stop = Arc::clone(&stop);
        let pump = thread::Builder::new()
            .name("inputnorm-gilrs".to_string())
            .spawn(move || {
                let gilrs = match Gilrs::new() {
                    Ok(gilrs) => gilrs,
                    Err(e) => {
                        error!("Failed to initialize gilrs: {}", e);
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }
                };

                let (command_sender, commands) = mpsc::unbounded_channel();
                let mut pump = Pump {
                    gilrs,
                    shared: pump_shared,
                    commands,
                    command_sender,
                    effects: HashMap::new(),
                    stop: pump_stop,
                };
                let ids: Vec<GamepadId> = pump.gilrs.gamepads().map(|(id, _)| id).collect();
                for id in ids {
                    pump.attach(id, false);
                }
                let _ = ready_tx.send(Ok(()));
                pump.run();
            })
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                info!("gilrs backend ready");
                Ok(Self {
                    shared,
                    stop,
                    pump: Mutex::new(Some(pump)),
                })
            }
            Ok(Err(reason)) => Err(BackendError::Unavailable(reason)),
            Err(_) => Err(BackendError::Unavailable("gilrs pump thread died".to_string())),
        }
    }
}

impl InputBackend for GilrsBackend {
    fn name(&self) -> &str {
        "gilrs"
    }

    fn controllers(&self) -> Result<Vec<Arc<dyn ControllerHandle>>, BackendError> {
        Ok(lock(&self.shared.controllers)
            .values()
            .map(|c| Arc::clone(c) as Arc<dyn ControllerHandle>)
            .collect())
    }

    fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<HotplugEvent>, BackendError> {
        let (sender, receiver) = mpsc::unbounded_channel();
        *lock(&self.shared.subscriber) = Some(sender);
        Ok(receiver)
    }

    fn unsubscribe(&self) {
        lock(&self.shared.subscriber).take();
    }
}

impl Drop for GilrsBackend {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(pump) = lock(&self.pump).take() {
            if pump.join().is_err() {
                error!("gilrs pump thread panicked");
            }
        }
    }
}
