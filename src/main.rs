//! inputnorm-monitor - prints normalized gamepad events from real hardware
//!
//! Usage: `inputnorm-monitor [settings.toml]`

use color_eyre::{eyre::eyre, Result};
use inputnorm::backend::gilrs::GilrsBackend;
use inputnorm::{DeviceRegistry, EventForwarder, InputEvent, InputSettings};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let settings = load_settings()?;
    info!("Settings: {:?}", settings);

    let backend = Arc::new(GilrsBackend::new().map_err(|e| eyre!("Failed to start gilrs: {}", e))?);
    let registry = DeviceRegistry::new(backend, Some(settings));
    registry.create()?;

    let gamepads = registry.gamepads();
    if gamepads.is_empty() {
        warn!("No gamepads connected");
    }
    for gamepad in &gamepads {
        info!(
            "{} ({}): {} layout, {} buttons, rumble: {}",
            gamepad.name(),
            gamepad.id(),
            gamepad.layout(),
            gamepad.button_count(),
            gamepad.can_rumble()
        );
    }

    let (forwarder, mut events) = EventForwarder::channel();
    registry.add_gamepad_listener(forwarder);
    registry.start_listening()?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received, shutting down");
                break;
            }
            event = events.recv() => match event {
                Some(event) => print_event(&event),
                None => break,
            },
        }
    }

    registry.destroy();
    Ok(())
}

fn print_event(event: &InputEvent) {
    let source = event.source();
    match event {
        InputEvent::ButtonPress(e) => info!("{} pressed {}", source, e.button),
        InputEvent::ButtonRelease(e) => info!("{} released {}", source, e.button),
        InputEvent::PovPress(e) => info!("{} POV {}", source, e.direction),
        InputEvent::PovRelease(e) => info!("{} POV {} released", source, e.direction),
        InputEvent::StickPush(e) => info!(
            "{} {:?} stick {} {:.2} ({:.2}, {:.2})",
            source,
            e.stick,
            e.direction.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
            e.intensity,
            e.x,
            e.y
        ),
        InputEvent::TriggerPush(e) => info!("{} {:?} trigger {:.2}", source, e.trigger, e.value),
        InputEvent::Removed(_) => warn!("{} removed", source),
        InputEvent::Fault(fault) => warn!("{}", fault),
        other => info!("{:?}", other),
    }
}

fn load_settings() -> Result<InputSettings> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(InputSettings::default());
    };

    let text = std::fs::read_to_string(&path).map_err(|e| eyre!("Failed to read {}: {}", path, e))?;
    Ok(InputSettings::from_toml_str(&text)?)
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
