//! Reactive key loop: show an idle icon on every key and swap to the pressed
//! icon while a key is held.

use std::error::Error;
use std::path::Path;

use dock_sync_core::DeviceError;
use streamdock293::keymap::KEY_COUNT;
use streamdock293::media::{render_icon, upload_icon, ImageSource};
use streamdock293::{Key, Resize, StreamDock293};
use tracing::{info, warn};

use crate::config::{DeviceConfig, ListenConfig};

/// Render an optional icon once up front so key presses only stream bytes
async fn prerender(path: Option<&Path>, resize: Resize) -> Result<Option<Vec<u8>>, DeviceError> {
    let Some(path) = path else {
        return Ok(None);
    };
    let source = ImageSource::from(path);
    Ok(Some(render_icon(&source.resolve().await?, resize)?))
}

pub async fn run_listen(
    dock: &StreamDock293,
    device: &DeviceConfig,
    listen: &ListenConfig,
    resize: Resize,
) -> Result<(), Box<dyn Error>> {
    let idle = prerender(listen.idle_image.as_deref(), resize).await?;
    let pressed = prerender(listen.pressed_image.as_deref(), resize).await?;

    dock.wake_screen().await?;
    dock.clear_screen().await?;
    dock.set_brightness(device.brightness).await?;

    if let Some(icon) = &idle {
        for key in 1..=KEY_COUNT {
            upload_icon(dock.serializer(), key, icon).await?;
        }
    }
    info!("listening for key presses, ctrl-c to stop");

    loop {
        let event = tokio::select! {
            event = dock.receive_key_event() => event,
            _ = tokio::signal::ctrl_c() => {
                println!("stopping");
                return Ok(());
            },
        };
        let event = match event {
            Ok(event) => event,
            Err(DeviceError::Protocol(e)) => {
                warn!("ignoring malformed report: {e}");
                continue;
            },
            Err(e) => return Err(e.into()),
        };

        println!("key {} {:?}", event.key, event.state);
        let Key::Mapped(key) = event.key else {
            continue;
        };
        let icon = if event.state.is_pressed() {
            &pressed
        } else {
            &idle
        };
        if let Some(icon) = icon {
            upload_icon(dock.serializer(), key, icon).await?;
        }
    }
}
