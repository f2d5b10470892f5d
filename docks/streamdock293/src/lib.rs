//! High level abstraction for driving StreamDock 293 button panels.
//!
//! The panel has fifteen keys with 100x100 displays and an 800x480 boot logo.
//! Every outbound packet goes through a single [`Serializer`]; inbound key
//! reports are read on their own endpoint and never wait on a send.

use std::sync::Arc;

use dock_sync_core::{ControlRequest, ControlResponse, Result, Transport};
use tracing::{debug, warn};

pub mod abi;
pub mod hid;
pub mod keymap;
pub mod media;
pub mod transfer;

#[cfg(test)]
mod testing;

pub use hid::HidTransport;
pub use keymap::{Key, KeyEvent, KeyState};
pub use media::{ImageSource, Resize};
pub use transfer::Serializer;

pub mod consts {
    pub const VENDOR_ID: u16 = 0x5500;
    pub const PRODUCT_ID: u16 = 0x1001;
    pub const INTERFACE: i32 = 0;
    /// Default inbound report read size
    pub const REPORT_SIZE: usize = 512;
}

/// Firmware query: HID GET_REPORT for input report 0
const FIRMWARE_REQUEST: ControlRequest = ControlRequest {
    request_type: 0xA1,
    request: 0x01,
    value: 0x0100,
    index: 0,
    length: 512,
};

/// Firmware identification string, when the device provides one
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FirmwareVersion {
    Known(String),
    Unavailable,
}

impl std::fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FirmwareVersion::Known(version) => f.write_str(version),
            FirmwareVersion::Unavailable => f.write_str("unavailable"),
        }
    }
}

/// High level abstraction for managing a StreamDock 293
pub struct StreamDock293 {
    transport: Arc<dyn Transport>,
    serializer: Serializer,
    resize: Resize,
    report_size: usize,
}

impl StreamDock293 {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            serializer: Serializer::new(Arc::clone(&transport)),
            transport,
            resize: Resize::default(),
            report_size: consts::REPORT_SIZE,
        }
    }

    /// Find and open the device over hidapi
    pub fn open() -> Result<Self> {
        Ok(Self::new(Arc::new(HidTransport::open()?)))
    }

    /// Interpolation used when scaling images to the device
    pub fn with_resize(mut self, resize: Resize) -> Self {
        self.resize = resize;
        self
    }

    /// Maximum inbound report size requested per read
    pub fn with_report_size(mut self, report_size: usize) -> Self {
        self.report_size = report_size;
        self
    }

    /// Shared outbound packet serializer
    pub fn serializer(&self) -> &Serializer {
        &self.serializer
    }

    /// Query the firmware string. A response without text is reported as
    /// unavailable rather than an error.
    pub async fn firmware_version(&self) -> Result<FirmwareVersion> {
        let response = self.transport.control_transfer(FIRMWARE_REQUEST).await?;
        let data = match response {
            ControlResponse::Data(data) => data,
            ControlResponse::Status(len) => {
                warn!(len, "firmware query returned no data");
                return Ok(FirmwareVersion::Unavailable);
            },
        };
        match String::from_utf8(data) {
            Ok(text) => Ok(FirmwareVersion::Known(
                text.trim_end_matches('\0').trim().to_string(),
            )),
            Err(e) => {
                warn!("firmware query returned invalid text: {e}");
                Ok(FirmwareVersion::Unavailable)
            },
        }
    }

    /// Wake the display from standby
    #[inline(always)]
    pub async fn wake_screen(&self) -> Result<()> {
        Ok(self.serializer.send_command(&abi::wake_screen()).await?)
    }

    /// Clear every key
    #[inline(always)]
    pub async fn clear_screen(&self) -> Result<()> {
        Ok(self
            .serializer
            .send_command(&abi::clear_key(abi::ALL_KEYS))
            .await?)
    }

    /// Clear a single key
    #[inline(always)]
    pub async fn clear_key_icon(&self, key: u8) -> Result<()> {
        Ok(self.serializer.send_command(&abi::clear_key(key)).await?)
    }

    /// Set the backlight brightness
    #[inline(always)]
    pub async fn set_brightness(&self, value: u8) -> Result<()> {
        Ok(self
            .serializer
            .send_command(&abi::set_brightness(value))
            .await?)
    }

    /// Commit pending images to the display
    #[inline(always)]
    pub async fn refresh(&self) -> Result<()> {
        Ok(self.serializer.send_command(&abi::commit()).await?)
    }

    /// Render and upload an icon for a logical key. Nothing is sent if the
    /// image cannot be read or decoded.
    pub async fn set_key_icon(&self, key: u8, image: impl Into<ImageSource>) -> Result<()> {
        let source = image.into();
        let icon = media::render_icon(&source.resolve().await?, self.resize)?;
        media::upload_icon(&self.serializer, key, &icon).await
    }

    /// Render and upload the boot logo. Nothing is sent if the image cannot
    /// be read or decoded.
    pub async fn set_boot_image(&self, image: impl Into<ImageSource>) -> Result<()> {
        let source = image.into();
        let raw = media::render_boot_image(&source.resolve().await?, self.resize)?;
        media::upload_boot_image(&self.serializer, &raw).await
    }

    /// Stream an arbitrary buffer as unprefixed chunks
    pub async fn send_bytes(&self, data: &[u8]) -> Result<()> {
        Ok(self.serializer.send_chunked(data).await?)
    }

    /// Read one raw inbound report
    pub async fn receive(&self) -> Result<Vec<u8>> {
        Ok(self.transport.receive(self.report_size).await?)
    }

    /// Wait for the next key transition
    pub async fn receive_key_event(&self) -> Result<KeyEvent> {
        let report = self.receive().await?;
        let event = keymap::decode(&report)?;
        debug!(key = %event.key, state = ?event.state, "key event");
        Ok(event)
    }
}
