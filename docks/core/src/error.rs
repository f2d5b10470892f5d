//! Error types shared by device drivers.

use std::path::PathBuf;

/// Failures reported by a transport backend
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Device was not found
    #[error("device not found")]
    DeviceNotFound,

    /// The device went away or the handle was closed
    #[error("device disconnected")]
    Disconnected,

    /// The backend accepted fewer bytes than the packet holds
    #[error("short write: {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    /// The backend cannot perform the requested transfer
    #[error("unsupported transfer: {0}")]
    Unsupported(&'static str),

    /// The blocking io task was cancelled or panicked
    #[error("io task failed: {0}")]
    Task(String),

    /// HID communication error
    #[error("hid error: {0}")]
    Hid(#[from] hidapi::HidError),
}

/// Failures while turning a source image into device-ready bytes
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// Source file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source bytes are not a decodable image
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// Rendered pixels could not be encoded for the device
    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    /// Encoded image does not fit the 32-bit size field of the upload header
    #[error("media too large: {len} bytes")]
    TooLarge { len: usize },
}

/// Malformed data received from the device
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Inbound report too short to carry a key code and state
    #[error("report too short: got {len} bytes, need at least {need}")]
    ShortReport { len: usize, need: usize },
}

/// Errors that can occur during device operations
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl From<hidapi::HidError> for DeviceError {
    fn from(err: hidapi::HidError) -> Self {
        Self::Transport(err.into())
    }
}

pub type Result<T> = std::result::Result<T, DeviceError>;
