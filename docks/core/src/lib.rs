//! Core traits and types for dock-sync device abstraction.
//!
//! This crate provides:
//! - The `Transport` capability that device drivers write packets through
//! - Control transfer request/response types
//! - The error taxonomy shared by every device crate

mod error;
mod transport;

pub use error::{DeviceError, ProtocolError, ResourceError, Result, TransportError};
pub use transport::{ControlRequest, ControlResponse, Transport};
