//! Transport capability for talking to a device.
//!
//! Any backend that can push a packet out, pull a report in, and issue a
//! control transfer can drive a device. Drivers hold it as `Arc<dyn Transport>`.

use async_trait::async_trait;

use crate::TransportError;

/// USB control transfer setup fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlRequest {
    pub request_type: u8,
    pub request: u8,
    pub value: u16,
    pub index: u16,
    pub length: u16,
}

/// Result of a control transfer. Backends return the data stage for IN
/// transfers, or only a byte count when there was no data to hand back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlResponse {
    Data(Vec<u8>),
    Status(usize),
}

/// Raw device io. Calls suspend until the backend completes or fails; no
/// timeouts are applied above this layer.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Write one packet to the device
    async fn send(&self, data: &[u8]) -> Result<(), TransportError>;

    /// Read one inbound report of at most `max_len` bytes
    async fn receive(&self, max_len: usize) -> Result<Vec<u8>, TransportError>;

    /// Issue a control transfer on the default pipe
    async fn control_transfer(
        &self,
        request: ControlRequest,
    ) -> Result<ControlResponse, TransportError>;
}
