//! hidapi backed transport.
//!
//! The panel enumerates as a vendor HID device with unnumbered reports. Writes
//! go out behind a zero report id, and the firmware query maps onto a HID
//! GET_REPORT for input report 0.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dock_sync_core::{ControlRequest, ControlResponse, Transport, TransportError};
use hidapi::{HidApi, HidDevice};
use tracing::{debug, warn};

use crate::consts;

/// HID class GET_REPORT, device to host, interface recipient
const GET_REPORT_REQUEST_TYPE: u8 = 0xA1;
const GET_REPORT: u8 = 0x01;
/// Report type in the high byte of wValue
const INPUT_REPORT: u8 = 0x01;
const FEATURE_REPORT: u8 = 0x03;

/// A partial packet leaves the device mid-command, so it is an error
fn ensure_written(written: usize, expected: usize) -> Result<(), TransportError> {
    if written < expected {
        warn!(written, expected, "short write");
        return Err(TransportError::ShortWrite { written, expected });
    }
    Ok(())
}

/// Two handles onto the same interface so a pending read never holds up writes
pub struct HidTransport {
    writer: Arc<Mutex<HidDevice>>,
    reader: Arc<Mutex<HidDevice>>,
}

impl HidTransport {
    /// Find and open the first StreamDock 293 on interface 0
    pub fn open() -> Result<Self, TransportError> {
        let api = HidApi::new()?;
        let info = api
            .device_list()
            .find(|d| {
                d.vendor_id() == consts::VENDOR_ID
                    && d.product_id() == consts::PRODUCT_ID
                    && d.interface_number() == consts::INTERFACE
            })
            .ok_or(TransportError::DeviceNotFound)?;
        debug!(path = ?info.path(), "opening device");

        Ok(Self {
            writer: Arc::new(Mutex::new(info.open_device(&api)?)),
            reader: Arc::new(Mutex::new(info.open_device(&api)?)),
        })
    }

    /// Run a blocking hidapi call against one of the handles
    async fn with_device<T, F>(device: &Arc<Mutex<HidDevice>>, f: F) -> Result<T, TransportError>
    where
        T: Send + 'static,
        F: FnOnce(&HidDevice) -> Result<T, TransportError> + Send + 'static,
    {
        let device = Arc::clone(device);
        tokio::task::spawn_blocking(move || {
            let device = device.lock().map_err(|_| TransportError::Disconnected)?;
            f(&device)
        })
        .await
        .map_err(|e| TransportError::Task(e.to_string()))?
    }
}

#[async_trait]
impl Transport for HidTransport {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let mut report = Vec::with_capacity(data.len() + 1);
        report.push(0x00);
        report.extend_from_slice(data);

        Self::with_device(&self.writer, move |device| {
            let written = device.write(&report)?;
            ensure_written(written, report.len())
        })
        .await
    }

    async fn receive(&self, max_len: usize) -> Result<Vec<u8>, TransportError> {
        Self::with_device(&self.reader, move |device| {
            let mut buf = vec![0u8; max_len];
            let len = device.read(&mut buf)?;
            buf.truncate(len);
            Ok(buf)
        })
        .await
    }

    async fn control_transfer(
        &self,
        request: ControlRequest,
    ) -> Result<ControlResponse, TransportError> {
        if request.request_type != GET_REPORT_REQUEST_TYPE || request.request != GET_REPORT {
            return Err(TransportError::Unsupported(
                "only HID GET_REPORT is available through hidapi",
            ));
        }
        let [report_type, report_id] = request.value.to_be_bytes();

        Self::with_device(&self.writer, move |device| {
            // first byte carries the report id in and out
            let mut buf = vec![0u8; request.length as usize + 1];
            buf[0] = report_id;
            let len = match report_type {
                INPUT_REPORT => device.get_input_report(&mut buf)?,
                FEATURE_REPORT => device.get_feature_report(&mut buf)?,
                _ => return Err(TransportError::Unsupported("unknown HID report type")),
            };
            if len == 0 {
                return Ok(ControlResponse::Status(0));
            }
            buf.truncate(len);
            buf.remove(0);
            Ok(ControlResponse::Data(buf))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_write_is_accepted() {
        assert!(ensure_written(518, 518).is_ok());
    }

    #[test]
    fn short_write_is_an_error() {
        assert!(matches!(
            ensure_written(64, 518),
            Err(TransportError::ShortWrite {
                written: 64,
                expected: 518
            })
        ));
    }
}
