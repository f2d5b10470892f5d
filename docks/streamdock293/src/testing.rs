//! In-memory transport used by the unit tests.

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use dock_sync_core::{ControlRequest, ControlResponse, Transport, TransportError};
use image::{ImageFormat, Rgb, RgbImage};
use tokio::sync::Semaphore;

/// PNG with the left half red and the right half blue
pub fn split_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgb([255, 0, 0])
        } else {
            Rgb([0, 0, 255])
        }
    });
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

/// Records every packet written and replays queued reports
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<Vec<u8>>>,
    reports: Mutex<VecDeque<Vec<u8>>>,
    control: Mutex<Vec<ControlRequest>>,
    control_response: Mutex<Option<ControlResponse>>,
    fail_next: AtomicBool,
    gate: Option<Semaphore>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingTransport {
    /// Every send blocks until [`Self::open_gate`] is called
    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Default::default()
        }
    }

    pub fn open_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn fail_next_send(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn push_report(&self, report: Vec<u8>) {
        self.reports.lock().unwrap().push_back(report);
    }

    pub fn set_control_response(&self, response: ControlResponse) {
        *self.control_response.lock().unwrap() = Some(response);
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap().clone()
    }

    pub fn control_requests(&self) -> Vec<ControlRequest> {
        self.control.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.map_err(|_| TransportError::Disconnected)?;
            tokio::task::yield_now().await;
        }

        let result = if self.fail_next.swap(false, Ordering::SeqCst) {
            Err(TransportError::Disconnected)
        } else {
            self.sent.lock().unwrap().push(data.to_vec());
            Ok(())
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn receive(&self, max_len: usize) -> Result<Vec<u8>, TransportError> {
        let mut report = self
            .reports
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(TransportError::Disconnected)?;
        report.truncate(max_len);
        Ok(report)
    }

    async fn control_transfer(
        &self,
        request: ControlRequest,
    ) -> Result<ControlResponse, TransportError> {
        self.control.lock().unwrap().push(request);
        self.control_response
            .lock()
            .unwrap()
            .clone()
            .ok_or(TransportError::Disconnected)
    }
}
