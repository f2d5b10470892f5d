//! Packet framing and exclusive transmission.

use std::sync::Arc;

use dock_sync_core::{Transport, TransportError};
use tokio::sync::Mutex;
use tracing::trace;

use crate::abi::CMD_PREFIX;

/// Payload bytes carried by every packet
pub const PACKET_SIZE: usize = 512;

/// Build one packet: `prefix` followed by `payload`, zero padded to [`PACKET_SIZE`].
/// Payloads longer than a packet are passed through untouched.
pub fn frame(payload: &[u8], prefix: &[u8]) -> Vec<u8> {
    let mut packet = Vec::with_capacity(prefix.len() + payload.len().max(PACKET_SIZE));
    packet.extend_from_slice(prefix);
    packet.extend_from_slice(payload);
    if payload.len() < PACKET_SIZE {
        packet.resize(prefix.len() + PACKET_SIZE, 0);
    }
    packet
}

/// Serializes every outbound packet for a device.
///
/// Only one packet is ever in flight. Waiters are served in arrival order, and
/// the lock is held by a guard so it is released when the write fails or the
/// sending future is dropped.
pub struct Serializer {
    transport: Arc<dyn Transport>,
    lock: Mutex<()>,
}

impl Serializer {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            lock: Mutex::new(()),
        }
    }

    /// Frame and write a single packet
    pub async fn send(&self, payload: &[u8], prefix: &[u8]) -> Result<(), TransportError> {
        let _guard = self.lock.lock().await;
        let packet = frame(payload, prefix);
        trace!(len = packet.len(), prefixed = !prefix.is_empty(), "sending packet");
        self.transport.send(&packet).await
    }

    /// Write a control command behind the standard prefix
    #[inline(always)]
    pub async fn send_command(&self, command: &[u8]) -> Result<(), TransportError> {
        self.send(command, &CMD_PREFIX).await
    }

    /// Write a bulk buffer as consecutive unprefixed packets. The last chunk is
    /// padded by [`frame`]. Stops at the first failed chunk.
    pub async fn send_chunked(&self, data: &[u8]) -> Result<(), TransportError> {
        for chunk in data.chunks(PACKET_SIZE) {
            self.send(chunk, &[]).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::testing::RecordingTransport;

    #[test]
    fn short_payload_is_zero_padded() {
        let packet = frame(&[1, 2, 3], &CMD_PREFIX);
        assert_eq!(packet.len(), 517);
        assert_eq!(&packet[..5], &CMD_PREFIX);
        assert_eq!(&packet[5..8], &[1, 2, 3]);
        assert!(packet[8..].iter().all(|b| *b == 0));
    }

    #[test]
    fn chunk_packets_have_no_prefix() {
        let packet = frame(&[0xAA; 176], &[]);
        assert_eq!(packet.len(), PACKET_SIZE);
        assert!(packet[..176].iter().all(|b| *b == 0xAA));
        assert!(packet[176..].iter().all(|b| *b == 0));
    }

    #[test]
    fn full_payload_is_not_padded() {
        let packet = frame(&[7; PACKET_SIZE], &CMD_PREFIX);
        assert_eq!(packet.len(), 5 + PACKET_SIZE);
    }

    #[tokio::test]
    async fn chunking_splits_in_order() {
        let transport = Arc::new(RecordingTransport::default());
        let serializer = Serializer::new(transport.clone());
        let data: Vec<u8> = (0..1200u32).map(|i| (i % 251) as u8).collect();

        serializer.send_chunked(&data).await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 3);
        assert!(sent.iter().all(|p| p.len() == PACKET_SIZE));
        assert_eq!(&sent[0][..], &data[..512]);
        assert_eq!(&sent[1][..], &data[512..1024]);
        assert_eq!(&sent[2][..176], &data[1024..]);
        assert!(sent[2][176..].iter().all(|b| *b == 0));
    }

    #[tokio::test]
    async fn failed_send_releases_lock() {
        let transport = Arc::new(RecordingTransport::default());
        transport.fail_next_send();
        let serializer = Serializer::new(transport.clone());

        assert!(serializer.send_command(b"DIS\0\0").await.is_err());
        tokio::time::timeout(Duration::from_secs(1), serializer.send_command(b"STP\0\0"))
            .await
            .expect("serializer deadlocked after a failed send")
            .unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(&sent[0][5..8], b"STP");
    }

    #[tokio::test]
    async fn concurrent_sends_are_serialized_in_arrival_order() {
        let transport = Arc::new(RecordingTransport::gated());
        let serializer = Arc::new(Serializer::new(transport.clone()));

        let mut handles = Vec::new();
        for tag in [b'A', b'B', b'C'] {
            let serializer = serializer.clone();
            handles.push(tokio::spawn(async move {
                serializer.send(&[tag; 600], &[]).await
            }));
            // let the task reach the lock before the next one is spawned
            for _ in 0..4 {
                tokio::task::yield_now().await;
            }
        }
        transport.open_gate();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let order: Vec<u8> = transport.sent().iter().map(|p| p[0]).collect();
        assert_eq!(order, b"ABC");
        assert_eq!(transport.max_in_flight(), 1);
        // each packet is written whole
        for packet in transport.sent() {
            assert_eq!(packet.len(), 600);
            assert!(packet.iter().all(|b| *b == packet[0]));
        }
    }
}
