use std::sync::{Arc, Mutex};

use crate::stream::data::FramePacket;

/// Single-slot latest-wins frame buffer shared between the capture worker
/// and every streaming connection.
///
/// A `set_latest` overwrites any unread value; there is no queue and no
/// per-consumer backpressure. The lock is held only for the copy in or out,
/// never across encoding or camera I/O.
#[derive(Clone, Default)]
pub(crate) struct FrameStore {
    inner: Arc<Mutex<Option<FramePacket>>>,
}

impl FrameStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_latest(&self, packet: FramePacket) {
        if let Ok(mut guard) = self.inner.lock() {
            *guard = Some(packet);
        }
    }

    /// Most recently published packet, or `None` before the first publish.
    pub(crate) fn get_latest(&self) -> Option<FramePacket> {
        match self.inner.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(frame_number: u64) -> FramePacket {
        FramePacket {
            jpeg: vec![frame_number as u8],
            finger_count: 0,
            hand_detected: false,
            timestamp_ms: 0,
            frame_number,
            fps: 0.0,
        }
    }

    #[test]
    fn empty_store_returns_none() {
        assert!(FrameStore::new().get_latest().is_none());
    }

    #[test]
    fn latest_write_wins() {
        let store = FrameStore::new();
        store.set_latest(packet(1));
        store.set_latest(packet(2));
        let latest = store.get_latest().unwrap();
        assert_eq!(latest.frame_number, 2);
        // Reads are non-destructive.
        assert_eq!(store.get_latest().unwrap().frame_number, 2);
    }

    #[test]
    fn handles_are_views_of_the_same_slot() {
        let producer = FrameStore::new();
        let consumer = producer.clone();
        producer.set_latest(packet(7));
        assert_eq!(consumer.get_latest().unwrap().frame_number, 7);
    }
}
