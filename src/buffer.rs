//! Rolling capture buffer: a bounded FIFO of recent media slices.
//!
//! The recorder appends fixed-duration slices on its own timer while the
//! session is armed; keeping only the most recent window means the swing that
//! preceded the impact sound is still available when capture stops.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One recorder chunk. Opaque bytes in whatever container the recorder
/// negotiated at start time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSlice {
    pub bytes: Vec<u8>,
}

impl MediaSlice {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

/// Bounded FIFO of the most recent media slices.
///
/// Appends past the cap evict the oldest slice. Once frozen the buffer
/// rejects further appends; the finalizer then consumes the slices exactly
/// once via [`RollingBuffer::take_slices`].
#[derive(Debug)]
pub struct RollingBuffer {
    slices: VecDeque<MediaSlice>,
    max_slices: usize,
    frozen: bool,
}

impl RollingBuffer {
    pub fn new(max_slices: usize) -> Self {
        Self {
            slices: VecDeque::with_capacity(max_slices.max(1)),
            max_slices: max_slices.max(1),
            frozen: false,
        }
    }

    /// Append a slice, evicting the oldest if the cap is reached. No-op once
    /// frozen (the recorder thread may still deliver a chunk that raced the
    /// freeze).
    pub fn append(&mut self, slice: MediaSlice) {
        if self.frozen {
            return;
        }
        if self.slices.len() == self.max_slices {
            self.slices.pop_front();
        }
        self.slices.push_back(slice);
    }

    /// Stop accepting new slices.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Drain the retained slices in arrival order. The buffer is left empty
    /// and frozen, so a second call yields nothing.
    pub fn take_slices(&mut self) -> Vec<MediaSlice> {
        self.frozen = true;
        self.slices.drain(..).collect()
    }
}

/// Cloneable append handle given to the recorder. Appends and evictions run
/// under one lock so a chunk-timer append cannot interleave with an eviction
/// from the detection side.
#[derive(Clone)]
pub struct SliceSink {
    buffer: Arc<Mutex<RollingBuffer>>,
}

impl SliceSink {
    pub fn new(buffer: Arc<Mutex<RollingBuffer>>) -> Self {
        Self { buffer }
    }

    pub fn append(&self, slice: MediaSlice) {
        let mut buffer = self
            .buffer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        buffer.append(slice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slice(tag: u8) -> MediaSlice {
        MediaSlice::new(vec![tag])
    }

    #[test]
    fn append_below_cap_keeps_everything() {
        let mut buffer = RollingBuffer::new(4);
        for tag in 0..3 {
            buffer.append(slice(tag));
        }
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn over_cap_evicts_oldest_first() {
        let mut buffer = RollingBuffer::new(3);
        for tag in 0..7 {
            buffer.append(slice(tag));
        }
        assert_eq!(buffer.len(), 3);
        let kept = buffer.take_slices();
        let tags: Vec<u8> = kept.iter().map(|s| s.bytes[0]).collect();
        assert_eq!(tags, vec![4, 5, 6]);
    }

    #[test]
    fn length_never_exceeds_cap() {
        let mut buffer = RollingBuffer::new(10);
        for tag in 0..200 {
            buffer.append(slice(tag as u8));
            assert!(buffer.len() <= 10);
        }
    }

    #[test]
    fn frozen_buffer_rejects_appends() {
        let mut buffer = RollingBuffer::new(4);
        buffer.append(slice(1));
        buffer.freeze();
        buffer.append(slice(2));
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn take_slices_consumes_once() {
        let mut buffer = RollingBuffer::new(4);
        buffer.append(slice(1));
        buffer.append(slice(2));
        let first = buffer.take_slices();
        assert_eq!(first.len(), 2);
        assert!(buffer.take_slices().is_empty());
        assert!(buffer.is_frozen());
    }

    #[test]
    fn sink_appends_through_shared_lock() {
        let shared = Arc::new(Mutex::new(RollingBuffer::new(2)));
        let sink = SliceSink::new(shared.clone());
        sink.append(slice(1));
        sink.append(slice(2));
        sink.append(slice(3));
        let mut buffer = shared.lock().unwrap();
        let tags: Vec<u8> = buffer.take_slices().iter().map(|s| s.bytes[0]).collect();
        assert_eq!(tags, vec![2, 3]);
    }
}
