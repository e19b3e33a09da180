use crossbeam_channel::{Sender, TrySendError};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

/// Downmix multi-channel input to mono while applying the provided converter
/// so the analysis path sees a single channel regardless of microphone
/// layout.
pub fn append_downmixed_samples<T, F>(buf: &mut Vec<f32>, data: &[T], channels: usize, mut convert: F)
where
    T: Copy,
    F: FnMut(T) -> f32,
{
    if channels <= 1 {
        buf.extend(data.iter().copied().map(&mut convert));
        return;
    }

    // Average each interleaved frame to produce a mono representation.
    let mut acc = 0.0f32;
    let mut count = 0usize;
    for sample in data.iter().copied() {
        acc += convert(sample);
        count += 1;
        if count == channels {
            buf.push(acc / channels as f32);
            acc = 0.0;
            count = 0;
        }
    }
    if count > 0 {
        buf.push(acc / count as f32);
    }
}

/// Runs on the capture callback thread: accumulates mono samples and fans
/// out fixed-size frames to every consumer (impact detector, recorder).
/// A full channel drops the frame for that consumer and bumps the counter;
/// the callback never blocks.
pub struct FrameDispatcher {
    frame_samples: usize,
    pending: Vec<f32>,
    scratch: Vec<f32>,
    senders: Vec<Sender<Vec<f32>>>,
    dropped: Arc<AtomicUsize>,
}

impl FrameDispatcher {
    pub fn new(
        frame_samples: usize,
        senders: Vec<Sender<Vec<f32>>>,
        dropped: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            frame_samples: frame_samples.max(1),
            pending: Vec::with_capacity(frame_samples),
            scratch: Vec::new(),
            senders,
            dropped,
        }
    }

    pub fn push<T, F>(&mut self, data: &[T], channels: usize, convert: F)
    where
        T: Copy,
        F: FnMut(T) -> f32,
    {
        self.scratch.clear();
        append_downmixed_samples(&mut self.scratch, data, channels, convert);
        self.pending.extend_from_slice(&self.scratch);

        while self.pending.len() >= self.frame_samples {
            let frame: Vec<f32> = self.pending.drain(..self.frame_samples).collect();
            for sender in &self.senders {
                if let Err(TrySendError::Full(_)) = sender.try_send(frame.clone()) {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }
}
