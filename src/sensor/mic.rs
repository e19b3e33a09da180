//! Microphone sensor adapter over CPAL.
//!
//! A headless host has no camera capability, so this adapter exposes an
//! audio-only stream: the session degrades to sound-triggered capture and
//! the recorder chunks raw PCM. Device enumeration, per-format sample
//! conversion, and mono downmix follow the platform conventions cpal
//! exposes.

use super::{ChunkRecorder, MediaStream, RecorderState, SensorHost, StreamRequest, VideoFrame};
use crate::audio::FrameDispatcher;
use crate::buffer::{MediaSlice, SliceSink};
use crate::errors::{AcquireError, RecorderError};
use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Dispatch frame length. Short enough that the detection loop sees fresh
/// audio every tick at typical frame rates.
const DISPATCH_FRAME_MS: u64 = 20;

/// Microphone-only media host.
pub struct MicHost {
    preferred_device: Option<String>,
    channel_capacity: usize,
}

impl MicHost {
    pub fn new(preferred_device: Option<&str>, channel_capacity: usize) -> Self {
        Self {
            preferred_device: preferred_device.map(str::to_string),
            channel_capacity: channel_capacity.max(1),
        }
    }

    /// List input device names so the CLI can expose a selector.
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices = host.input_devices().context("no input devices available")?;
        let mut names = Vec::new();
        for device in devices {
            if let Ok(name) = device.name() {
                names.push(name);
            }
        }
        Ok(names)
    }

    fn find_device(&self) -> Result<cpal::Device, AcquireError> {
        let host = cpal::default_host();
        match &self.preferred_device {
            Some(name) => {
                let mut devices = host
                    .input_devices()
                    .map_err(|err| classify(&err.to_string()))?;
                devices
                    .find(|d| d.name().map(|n| &n == name).unwrap_or(false))
                    .ok_or_else(|| {
                        AcquireError::DeviceNotFound(format!("input device '{name}' not found"))
                    })
            }
            None => host.default_input_device().ok_or_else(|| {
                AcquireError::DeviceNotFound("no default input device available".to_string())
            }),
        }
    }
}

impl SensorHost for MicHost {
    fn acquire(&mut self, request: &StreamRequest) -> Result<Box<dyn MediaStream>, AcquireError> {
        if !request.audio {
            return Err(AcquireError::DeviceNotFound(
                "this host has no camera capability; audio is required".to_string(),
            ));
        }
        debug!(facing = request.facing.label(), "facing mode ignored by microphone adapter");

        let device = self.find_device()?;
        let device_name = device
            .name()
            .unwrap_or_else(|_| "unknown input device".to_string());
        let default_config = device
            .default_input_config()
            .map_err(|err| classify(&err.to_string()))?;
        let format = default_config.sample_format();
        let device_config: StreamConfig = default_config.into();
        let sample_rate = device_config.sample_rate.0;
        let channels = usize::from(device_config.channels.max(1));
        debug!(
            device = %device_name,
            ?format,
            sample_rate,
            channels,
            "acquiring microphone stream"
        );

        let frame_samples = ((u64::from(sample_rate) * DISPATCH_FRAME_MS) / 1000).max(1) as usize;
        let (detector_tx, detector_rx) = bounded::<Vec<f32>>(self.channel_capacity);
        let (recorder_tx, recorder_rx) = bounded::<Vec<f32>>(self.channel_capacity);
        let dropped = Arc::new(AtomicUsize::new(0));
        let dispatcher = Arc::new(Mutex::new(FrameDispatcher::new(
            frame_samples,
            vec![detector_tx, recorder_tx],
            dropped.clone(),
        )));

        let err_fn = |err| warn!(error = %err, "audio stream error");
        let stream = match format {
            SampleFormat::F32 => {
                let dispatcher = dispatcher.clone();
                let dropped = dropped.clone();
                device.build_input_stream(
                    &device_config,
                    move |data: &[f32], _| {
                        if let Ok(mut pump) = dispatcher.try_lock() {
                            pump.push(data, channels, |sample| sample);
                        } else {
                            dropped.fetch_add(1, Ordering::Relaxed);
                        }
                    },
                    err_fn,
                    None,
                )
            }
            SampleFormat::I16 => {
                let dispatcher = dispatcher.clone();
                let dropped = dropped.clone();
                device.build_input_stream(
                    &device_config,
                    move |data: &[i16], _| {
                        if let Ok(mut pump) = dispatcher.try_lock() {
                            pump.push(data, channels, |sample| sample as f32 / 32_768.0);
                        } else {
                            dropped.fetch_add(1, Ordering::Relaxed);
                        }
                    },
                    err_fn,
                    None,
                )
            }
            SampleFormat::U16 => {
                let dispatcher = dispatcher.clone();
                let dropped = dropped.clone();
                device.build_input_stream(
                    &device_config,
                    move |data: &[u16], _| {
                        if let Ok(mut pump) = dispatcher.try_lock() {
                            pump.push(data, channels, |sample| {
                                (sample as f32 - 32_768.0) / 32_768.0
                            });
                        } else {
                            dropped.fetch_add(1, Ordering::Relaxed);
                        }
                    },
                    err_fn,
                    None,
                )
            }
            other => {
                return Err(AcquireError::DeviceNotFound(format!(
                    "'{device_name}' offers no usable input: unsupported sample format {other:?}"
                )))
            }
        }
        .map_err(|err| classify(&err.to_string()))?;

        stream.play().map_err(|err| classify(&err.to_string()))?;

        Ok(Box::new(MicStream {
            stream: Some(stream),
            detector_rx,
            recorder_rx,
            dropped,
            sample_rate,
        }))
    }
}

/// Map a cpal error message onto the acquisition taxonomy.
fn classify(message: &str) -> AcquireError {
    let lower = message.to_lowercase();
    if lower.contains("permission") || lower.contains("denied") || lower.contains("access") {
        AcquireError::PermissionDenied(message.to_string())
    } else if lower.contains("busy") || lower.contains("in use") || lower.contains("unavailable") {
        AcquireError::DeviceBusy(message.to_string())
    } else {
        AcquireError::DeviceNotFound(message.to_string())
    }
}

/// Live microphone stream: one audio track, no camera track.
pub struct MicStream {
    stream: Option<cpal::Stream>,
    detector_rx: Receiver<Vec<f32>>,
    recorder_rx: Receiver<Vec<f32>>,
    dropped: Arc<AtomicUsize>,
    sample_rate: u32,
}

impl MediaStream for MicStream {
    fn release(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(err) = stream.pause() {
                debug!(error = %err, "failed to pause audio stream on release");
            }
            drop(stream);
        }
    }

    fn live_track_count(&self) -> usize {
        usize::from(self.stream.is_some())
    }

    fn audio_frames(&self) -> Option<Receiver<Vec<f32>>> {
        Some(self.detector_rx.clone())
    }

    fn video_frame(&mut self) -> Option<VideoFrame> {
        None
    }

    fn recorder(&mut self) -> Result<Box<dyn ChunkRecorder>, RecorderError> {
        Ok(Box::new(PcmChunkRecorder::new(
            self.recorder_rx.clone(),
            self.sample_rate,
        )))
    }

    fn frames_dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Drop for MicStream {
    fn drop(&mut self) {
        self.release();
    }
}

/// Chunk recorder over the mono PCM stream. Slices the stream into
/// interval-sized chunks on a worker thread and appends them to the sink.
pub struct PcmChunkRecorder {
    frames: Receiver<Vec<f32>>,
    sample_rate: u32,
    mime: String,
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl PcmChunkRecorder {
    pub fn new(frames: Receiver<Vec<f32>>, sample_rate: u32) -> Self {
        Self {
            frames,
            sample_rate,
            mime: format!("audio/pcm;rate={sample_rate};encoding=float32le"),
            stop: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }
}

impl ChunkRecorder for PcmChunkRecorder {
    fn start(&mut self, interval: Duration, sink: SliceSink) -> Result<(), RecorderError> {
        if self.handle.is_some() {
            return Err(RecorderError::AlreadyRecording);
        }
        self.stop.store(false, Ordering::Relaxed);

        let frames = self.frames.clone();
        let stop = self.stop.clone();
        let slice_samples =
            ((u64::from(self.sample_rate) * interval.as_millis() as u64) / 1000).max(1) as usize;
        let handle = thread::spawn(move || {
            let mut pending: Vec<f32> = Vec::with_capacity(slice_samples);
            loop {
                if stop.load(Ordering::Relaxed) {
                    if !pending.is_empty() {
                        sink.append(MediaSlice::new(encode_f32le(&pending)));
                    }
                    break;
                }
                match frames.recv_timeout(Duration::from_millis(50)) {
                    Ok(frame) => {
                        pending.extend(frame);
                        while pending.len() >= slice_samples {
                            let chunk: Vec<f32> = pending.drain(..slice_samples).collect();
                            sink.append(MediaSlice::new(encode_f32le(&chunk)));
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        });
        self.handle = Some(handle);
        Ok(())
    }

    fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    fn state(&self) -> RecorderState {
        if self.handle.is_some() {
            RecorderState::Recording
        } else {
            RecorderState::Inactive
        }
    }

    fn mime_type(&self) -> &str {
        &self.mime
    }
}

fn encode_f32le(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 4);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::RollingBuffer;
    use crossbeam_channel::unbounded;

    #[test]
    fn classify_splits_the_taxonomy() {
        assert_eq!(classify("Permission denied by user").label(), "permission_denied");
        assert_eq!(classify("device busy").label(), "device_busy");
        assert_eq!(classify("the device is unavailable").label(), "device_busy");
        assert_eq!(classify("something else").label(), "device_not_found");
    }

    #[test]
    fn pcm_recorder_slices_frames_into_chunks() {
        let (tx, rx) = unbounded::<Vec<f32>>();
        // 1 kHz "rate" so a 500 ms slice is 500 samples.
        let mut recorder = PcmChunkRecorder::new(rx, 1_000);
        let buffer = Arc::new(Mutex::new(RollingBuffer::new(10)));
        recorder
            .start(Duration::from_millis(500), SliceSink::new(buffer.clone()))
            .unwrap();
        assert_eq!(recorder.state(), RecorderState::Recording);

        tx.send(vec![0.5f32; 1_250]).unwrap();
        // Give the worker a moment to slice, then flush the remainder.
        thread::sleep(Duration::from_millis(100));
        recorder.stop();
        assert_eq!(recorder.state(), RecorderState::Inactive);

        let mut buffer = buffer.lock().unwrap();
        let slices = buffer.take_slices();
        assert_eq!(slices.len(), 3);
        assert_eq!(slices[0].bytes.len(), 500 * 4);
        assert_eq!(slices[1].bytes.len(), 500 * 4);
        assert_eq!(slices[2].bytes.len(), 250 * 4);
    }

    #[test]
    fn starting_twice_is_rejected() {
        let (_tx, rx) = unbounded::<Vec<f32>>();
        let mut recorder = PcmChunkRecorder::new(rx, 1_000);
        let buffer = Arc::new(Mutex::new(RollingBuffer::new(4)));
        recorder
            .start(Duration::from_millis(100), SliceSink::new(buffer.clone()))
            .unwrap();
        let second = recorder.start(Duration::from_millis(100), SliceSink::new(buffer));
        assert!(matches!(second, Err(RecorderError::AlreadyRecording)));
        recorder.stop();
    }

    #[test]
    fn mime_type_reports_negotiated_rate() {
        let (_tx, rx) = unbounded::<Vec<f32>>();
        let recorder = PcmChunkRecorder::new(rx, 48_000);
        assert_eq!(recorder.mime_type(), "audio/pcm;rate=48000;encoding=float32le");
    }
}
