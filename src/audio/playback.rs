use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample, StreamConfig};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use super::source::BYTES_PER_SAMPLE;
use crate::error::SinkError;

/// Accepts the raw PCM bytes read from the source for playback.
pub trait BlockSink {
    fn write(&mut self, pcm: &[u8]) -> Result<(), SinkError>;
}

/// Queue shared between the frame loop and the output callback.
struct SharedQueue {
    samples: Mutex<VecDeque<f32>>,
    drained: Condvar,
    closed: AtomicBool,
    capacity: usize,
}

/// Plays interleaved i16 PCM on the default output device.
///
/// `write` blocks while the queue already holds more than ~200ms of audio,
/// which keeps the frame loop in step with playback.
pub struct DeviceSink {
    // Dropping the stream stops playback and releases the device.
    _stream: cpal::Stream,
    queue: Arc<SharedQueue>,
}

impl DeviceSink {
    pub fn open(sample_rate: u32, channels: u16) -> Result<Self, SinkError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(SinkError::NoDevice)?;
        let default_config = device
            .default_output_config()
            .map_err(|e| SinkError::Device(e.to_string()))?;

        let config = StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let queue = Arc::new(SharedQueue {
            samples: Mutex::new(VecDeque::new()),
            drained: Condvar::new(),
            closed: AtomicBool::new(false),
            capacity: (sample_rate as usize * channels.max(1) as usize / 5).max(1),
        });

        let stream = match default_config.sample_format() {
            SampleFormat::I16 => build_stream::<i16>(&device, &config, queue.clone())?,
            SampleFormat::U16 => build_stream::<u16>(&device, &config, queue.clone())?,
            _ => build_stream::<f32>(&device, &config, queue.clone())?,
        };
        stream.play().map_err(|e| SinkError::Device(e.to_string()))?;

        log::debug!(
            "Output stream: {}Hz, {} channel(s), {:?}",
            sample_rate,
            channels,
            default_config.sample_format()
        );

        Ok(Self {
            _stream: stream,
            queue,
        })
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    queue: Arc<SharedQueue>,
) -> Result<cpal::Stream, SinkError>
where
    T: SizedSample + FromSample<f32> + Send + 'static,
{
    let data_queue = queue.clone();
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                if let Ok(mut samples) = data_queue.samples.lock() {
                    for slot in data.iter_mut() {
                        *slot = cpal::Sample::from_sample(samples.pop_front().unwrap_or(0.0));
                    }
                }
                data_queue.drained.notify_all();
            },
            move |err| {
                log::error!("Audio output stream error: {}", err);
                queue.closed.store(true, Ordering::Release);
                queue.drained.notify_all();
            },
            None,
        )
        .map_err(|e| SinkError::Device(e.to_string()))
}

impl BlockSink for DeviceSink {
    fn write(&mut self, pcm: &[u8]) -> Result<(), SinkError> {
        let incoming: Vec<f32> = pcm
            .chunks_exact(BYTES_PER_SAMPLE)
            .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / 32768.0)
            .collect();

        let queue = &self.queue;
        let mut samples = queue.samples.lock().map_err(|_| SinkError::Closed)?;
        while !samples.is_empty() && samples.len() + incoming.len() > queue.capacity {
            if queue.closed.load(Ordering::Acquire) {
                return Err(SinkError::Closed);
            }
            let (guard, _) = queue
                .drained
                .wait_timeout(samples, Duration::from_millis(100))
                .map_err(|_| SinkError::Closed)?;
            samples = guard;
        }
        samples.extend(incoming);
        Ok(())
    }
}

/// Discards audio. Used for headless rendering.
pub struct NullSink;

impl BlockSink for NullSink {
    fn write(&mut self, _pcm: &[u8]) -> Result<(), SinkError> {
        Ok(())
    }
}
