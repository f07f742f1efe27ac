//! cpal-backed audio host.
//!
//! `cpal::Stream` is not `Send`, so each open stream lives on its own
//! thread. The thread builds and starts the stream, reports readiness back,
//! then parks until the handle is stopped or dropped, at which point the
//! stream is dropped (closing the device) and the thread exits.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::thread;
use tokio::sync::mpsc;
use tracing::{error, info};

use super::backend::{AudioFrame, AudioHost, CaptureStream, PlaybackStream, StreamSettings};
use crate::error::AudioError;

/// Default input/output devices of the platform host.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalHost;

impl CpalHost {
    pub fn new() -> Self {
        Self
    }
}

impl AudioHost for CpalHost {
    fn open_capture(
        &self,
        settings: StreamSettings,
        sink: mpsc::UnboundedSender<AudioFrame>,
    ) -> Result<Box<dyn CaptureStream>, AudioError> {
        let thread = DeviceThread::spawn("deck-capture", move || build_capture(settings, sink))?;
        Ok(Box::new(CpalStream { _thread: thread }))
    }

    fn open_playback(
        &self,
        samples: Arc<[f32]>,
        sample_rate: u32,
    ) -> Result<Box<dyn PlaybackStream>, AudioError> {
        let thread =
            DeviceThread::spawn("deck-playback", move || build_playback(samples, sample_rate))?;
        Ok(Box::new(CpalStream { _thread: thread }))
    }

    fn name(&self) -> &str {
        "cpal default devices"
    }
}

struct CpalStream {
    _thread: DeviceThread,
}

impl CaptureStream for CpalStream {
    fn stop(self: Box<Self>) {
        // Dropping joins the device thread.
    }
}

impl PlaybackStream for CpalStream {
    fn stop(self: Box<Self>) {}
}

/// Owns the thread that owns a `cpal::Stream`.
struct DeviceThread {
    stop_tx: Option<std_mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl DeviceThread {
    fn spawn<F>(name: &str, build: F) -> Result<Self, AudioError>
    where
        F: FnOnce() -> Result<cpal::Stream, AudioError> + Send + 'static,
    {
        let (ready_tx, ready_rx) = std_mpsc::channel::<Result<(), AudioError>>();
        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || match build() {
                Ok(stream) => {
                    let _ = ready_tx.send(Ok(()));
                    // Returns on stop() or when the sender is dropped.
                    let _ = stop_rx.recv();
                    drop(stream);
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            })
            .map_err(|_| AudioError::DeviceThread)?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                stop_tx: Some(stop_tx),
                handle: Some(handle),
            }),
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(AudioError::DeviceThread)
            }
        }
    }
}

impl Drop for DeviceThread {
    fn drop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn log_stream_error(err: cpal::StreamError) {
    error!("Audio stream error: {}", err);
}

fn build_capture(
    settings: StreamSettings,
    sink: mpsc::UnboundedSender<AudioFrame>,
) -> Result<cpal::Stream, AudioError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or(AudioError::NoDevice("input"))?;
    let default = device.default_input_config()?;

    info!(
        "Capture device: {} ({}Hz, {} device channels -> {} stored)",
        device.name().unwrap_or_default(),
        settings.sample_rate,
        default.channels(),
        settings.channels
    );

    let config = StreamConfig {
        channels: default.channels(),
        sample_rate: cpal::SampleRate(settings.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };
    let channels = config.channels as usize;

    let stream = match default.sample_format() {
        SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| push_frame(data, channels, &sink),
            log_stream_error,
            None,
        )?,
        SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| push_frame(data, channels, &sink),
            log_stream_error,
            None,
        )?,
        other => return Err(AudioError::UnsupportedFormat(format!("{:?}", other))),
    };

    stream.play()?;
    Ok(stream)
}

/// Capture callback body: convert, downmix, enqueue. Never blocks.
fn push_frame<T>(data: &[T], channels: usize, sink: &mpsc::UnboundedSender<AudioFrame>)
where
    T: cpal::Sample,
    f32: cpal::FromSample<T>,
{
    let samples: Vec<f32> = if channels <= 1 {
        data.iter()
            .map(|&s| {
                let v: f32 = cpal::Sample::from_sample(s);
                v
            })
            .collect()
    } else {
        data.chunks_exact(channels)
            .map(|frame| {
                let sum: f32 = frame
                    .iter()
                    .map(|&s| {
                        let v: f32 = cpal::Sample::from_sample(s);
                        v
                    })
                    .sum();
                sum / channels as f32
            })
            .collect()
    };

    // Receiver gone means the session already stopped.
    let _ = sink.send(AudioFrame { samples });
}

fn build_playback(samples: Arc<[f32]>, sample_rate: u32) -> Result<cpal::Stream, AudioError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or(AudioError::NoDevice("output"))?;
    let default = device.default_output_config()?;

    info!(
        "Playback device: {} ({}Hz, {} samples)",
        device.name().unwrap_or_default(),
        sample_rate,
        samples.len()
    );

    let config = StreamConfig {
        channels: default.channels(),
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };
    let channels = config.channels as usize;
    let mut position = 0usize;

    let stream = match default.sample_format() {
        SampleFormat::F32 => device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                fill_output(data, channels, &samples, &mut position)
            },
            log_stream_error,
            None,
        )?,
        SampleFormat::I16 => device.build_output_stream(
            &config,
            move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                fill_output(data, channels, &samples, &mut position)
            },
            log_stream_error,
            None,
        )?,
        other => return Err(AudioError::UnsupportedFormat(format!("{:?}", other))),
    };

    stream.play()?;
    Ok(stream)
}

/// Mono source duplicated to every device channel; silence after the end.
fn fill_output<T>(data: &mut [T], channels: usize, samples: &[f32], position: &mut usize)
where
    T: cpal::Sample + cpal::FromSample<f32>,
{
    for frame in data.chunks_mut(channels.max(1)) {
        let value = samples.get(*position).copied().unwrap_or(0.0);
        if *position < samples.len() {
            *position += 1;
        }
        for out in frame.iter_mut() {
            *out = T::from_sample(value);
        }
    }
}
