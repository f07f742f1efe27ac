// Scripted audio host for driving sessions without a sound card.
#![allow(dead_code)]

use deck_pacer::audio::{
    AudioFrame, AudioHost, CaptureStream, PlaybackStream, StreamSettings,
};
use deck_pacer::error::AudioError;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

pub const RATE: u32 = 8000;

type Sink = Arc<Mutex<Option<mpsc::UnboundedSender<AudioFrame>>>>;

#[derive(Default)]
pub struct ScriptedHost {
    sink: Sink,
    pub fail_open: AtomicBool,
    pub captures_opened: AtomicUsize,
    pub playbacks_opened: AtomicUsize,
    pub playbacks_stopped: Arc<AtomicUsize>,
    pub last_playback_len: AtomicUsize,
    /// How long closing a playback stream blocks, like joining a device thread
    pub playback_stop_ms: AtomicU64,
}

impl ScriptedHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Deliver a buffer the way a device callback would. False when no
    /// capture stream is open.
    pub fn push(&self, samples: Vec<f32>) -> bool {
        match self.sink.lock().unwrap().as_ref() {
            Some(tx) => tx.send(AudioFrame { samples }).is_ok(),
            None => false,
        }
    }

    pub fn capture_open(&self) -> bool {
        self.sink.lock().unwrap().is_some()
    }

    pub fn stopped(&self) -> usize {
        self.playbacks_stopped.load(Ordering::SeqCst)
    }
}

struct ScriptedCapture {
    sink: Sink,
}

impl CaptureStream for ScriptedCapture {
    fn stop(self: Box<Self>) {
        self.sink.lock().unwrap().take();
    }
}

struct ScriptedPlayback {
    stopped: Arc<AtomicUsize>,
    stop_delay: Duration,
}

impl PlaybackStream for ScriptedPlayback {
    fn stop(self: Box<Self>) {
        std::thread::sleep(self.stop_delay);
        self.stopped.fetch_add(1, Ordering::SeqCst);
    }
}

impl AudioHost for ScriptedHost {
    fn open_capture(
        &self,
        _settings: StreamSettings,
        sink: mpsc::UnboundedSender<AudioFrame>,
    ) -> Result<Box<dyn CaptureStream>, AudioError> {
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(AudioError::NoDevice("input"));
        }
        self.captures_opened.fetch_add(1, Ordering::SeqCst);
        *self.sink.lock().unwrap() = Some(sink);
        Ok(Box::new(ScriptedCapture {
            sink: Arc::clone(&self.sink),
        }))
    }

    fn open_playback(
        &self,
        samples: Arc<[f32]>,
        _sample_rate: u32,
    ) -> Result<Box<dyn PlaybackStream>, AudioError> {
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(AudioError::NoDevice("output"));
        }
        self.playbacks_opened.fetch_add(1, Ordering::SeqCst);
        self.last_playback_len.store(samples.len(), Ordering::SeqCst);
        Ok(Box::new(ScriptedPlayback {
            stopped: Arc::clone(&self.playbacks_stopped),
            stop_delay: Duration::from_millis(self.playback_stop_ms.load(Ordering::SeqCst)),
        }))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub fn settings() -> StreamSettings {
    StreamSettings {
        sample_rate: RATE,
        channels: 1,
    }
}

/// `seconds` of a 440 Hz sine at [`RATE`].
pub fn tone(seconds: f64) -> Vec<f32> {
    let len = (seconds * RATE as f64).round() as usize;
    (0..len)
        .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / RATE as f32).sin())
        .collect()
}
