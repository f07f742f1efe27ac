use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::AudioError;

/// Captured audio handed from the device callback to the control thread
/// (mono f32).
#[derive(Debug, Clone)]
pub struct AudioFrame {
    pub samples: Vec<f32>,
}

/// Fixed stream format for the deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSettings {
    pub sample_rate: u32,
    /// 1 = mono. Segments are always stored mono; devices with more channels
    /// are downmixed in the callback.
    pub channels: u16,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 1,
        }
    }
}

/// A live capture stream. Dropping or stopping it closes the device.
pub trait CaptureStream {
    /// Halt and release the stream synchronously. After this returns the
    /// frame sender held by the callback has been dropped.
    fn stop(self: Box<Self>);
}

/// A live, non-blocking playback stream.
pub trait PlaybackStream: Send {
    fn stop(self: Box<Self>);
}

/// Audio transport seam.
///
/// - Device: cpal default input/output devices (`CpalHost`)
/// - Tests: scripted in-memory host
pub trait AudioHost: Send + Sync {
    /// Open and start a capture stream. The callback must only enqueue into
    /// `sink`; it never blocks.
    fn open_capture(
        &self,
        settings: StreamSettings,
        sink: mpsc::UnboundedSender<AudioFrame>,
    ) -> Result<Box<dyn CaptureStream>, AudioError>;

    /// Open and start playing `samples` once. Returns immediately.
    fn open_playback(
        &self,
        samples: Arc<[f32]>,
        sample_rate: u32,
    ) -> Result<Box<dyn PlaybackStream>, AudioError>;

    /// Name for logging
    fn name(&self) -> &str;
}
