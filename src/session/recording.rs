use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::stats::{CaptureStats, SavedTake};
use crate::audio::{AudioFrame, AudioHost, CaptureStream, StreamSettings};
use crate::error::{AudioError, StoreError};
use crate::store::SegmentStore;

/// `Idle -> Capturing -> Idle`. At most one capture is live; a second
/// `start` while capturing is ignored.
pub struct RecordingSession {
    host: Arc<dyn AudioHost>,
    settings: StreamSettings,
    active: Option<ActiveCapture>,
}

struct ActiveCapture {
    segment: u32,
    stream: Box<dyn CaptureStream>,
    queue: mpsc::UnboundedReceiver<AudioFrame>,
    buffers: Vec<Vec<f32>>,
    samples: usize,
    started: Instant,
    started_at: chrono::DateTime<Utc>,
}

impl ActiveCapture {
    /// Append everything queued so far, in arrival order.
    fn drain(&mut self) {
        while let Ok(frame) = self.queue.try_recv() {
            self.samples += frame.samples.len();
            self.buffers.push(frame.samples);
        }
    }

    fn stats(&self) -> CaptureStats {
        CaptureStats {
            segment: self.segment,
            started_at: self.started_at,
            elapsed_secs: self.started.elapsed().as_secs_f64(),
            buffers: self.buffers.len(),
            samples: self.samples,
        }
    }
}

impl RecordingSession {
    pub fn new(host: Arc<dyn AudioHost>, settings: StreamSettings) -> Self {
        Self {
            host,
            settings,
            active: None,
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_segment(&self) -> Option<u32> {
        self.active.as_ref().map(|a| a.segment)
    }

    /// Open the capture stream for `segment`.
    ///
    /// Returns `Ok(false)` without side effects when already capturing or no
    /// segment is given. On device failure the session stays idle.
    pub fn start(&mut self, segment: Option<u32>) -> Result<bool, AudioError> {
        if self.active.is_some() {
            debug!("Recording already active, ignoring start");
            return Ok(false);
        }
        let Some(segment) = segment else {
            return Ok(false);
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let stream = self.host.open_capture(self.settings, tx)?;

        info!(
            segment,
            "Recording started on {} ({}Hz)",
            self.host.name(),
            self.settings.sample_rate
        );

        self.active = Some(ActiveCapture {
            segment,
            stream,
            queue: rx,
            buffers: Vec::new(),
            samples: 0,
            started: Instant::now(),
            started_at: Utc::now(),
        });
        Ok(true)
    }

    /// Progress tick: drain the queue and report elapsed time. `None` when
    /// idle, which also ends the tick schedule.
    pub fn tick(&mut self) -> Option<CaptureStats> {
        let active = self.active.as_mut()?;
        active.drain();
        Some(active.stats())
    }

    /// Close the stream, drain what is left and, if anything was captured,
    /// persist it as the segment's original (invalidating its derivative).
    ///
    /// A no-op returning `Ok(None)` when idle. The session is idle afterwards
    /// even if persisting fails.
    pub fn stop(&mut self, store: &mut SegmentStore) -> Result<Option<SavedTake>, StoreError> {
        let Some(active) = self.active.take() else {
            return Ok(None);
        };

        let ActiveCapture {
            segment,
            stream,
            mut queue,
            mut buffers,
            ..
        } = active;

        // Closing the stream drops the callback's sender, so the final drain
        // sees every buffer it ever enqueued.
        stream.stop();
        while let Ok(frame) = queue.try_recv() {
            buffers.push(frame.samples);
        }

        if buffers.is_empty() {
            info!(segment, "Recording stopped, nothing captured");
            return Ok(None);
        }

        let samples = buffers.concat();
        let path = store.commit_original(segment, &samples)?;
        let duration_secs = samples.len() as f64 / store.sample_rate() as f64;

        info!(
            segment,
            "Recording stopped: {:.2}s in {} buffers",
            duration_secs,
            buffers.len()
        );

        Ok(Some(SavedTake {
            segment,
            path,
            duration_secs,
            buffers: buffers.len(),
        }))
    }
}
