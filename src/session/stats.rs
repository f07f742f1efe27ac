use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// Progress of the active capture, reported by every tick.
#[derive(Debug, Clone, Serialize)]
pub struct CaptureStats {
    /// Segment being recorded
    pub segment: u32,

    /// When capture started
    pub started_at: DateTime<Utc>,

    /// Wall-clock seconds since start
    pub elapsed_secs: f64,

    /// Buffers drained from the capture queue so far
    pub buffers: usize,

    /// Samples drained so far
    pub samples: usize,
}

/// What a successful `stop` persisted.
#[derive(Debug, Clone, Serialize)]
pub struct SavedTake {
    pub segment: u32,
    pub path: PathBuf,
    /// Duration of the stored audio (samples / rate)
    pub duration_secs: f64,
    pub buffers: usize,
}
