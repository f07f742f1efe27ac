//! Error types.
//!
//! Every failure is handled at the component that can act on it; these types
//! only carry the failure across one boundary (device, DSP stage, file store,
//! export batch, control action).

use thiserror::Error;

/// Capture/playback stream could not be opened or started.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("No default {0} device available")]
    NoDevice(&'static str),

    #[error("Failed to query device config: {0}")]
    DeviceConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("Failed to build audio stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("Failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("Audio device thread exited before the stream was ready")]
    DeviceThread,
}

/// One stretch stage failed; the engine falls through to the next stage.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StretchError {
    #[error("input of {len} samples is shorter than the {needed}-sample analysis frame")]
    InputTooShort { len: usize, needed: usize },

    #[error("input contains non-finite samples")]
    NonFinite,

    #[error("invalid stretch rate {0}")]
    InvalidRate(f64),
}

/// Segment file I/O failure.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("slide {0} has no recording")]
    NotRecorded(u32),
}

#[derive(Error, Debug)]
pub enum ExportError {
    /// No segment has any audio; nothing was written.
    #[error("nothing to export: no slide has a recording")]
    NothingToExport,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failure of a control-surface action, reported to the user as a warning.
#[derive(Error, Debug)]
pub enum DeckError {
    #[error("select a slide first")]
    NoSelection,

    #[error("slide {0} has no recording")]
    NotRecorded(u32),

    #[error("audio device error: {0}")]
    Device(#[from] AudioError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Export(#[from] ExportError),
}
