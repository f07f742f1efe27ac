pub mod backend;
pub mod device;
pub mod file;

pub use backend::{AudioFrame, AudioHost, CaptureStream, PlaybackStream, StreamSettings};
pub use device::CpalHost;
pub use file::{wav_duration_seconds, write_wav, AudioFile};
