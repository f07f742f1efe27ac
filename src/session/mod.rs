//! Live audio sessions
//!
//! - `RecordingSession`: capture into a queue, drained on the control thread
//!   by progress ticks and by `stop`
//! - `PlaybackSession`: one segment at a time, ended by a polling watcher or
//!   by `stop`

mod playback;
mod recording;
mod stats;

pub use playback::{PlaybackSession, PlaybackStart};
pub use recording::RecordingSession;
pub use stats::{CaptureStats, SavedTake};
