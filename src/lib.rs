pub mod audio;
pub mod budget;
pub mod config;
pub mod console;
pub mod deck;
pub mod error;
pub mod export;
pub mod mmss;
pub mod session;
pub mod store;
pub mod stretch;

pub use audio::{AudioFile, AudioFrame, AudioHost, CpalHost, StreamSettings};
pub use budget::{compute_factors, uniform_rate, Budget};
pub use config::Config;
pub use deck::{Deck, DeckSummary, FitReport, SegmentRow};
pub use error::{AudioError, DeckError, ExportError, StoreError, StretchError};
pub use export::{ExportMode, ExportPipeline, ExportReport};
pub use session::{CaptureStats, PlaybackSession, PlaybackStart, RecordingSession, SavedTake};
pub use store::{DurationKind, SegmentStore};
pub use stretch::{Stretched, TimeStretchEngine};
