use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::audio::{AudioHost, PlaybackStream};
use crate::error::DeckError;
use crate::store::SegmentStore;

/// Stream slot shared by the session and its watcher; whoever takes it first
/// releases the device.
type StreamSlot = Arc<Mutex<Option<Box<dyn PlaybackStream>>>>;

fn release(slot: &StreamSlot) {
    let stream = match slot.lock() {
        Ok(mut guard) => guard.take(),
        Err(poisoned) => poisoned.into_inner().take(),
    };
    if let Some(stream) = stream {
        stream.stop();
    }
}

/// `Idle -> Playing -> Idle` for one segment's effective audio.
///
/// A watcher task polls the cancellation token and the elapsed time every
/// `poll_interval`; on either it releases the stream. Stop latency is
/// therefore about one poll interval for the watcher, but `stop` releases
/// the device immediately.
pub struct PlaybackSession {
    host: Arc<dyn AudioHost>,
    poll_interval: Duration,
    active: Option<ActivePlayback>,
}

struct ActivePlayback {
    segment: u32,
    duration: Duration,
    cancel: CancellationToken,
    stream: StreamSlot,
    watcher: JoinHandle<()>,
}

/// Outcome of [`PlaybackSession::start`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackStart {
    Started { segment: u32, duration_secs: f64 },
    /// Something is already playing; nothing changed.
    AlreadyPlaying,
}

impl PlaybackSession {
    pub fn new(host: Arc<dyn AudioHost>, poll_interval: Duration) -> Self {
        Self {
            host,
            poll_interval,
            active: None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|a| !a.watcher.is_finished())
    }

    pub fn active_segment(&self) -> Option<u32> {
        self.active
            .as_ref()
            .filter(|a| !a.watcher.is_finished())
            .map(|a| a.segment)
    }

    /// Forget a playback whose watcher already finished. Returns the segment
    /// that completed, if any.
    pub fn reap(&mut self) -> Option<u32> {
        if self.active.as_ref()?.watcher.is_finished() {
            return self.active.take().map(|a| a.segment);
        }
        None
    }

    /// Play the segment's effective audio (processed, else original).
    ///
    /// Must be called within a tokio runtime.
    pub fn start(&mut self, segment: u32, store: &SegmentStore) -> Result<PlaybackStart, DeckError> {
        self.reap();
        if self.active.is_some() {
            return Ok(PlaybackStart::AlreadyPlaying);
        }
        if store.effective_path(segment).is_none() {
            return Err(DeckError::NotRecorded(segment));
        }

        let audio = store.load_effective(segment)?;
        let duration = Duration::from_secs_f64(audio.duration_seconds);
        let samples: Arc<[f32]> = audio.samples.into();
        let stream = self.host.open_playback(samples, audio.sample_rate)?;

        let slot: StreamSlot = Arc::new(Mutex::new(Some(stream)));
        let cancel = CancellationToken::new();
        let watcher = tokio::spawn(watch(
            segment,
            duration,
            self.poll_interval,
            cancel.clone(),
            Arc::clone(&slot),
        ));

        info!(
            segment,
            "Playing {} ({:.2}s)",
            audio.path.display(),
            audio.duration_seconds
        );

        self.active = Some(ActivePlayback {
            segment,
            duration,
            cancel,
            stream: slot,
            watcher,
        });

        Ok(PlaybackStart::Started {
            segment,
            duration_secs: duration.as_secs_f64(),
        })
    }

    /// Cancel and release the stream now. Idempotent.
    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
            release(&active.stream);
            debug!(
                segment = active.segment,
                "Playback stopped ({:.2}s loaded)",
                active.duration.as_secs_f64()
            );
        }
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn watch(
    segment: u32,
    duration: Duration,
    poll_interval: Duration,
    cancel: CancellationToken,
    stream: StreamSlot,
) {
    let started = Instant::now();
    loop {
        if cancel.is_cancelled() {
            debug!(segment, "Playback watcher cancelled");
            break;
        }
        if started.elapsed() >= duration {
            info!(segment, "Playback finished");
            break;
        }
        tokio::time::sleep(poll_interval).await;
    }
    // Closing a device stream joins its thread; keep that off the runtime.
    if let Err(e) = tokio::task::spawn_blocking(move || release(&stream)).await {
        warn!(segment, "Playback release task failed: {}", e);
    }
}
