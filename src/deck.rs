//! The control component.
//!
//! `Deck` owns the budget, the segment store and both sessions, and is the
//! only place segment metadata is mutated. Every control-surface action is a
//! method here; failures come back as [`DeckError`] for the surface to show
//! as a warning, with state left as it was.

use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::audio::{AudioHost, StreamSettings};
use crate::budget::{clamp_speed, compute_factors, Budget, MAX_SPEED, MIN_SPEED};
use crate::error::DeckError;
use crate::export::{ExportMode, ExportPipeline, ExportReport};
use crate::mmss::format_mmss;
use crate::session::{CaptureStats, PlaybackSession, PlaybackStart, RecordingSession, SavedTake};
use crate::store::{DurationKind, SegmentStore};
use crate::stretch::TimeStretchEngine;

const NOT_RECORDED: &str = "not recorded";

/// One row of the segment table.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SegmentRow {
    pub index: u32,
    /// Per-segment limit (`target / slide_count`)
    pub limit: String,
    pub original: String,
    pub effective: String,
    /// Effective duration above the per-segment limit
    pub over_budget: bool,
}

/// Everything the control surface displays.
#[derive(Debug, Clone, Serialize)]
pub struct DeckSummary {
    pub rows: Vec<SegmentRow>,
    pub original_total: String,
    pub effective_total: String,
    pub target: String,
    pub record_label: &'static str,
    pub play_label: &'static str,
}

/// Result of [`Deck::fit_to_budget`].
#[derive(Debug, Clone, Serialize)]
pub struct FitReport {
    /// Allocator output per index `1..=slide_count`
    pub factors: Vec<f64>,
    /// Segments still above the per-segment limit afterwards
    pub over_budget: Vec<u32>,
}

pub struct Deck {
    budget: Budget,
    store: SegmentStore,
    engine: TimeStretchEngine,
    recording: RecordingSession,
    playback: PlaybackSession,
    selected: Option<u32>,
    last_speed: f64,
    live: Option<CaptureStats>,
}

impl Deck {
    pub fn new(
        host: Arc<dyn AudioHost>,
        settings: StreamSettings,
        store: SegmentStore,
        budget: Budget,
        playback_poll: Duration,
    ) -> Self {
        Self {
            budget,
            store,
            engine: TimeStretchEngine::default(),
            recording: RecordingSession::new(Arc::clone(&host), settings),
            playback: PlaybackSession::new(host, playback_poll),
            selected: None,
            last_speed: 1.0,
            live: None,
        }
    }

    pub fn with_engine(mut self, engine: TimeStretchEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn budget(&self) -> &Budget {
        &self.budget
    }

    pub fn store(&self) -> &SegmentStore {
        &self.store
    }

    pub fn selected(&self) -> Option<u32> {
        self.selected
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_capturing()
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    /// Select a segment; indices outside `1..=slide_count` clear the
    /// selection.
    pub fn select(&mut self, index: u32) -> Option<u32> {
        self.selected = self.budget.indices().contains(&index).then_some(index);
        self.selected
    }

    /// Regenerate segment identities `1..=count`. Recordings beyond the new
    /// range stay on disk but are no longer shown or exported.
    pub fn set_slide_count(&mut self, count: u32) {
        self.budget.set_slide_count(count);
        if self.selected.is_some_and(|i| i > self.budget.slide_count()) {
            self.selected = None;
        }
        info!("Slide count set to {}", self.budget.slide_count());
    }

    /// Unparseable text means one slide.
    pub fn set_slide_count_text(&mut self, text: &str) {
        self.set_slide_count(text.trim().parse().unwrap_or(1));
    }

    /// Invalid text keeps the previous target.
    pub fn set_target_text(&mut self, text: &str) -> u32 {
        let target = self.budget.set_target_text(text);
        info!("Target total {}", format_mmss(target as f64));
        target
    }

    fn require_selection(&self) -> Result<u32, DeckError> {
        self.selected.ok_or(DeckError::NoSelection)
    }

    fn require_recording(&self, index: u32) -> Result<(), DeckError> {
        if self.store.has_recording(index) {
            Ok(())
        } else {
            Err(DeckError::NotRecorded(index))
        }
    }

    pub fn start_recording(&mut self) -> Result<bool, DeckError> {
        if self.recording.is_capturing() {
            return Ok(false);
        }
        let index = self.require_selection()?;
        let started = self.recording.start(Some(index))?;
        self.live = None;
        Ok(started)
    }

    pub fn stop_recording(&mut self) -> Result<Option<SavedTake>, DeckError> {
        self.live = None;
        Ok(self.recording.stop(&mut self.store)?)
    }

    /// Record button.
    pub fn toggle_record(&mut self) -> Result<Option<SavedTake>, DeckError> {
        if self.recording.is_capturing() {
            self.stop_recording()
        } else {
            self.start_recording().map(|_| None)
        }
    }

    /// Periodic control-thread tick: drain capture progress and reap finished
    /// playback.
    pub fn tick(&mut self) -> Option<CaptureStats> {
        if let Some(segment) = self.playback.reap() {
            info!(segment, "Playback returned to idle");
        }
        self.live = self.recording.tick();
        self.live.clone()
    }

    pub fn start_playback(&mut self) -> Result<PlaybackStart, DeckError> {
        let index = self.require_selection()?;
        self.playback.start(index, &self.store)
    }

    pub fn stop_playback(&mut self) {
        self.playback.stop();
    }

    /// Play button.
    pub fn toggle_play(&mut self) -> Result<Option<PlaybackStart>, DeckError> {
        if self.playback.is_playing() {
            self.playback.stop();
            Ok(None)
        } else {
            self.start_playback().map(Some)
        }
    }

    /// Delete the selected segment's audio. No selection is a silent no-op.
    pub fn delete_selected(&mut self) -> bool {
        match self.selected {
            Some(index) => self.store.remove(index),
            None => false,
        }
    }

    /// Parse a speed; invalid text reuses the last good speed.
    pub fn parse_speed(&mut self, text: &str) -> f64 {
        match text.trim().parse::<f64>() {
            Ok(speed) if speed.is_finite() => {
                self.last_speed = clamp_speed(speed);
            }
            _ => warn!("Invalid speed {:?}, using {:.2}", text, self.last_speed),
        }
        self.last_speed
    }

    /// Stretch the selected original at `speed_text` (clamped to
    /// [0.5, 2.0]) and store it as the derivative. Returns the new effective
    /// duration.
    pub fn apply_speed_to_selected(&mut self, speed_text: &str) -> Result<f64, DeckError> {
        let index = self.require_selection()?;
        self.require_recording(index)?;
        let speed = self.parse_speed(speed_text);
        self.apply_speed(index, speed)
    }

    fn apply_speed(&mut self, index: u32, speed: f64) -> Result<f64, DeckError> {
        let (samples, sample_rate) = self.stretch_original(index, speed)?;
        self.store.commit_processed(index, &samples, sample_rate)?;
        Ok(self.store.effective_duration(index))
    }

    fn stretch_original(&self, index: u32, speed: f64) -> Result<(Vec<f32>, u32), DeckError> {
        let speed = speed.clamp(MIN_SPEED, MAX_SPEED);
        let original = self.store.load_original(index)?;
        let stretched = self.engine.stretch(&original.samples, speed);
        info!(
            segment = index,
            "Applied {:.2}x via {}", speed, stretched.algorithm
        );
        Ok((stretched.into_vec(), original.sample_rate))
    }

    /// Drop the selected segment's derivative. Returns the effective
    /// duration now in force (the original's, or 0 if unrecorded).
    pub fn reset_speed_selected(&mut self) -> Option<f64> {
        let index = self.selected?;
        self.store.clear_processed(index);
        Some(self.store.effective_duration(index))
    }

    /// Per-segment stretch from the budget allocator: factor > 1 stores a
    /// derivative at that rate, factor 1 clears any derivative. Every
    /// stretch runs before any derivative changes, so a failed load leaves
    /// the deck untouched.
    pub fn fit_to_budget(&mut self) -> Result<FitReport, DeckError> {
        let slide_count = self.budget.slide_count();
        let durations = self.store.durations(slide_count, DurationKind::Original);
        let factors = compute_factors(&durations, self.budget.target_total_seconds() as f64);

        let mut plan = Vec::new();
        for (index, &factor) in self.budget.indices().zip(&factors) {
            if !self.store.has_recording(index) {
                continue;
            }
            let stretched = if factor > 1.0 {
                Some(self.stretch_original(index, factor)?)
            } else {
                None
            };
            plan.push((index, stretched));
        }

        for (index, stretched) in plan {
            match stretched {
                Some((samples, sample_rate)) => {
                    self.store.commit_processed(index, &samples, sample_rate)?;
                }
                None => {
                    self.store.clear_processed(index);
                }
            }
        }

        let limit = self.budget.per_segment_limit();
        let over_budget = self
            .budget
            .indices()
            .filter(|&i| {
                let d = self.store.effective_duration(i);
                d > limit && d > 0.0
            })
            .collect();

        Ok(FitReport {
            factors,
            over_budget,
        })
    }

    pub fn export(&mut self, mode: ExportMode, out_dir: &Path) -> Result<ExportReport, DeckError> {
        let report = ExportPipeline::new(&self.engine).run(
            mode,
            &mut self.store,
            self.budget.slide_count(),
            out_dir,
        )?;
        Ok(report)
    }

    pub fn export_uniform(&mut self, out_dir: &Path) -> Result<ExportReport, DeckError> {
        let target_total_seconds = self.budget.target_total_seconds();
        self.export(
            ExportMode::UniformSpeedup {
                target_total_seconds,
            },
            out_dir,
        )
    }

    pub fn export_as_is(&mut self, out_dir: &Path) -> Result<ExportReport, DeckError> {
        self.export(ExportMode::AsIs, out_dir)
    }

    pub fn record_label(&self) -> &'static str {
        if self.recording.is_capturing() {
            "Stop recording"
        } else {
            "Start recording"
        }
    }

    pub fn play_label(&self) -> &'static str {
        if self.playback.is_playing() {
            "Stop playback"
        } else {
            "Play"
        }
    }

    /// Segment table and totals for the control surface.
    pub fn summary(&self) -> DeckSummary {
        let slide_count = self.budget.slide_count();
        let limit = self.budget.per_segment_limit();
        let limit_text = format_mmss(limit);
        let originals = self.store.durations(slide_count, DurationKind::Original);
        let effectives = self.store.durations(slide_count, DurationKind::Effective);

        let rows = self
            .budget
            .indices()
            .zip(originals.iter().zip(&effectives))
            .map(|(index, (&original, &effective))| {
                let live = self.live.as_ref().filter(|s| s.segment == index);
                let (original_text, effective_text) = match live {
                    Some(stats) => {
                        let elapsed = format_mmss(stats.elapsed_secs);
                        let effective = if self.store.processed_path(index).is_some() {
                            format_mmss(effective)
                        } else {
                            elapsed.clone()
                        };
                        (elapsed, effective)
                    }
                    None if self.store.has_recording(index) => {
                        (format_mmss(original), format_mmss(effective))
                    }
                    None => (NOT_RECORDED.to_string(), NOT_RECORDED.to_string()),
                };

                SegmentRow {
                    index,
                    limit: limit_text.clone(),
                    original: original_text,
                    effective: effective_text,
                    over_budget: effective > limit && effective > 0.0,
                }
            })
            .collect();

        DeckSummary {
            rows,
            original_total: format_mmss(originals.iter().sum()),
            effective_total: format_mmss(effectives.iter().sum()),
            target: format_mmss(self.budget.target_total_seconds() as f64),
            record_label: self.record_label(),
            play_label: self.play_label(),
        }
    }
}
