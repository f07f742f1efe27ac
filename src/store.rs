//! Per-segment audio files.
//!
//! The store owns two maps keyed by segment index: the as-recorded original
//! and an optional time-stretched derivative. Durations are never cached;
//! they are read from the WAV headers on demand.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::audio::{wav_duration_seconds, write_wav, AudioFile};
use crate::error::StoreError;

/// Which file a duration query reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationKind {
    Original,
    /// Processed if present, else original.
    Effective,
}

#[derive(Debug)]
pub struct SegmentStore {
    recordings_dir: PathBuf,
    sample_rate: u32,
    originals: BTreeMap<u32, PathBuf>,
    processed: BTreeMap<u32, PathBuf>,
}

impl SegmentStore {
    pub fn new(recordings_dir: impl Into<PathBuf>, sample_rate: u32) -> Self {
        Self {
            recordings_dir: recordings_dir.into(),
            sample_rate,
            originals: BTreeMap::new(),
            processed: BTreeMap::new(),
        }
    }

    pub fn recordings_dir(&self) -> &Path {
        &self.recordings_dir
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn original_path(&self, index: u32) -> Option<&Path> {
        self.originals
            .get(&index)
            .map(PathBuf::as_path)
            .filter(|p| p.exists())
    }

    pub fn processed_path(&self, index: u32) -> Option<&Path> {
        self.processed
            .get(&index)
            .map(PathBuf::as_path)
            .filter(|p| p.exists())
    }

    /// The audio that currently represents the segment.
    pub fn effective_path(&self, index: u32) -> Option<&Path> {
        self.processed_path(index).or_else(|| self.original_path(index))
    }

    pub fn has_recording(&self, index: u32) -> bool {
        self.original_path(index).is_some()
    }

    /// Recorded indices within `1..=slide_count`, ascending.
    pub fn recorded_indices(&self, slide_count: u32) -> Vec<u32> {
        (1..=slide_count).filter(|&i| self.has_recording(i)).collect()
    }

    /// Persist a fresh take as the segment's original. Any processed
    /// derivative is invalidated.
    pub fn commit_original(&mut self, index: u32, samples: &[f32]) -> Result<PathBuf, StoreError> {
        fs::create_dir_all(&self.recordings_dir)?;
        let path = self.recordings_dir.join(format!("segment_{}.wav", index));
        write_wav(&path, samples, self.sample_rate)?;

        info!(
            segment = index,
            "Saved recording {} ({:.2}s)",
            path.display(),
            samples.len() as f64 / self.sample_rate as f64
        );

        self.originals.insert(index, path.clone());
        self.clear_processed(index);
        Ok(path)
    }

    /// Persist a derivative, replacing any previous one. Only recorded
    /// segments can have one.
    pub fn commit_processed(
        &mut self,
        index: u32,
        samples: &[f32],
        sample_rate: u32,
    ) -> Result<PathBuf, StoreError> {
        if !self.has_recording(index) {
            return Err(StoreError::NotRecorded(index));
        }
        fs::create_dir_all(&self.recordings_dir)?;
        let path = self
            .recordings_dir
            .join(format!("segment_{}_proc.wav", index));
        write_wav(&path, samples, sample_rate)?;

        info!(
            segment = index,
            "Saved processed audio {} ({:.2}s)",
            path.display(),
            samples.len() as f64 / sample_rate as f64
        );

        self.processed.insert(index, path.clone());
        Ok(path)
    }

    /// Drop the derivative and its file. Returns whether one was mapped.
    pub fn clear_processed(&mut self, index: u32) -> bool {
        match self.processed.remove(&index) {
            Some(path) => {
                remove_backing(&path);
                true
            }
            None => false,
        }
    }

    /// Drop original and derivative, files included.
    pub fn remove(&mut self, index: u32) -> bool {
        let had_processed = self.clear_processed(index);
        let had_original = match self.originals.remove(&index) {
            Some(path) => {
                remove_backing(&path);
                true
            }
            None => false,
        };
        if had_original || had_processed {
            info!(segment = index, "Deleted segment audio");
        }
        had_original || had_processed
    }

    pub fn load_original(&self, index: u32) -> Result<AudioFile, StoreError> {
        let path = self
            .original_path(index)
            .ok_or(StoreError::NotRecorded(index))?;
        AudioFile::open(path)
    }

    pub fn load_effective(&self, index: u32) -> Result<AudioFile, StoreError> {
        let path = self
            .effective_path(index)
            .ok_or(StoreError::NotRecorded(index))?;
        AudioFile::open(path)
    }

    pub fn original_duration(&self, index: u32) -> f64 {
        self.original_path(index).map_or(0.0, duration_or_zero)
    }

    pub fn effective_duration(&self, index: u32) -> f64 {
        self.effective_path(index).map_or(0.0, duration_or_zero)
    }

    /// One duration per index in `1..=slide_count`, 0 for unrecorded.
    pub fn durations(&self, slide_count: u32, kind: DurationKind) -> Vec<f64> {
        (1..=slide_count)
            .map(|i| match kind {
                DurationKind::Original => self.original_duration(i),
                DurationKind::Effective => self.effective_duration(i),
            })
            .collect()
    }
}

fn duration_or_zero(path: &Path) -> f64 {
    match wav_duration_seconds(path) {
        Ok(seconds) => seconds,
        Err(e) => {
            warn!("Unreadable WAV header {}: {}", path.display(), e);
            0.0
        }
    }
}

fn remove_backing(path: &Path) {
    if let Err(e) = remove_file_if_present(path) {
        warn!("Failed to remove {}: {}", path.display(), e);
    }
}

fn remove_file_if_present(path: &Path) -> Result<(), StoreError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
