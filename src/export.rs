//! Batch export of all segments plus a combined master file.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::audio::{write_wav, AudioFile};
use crate::budget::uniform_rate;
use crate::error::{ExportError, StoreError};
use crate::store::{DurationKind, SegmentStore};
use crate::stretch::TimeStretchEngine;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExportMode {
    /// Every recorded original stretched by one global rate,
    /// `max(1, total_original / target_total)`.
    UniformSpeedup { target_total_seconds: u32 },
    /// Current effective audio, unchanged.
    AsIs,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub out_dir: PathBuf,
    /// Individual segment files, in index order
    pub files: Vec<PathBuf>,
    pub combined: PathBuf,
    /// Rate applied to every segment (1.0 for as-is)
    pub rate: f64,
    pub combined_duration_secs: f64,
}

pub struct ExportPipeline<'a> {
    engine: &'a TimeStretchEngine,
}

impl<'a> ExportPipeline<'a> {
    pub fn new(engine: &'a TimeStretchEngine) -> Self {
        Self { engine }
    }

    /// Export segments `1..=slide_count` into `out_dir`.
    ///
    /// Unrecorded segments are skipped. If none is recorded nothing is
    /// written and `ExportError::NothingToExport` is returned. Uniform mode
    /// also stores each stretched segment as that segment's derivative, after
    /// all export files were written; a failed batch leaves derivatives
    /// as they were.
    pub fn run(
        &self,
        mode: ExportMode,
        store: &mut SegmentStore,
        slide_count: u32,
        out_dir: &Path,
    ) -> Result<ExportReport, ExportError> {
        let indices = store.recorded_indices(slide_count);
        if indices.is_empty() {
            return Err(ExportError::NothingToExport);
        }

        let rate = match mode {
            ExportMode::UniformSpeedup {
                target_total_seconds,
            } => {
                let total: f64 = store
                    .durations(slide_count, DurationKind::Original)
                    .iter()
                    .sum();
                uniform_rate(total, target_total_seconds as f64)
            }
            ExportMode::AsIs => 1.0,
        };

        fs::create_dir_all(out_dir).map_err(StoreError::from)?;
        info!(
            "Exporting {} segment(s) to {} ({:?}, rate {:.3})",
            indices.len(),
            out_dir.display(),
            mode,
            rate
        );

        let mut files = Vec::with_capacity(indices.len());
        let mut combined: Vec<f32> = Vec::new();
        let mut derivatives: Vec<(u32, Vec<f32>, u32)> = Vec::new();

        for index in indices {
            let (samples, sample_rate) = match mode {
                ExportMode::UniformSpeedup { .. } => {
                    let original = store.load_original(index)?;
                    let stretched = self.engine.stretch(&original.samples, rate);
                    debug!(segment = index, "Uniform stretch via {}", stretched.algorithm);
                    (stretched.into_vec(), original.sample_rate)
                }
                ExportMode::AsIs => {
                    let AudioFile {
                        samples,
                        sample_rate,
                        ..
                    } = store.load_effective(index)?;
                    (samples, sample_rate)
                }
            };

            let path = out_dir.join(format!("segment_{}.wav", index));
            write_wav(&path, &samples, sample_rate)?;
            combined.extend_from_slice(&samples);
            files.push(path);

            if matches!(mode, ExportMode::UniformSpeedup { .. }) {
                derivatives.push((index, samples, sample_rate));
            }
        }

        let combined_path = out_dir.join("combined.wav");
        let master_rate = store.sample_rate();
        write_wav(&combined_path, &combined, master_rate)?;
        let combined_duration_secs = combined.len() as f64 / master_rate as f64;

        // Derivatives change only once every export file is on disk.
        for (index, samples, sample_rate) in derivatives {
            store.commit_processed(index, &samples, sample_rate)?;
        }

        info!(
            "Export complete: {} files + {} ({:.2}s)",
            files.len(),
            combined_path.display(),
            combined_duration_secs
        );

        Ok(ExportReport {
            out_dir: out_dir.to_path_buf(),
            files,
            combined: combined_path,
            rate,
            combined_duration_secs,
        })
    }
}
