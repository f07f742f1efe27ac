//! Waveform-similarity overlap-add (WSOLA).
//!
//! Frames are read from the input at `k * hop * rate` (± a search tolerance)
//! and overlap-added at `k * hop` in the output. Each frame position is
//! chosen to maximise cross-correlation with the natural continuation of the
//! previously copied frame, which keeps the waveform phase-coherent across
//! frame boundaries.

use super::window::{hann, target_len};
use super::StretchStrategy;
use crate::error::StretchError;

const FRAME_LEN: usize = 1024;
const SYNTHESIS_HOP: usize = FRAME_LEN / 2;
const TOLERANCE: usize = 256;

#[derive(Debug, Clone)]
pub struct Wsola {
    frame_len: usize,
    hop: usize,
    tolerance: usize,
    window: Vec<f32>,
}

impl Default for Wsola {
    fn default() -> Self {
        Self::new(FRAME_LEN, SYNTHESIS_HOP, TOLERANCE)
    }
}

impl Wsola {
    pub fn new(frame_len: usize, hop: usize, tolerance: usize) -> Self {
        Self {
            frame_len,
            hop,
            tolerance,
            window: hann(frame_len),
        }
    }

    /// Best analysis start within `nominal ± tolerance`, ties broken towards
    /// the nominal position.
    fn best_start(&self, input: &[f32], natural: usize, nominal: usize, max_start: usize) -> usize {
        let overlap = self.frame_len - self.hop;
        let lo = nominal.saturating_sub(self.tolerance);
        let hi = (nominal + self.tolerance).min(max_start);
        let reference = &input[natural..natural + overlap];

        let mut best = nominal.min(max_start);
        let mut best_score = f32::NEG_INFINITY;
        let mut best_distance = usize::MAX;

        for candidate in lo..=hi {
            let score: f32 = reference
                .iter()
                .zip(&input[candidate..candidate + overlap])
                .map(|(a, b)| a * b)
                .sum();
            let distance = candidate.abs_diff(nominal);
            if score > best_score || (score == best_score && distance < best_distance) {
                best = candidate;
                best_score = score;
                best_distance = distance;
            }
        }

        best
    }
}

impl StretchStrategy for Wsola {
    fn name(&self) -> &'static str {
        "wsola"
    }

    fn stretch(&self, samples: &[f32], rate: f64) -> Result<Vec<f32>, StretchError> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(StretchError::InvalidRate(rate));
        }
        if samples.len() < self.frame_len {
            return Err(StretchError::InputTooShort {
                len: samples.len(),
                needed: self.frame_len,
            });
        }
        if samples.iter().any(|s| !s.is_finite()) {
            return Err(StretchError::NonFinite);
        }

        let out_len = target_len(samples.len(), rate);
        let analysis_hop = self.hop as f64 * rate;
        let max_start = samples.len() - 1;

        // Zero tail so every frame and continuation window is in bounds.
        let mut input = samples.to_vec();
        input.resize(samples.len() + self.frame_len + self.tolerance, 0.0);

        let mut output = vec![0.0f32; out_len + self.frame_len];
        let mut weight = vec![0.0f32; out_len + self.frame_len];
        let mut previous: Option<usize> = None;

        let mut k = 0usize;
        loop {
            let synthesis_pos = k * self.hop;
            if synthesis_pos >= out_len {
                break;
            }

            let nominal = ((k as f64 * analysis_hop).round() as usize).min(max_start);
            let start = match previous {
                None => nominal,
                Some(prev) => self.best_start(&input, prev + self.hop, nominal, max_start),
            };

            let frame = &input[start..start + self.frame_len];
            for (i, (&s, &w)) in frame.iter().zip(&self.window).enumerate() {
                output[synthesis_pos + i] += s * w;
                weight[synthesis_pos + i] += w;
            }

            previous = Some(start);
            k += 1;
        }

        for (o, &w) in output.iter_mut().zip(&weight) {
            if w > 1e-3 {
                *o /= w;
            }
        }

        output.truncate(out_len);
        Ok(output)
    }
}
