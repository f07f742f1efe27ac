//! Phase-vocoder time stretch.
//!
//! 1. STFT of the (centre-padded) input with a Hann window
//! 2. Resample the frame sequence at `rate`, interpolating magnitudes and
//!    accumulating phase from the measured per-bin phase advance
//! 3. Inverse STFT with windowed overlap-add, normalised by the summed
//!    squared window

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use std::f32::consts::PI;

use super::window::{hann, target_len};
use super::StretchStrategy;
use crate::error::StretchError;

const FFT_SIZE: usize = 2048;
const HOP: usize = FFT_SIZE / 4;

#[derive(Debug, Clone)]
pub struct PhaseVocoder {
    fft_size: usize,
    hop: usize,
}

impl Default for PhaseVocoder {
    fn default() -> Self {
        Self {
            fft_size: FFT_SIZE,
            hop: HOP,
        }
    }
}

impl PhaseVocoder {
    pub fn new(fft_size: usize, hop: usize) -> Self {
        Self { fft_size, hop }
    }

    fn bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    fn stft(&self, padded: &[f32], window: &[f32], planner: &mut FftPlanner<f32>) -> Vec<Vec<Complex<f32>>> {
        let fft = planner.plan_fft_forward(self.fft_size);
        let frames = 1 + (padded.len() - self.fft_size) / self.hop;
        let mut buffer = vec![Complex::new(0.0, 0.0); self.fft_size];

        (0..frames)
            .map(|t| {
                let start = t * self.hop;
                for (slot, (&s, &w)) in buffer
                    .iter_mut()
                    .zip(padded[start..start + self.fft_size].iter().zip(window))
                {
                    *slot = Complex::new(s * w, 0.0);
                }
                fft.process(&mut buffer);
                buffer[..self.bins()].to_vec()
            })
            .collect()
    }

    fn istft(
        &self,
        frames: &[Vec<Complex<f32>>],
        window: &[f32],
        planner: &mut FftPlanner<f32>,
    ) -> Vec<f32> {
        let ifft = planner.plan_fft_inverse(self.fft_size);
        let len = self.fft_size + self.hop * frames.len().saturating_sub(1);
        let mut output = vec![0.0f32; len];
        let mut weight = vec![0.0f32; len];
        let mut buffer = vec![Complex::new(0.0, 0.0); self.fft_size];
        let scale = 1.0 / self.fft_size as f32;

        for (t, half) in frames.iter().enumerate() {
            buffer[..half.len()].copy_from_slice(half);
            // Hermitian mirror for a real signal.
            for k in 1..self.fft_size - half.len() + 1 {
                buffer[self.fft_size - k] = half[k].conj();
            }
            ifft.process(&mut buffer);

            let start = t * self.hop;
            for (i, &w) in window.iter().enumerate() {
                output[start + i] += buffer[i].re * scale * w;
                weight[start + i] += w * w;
            }
        }

        for (o, &w) in output.iter_mut().zip(&weight) {
            if w > 1e-6 {
                *o /= w;
            }
        }
        output
    }
}

fn wrap_phase(phase: f32) -> f32 {
    phase - 2.0 * PI * (phase / (2.0 * PI)).round()
}

impl StretchStrategy for PhaseVocoder {
    fn name(&self) -> &'static str {
        "phase-vocoder"
    }

    fn stretch(&self, samples: &[f32], rate: f64) -> Result<Vec<f32>, StretchError> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(StretchError::InvalidRate(rate));
        }
        if samples.len() < self.fft_size {
            return Err(StretchError::InputTooShort {
                len: samples.len(),
                needed: self.fft_size,
            });
        }
        if samples.iter().any(|s| !s.is_finite()) {
            return Err(StretchError::NonFinite);
        }

        let out_len = target_len(samples.len(), rate);
        let pad = self.fft_size / 2;
        let mut padded = vec![0.0f32; pad];
        padded.extend_from_slice(samples);
        padded.resize(padded.len() + pad, 0.0);

        let window = hann(self.fft_size);
        let mut planner = FftPlanner::<f32>::new();
        let spectrum = self.stft(&padded, &window, &mut planner);
        let frame_count = spectrum.len();
        let bins = self.bins();

        let advance: Vec<f32> = (0..bins)
            .map(|k| 2.0 * PI * k as f32 * self.hop as f32 / self.fft_size as f32)
            .collect();
        let silent = vec![Complex::new(0.0f32, 0.0); bins];
        let mut phase: Vec<f32> = spectrum[0].iter().map(|c| c.arg()).collect();
        let mut stretched = Vec::new();

        let mut step = 0.0f64;
        while step < frame_count as f64 {
            let left = step.floor() as usize;
            let alpha = (step - left as f64) as f32;
            let current = &spectrum[left];
            let next = spectrum.get(left + 1).unwrap_or(&silent);

            let frame: Vec<Complex<f32>> = (0..bins)
                .map(|k| {
                    let magnitude = (1.0 - alpha) * current[k].norm() + alpha * next[k].norm();
                    Complex::from_polar(magnitude, phase[k])
                })
                .collect();
            stretched.push(frame);

            for k in 0..bins {
                let delta = wrap_phase(next[k].arg() - current[k].arg() - advance[k]);
                phase[k] += advance[k] + delta;
            }

            step += rate;
        }

        let reconstructed = self.istft(&stretched, &window, &mut planner);
        let mut output: Vec<f32> = reconstructed.into_iter().skip(pad).take(out_len).collect();
        output.resize(out_len, 0.0);
        Ok(output)
    }
}
