use super::window::target_len;
use super::StretchStrategy;
use crate::error::StretchError;

/// Linear interpolation onto a uniformly rescaled time axis.
///
/// No spectral processing: pitch shifts with speed. Cannot fail, so it is the
/// engine's terminal stage.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinearResampler;

impl LinearResampler {
    pub fn resample(&self, samples: &[f32], rate: f64) -> Vec<f32> {
        let len = samples.len();
        let rate = if rate.is_finite() && rate > 0.0 { rate } else { 1.0 };
        let out_len = target_len(len, rate);

        if len == 0 {
            return vec![0.0; out_len];
        }

        // Output sample i sits at input position i * len / out_len.
        let step = len as f64 / out_len as f64;
        let last = len - 1;

        (0..out_len)
            .map(|i| {
                let position = i as f64 * step;
                let left = position.floor() as usize;
                if left >= last {
                    return samples[last];
                }
                let frac = (position - left as f64) as f32;
                samples[left] + (samples[left + 1] - samples[left]) * frac
            })
            .collect()
    }
}

impl StretchStrategy for LinearResampler {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn stretch(&self, samples: &[f32], rate: f64) -> Result<Vec<f32>, StretchError> {
        Ok(self.resample(samples, rate))
    }
}
