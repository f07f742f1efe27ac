//! Time-scale modification of mono segment audio.
//!
//! `TimeStretchEngine` tries an ordered chain of [`StretchStrategy`] stages
//! and returns the first success. The linear resampler is always the final
//! stage and cannot fail, so `stretch` never errors for any input.
//!
//! Default chain:
//!
//! 1. [`Wsola`]: phase-coherent overlap-add
//! 2. [`PhaseVocoder`]: STFT phase vocoder
//! 3. [`LinearResampler`]: length-correct, no pitch preservation

mod linear;
mod vocoder;
mod window;
mod wsola;

use std::borrow::Cow;
use tracing::{debug, warn};

use crate::error::StretchError;

pub use linear::LinearResampler;
pub use vocoder::PhaseVocoder;
pub use window::target_len;
pub use wsola::Wsola;

/// One stage of the stretch chain.
pub trait StretchStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Play `samples` at `rate`x speed; output has about `len / rate` samples.
    fn stretch(&self, samples: &[f32], rate: f64) -> Result<Vec<f32>, StretchError>;
}

/// Result of [`TimeStretchEngine::stretch`].
#[derive(Debug)]
pub struct Stretched<'a> {
    pub samples: Cow<'a, [f32]>,
    /// Stage that produced the output, `"identity"` for rate 1.0.
    pub algorithm: &'static str,
}

impl Stretched<'_> {
    pub fn into_vec(self) -> Vec<f32> {
        self.samples.into_owned()
    }
}

pub struct TimeStretchEngine {
    chain: Vec<Box<dyn StretchStrategy>>,
    fallback: LinearResampler,
}

impl Default for TimeStretchEngine {
    fn default() -> Self {
        Self::with_chain(vec![
            Box::new(Wsola::default()),
            Box::new(PhaseVocoder::default()),
        ])
    }
}

impl TimeStretchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Custom stages, tried in order before the linear fallback.
    pub fn with_chain(chain: Vec<Box<dyn StretchStrategy>>) -> Self {
        Self {
            chain,
            fallback: LinearResampler,
        }
    }

    pub fn stages(&self) -> Vec<&'static str> {
        self.chain
            .iter()
            .map(|s| s.name())
            .chain(std::iter::once(self.fallback.name()))
            .collect()
    }

    /// Rate is expected in [0.5, 2.0]; callers clamp. Exactly 1.0 returns
    /// the input borrowed, without running any stage.
    pub fn stretch<'a>(&self, samples: &'a [f32], rate: f64) -> Stretched<'a> {
        if rate == 1.0 {
            return Stretched {
                samples: Cow::Borrowed(samples),
                algorithm: "identity",
            };
        }

        for stage in &self.chain {
            match stage.stretch(samples, rate) {
                Ok(output) => {
                    debug!(
                        "Stretched {} -> {} samples at {:.3}x with {}",
                        samples.len(),
                        output.len(),
                        rate,
                        stage.name()
                    );
                    return Stretched {
                        samples: Cow::Owned(output),
                        algorithm: stage.name(),
                    };
                }
                Err(e) => {
                    warn!("{} stretch failed, falling back: {}", stage.name(), e);
                }
            }
        }

        Stretched {
            samples: Cow::Owned(self.fallback.resample(samples, rate)),
            algorithm: self.fallback.name(),
        }
    }
}
