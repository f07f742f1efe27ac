//! Fitting segment durations into a total target.

use serde::Serialize;
use std::ops::RangeInclusive;

use crate::mmss::parse_mmss;

/// Legal manual speed range.
pub const MIN_SPEED: f64 = 0.5;
pub const MAX_SPEED: f64 = 2.0;

/// Range of factors the allocator hands out.
pub const MIN_FACTOR: f64 = 1.0;
pub const MAX_FACTOR: f64 = 2.0;

/// Smallest adjusted per-segment target, in seconds.
const MIN_ADJUSTED_TARGET: f64 = 0.001;

/// Per-segment speed factors, one per duration, in input order.
///
/// Only segments longer than the fair share (`target_total / n`) are sped
/// up. The total overflow is split across them in proportion to how far each
/// exceeds the fair share, and each factor is capped to
/// [`MIN_FACTOR`, `MAX_FACTOR`]. When the cap binds the result does not fit
/// `target_total`; those segments stay over budget.
///
/// If nothing exceeds the fair share yet the total is still over target
/// (reachable only through float edge cases), every segment gets
/// `total / target_total`, unclamped.
pub fn compute_factors(durations: &[f64], target_total: f64) -> Vec<f64> {
    let total: f64 = durations.iter().sum();
    let n = durations.len();

    if total <= target_total || total == 0.0 || n == 0 {
        return vec![1.0; n];
    }

    let avg_target = target_total / n as f64;
    let excess: Vec<f64> = durations
        .iter()
        .map(|&d| (d - avg_target).max(0.0))
        .collect();
    let sum_excess: f64 = excess.iter().sum();

    if sum_excess == 0.0 {
        return uniform_fallback(total, target_total, n);
    }

    let over = total - target_total;
    durations
        .iter()
        .zip(&excess)
        .map(|(&d, &e)| {
            if d <= avg_target {
                return 1.0;
            }
            let shrink = over * (e / sum_excess);
            let adjusted = (d - shrink).max(MIN_ADJUSTED_TARGET);
            (d / adjusted).clamp(MIN_FACTOR, MAX_FACTOR)
        })
        .collect()
}

/// Zero-excess branch of [`compute_factors`]: everyone shrinks by the same
/// overflow ratio.
pub fn uniform_fallback(total: f64, target_total: f64, n: usize) -> Vec<f64> {
    let scale = target_total / total;
    vec![1.0 / scale; n]
}

/// Single global rate for uniform export: `max(1, total / target)`, limited
/// to the stretch range.
pub fn uniform_rate(total_original: f64, target_total: f64) -> f64 {
    if total_original <= target_total {
        return 1.0;
    }
    (total_original / target_total).clamp(MIN_FACTOR, MAX_FACTOR)
}

/// Clamp a manual speed into [`MIN_SPEED`, `MAX_SPEED`]; non-finite becomes 1.0.
pub fn clamp_speed(speed: f64) -> f64 {
    if speed.is_finite() {
        speed.clamp(MIN_SPEED, MAX_SPEED)
    } else {
        1.0
    }
}

/// The global constraint set by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Budget {
    target_total_seconds: u32,
    slide_count: u32,
}

impl Budget {
    pub fn new(target_total_seconds: u32, slide_count: u32) -> Self {
        Self {
            target_total_seconds,
            slide_count: slide_count.max(1),
        }
    }

    pub fn target_total_seconds(&self) -> u32 {
        self.target_total_seconds
    }

    pub fn slide_count(&self) -> u32 {
        self.slide_count
    }

    /// Parse `mm:ss`; invalid text keeps the current target. Returns the
    /// target now in effect.
    pub fn set_target_text(&mut self, text: &str) -> u32 {
        self.target_total_seconds = parse_mmss(text, self.target_total_seconds);
        self.target_total_seconds
    }

    pub fn set_target_seconds(&mut self, seconds: u32) {
        self.target_total_seconds = seconds;
    }

    /// Values below 1 are raised to 1.
    pub fn set_slide_count(&mut self, count: u32) {
        self.slide_count = count.max(1);
    }

    /// `target / slide_count`, 0 when there are no slides.
    pub fn per_segment_limit(&self) -> f64 {
        if self.slide_count == 0 {
            return 0.0;
        }
        self.target_total_seconds as f64 / self.slide_count as f64
    }

    /// Segment identities `1..=slide_count`.
    pub fn indices(&self) -> RangeInclusive<u32> {
        1..=self.slide_count
    }
}
