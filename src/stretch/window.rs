use std::f32::consts::PI;

/// Periodic Hann window (sums to a constant at 50% and 75% overlap).
pub fn hann(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / size as f32).cos()))
        .collect()
}

/// Output length every stage agrees on: `max(1, round(len / rate))`.
pub fn target_len(len: usize, rate: f64) -> usize {
    ((len as f64 / rate).round() as usize).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hann_overlap_adds_to_one_at_half_hop() {
        let w = hann(8);
        for i in 0..4 {
            assert!((w[i] + w[i + 4] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn target_len_never_zero() {
        assert_eq!(target_len(0, 2.0), 1);
        assert_eq!(target_len(1, 2.0), 1);
        assert_eq!(target_len(9, 1.5), 6);
        assert_eq!(target_len(100, 0.5), 200);
    }
}
