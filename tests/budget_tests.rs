// Budget allocator: conservation, caps and the fair-share rule.

use approx::assert_relative_eq;
use deck_pacer::budget::{
    clamp_speed, compute_factors, uniform_fallback, uniform_rate, Budget, MAX_FACTOR, MIN_FACTOR,
};

fn fitted_total(durations: &[f64], factors: &[f64]) -> f64 {
    durations.iter().zip(factors).map(|(d, f)| d / f).sum()
}

#[test]
fn test_under_target_is_untouched() {
    assert_eq!(compute_factors(&[10.0, 20.0], 60.0), vec![1.0, 1.0]);
    assert_eq!(compute_factors(&[30.0, 30.0], 60.0), vec![1.0, 1.0]);
}

#[test]
fn test_degenerate_inputs() {
    assert!(compute_factors(&[], 60.0).is_empty());
    assert_eq!(compute_factors(&[0.0, 0.0, 0.0], 0.0), vec![1.0, 1.0, 1.0]);
}

#[test]
fn test_equal_segments_share_overflow() {
    let durations = [50.0, 50.0];
    let factors = compute_factors(&durations, 80.0);

    assert_relative_eq!(factors[0], 1.25, epsilon = 1e-9);
    assert_relative_eq!(factors[1], 1.25, epsilon = 1e-9);
    assert_relative_eq!(fitted_total(&durations, &factors), 80.0, epsilon = 1e-9);
}

#[test]
fn test_short_segments_are_protected() {
    let durations = [30.0, 90.0];
    let factors = compute_factors(&durations, 100.0);

    assert_eq!(factors[0], 1.0, "below fair share must not be sped up");
    assert_relative_eq!(factors[1], 90.0 / 70.0, epsilon = 1e-9);
    assert_relative_eq!(fitted_total(&durations, &factors), 100.0, epsilon = 1e-9);
}

#[test]
fn test_overflow_split_by_excess() {
    // fair share 30; excess 10 and 30 share an overflow of 30
    let durations = [40.0, 60.0, 20.0];
    let factors = compute_factors(&durations, 90.0);

    assert_relative_eq!(factors[0], 40.0 / 32.5, epsilon = 1e-9);
    assert_relative_eq!(factors[1], 1.6, epsilon = 1e-9);
    assert_eq!(factors[2], 1.0);
    assert_relative_eq!(fitted_total(&durations, &factors), 90.0, epsilon = 1e-9);
}

#[test]
fn test_cap_leaves_segment_over_budget() {
    let durations = [10.0, 200.0];
    let factors = compute_factors(&durations, 60.0);

    assert_eq!(factors, vec![1.0, MAX_FACTOR]);
    assert!(fitted_total(&durations, &factors) > 60.0);
}

#[test]
fn test_zero_target_hits_cap() {
    let factors = compute_factors(&[0.0, 10.0], 0.0);
    assert_eq!(factors, vec![1.0, MAX_FACTOR]);
}

#[test]
fn test_factors_stay_in_range() {
    let cases: [(&[f64], f64); 4] = [
        (&[1.0, 2.0, 3.0, 400.0], 30.0),
        (&[5.0; 8], 1.0),
        (&[0.1, 0.2, 99.0], 50.0),
        (&[61.0, 59.0, 60.0], 179.0),
    ];
    for (durations, target) in cases {
        let factors = compute_factors(durations, target);
        assert_eq!(factors.len(), durations.len());
        for f in factors {
            assert!((MIN_FACTOR..=MAX_FACTOR).contains(&f), "{f} out of range");
        }
    }
}

#[test]
fn test_uniform_fallback_formula() {
    assert_eq!(uniform_fallback(100.0, 80.0, 3), vec![1.25; 3]);
    // unclamped
    assert_eq!(uniform_fallback(100.0, 25.0, 2), vec![4.0; 2]);
}

#[test]
fn test_uniform_rate() {
    assert_eq!(uniform_rate(5.0, 6.0), 1.0);
    assert_relative_eq!(uniform_rate(9.0, 6.0), 1.5);
    assert_eq!(uniform_rate(30.0, 6.0), 2.0);
    assert_eq!(uniform_rate(9.0, 0.0), 2.0);
}

#[test]
fn test_clamp_speed() {
    assert_eq!(clamp_speed(1.5), 1.5);
    assert_eq!(clamp_speed(3.0), 2.0);
    assert_eq!(clamp_speed(0.1), 0.5);
    assert_eq!(clamp_speed(f64::NAN), 1.0);
}

#[test]
fn test_budget_text_and_limits() {
    let mut budget = Budget::new(300, 0);
    assert_eq!(budget.slide_count(), 1);

    budget.set_slide_count(4);
    assert_eq!(budget.set_target_text("2:00"), 120);
    assert_relative_eq!(budget.per_segment_limit(), 30.0);
    assert_eq!(budget.indices().collect::<Vec<_>>(), vec![1, 2, 3, 4]);

    assert_eq!(budget.set_target_text("two minutes"), 120);
    budget.set_target_seconds(90);
    assert_eq!(budget.target_total_seconds(), 90);
}
