use moorprof_core::sync::synchronize_profile;
use moorprof_core::types::{ProfileDirection, ProfileRecord};

fn reference_ramp(n: usize, t0: f64, dt: f64, p0: f64, dp: f64) -> ProfileRecord {
    let mut record = ProfileRecord::new(1);
    record.time = (0..n).map(|i| t0 + i as f64 * dt).collect();
    record.pressure = (0..n).map(|i| p0 + i as f64 * dp).collect();
    record.profile_mask = vec![true; n];
    record.direction = ProfileDirection::Descending;
    record
}

fn secondary_at(times: Vec<f64>) -> ProfileRecord {
    let mut record = ProfileRecord::new(1);
    record.time = times;
    record
}

#[test]
fn interpolates_pressure_onto_secondary_timestamps() {
    let reference = reference_ramp(100, 0.0, 1.0, 20.0, 2.0);
    let mut secondary = secondary_at((0..50).map(|i| 0.5 + i as f64 * 2.0).collect());

    synchronize_profile(&mut secondary, &reference, 0.5, 0.0).unwrap();

    assert_eq!(secondary.pressure.len(), 50);
    // Linear ramp interpolates exactly under a shape-preserving cubic.
    assert!((secondary.pressure[0] - 21.0).abs() < 1e-9);
    assert!((secondary.pressure[10] - 61.0).abs() < 1e-9);
    // Constant 2 dbar/s ramp; dt derived from the 0.5 Hz rate.
    for rate in &secondary.dpdt {
        assert!((rate - 2.0).abs() < 1e-9);
    }
    assert_eq!(secondary.direction, ProfileDirection::Descending);
    assert_eq!(secondary.data_status.last().unwrap(), "pressure record added");
}

#[test]
fn depth_offset_is_added_after_interpolation() {
    let reference = reference_ramp(50, 0.0, 1.0, 100.0, 0.0);
    let mut secondary = secondary_at((0..20).map(|i| i as f64).collect());

    synchronize_profile(&mut secondary, &reference, 1.0, -0.72).unwrap();

    for p in &secondary.pressure {
        assert!((p - 99.28).abs() < 1e-9);
    }
}

#[test]
fn empty_secondary_gets_no_pressure_record() {
    let reference = reference_ramp(50, 0.0, 1.0, 20.0, 1.0);
    let mut secondary = secondary_at(Vec::new());

    synchronize_profile(&mut secondary, &reference, 1.0, 0.0).unwrap();

    assert!(secondary.pressure.is_empty());
    assert!(secondary.dpdt.is_empty());
    assert_eq!(
        secondary.data_status.last().unwrap(),
        "no pressure record added"
    );
    // The empty-secondary branch transfers nothing.
    assert_eq!(secondary.direction, ProfileDirection::Unknown);
}

#[test]
fn unusable_reference_yields_full_length_nan() {
    let mut reference = reference_ramp(50, 0.0, 1.0, 20.0, 1.0);
    reference.pressure = Vec::new();
    let mut secondary = secondary_at((0..30).map(|i| i as f64).collect());

    synchronize_profile(&mut secondary, &reference, 1.0, 0.0).unwrap();

    assert_eq!(secondary.pressure.len(), 30);
    assert!(secondary.pressure.iter().all(|p| p.is_nan()));
    assert!(secondary.dpdt.iter().all(|p| p.is_nan()));
    assert_eq!(
        secondary.data_status.last().unwrap(),
        "NaN pressure record added"
    );
    assert_eq!(secondary.direction, ProfileDirection::Descending);
}

#[test]
fn disjoint_short_series_yields_empty_not_nan() {
    // Five secondary points, reference spanning a disjoint interval: this is
    // the degraded "not enough points" case and must stay distinct from the
    // NaN branch above.
    let reference = reference_ramp(100, 0.0, 1.0, 20.0, 1.0);
    let mut secondary = secondary_at((0..5).map(|i| 1000.0 + i as f64).collect());

    synchronize_profile(&mut secondary, &reference, 1.0, 0.0).unwrap();

    assert!(secondary.pressure.is_empty());
    assert!(secondary.dpdt.is_empty());
    assert_eq!(
        secondary.data_status.last().unwrap(),
        "not enough points to interpolate"
    );
}

#[test]
fn overlapping_but_short_reference_also_degrades() {
    let reference = reference_ramp(5, 0.0, 1.0, 20.0, 1.0);
    let mut secondary = secondary_at((0..50).map(|i| i as f64 * 0.1).collect());

    synchronize_profile(&mut secondary, &reference, 1.0, 0.0).unwrap();

    assert!(secondary.pressure.is_empty());
    assert_eq!(
        secondary.data_status.last().unwrap(),
        "not enough points to interpolate"
    );
}

#[test]
fn combined_mask_is_subset_of_both_contributors() {
    let mut reference = reference_ramp(100, 0.0, 1.0, 20.0, 1.0);
    for i in 40..60 {
        reference.profile_mask[i] = false;
    }

    let mut secondary = secondary_at((0..100).map(|i| i as f64).collect());
    secondary.profile_mask = vec![true; 100];
    for i in 0..10 {
        secondary.profile_mask[i] = false;
    }
    let own_before = secondary.profile_mask.clone();

    synchronize_profile(&mut secondary, &reference, 1.0, 0.0).unwrap();

    for i in 0..100 {
        // Monotonicity: never widens either contributing mask.
        assert!(!secondary.profile_mask[i] || own_before[i]);
        if (40..60).contains(&i) {
            assert!(!secondary.profile_mask[i]);
        }
    }
    assert!(secondary.profile_mask[70]);
}

#[test]
fn mask_transition_edges_are_excluded() {
    let mut reference = reference_ramp(20, 0.0, 1.0, 20.0, 1.0);
    reference.profile_mask[10] = false;

    // Secondary samples halfway between reference samples interpolate to 0.5
    // across the transition and must be rejected; interior of the all-true
    // span interpolates exactly to 1.0.
    let mut secondary = secondary_at((0..19).map(|i| i as f64 + 0.5).collect());
    synchronize_profile(&mut secondary, &reference, 1.0, 0.0).unwrap();

    assert!(secondary.profile_mask[2]);
    assert!(!secondary.profile_mask[9]);
    assert!(!secondary.profile_mask[10]);
    assert!(secondary.profile_mask[15]);
}

#[test]
fn samples_beyond_reference_span_are_masked_out() {
    let reference = reference_ramp(50, 0.0, 1.0, 20.0, 1.0);
    let mut secondary = secondary_at((0..60).map(|i| i as f64).collect());

    synchronize_profile(&mut secondary, &reference, 1.0, 0.0).unwrap();

    assert!(secondary.profile_mask[30]);
    for i in 50..60 {
        assert!(!secondary.profile_mask[i]);
    }
    // Pressure itself extrapolates; only the mask rejects the overhang.
    assert!(secondary.pressure[55].is_finite());
}

#[test]
fn mismatched_profile_numbers_are_fatal() {
    let reference = reference_ramp(50, 0.0, 1.0, 20.0, 1.0);
    let mut secondary = secondary_at((0..20).map(|i| i as f64).collect());
    secondary.profile_number = 2;

    assert!(synchronize_profile(&mut secondary, &reference, 1.0, 0.0).is_err());
}
