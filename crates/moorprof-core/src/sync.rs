// crates/moorprof-core/src/sync.rs

use tracing::warn;

use crate::error::{PipelineError, Result};
use crate::interp::{centered_diff, interp_linear, interp_makima};
use crate::types::{ProfileRecord, StepCode};

const MIN_INTERP_POINTS: usize = 10;

/// Interpolates the reference (CTD) pressure series onto a secondary
/// instrument's native timestamps, derives dP/dt from the instrument's
/// acquisition rate, transfers the combined validity mask, and applies the
/// instrument's fixed depth offset.
///
/// Degraded inputs produce degraded-but-shaped outputs, never errors:
/// - secondary has no timestamps: pressure/dpdt stay empty;
/// - reference has no usable time or pressure: full-length NaN;
/// - too few points or disjoint time spans: pressure/dpdt left empty, a
///   deliberately distinct case from the NaN branch. Downstream assembly
///   widens these to full-length NaN before export.
///
/// The only error is structural: paired records that disagree on profile
/// identity, which indicates upstream import corruption.
pub fn synchronize_profile(
    secondary: &mut ProfileRecord,
    reference: &ProfileRecord,
    sample_rate_hz: f64,
    depth_offset_dbar: f64,
) -> Result<()> {
    if secondary.profile_number != reference.profile_number {
        return Err(PipelineError::ProfileMismatch {
            reference: reference.profile_number,
            secondary: secondary.profile_number,
        });
    }

    if secondary.time.is_empty() {
        secondary.pressure = Vec::new();
        secondary.dpdt = Vec::new();
        secondary.log_step(StepCode::PressureSync, "no pressure record added");
        return Ok(());
    }

    if !reference.has_usable_time() || reference.pressure.is_empty() {
        let n = secondary.time.len();
        secondary.pressure = vec![f64::NAN; n];
        secondary.dpdt = vec![f64::NAN; n];
        transfer_reference_attributes(secondary, reference);
        secondary.log_step(StepCode::PressureSync, "NaN pressure record added");
        return Ok(());
    }

    // Interpolation operates on the finite (time, pressure) pairs only.
    let (ref_time, ref_pressure, ref_mask) = finite_reference(reference);

    let secondary_span = span(&secondary.time);
    let reference_span = span(&ref_time);
    let overlaps = match (secondary_span, reference_span) {
        (Some((s_lo, s_hi)), Some((r_lo, r_hi))) => s_lo <= r_hi && r_lo <= s_hi,
        _ => false,
    };

    if secondary.time.len() < MIN_INTERP_POINTS || ref_time.len() < MIN_INTERP_POINTS || !overlaps {
        warn!(
            profile = secondary.profile_number,
            secondary_points = secondary.time.len(),
            reference_points = ref_time.len(),
            overlaps,
            "not enough points to interpolate pressure"
        );
        secondary.pressure = Vec::new();
        secondary.dpdt = Vec::new();
        transfer_reference_attributes(secondary, reference);
        secondary.log_step(StepCode::PressureSync, "not enough points to interpolate");
        return Ok(());
    }

    let mut pressure = interp_makima(&ref_time, &ref_pressure, &secondary.time);
    let dpdt = centered_diff(&pressure, 1.0 / sample_rate_hz);

    combine_masks(secondary, &ref_time, &ref_mask);
    transfer_reference_attributes(secondary, reference);

    for p in pressure.iter_mut() {
        *p += depth_offset_dbar;
    }
    secondary.pressure = pressure;
    secondary.dpdt = dpdt;
    secondary.log_step(StepCode::PressureSync, "pressure record added");
    Ok(())
}

/// Reference mask carried onto the secondary timestamps by linear
/// interpolation of the mask as 0/1 values. Only samples landing exactly on
/// 1.0 stay valid: fractional values occur at mask transition edges and are
/// rejected, as are samples outside the reference span (NaN). The result is
/// ANDed with the secondary's own mask, so the combined mask only narrows.
fn combine_masks(secondary: &mut ProfileRecord, ref_time: &[f64], ref_mask: &[f64]) {
    let n = secondary.time.len();
    if secondary.profile_mask.len() != n {
        secondary.profile_mask = vec![true; n];
    }
    let carried = interp_linear(ref_time, ref_mask, &secondary.time);
    for (own, value) in secondary.profile_mask.iter_mut().zip(carried.iter()) {
        *own = *own && (*value == 1.0);
    }
}

fn transfer_reference_attributes(secondary: &mut ProfileRecord, reference: &ProfileRecord) {
    secondary.direction = reference.direction;
    secondary.profile_date = reference.profile_date;
    secondary.backtrack = reference.backtrack;
}

/// Finite (time, pressure, mask-as-0/1) triples from the reference record,
/// in time order as recorded.
fn finite_reference(reference: &ProfileRecord) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut time = Vec::with_capacity(reference.time.len());
    let mut pressure = Vec::with_capacity(reference.time.len());
    let mut mask = Vec::with_capacity(reference.time.len());
    for (i, &t) in reference.time.iter().enumerate() {
        let p = reference.pressure.get(i).copied().unwrap_or(f64::NAN);
        if t.is_finite() && p.is_finite() {
            time.push(t);
            pressure.push(p);
            mask.push(if reference.profile_mask.get(i).copied().unwrap_or(true) {
                1.0
            } else {
                0.0
            });
        }
    }
    (time, pressure, mask)
}

fn span(values: &[f64]) -> Option<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &v in values {
        if v.is_finite() {
            lo = lo.min(v);
            hi = hi.max(v);
        }
    }
    (lo <= hi).then_some((lo, hi))
}
