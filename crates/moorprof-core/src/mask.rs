// crates/moorprof-core/src/mask.rs

use crate::types::{channel_set, InstrumentKind, Level, ProfileRecord, StepCode};

/// Final quality gate before binning: every sample at a mask-false position,
/// across the record's L1 channel set plus pressure and dP/dt, becomes NaN.
/// Runs once, after all contributing masks have been combined. NaN-ing an
/// already-NaN value is a no-op, so the pass is idempotent. No-op when the
/// record has no pressure.
pub fn apply_profile_mask(record: &mut ProfileRecord, kind: InstrumentKind) {
    if record.pressure.is_empty() {
        record.log_step(StepCode::MaskApply, "no action taken (empty pressure)");
        return;
    }

    let mask = record.profile_mask.clone();
    let mut masked = 0usize;

    masked += nan_where_false(&mut record.pressure, &mask);
    masked += nan_where_false(&mut record.dpdt, &mask);
    for channel in channel_set(kind, Level::L1) {
        if let Some(values) = record.channel_mut(*channel) {
            masked += nan_where_false(values, &mask);
        }
    }

    record.log_step(
        StepCode::MaskApply,
        format!("{masked} field samples outside validity mask set to NaN"),
    );
}

fn nan_where_false(values: &mut [f64], mask: &[bool]) -> usize {
    let mut count = 0usize;
    for (value, keep) in values.iter_mut().zip(mask.iter()) {
        if !keep && !value.is_nan() {
            *value = f64::NAN;
            count += 1;
        }
    }
    count
}
