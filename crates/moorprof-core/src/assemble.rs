// crates/moorprof-core/src/assemble.rs
//
// Deployment-level assembly: widen degraded fields to full-length NaN, pad
// every profile to a common length, and stack the per-profile products into
// long-format DataFrames ready for parquet export.

use polars::prelude::{Column, DataFrame, NamedFrom, PolarsError, Series};

use crate::binning::BinnedProfile;
use crate::types::{channel_set, nan_vec, InstrumentKind, Level, ProfileRecord};

/// Widens any field left empty by an upstream degraded branch (quality-gate
/// nulling, failed interpolation) to full-length NaN, so every exported field
/// keeps positional alignment with `time`. Missing channels from the L1 set
/// are filled the same way.
pub fn finalize_unbinned(record: &mut ProfileRecord, kind: InstrumentKind) {
    let n = record.len();
    if record.pressure.len() != n {
        record.pressure = nan_vec(n);
    }
    if record.dpdt.len() != n {
        record.dpdt = nan_vec(n);
    }
    if record.profile_mask.len() != n {
        record.profile_mask = vec![false; n];
    }
    for channel in channel_set(kind, Level::L1) {
        let needs_fill = record
            .channel(*channel)
            .is_none_or(|values| values.len() != n);
        if needs_fill {
            record.set_channel(*channel, nan_vec(n));
        }
    }
}

/// Pads every record to the longest profile in the stream: NaN for numeric
/// fields, false for the mask. Returns the common padded length. Fixed-length
/// profiles stack directly into a deployment-wide sample matrix.
pub fn pad_unbinned(records: &mut [ProfileRecord], kind: InstrumentKind) -> usize {
    let target = records.iter().map(|r| r.len()).max().unwrap_or(0);
    for record in records.iter_mut() {
        finalize_unbinned(record, kind);
        let pad = target - record.len();
        if pad == 0 {
            continue;
        }
        record.time.extend(std::iter::repeat_n(f64::NAN, pad));
        record.pressure.extend(std::iter::repeat_n(f64::NAN, pad));
        record.dpdt.extend(std::iter::repeat_n(f64::NAN, pad));
        record.profile_mask.extend(std::iter::repeat_n(false, pad));
        for channel in channel_set(kind, Level::L1) {
            if let Some(values) = record.channel_mut(*channel) {
                values.extend(std::iter::repeat_n(f64::NAN, pad));
            }
        }
    }
    target
}

/// One row per (profile, sample), channels as columns. `level` selects the
/// channel set: L0 right after import, L1 after the full per-profile
/// pipeline. Fields a degraded profile left empty (or never had) widen to
/// NaN in the output so every column keeps the same height.
pub fn stack_unbinned(
    records: &[ProfileRecord],
    kind: InstrumentKind,
    level: Level,
) -> Result<DataFrame, PolarsError> {
    let total: usize = records.iter().map(|r| r.len()).sum();
    let mut profile_numbers = Vec::with_capacity(total);
    let mut times = Vec::with_capacity(total);
    let mut pressures = Vec::with_capacity(total);
    let mut dpdts = Vec::with_capacity(total);
    let mut masks = Vec::with_capacity(total);
    let channels = channel_set(kind, level);
    let mut channel_data: Vec<Vec<f64>> = vec![Vec::with_capacity(total); channels.len()];

    for record in records {
        let n = record.len();
        profile_numbers.extend(std::iter::repeat_n(record.profile_number, n));
        times.extend_from_slice(&record.time);
        extend_padded(&mut pressures, &record.pressure, n);
        extend_padded(&mut dpdts, &record.dpdt, n);
        if record.profile_mask.len() == n {
            masks.extend(record.profile_mask.iter().copied());
        } else {
            masks.extend(std::iter::repeat_n(false, n));
        }
        for (slot, channel) in channel_data.iter_mut().zip(channels.iter()) {
            extend_padded(slot, record.channel(*channel).unwrap_or_default(), n);
        }
    }

    let mut columns: Vec<Column> = vec![
        Series::new("profile_number".into(), profile_numbers).into(),
        Series::new("time_s".into(), times).into(),
        Series::new("pressure_dbar".into(), pressures).into(),
        Series::new("dpdt_dbar_s".into(), dpdts).into(),
        Series::new("profile_mask".into(), masks).into(),
    ];
    for (values, channel) in channel_data.into_iter().zip(channels.iter()) {
        columns.push(Series::new(channel.as_str().into(), values).into());
    }
    DataFrame::new(columns)
}

fn extend_padded(out: &mut Vec<f64>, values: &[f64], n: usize) {
    if values.len() == n {
        out.extend_from_slice(values);
    } else {
        out.extend(std::iter::repeat_n(f64::NAN, n));
    }
}

/// One row per (profile, pressure bin); the grid is identical for every
/// profile, so the frame is a long-format pressure-time matrix.
pub fn stack_binned(
    binned: &[BinnedProfile],
    kind: InstrumentKind,
) -> Result<DataFrame, PolarsError> {
    let total: usize = binned.iter().map(|b| b.pressure.len()).sum();
    let mut profile_numbers = Vec::with_capacity(total);
    let mut directions = Vec::with_capacity(total);
    let mut pressures = Vec::with_capacity(total);
    let channels = channel_set(kind, Level::L2);
    let mut channel_data: Vec<Vec<f64>> = vec![Vec::with_capacity(total); channels.len()];

    for profile in binned {
        let n = profile.pressure.len();
        profile_numbers.extend(std::iter::repeat_n(profile.profile_number, n));
        directions.extend(std::iter::repeat_n(profile.direction.as_str(), n));
        pressures.extend_from_slice(&profile.pressure);
        for (slot, channel) in channel_data.iter_mut().zip(channels.iter()) {
            match profile.channels.get(channel) {
                Some(values) => slot.extend_from_slice(values),
                None => slot.extend(std::iter::repeat_n(f64::NAN, n)),
            }
        }
    }

    let mut columns: Vec<Column> = vec![
        Series::new("profile_number".into(), profile_numbers).into(),
        Series::new("direction".into(), directions).into(),
        Series::new("pressure_dbar".into(), pressures).into(),
    ];
    for (values, channel) in channel_data.into_iter().zip(channels.iter()) {
        columns.push(Series::new(channel.as_str().into(), values).into());
    }
    DataFrame::new(columns)
}
