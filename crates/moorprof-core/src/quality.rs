// crates/moorprof-core/src/quality.rs

use tracing::warn;

use crate::types::{Channel, ProfileRecord, StepCode};

/// Field a quality gate drives on: the top-level pressure series or a named
/// channel (heading for the current meter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateField {
    Pressure,
    Channel(Channel),
}

impl GateField {
    fn name(&self) -> &'static str {
        match self {
            GateField::Pressure => "pressure_dbar",
            GateField::Channel(channel) => channel.as_str(),
        }
    }
}

/// Nulls (empties) `field` on every record whose finite point count falls
/// below `min_points` or whose dynamic range falls below `min_range`. The -1
/// sentinel disables either threshold since no real count or range sits below
/// it. Rejection is local: the deployment is never aborted, and every outcome
/// lands in the record's audit trail. Returns the nulled profile numbers.
pub fn apply_quality_gate(
    records: &mut [ProfileRecord],
    field: GateField,
    min_points: i64,
    min_range: f64,
) -> Vec<u32> {
    let mut nulled = Vec::new();

    for record in records.iter_mut() {
        let (count, range) = match field {
            GateField::Pressure => finite_stats(&record.pressure),
            GateField::Channel(channel) => {
                finite_stats(record.channel(channel).unwrap_or_default())
            }
        };

        let too_few = (count as i64) < min_points;
        let too_flat = range < min_range;

        if too_few || too_flat {
            match field {
                GateField::Pressure => record.pressure = Vec::new(),
                GateField::Channel(channel) => {
                    record.set_channel(channel, Vec::new());
                }
            }
            record.log_step(
                StepCode::QualityGate,
                format!(
                    "{} nulled: {} finite points, range {:.3}",
                    field.name(),
                    count,
                    range
                ),
            );
            nulled.push(record.profile_number);
        } else {
            record.log_step(StepCode::QualityGate, format!("{} passed", field.name()));
        }
    }

    if !nulled.is_empty() {
        warn!(
            field = field.name(),
            profiles = ?nulled,
            "quality gate nulled {} profile(s)",
            nulled.len()
        );
    }

    nulled
}

/// Finite point count and dynamic range, ignoring NaN. Empty or all-NaN data
/// has range 0, which fails any enabled range threshold automatically.
fn finite_stats(values: &[f64]) -> (usize, f64) {
    let mut count = 0usize;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in values {
        if v.is_finite() {
            count += 1;
            min = min.min(v);
            max = max.max(v);
        }
    }
    let range = if count == 0 { 0.0 } else { max - min };
    (count, range)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_pressure(n: u32, pressure: Vec<f64>) -> ProfileRecord {
        let mut record = ProfileRecord::new(n);
        record.time = (0..pressure.len()).map(|i| i as f64).collect();
        record.pressure = pressure;
        record
    }

    #[test]
    fn exactly_min_points_is_kept() {
        let mut records = vec![record_with_pressure(1, (0..50).map(|i| i as f64).collect())];
        let nulled = apply_quality_gate(&mut records, GateField::Pressure, 50, -1.0);
        assert!(nulled.is_empty());
        assert_eq!(records[0].pressure.len(), 50);
    }

    #[test]
    fn one_below_min_points_is_nulled() {
        let mut records = vec![record_with_pressure(1, (0..49).map(|i| i as f64).collect())];
        let nulled = apply_quality_gate(&mut records, GateField::Pressure, 50, -1.0);
        assert_eq!(nulled, vec![1]);
        assert!(records[0].pressure.is_empty());
    }

    #[test]
    fn sentinel_disables_both_thresholds() {
        let mut records = vec![record_with_pressure(1, vec![5.0, 5.0])];
        let nulled = apply_quality_gate(&mut records, GateField::Pressure, -1, -1.0);
        assert!(nulled.is_empty());
    }

    #[test]
    fn all_nan_field_fails_enabled_range_threshold() {
        let mut records = vec![record_with_pressure(4, vec![f64::NAN; 30])];
        let nulled = apply_quality_gate(&mut records, GateField::Pressure, -1, 1.0);
        assert_eq!(nulled, vec![4]);
    }

    #[test]
    fn nan_samples_are_excluded_from_range() {
        let pressure = vec![10.0, f64::NAN, 11.0, f64::NAN, 12.0];
        let mut records = vec![record_with_pressure(2, pressure)];
        // Range is 2.0 over the finite samples; a 5.0 threshold nulls it.
        let nulled = apply_quality_gate(&mut records, GateField::Pressure, -1, 5.0);
        assert_eq!(nulled, vec![2]);
    }

    #[test]
    fn channel_gate_nulls_only_the_named_channel(){
        let mut record = ProfileRecord::new(7);
        record.time = vec![0.0, 1.0, 2.0];
        record.pressure = vec![1.0, 2.0, 3.0];
        record.set_channel(Channel::Heading, vec![100.0, 100.1, 100.2]);
        let mut records = vec![record];
        let nulled =
            apply_quality_gate(&mut records, GateField::Channel(Channel::Heading), -1, 30.0);
        assert_eq!(nulled, vec![7]);
        assert!(records[0].channel(Channel::Heading).unwrap().is_empty());
        assert_eq!(records[0].pressure.len(), 3);
    }
}
