// crates/moorprof-core/src/binning.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::config::BinConfig;
use crate::types::{channel_set, Channel, InstrumentKind, Level, ProfileDirection, ProfileRecord, StepCode};

/// Fixed pressure grid of bin centers `min..=max` step `width`; each bin
/// covers center +/- width/2. Identical across profiles of a deployment so
/// binned rows stack directly into a pressure-time matrix.
#[derive(Debug, Clone)]
pub struct BinGrid {
    centers: Vec<f64>,
    width: f64,
}

impl BinGrid {
    pub fn new(config: &BinConfig) -> Self {
        let count = config.bin_count();
        let centers = (0..count)
            .map(|i| config.min_dbar + i as f64 * config.width_dbar)
            .collect();
        Self {
            centers,
            width: config.width_dbar,
        }
    }

    pub fn centers(&self) -> &[f64] {
        &self.centers
    }

    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    /// Index of the bin containing `pressure`, if any.
    fn index_of(&self, pressure: f64) -> Option<usize> {
        if !pressure.is_finite() || self.centers.is_empty() {
            return None;
        }
        let lower_edge = self.centers[0] - self.width / 2.0;
        let idx = ((pressure - lower_edge) / self.width).floor();
        if idx < 0.0 {
            return None;
        }
        let idx = idx as usize;
        (idx < self.centers.len()).then_some(idx)
    }
}

/// One profile resampled onto the pressure grid: one row per bin, channels
/// aligned identically across profiles.
#[derive(Debug, Clone)]
pub struct BinnedProfile {
    pub profile_number: u32,
    pub direction: ProfileDirection,
    pub profile_date: Option<DateTime<Utc>>,
    pub pressure: Vec<f64>,
    pub channels: BTreeMap<Channel, Vec<f64>>,
}

/// Resamples a mask-applied profile onto the grid. Each bin takes the median
/// of the retained (finite) in-bin samples per channel, or NaN when fewer
/// than `min_samples` survive. Heading is aggregated with a circular vector
/// mean since arithmetic means wrap wrongly across 0/360.
pub fn bin_profile(
    record: &mut ProfileRecord,
    kind: InstrumentKind,
    config: &BinConfig,
) -> BinnedProfile {
    let grid = BinGrid::new(config);
    let channels = channel_set(kind, Level::L2);

    // Bin membership is driven by the pressure series; masked samples carry
    // NaN pressure and therefore land in no bin.
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); grid.len()];
    for (i, &p) in record.pressure.iter().enumerate() {
        if let Some(bin) = grid.index_of(p) {
            members[bin].push(i);
        }
    }

    let mut binned = BinnedProfile {
        profile_number: record.profile_number,
        direction: record.direction,
        profile_date: record.profile_date,
        pressure: grid.centers().to_vec(),
        channels: BTreeMap::new(),
    };

    let mut populated = 0usize;
    for channel in channels {
        let source = record.channel(*channel).unwrap_or_default();
        let mut column = vec![f64::NAN; grid.len()];
        for (bin, indices) in members.iter().enumerate() {
            let values: Vec<f64> = indices
                .iter()
                .filter_map(|&i| source.get(i).copied())
                .filter(|v| v.is_finite())
                .collect();
            if values.len() < config.min_samples {
                continue;
            }
            column[bin] = if channel.is_circular() {
                circular_mean_deg(&values)
            } else {
                median(&values)
            };
            populated += 1;
        }
        binned.channels.insert(*channel, column);
    }

    record.log_step(
        StepCode::PressureBin,
        format!(
            "binned onto {} levels ({} channel bins populated)",
            grid.len(),
            populated
        ),
    );
    binned
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("median over non-finite values"));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Vector mean of unit vectors at the recorded angles, mapped back to
/// [0, 360).
fn circular_mean_deg(values: &[f64]) -> f64 {
    let (mut sin_sum, mut cos_sum) = (0.0f64, 0.0f64);
    for &v in values {
        let r = v.to_radians();
        sin_sum += r.sin();
        cos_sum += r.cos();
    }
    sin_sum
        .atan2(cos_sum)
        .to_degrees()
        .rem_euclid(360.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_handles_even_and_odd_counts() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn circular_mean_crosses_north_correctly() {
        let mean = circular_mean_deg(&[350.0, 10.0]);
        assert!(mean < 1e-9 || (360.0 - mean) < 1e-9, "got {mean}");

        let arithmetic_trap = circular_mean_deg(&[359.0, 1.0, 0.0]);
        assert!(arithmetic_trap < 1.0 || arithmetic_trap > 359.0);
    }

    #[test]
    fn grid_assigns_samples_to_center_windows() {
        let grid = BinGrid::new(&BinConfig {
            width_dbar: 5.0,
            min_dbar: 20.0,
            max_dbar: 500.0,
            min_samples: 1,
        });
        assert_eq!(grid.len(), 97);
        assert_eq!(grid.index_of(20.0), Some(0));
        assert_eq!(grid.index_of(22.4), Some(0));
        assert_eq!(grid.index_of(22.6), Some(1));
        assert_eq!(grid.index_of(500.0), Some(96));
        assert_eq!(grid.index_of(17.0), None);
        assert_eq!(grid.index_of(f64::NAN), None);
    }
}
