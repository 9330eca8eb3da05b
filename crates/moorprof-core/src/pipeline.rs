// crates/moorprof-core/src/pipeline.rs
//
// Per-profile orchestration: CTD reference preparation, cross-instrument
// synchronization, current-meter transformation, mask application, pressure
// binning, then deployment-level assembly. Each profile degrades locally;
// only structural invariant violations abort the run.

use polars::prelude::DataFrame;
use tracing::info;

use crate::assemble::{pad_unbinned, stack_binned, stack_unbinned};
use crate::binning::{bin_profile, BinnedProfile};
use crate::config::DeploymentConfig;
use crate::error::{PipelineError, Result};
use crate::ingest::DeploymentStreams;
use crate::interp::centered_diff;
use crate::mask::apply_profile_mask;
use crate::outputs::{InstrumentProducts, RunSummary};
use crate::quality::{apply_quality_gate, GateField};
use crate::sync::synchronize_profile;
use crate::transform::transform_velocity;
use crate::types::{Channel, InstrumentKind, Level, ProfileDirection, ProfileRecord, StepCode};

/// Reversals faster than this (against the travel direction) flag a
/// backtrack, in dbar/s.
const BACKTRACK_DPDT_THRESHOLD: f64 = 0.005;

#[derive(Debug)]
pub struct PipelineOutput {
    pub products: Vec<InstrumentProducts>,
    pub summary: RunSummary,
}

pub fn run_deployment(
    streams: &mut DeploymentStreams,
    config: &DeploymentConfig,
) -> Result<PipelineOutput> {
    if streams.ctd.len() != streams.engineering.len()
        || streams.ctd.len() != streams.current_meter.len()
    {
        return Err(PipelineError::StreamLengthMismatch {
            ctd: streams.ctd.len(),
            engineering: streams.engineering.len(),
            current_meter: streams.current_meter.len(),
        });
    }

    streams.mark_unimported();

    // L0 snapshot of the imported data, before any stage mutates it.
    let raw_ctd = stack_unbinned(&streams.ctd, InstrumentKind::Ctd, Level::L0)?;
    let raw_eng = stack_unbinned(&streams.engineering, InstrumentKind::Engineering, Level::L0)?;
    let raw_acm = stack_unbinned(&streams.current_meter, InstrumentKind::CurrentMeter, Level::L0)?;

    // Reference preparation must complete for a profile before any secondary
    // work on that profile; everything after that is independent per profile.
    for record in streams.ctd.iter_mut() {
        prepare_reference(record, config.ctd.sample_rate_hz);
    }
    apply_quality_gate(
        &mut streams.ctd,
        GateField::Pressure,
        config.ctd.min_points,
        config.ctd.min_range,
    );

    for (secondary, reference) in streams.engineering.iter_mut().zip(streams.ctd.iter()) {
        synchronize_profile(
            secondary,
            reference,
            config.engineering.sample_rate_hz,
            config.engineering.depth_offset_dbar,
        )?;
    }
    for (secondary, reference) in streams.current_meter.iter_mut().zip(streams.ctd.iter()) {
        synchronize_profile(
            secondary,
            reference,
            config.current_meter.instrument.sample_rate_hz,
            config.current_meter.instrument.depth_offset_dbar,
        )?;
    }

    // Short-record rejection on each stream's driving field.
    apply_quality_gate(
        &mut streams.engineering,
        GateField::Pressure,
        config.engineering.min_points,
        config.engineering.min_range,
    );
    apply_quality_gate(
        &mut streams.current_meter,
        GateField::Channel(Channel::Heading),
        config.current_meter.instrument.min_points,
        config.current_meter.instrument.min_range,
    );

    for record in streams.current_meter.iter_mut() {
        transform_velocity(record, config)?;
    }

    for (kind, records) in [
        (InstrumentKind::Ctd, &mut streams.ctd),
        (InstrumentKind::Engineering, &mut streams.engineering),
        (InstrumentKind::CurrentMeter, &mut streams.current_meter),
    ] {
        for record in records.iter_mut() {
            apply_profile_mask(record, kind);
        }
    }

    let binned_ctd = bin_stream(&mut streams.ctd, InstrumentKind::Ctd, config);
    let binned_eng = bin_stream(&mut streams.engineering, InstrumentKind::Engineering, config);
    let binned_acm = bin_stream(
        &mut streams.current_meter,
        InstrumentKind::CurrentMeter,
        config,
    );

    let products = vec![
        assemble_stream(&mut streams.ctd, raw_ctd, &binned_ctd, InstrumentKind::Ctd)?,
        assemble_stream(
            &mut streams.engineering,
            raw_eng,
            &binned_eng,
            InstrumentKind::Engineering,
        )?,
        assemble_stream(
            &mut streams.current_meter,
            raw_acm,
            &binned_acm,
            InstrumentKind::CurrentMeter,
        )?,
    ];

    let summary = RunSummary::from_streams(
        &config.deployment.id,
        config.deployment.profiler_type.as_str(),
        streams,
    );
    info!(
        deployment = config.deployment.id.as_str(),
        profiles = streams.profile_count(),
        "deployment pipeline complete"
    );

    Ok(PipelineOutput { products, summary })
}

/// CTD reference preparation: travel direction from the pressure trend,
/// dP/dt from the acquisition rate, and a backtrack scan that narrows the
/// validity mask where the platform reversed against its travel direction.
fn prepare_reference(record: &mut ProfileRecord, sample_rate_hz: f64) {
    if record.is_empty() {
        return;
    }

    record.direction = detect_direction(&record.pressure);
    record.log_step(
        StepCode::DirectionDetect,
        format!("profile direction {}", record.direction.as_str()),
    );

    record.dpdt = centered_diff(&record.pressure, 1.0 / sample_rate_hz);

    let expected_sign = match record.direction {
        ProfileDirection::Descending => 1.0,
        ProfileDirection::Ascending => -1.0,
        ProfileDirection::Unknown => {
            record.log_step(StepCode::BacktrackDetect, "skipped: unknown direction");
            return;
        }
    };
    if record.profile_mask.len() != record.len() {
        record.profile_mask = vec![true; record.len()];
    }
    let mut flagged = 0usize;
    for (keep, &rate) in record.profile_mask.iter_mut().zip(record.dpdt.iter()) {
        if rate.is_finite() && rate * expected_sign < -BACKTRACK_DPDT_THRESHOLD {
            *keep = false;
            flagged += 1;
        }
    }
    record.backtrack = flagged > 0;
    record.log_step(
        StepCode::BacktrackDetect,
        format!("{flagged} samples flagged as backtrack"),
    );
}

fn detect_direction(pressure: &[f64]) -> ProfileDirection {
    let first = pressure.iter().copied().find(|p| p.is_finite());
    let last = pressure.iter().rev().copied().find(|p| p.is_finite());
    match (first, last) {
        (Some(start), Some(end)) if end > start => ProfileDirection::Descending,
        (Some(start), Some(end)) if end < start => ProfileDirection::Ascending,
        _ => ProfileDirection::Unknown,
    }
}

fn bin_stream(
    records: &mut [ProfileRecord],
    kind: InstrumentKind,
    config: &DeploymentConfig,
) -> Vec<BinnedProfile> {
    let bin_config = match kind {
        InstrumentKind::Ctd => &config.ctd.bin,
        InstrumentKind::Engineering => &config.engineering.bin,
        InstrumentKind::CurrentMeter => &config.current_meter.instrument.bin,
    };
    records
        .iter_mut()
        .map(|record| bin_profile(record, kind, bin_config))
        .collect()
}

fn assemble_stream(
    records: &mut [ProfileRecord],
    raw: DataFrame,
    binned: &[BinnedProfile],
    kind: InstrumentKind,
) -> Result<InstrumentProducts> {
    pad_unbinned(records, kind);
    let unbinned = stack_unbinned(records, kind, Level::L1)?;
    let binned = stack_binned(binned, kind)?;
    Ok(InstrumentProducts {
        kind,
        raw,
        unbinned,
        binned,
    })
}
