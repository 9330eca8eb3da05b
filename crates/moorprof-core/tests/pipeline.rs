use moorprof_core::config::DeploymentConfig;
use moorprof_core::ingest::DeploymentStreams;
use moorprof_core::pipeline::run_deployment;
use moorprof_core::types::{channel_set, Channel, InstrumentKind, Level, ProfileRecord};
use polars::prelude::*;

const CONFIG: &str = r#"
    [deployment]
    id = "e2e-deployment"
    profile_count = 1
    profiler_type = "coastal"
    magnetic_declination_deg = 0.0

    [ctd]
    sample_rate_hz = 1.0
    bin = { width_dbar = 5.0, min_dbar = 20.0, max_dbar = 500.0 }

    [engineering]
    sample_rate_hz = 1.0
    bin = { width_dbar = 5.0, min_dbar = 20.0, max_dbar = 500.0 }

    [current_meter]
    sample_rate_hz = 1.0
    wag_radius_m = 0.27
    bin = { width_dbar = 5.0, min_dbar = 20.0, max_dbar = 500.0 }
"#;

const SAMPLES: usize = 200;

/// 200 one-second samples ramping 20 -> 500 dbar.
fn scenario_pressure(i: usize) -> f64 {
    20.0 + 480.0 * i as f64 / (SAMPLES - 1) as f64
}

fn ctd_profile() -> ProfileRecord {
    let mut record = ProfileRecord::new(1);
    record.time = (0..SAMPLES).map(|i| i as f64).collect();
    record.pressure = (0..SAMPLES).map(scenario_pressure).collect();
    record.profile_mask = vec![true; SAMPLES];
    record.set_channel(Channel::Temperature, (0..SAMPLES).map(|i| 12.0 - i as f64 * 0.02).collect());
    record.set_channel(Channel::Conductivity, vec![3.4; SAMPLES]);
    record.set_channel(Channel::Salinity, vec![33.9; SAMPLES]);
    record
}

fn acm_profile() -> ProfileRecord {
    let mut record = ProfileRecord::new(1);
    record.time = (0..SAMPLES).map(|i| i as f64).collect();
    record.profile_mask = vec![true; SAMPLES];
    record.set_channel(Channel::VelBeam1, vec![0.12; SAMPLES]);
    record.set_channel(Channel::VelBeam2, vec![-0.08; SAMPLES]);
    record.set_channel(Channel::VelBeam3, vec![0.05; SAMPLES]);
    record.set_channel(Channel::VelBeam4, vec![-0.03; SAMPLES]);
    record.set_channel(Channel::Heading, vec![212.0; SAMPLES]); // zero heading rate
    record.set_channel(Channel::Pitch, vec![0.5; SAMPLES]);
    record.set_channel(Channel::Roll, vec![-0.4; SAMPLES]);
    record
}

fn scenario_streams() -> DeploymentStreams {
    let mut streams = DeploymentStreams::allocate(1);
    streams.ctd[0] = ctd_profile();
    streams.current_meter[0] = acm_profile();
    streams
}

fn column_f64(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    df.column(name)
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .collect()
}

#[test]
fn end_to_end_scenario_produces_97_populated_bins() {
    let config = DeploymentConfig::from_toml_str(CONFIG).unwrap();
    let mut streams = scenario_streams();

    let output = run_deployment(&mut streams, &config).expect("pipeline failed");

    let acm = output
        .products
        .iter()
        .find(|p| p.kind == InstrumentKind::CurrentMeter)
        .unwrap();
    assert_eq!(acm.binned.height(), 97);

    let pressure = column_f64(&acm.binned, "pressure_dbar");
    let mut previous = f64::NEG_INFINITY;
    for value in pressure.iter().map(|v| v.unwrap()) {
        assert!(value > previous, "bin pressures must increase");
        previous = value;
    }

    // Continuous sampling at ~2.4 dbar/sample fills every 5-dbar bin.
    for name in ["vel_east_m_s", "vel_north_m_s", "vel_up_m_s", "heading_deg"] {
        let column = column_f64(&acm.binned, name);
        assert_eq!(column.len(), 97);
        assert!(
            column.iter().all(|v| v.is_some_and(|x| x.is_finite())),
            "column {name} has empty bins"
        );
    }

    let ctd = output
        .products
        .iter()
        .find(|p| p.kind == InstrumentKind::Ctd)
        .unwrap();
    assert_eq!(ctd.binned.height(), 97);
    let temperature = column_f64(&ctd.binned, "temperature_c");
    assert!(temperature.iter().all(|v| v.is_some_and(|x| x.is_finite())));
}

#[test]
fn length_invariants_hold_after_the_full_run() {
    let config = DeploymentConfig::from_toml_str(CONFIG).unwrap();
    let mut streams = scenario_streams();
    run_deployment(&mut streams, &config).expect("pipeline failed");

    for (kind, records) in [
        (InstrumentKind::Ctd, &streams.ctd),
        (InstrumentKind::Engineering, &streams.engineering),
        (InstrumentKind::CurrentMeter, &streams.current_meter),
    ] {
        for record in records {
            let n = record.len();
            assert_eq!(record.pressure.len(), n);
            assert_eq!(record.dpdt.len(), n);
            assert_eq!(record.profile_mask.len(), n);
            for channel in channel_set(kind, Level::L1) {
                assert_eq!(
                    record.channel(*channel).map(|v| v.len()),
                    Some(n),
                    "{kind} channel {channel} length"
                );
            }
            assert_eq!(record.code_history.len(), record.data_status.len());
        }
    }
}

#[test]
fn all_false_mask_propagates_to_all_nan_binned_output() {
    let config = DeploymentConfig::from_toml_str(CONFIG).unwrap();
    let mut streams = scenario_streams();
    streams.ctd[0].profile_mask = vec![false; SAMPLES];

    let output = run_deployment(&mut streams, &config).expect("pipeline failed");

    // The secondary inherits the all-false mask through synchronization, so
    // every binned channel comes out NaN for both instruments.
    for product in output
        .products
        .iter()
        .filter(|p| p.kind != InstrumentKind::Engineering)
    {
        for channel in channel_set(product.kind, Level::L2) {
            let column = column_f64(&product.binned, channel.as_str());
            assert!(
                column.iter().all(|v| v.is_none_or(|x| x.is_nan())),
                "{} channel {channel} should be all NaN",
                product.kind
            );
        }
    }
}

#[test]
fn direction_and_backtrack_transfer_to_the_secondary() {
    let config = DeploymentConfig::from_toml_str(CONFIG).unwrap();
    let mut streams = scenario_streams();

    run_deployment(&mut streams, &config).expect("pipeline failed");

    assert_eq!(
        streams.current_meter[0].direction,
        streams.ctd[0].direction
    );
    assert_eq!(streams.current_meter[0].backtrack, streams.ctd[0].backtrack);
    assert!(streams.current_meter[0].has_usable_pressure());
}

#[test]
fn unselected_profiles_carry_placeholder_status() {
    let toml = CONFIG.replace("profile_count = 1", "profile_count = 3");
    let config = DeploymentConfig::from_toml_str(&toml).unwrap();
    let mut streams = DeploymentStreams::allocate(3);
    streams.ctd[0] = ctd_profile();
    streams.current_meter[0] = acm_profile();

    let output = run_deployment(&mut streams, &config).expect("pipeline failed");

    assert!(streams.ctd[2]
        .data_status
        .iter()
        .any(|s| s == "no data imported"));
    // Empty profiles still contribute a full all-NaN bin block so stacking
    // stays aligned.
    let ctd = output
        .products
        .iter()
        .find(|p| p.kind == InstrumentKind::Ctd)
        .unwrap();
    assert_eq!(ctd.binned.height(), 97 * 3);
}

#[test]
fn mismatched_stream_lengths_abort_the_run() {
    let config = DeploymentConfig::from_toml_str(CONFIG).unwrap();
    let mut streams = scenario_streams();
    streams.engineering.push(ProfileRecord::new(2));

    assert!(run_deployment(&mut streams, &config).is_err());
}
