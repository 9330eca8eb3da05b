// crates/moorprof-core/src/transform.rs
//
// Current-meter velocity processing: beam-frame measurements through the
// instrument frame into geographic East-North-Up, with platform-motion and
// mounting-geometry corrections.

use tracing::warn;

use crate::config::{DeploymentConfig, ProfilerType};
use crate::error::{PipelineError, Result};
use crate::interp::{centered_diff, unwrap_degrees};
use crate::types::{Channel, InstrumentKind, ProfileDirection, ProfileRecord, StepCode};

/// sin(5 deg)/sin(25 deg), fixed by the transducer mounting angles.
fn wag_geometry_ratio() -> f64 {
    (5.0f64.to_radians()).sin() / (25.0f64.to_radians()).sin()
}

/// Combined tilt beyond which the small-angle treatment breaks down; the
/// global variant rejects samples past this.
const MAX_TILT_DEG: f64 = 10.0;

/// Heading convention offset for the coastal current-meter family.
const COASTAL_HEADING_OFFSET_DEG: f64 = 90.0;

/// Runs the full transform chain on one current-meter profile. An empty
/// heading field marks an already-unusable profile: the whole chain becomes a
/// no-op with a single "no action taken" status entry.
pub fn transform_velocity(record: &mut ProfileRecord, config: &DeploymentConfig) -> Result<()> {
    if record
        .channel(Channel::Heading)
        .is_none_or(|h| h.is_empty())
    {
        record.log_step(StepCode::BeamTransform, "no action taken");
        return Ok(());
    }

    let cm = &config.current_meter;
    let mut beams = [
        required_channel(record, Channel::VelBeam1)?,
        required_channel(record, Channel::VelBeam2)?,
        required_channel(record, Channel::VelBeam3)?,
        required_channel(record, Channel::VelBeam4)?,
    ];
    let heading = required_channel(record, Channel::Heading)?;
    let pitch = required_channel(record, Channel::Pitch)?;
    let roll = required_channel(record, Channel::Roll)?;

    if cm.correct_vel_beam_for_phase_ambiguity {
        for beam in beams.iter_mut() {
            unwrap_phase(beam, cm.phase_ambiguity_velocity_m_s);
        }
        record.log_step(
            StepCode::PhaseUnwrap,
            format!(
                "beam velocities unwrapped against {:.2} m/s ambiguity span",
                cm.phase_ambiguity_velocity_m_s
            ),
        );
    }

    let (vx, mut vy, vz) = beams_to_instrument_frame(record, &beams);

    // Wag: the sensor head sits off the platform's rotation axis, so heading
    // changes add a lateral velocity proportional to the heading rate and the
    // moment arm. The signal is always computed and retained; subtraction
    // from Y is switched.
    let dt = 1.0 / cm.instrument.sample_rate_hz;
    let heading_rate_deg_s = centered_diff(&unwrap_degrees(&heading), dt);
    let wag: Vec<f64> = heading_rate_deg_s
        .iter()
        .map(|rate| rate.to_radians() * cm.wag_radius_m * wag_geometry_ratio())
        .collect();
    if cm.correct_vel_y_for_wag {
        for (y, w) in vy.iter_mut().zip(wag.iter()) {
            *y -= w;
        }
        record.log_step(StepCode::WagCorrection, "wag subtracted from lateral velocity");
    } else {
        record.log_step(
            StepCode::WagCorrection,
            "wag signal computed; subtraction disabled",
        );
    }

    // Tilt disabled means pitch and roll are zeroed, not skipped, so the same
    // rotation path always executes.
    let tilt_factor = if cm.correct_vel_xyz_for_pitch_and_roll {
        1.0
    } else {
        0.0
    };
    let heading_offset = match config.deployment.profiler_type {
        ProfilerType::Coastal => COASTAL_HEADING_OFFSET_DEG,
        ProfilerType::Global => 0.0,
    };

    let n = record.len();
    let mut east = vec![f64::NAN; n];
    let mut north = vec![f64::NAN; n];
    let mut up = vec![f64::NAN; n];
    for i in 0..n {
        let total_heading =
            heading[i] + config.deployment.magnetic_declination_deg + heading_offset;
        let (e, no, u) = rotate_to_enu(
            total_heading,
            pitch[i] * tilt_factor,
            roll[i] * tilt_factor,
            vx[i],
            vy[i],
            vz[i],
        );
        east[i] = e;
        north[i] = no;
        up[i] = u;
    }
    record.log_step(
        StepCode::EnuTransform,
        if cm.correct_vel_xyz_for_pitch_and_roll {
            "rotated to geographic frame with tilt correction"
        } else {
            "rotated to geographic frame; tilt correction disabled"
        },
    );

    if config.deployment.profiler_type == ProfilerType::Global {
        let mut rejected = 0usize;
        for i in 0..n {
            let tilt = (pitch[i] * pitch[i] + roll[i] * roll[i]).sqrt();
            if tilt > MAX_TILT_DEG {
                east[i] = f64::NAN;
                north[i] = f64::NAN;
                up[i] = f64::NAN;
                rejected += 1;
            }
        }
        record.log_step(
            StepCode::TiltRejection,
            format!("{rejected} samples beyond {MAX_TILT_DEG} deg tilt set to NaN"),
        );
    }

    apply_vertical_correction(record, &mut up, cm.correct_vel_u_for_dpdt);

    record.set_channel(Channel::VelX, vx);
    record.set_channel(Channel::VelY, vy);
    record.set_channel(Channel::VelZ, vz);
    record.set_channel(Channel::Wag, wag);
    record.set_channel(Channel::VelEast, east);
    record.set_channel(Channel::VelNorth, north);
    record.set_channel(Channel::VelUp, up);
    Ok(())
}

/// Fixed linear combination of the four acoustic paths into orthogonal
/// instrument axes. Paths sit at 45 deg elevation, 90 deg apart in azimuth:
/// paths 1/2 opposed along instrument X, paths 3/4 along Y. The vertical
/// estimate uses the wake-free pair, which depends on travel direction.
fn beams_to_instrument_frame(
    record: &mut ProfileRecord,
    beams: &[Vec<f64>; 4],
) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let sqrt2 = std::f64::consts::SQRT_2;
    let n = record.len();
    let mut vx = vec![f64::NAN; n];
    let mut vy = vec![f64::NAN; n];
    let mut vz = vec![f64::NAN; n];
    for i in 0..n {
        vx[i] = (beams[0][i] - beams[1][i]) / sqrt2;
        vy[i] = (beams[2][i] - beams[3][i]) / sqrt2;
        vz[i] = match record.direction {
            ProfileDirection::Descending => (beams[0][i] + beams[1][i]) / sqrt2,
            ProfileDirection::Ascending => (beams[2][i] + beams[3][i]) / sqrt2,
            ProfileDirection::Unknown => f64::NAN,
        };
    }
    match record.direction {
        ProfileDirection::Unknown => {
            warn!(
                profile = record.profile_number,
                "unrecognized profile direction; vertical beam combination unavailable"
            );
            record.log_step(
                StepCode::BeamTransform,
                "unrecognized direction: vertical velocity set to NaN",
            );
        }
        direction => {
            record.log_step(
                StepCode::BeamTransform,
                format!("beams combined to instrument frame ({})", direction.as_str()),
            );
        }
    }
    (vx, vy, vz)
}

/// Folds phase-wrap jumps out of a beam series: consecutive finite samples
/// that jump by more than half the ambiguity span are shifted back by whole
/// spans.
fn unwrap_phase(beam: &mut [f64], ambiguity_span: f64) {
    let mut offset = 0.0f64;
    let mut last_finite: Option<f64> = None;
    for value in beam.iter_mut() {
        if !value.is_finite() {
            continue;
        }
        let raw = *value;
        if let Some(prev) = last_finite {
            let delta = raw + offset - prev;
            if delta > ambiguity_span / 2.0 {
                offset -= ambiguity_span;
            } else if delta < -ambiguity_span / 2.0 {
                offset += ambiguity_span;
            }
        }
        *value = raw + offset;
        last_finite = Some(*value);
    }
}

/// Closed-form instrument-to-ENU rotation, the pre-multiplied product of the
/// heading, pitch, and roll rotation matrices H(h)*P(p)*R(r) applied to the
/// instrument-frame vector. Heading is compass degrees (instrument X is
/// starboard: at heading 0 it points east), pitch and roll in degrees.
pub fn rotate_to_enu(
    heading_deg: f64,
    pitch_deg: f64,
    roll_deg: f64,
    vx: f64,
    vy: f64,
    vz: f64,
) -> (f64, f64, f64) {
    let (sh, ch) = heading_deg.to_radians().sin_cos();
    let (sp, cp) = pitch_deg.to_radians().sin_cos();
    let (sr, cr) = roll_deg.to_radians().sin_cos();

    let east = vx * (ch * cr + sh * sp * sr) + vy * (sh * cp) + vz * (ch * sr - sh * sp * cr);
    let north = vx * (-sh * cr + ch * sp * sr) + vy * (ch * cp) + vz * (-sh * sr - ch * sp * cr);
    let up = vx * (-cp * sr) + vy * sp + vz * (cp * cr);
    (east, north, up)
}

/// Vertical velocity still contains the platform's own rise/fall; dP/dt is
/// the proxy for that motion. Unavailable dP/dt leaves the vertical
/// uncorrected with a warning, and the decision is always recorded.
fn apply_vertical_correction(record: &mut ProfileRecord, up: &mut [f64], enabled: bool) {
    let dpdt_usable = record.dpdt.iter().any(|v| v.is_finite());
    if !dpdt_usable {
        warn!(
            profile = record.profile_number,
            "no dP/dt available; vertical velocity left uncorrected"
        );
        record.log_step(
            StepCode::VerticalCorrection,
            "vertical velocity not corrected: no dP/dt available",
        );
        return;
    }
    if enabled {
        for (u, d) in up.iter_mut().zip(record.dpdt.iter()) {
            *u -= d;
        }
        record.log_step(
            StepCode::VerticalCorrection,
            "vertical velocity corrected with dP/dt",
        );
    } else {
        record.log_step(
            StepCode::VerticalCorrection,
            "vertical velocity left uncorrected: switch disabled",
        );
    }
}

fn required_channel(record: &ProfileRecord, channel: Channel) -> Result<Vec<f64>> {
    record
        .channel(channel)
        .map(|v| v.to_vec())
        .ok_or(PipelineError::MissingChannel {
            instrument: InstrumentKind::CurrentMeter,
            profile_number: record.profile_number,
            channel,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_unwrap_folds_large_jumps() {
        let mut beam = vec![0.8, 0.85, -0.9, -0.85];
        unwrap_phase(&mut beam, 1.8);
        assert!((beam[2] - 0.9).abs() < 1e-12);
        assert!((beam[3] - 0.95).abs() < 1e-12);
    }

    #[test]
    fn rotation_is_identity_at_zero_angles() {
        let (e, n, u) = rotate_to_enu(0.0, 0.0, 0.0, 1.0, 2.0, 3.0);
        assert!((e - 1.0).abs() < 1e-12);
        assert!((n - 2.0).abs() < 1e-12);
        assert!((u - 3.0).abs() < 1e-12);
    }

    #[test]
    fn heading_rotation_swings_starboard_axis() {
        // Facing east (heading 90), instrument X (starboard) points south.
        let (e, n, u) = rotate_to_enu(90.0, 0.0, 0.0, 1.0, 0.0, 0.0);
        assert!(e.abs() < 1e-12);
        assert!((n + 1.0).abs() < 1e-12);
        assert!(u.abs() < 1e-12);
    }
}
