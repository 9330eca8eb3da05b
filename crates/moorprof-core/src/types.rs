// crates/moorprof-core/src/types.rs

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Named channel fields carried by a profile record. Generic stages (masking,
/// binning) operate over per-instrument channel sets selected by tag rather
/// than by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Channel {
    Temperature,
    Conductivity,
    Salinity,
    MotorCurrent,
    BatteryVoltage,
    VelBeam1,
    VelBeam2,
    VelBeam3,
    VelBeam4,
    Heading,
    Pitch,
    Roll,
    VelX,
    VelY,
    VelZ,
    Wag,
    VelEast,
    VelNorth,
    VelUp,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Temperature => "temperature_c",
            Channel::Conductivity => "conductivity_s_m",
            Channel::Salinity => "salinity_psu",
            Channel::MotorCurrent => "motor_current_ma",
            Channel::BatteryVoltage => "battery_voltage_v",
            Channel::VelBeam1 => "vel_beam1_m_s",
            Channel::VelBeam2 => "vel_beam2_m_s",
            Channel::VelBeam3 => "vel_beam3_m_s",
            Channel::VelBeam4 => "vel_beam4_m_s",
            Channel::Heading => "heading_deg",
            Channel::Pitch => "pitch_deg",
            Channel::Roll => "roll_deg",
            Channel::VelX => "vel_x_m_s",
            Channel::VelY => "vel_y_m_s",
            Channel::VelZ => "vel_z_m_s",
            Channel::Wag => "wag_m_s",
            Channel::VelEast => "vel_east_m_s",
            Channel::VelNorth => "vel_north_m_s",
            Channel::VelUp => "vel_up_m_s",
        }
    }

    /// Heading wraps at 0/360 and must be aggregated with circular statistics.
    pub fn is_circular(&self) -> bool {
        matches!(self, Channel::Heading)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstrumentKind {
    Ctd,
    Engineering,
    CurrentMeter,
}

impl InstrumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstrumentKind::Ctd => "ctd",
            InstrumentKind::Engineering => "engineering",
            InstrumentKind::CurrentMeter => "current_meter",
        }
    }
}

impl fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output product levels: raw/imported, synchronized-and-transformed
/// unbinned, and pressure-binned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    L0,
    L1,
    L2,
}

const CTD_L0: &[Channel] = &[Channel::Temperature, Channel::Conductivity, Channel::Salinity];
const ENG_L0: &[Channel] = &[Channel::MotorCurrent, Channel::BatteryVoltage];
const ACM_L0: &[Channel] = &[
    Channel::VelBeam1,
    Channel::VelBeam2,
    Channel::VelBeam3,
    Channel::VelBeam4,
    Channel::Heading,
    Channel::Pitch,
    Channel::Roll,
];
const ACM_L1: &[Channel] = &[
    Channel::VelBeam1,
    Channel::VelBeam2,
    Channel::VelBeam3,
    Channel::VelBeam4,
    Channel::Heading,
    Channel::Pitch,
    Channel::Roll,
    Channel::VelX,
    Channel::VelY,
    Channel::VelZ,
    Channel::Wag,
    Channel::VelEast,
    Channel::VelNorth,
    Channel::VelUp,
];
const ACM_L2: &[Channel] = &[
    Channel::Heading,
    Channel::Pitch,
    Channel::Roll,
    Channel::VelEast,
    Channel::VelNorth,
    Channel::VelUp,
];

/// Static channel-set mapping per instrument and product level. This replaces
/// positional field indexing: every generic stage asks for the set it must
/// operate over and iterates tags.
pub fn channel_set(kind: InstrumentKind, level: Level) -> &'static [Channel] {
    match (kind, level) {
        (InstrumentKind::Ctd, _) => CTD_L0,
        (InstrumentKind::Engineering, _) => ENG_L0,
        (InstrumentKind::CurrentMeter, Level::L0) => ACM_L0,
        (InstrumentKind::CurrentMeter, Level::L1) => ACM_L1,
        (InstrumentKind::CurrentMeter, Level::L2) => ACM_L2,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileDirection {
    Ascending,
    Descending,
    Unknown,
}

impl ProfileDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileDirection::Ascending => "ascending",
            ProfileDirection::Descending => "descending",
            ProfileDirection::Unknown => "unknown",
        }
    }
}

/// Identifiers for pipeline steps, logged into `code_history` with a paired
/// human-readable outcome in `data_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepCode {
    Import,
    DirectionDetect,
    BacktrackDetect,
    QualityGate,
    PressureSync,
    PhaseUnwrap,
    BeamTransform,
    WagCorrection,
    EnuTransform,
    VerticalCorrection,
    TiltRejection,
    MaskApply,
    PressureBin,
}

impl StepCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepCode::Import => "import",
            StepCode::DirectionDetect => "direction_detect",
            StepCode::BacktrackDetect => "backtrack_detect",
            StepCode::QualityGate => "quality_gate",
            StepCode::PressureSync => "pressure_sync",
            StepCode::PhaseUnwrap => "phase_unwrap",
            StepCode::BeamTransform => "beam_transform",
            StepCode::WagCorrection => "wag_correction",
            StepCode::EnuTransform => "enu_transform",
            StepCode::VerticalCorrection => "vertical_correction",
            StepCode::TiltRejection => "tilt_rejection",
            StepCode::MaskApply => "mask_apply",
            StepCode::PressureBin => "pressure_bin",
        }
    }
}

/// One instrument stream's data for one profile. Created empty at
/// deployment-array allocation, populated by import, then mutated in place by
/// the pipeline stages. Never destroyed; a profile that cannot be processed
/// keeps its record with empty/NaN fields and an audit trail.
#[derive(Debug, Clone)]
pub struct ProfileRecord {
    pub profile_number: u32,
    /// Seconds since the Unix epoch. Empty when the profile was never
    /// selected or the file was missing.
    pub time: Vec<f64>,
    pub pressure: Vec<f64>,
    pub dpdt: Vec<f64>,
    pub channels: BTreeMap<Channel, Vec<f64>>,
    /// true = sample retained as scientifically valid. Narrowed (ANDed) by
    /// later stages, never widened.
    pub profile_mask: Vec<bool>,
    pub direction: ProfileDirection,
    pub profile_date: Option<DateTime<Utc>>,
    pub backtrack: bool,
    pub code_history: Vec<StepCode>,
    pub data_status: Vec<String>,
}

impl ProfileRecord {
    pub fn new(profile_number: u32) -> Self {
        Self {
            profile_number,
            time: Vec::new(),
            pressure: Vec::new(),
            dpdt: Vec::new(),
            channels: BTreeMap::new(),
            profile_mask: Vec::new(),
            direction: ProfileDirection::Unknown,
            profile_date: None,
            backtrack: false,
            code_history: Vec::new(),
            data_status: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Appends the paired history/status entries together so the two logs can
    /// never drift out of step.
    pub fn log_step(&mut self, code: StepCode, status: impl Into<String>) {
        self.code_history.push(code);
        self.data_status.push(status.into());
    }

    pub fn channel(&self, channel: Channel) -> Option<&[f64]> {
        self.channels.get(&channel).map(|v| v.as_slice())
    }

    pub fn channel_mut(&mut self, channel: Channel) -> Option<&mut Vec<f64>> {
        self.channels.get_mut(&channel)
    }

    pub fn set_channel(&mut self, channel: Channel, values: Vec<f64>) {
        self.channels.insert(channel, values);
    }

    /// True when the record has at least one finite pressure sample.
    pub fn has_usable_pressure(&self) -> bool {
        self.pressure.iter().any(|p| p.is_finite())
    }

    /// True when the record has at least one finite timestamp.
    pub fn has_usable_time(&self) -> bool {
        self.time.iter().any(|t| t.is_finite())
    }

    /// Forces every channel in `set` to an all-NaN vector matching the time
    /// length. Used when a stage fails: fields are never left ragged.
    pub fn nan_fill_channels(&mut self, set: &[Channel]) {
        let n = self.time.len();
        for channel in set {
            self.channels.insert(*channel, nan_vec(n));
        }
    }
}

pub fn nan_vec(n: usize) -> Vec<f64> {
    vec![f64::NAN; n]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_step_keeps_history_and_status_paired() {
        let mut record = ProfileRecord::new(3);
        record.log_step(StepCode::Import, "imported 100 samples");
        record.log_step(StepCode::QualityGate, "passed");
        assert_eq!(record.code_history.len(), record.data_status.len());
        assert_eq!(record.code_history[1], StepCode::QualityGate);
        assert_eq!(record.data_status[1], "passed");
    }

    #[test]
    fn channel_sets_select_per_instrument_fields() {
        assert!(channel_set(InstrumentKind::Ctd, Level::L1).contains(&Channel::Temperature));
        assert!(channel_set(InstrumentKind::CurrentMeter, Level::L1).contains(&Channel::VelEast));
        assert!(!channel_set(InstrumentKind::CurrentMeter, Level::L2).contains(&Channel::VelBeam1));
    }

    #[test]
    fn nan_fill_matches_time_length() {
        let mut record = ProfileRecord::new(1);
        record.time = vec![0.0, 1.0, 2.0];
        record.nan_fill_channels(channel_set(InstrumentKind::Ctd, Level::L0));
        for channel in channel_set(InstrumentKind::Ctd, Level::L0) {
            let values = record.channel(*channel).unwrap();
            assert_eq!(values.len(), 3);
            assert!(values.iter().all(|v| v.is_nan()));
        }
    }
}
