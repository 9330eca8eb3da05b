use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Instrument stream a raw profile file belongs to, taken from the unpacker
/// header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawInstrument {
    Ctd,
    Engineering,
    CurrentMeter,
}

impl RawInstrument {
    pub fn as_str(&self) -> &'static str {
        match self {
            RawInstrument::Ctd => "ctd",
            RawInstrument::Engineering => "engineering",
            RawInstrument::CurrentMeter => "current_meter",
        }
    }
}

impl fmt::Display for RawInstrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for RawInstrument {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ctd" | "c" => Ok(RawInstrument::Ctd),
            "engineering" | "eng" | "e" => Ok(RawInstrument::Engineering),
            "current_meter" | "acm" | "a" => Ok(RawInstrument::CurrentMeter),
            other => Err(format!("unknown instrument tag '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CtdColumns {
    pub pressure: Vec<f64>,
    pub temperature: Vec<f64>,
    pub conductivity: Vec<f64>,
    pub salinity: Option<Vec<f64>>,
}

#[derive(Debug, Clone)]
pub struct EngineeringColumns {
    pub motor_current: Vec<f64>,
    pub battery_voltage: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct CurrentMeterColumns {
    pub vel_beam: [Vec<f64>; 4],
    pub heading: Vec<f64>,
    pub pitch: Vec<f64>,
    pub roll: Vec<f64>,
}

#[derive(Debug, Clone)]
pub enum ProfileBody {
    Ctd(CtdColumns),
    Engineering(EngineeringColumns),
    CurrentMeter(CurrentMeterColumns),
}

/// One unpacker text file parsed into raw per-profile arrays. Sample
/// timestamps are seconds since the Unix epoch; missing values are NaN.
#[derive(Debug, Clone)]
pub struct ParsedProfileFile {
    pub instrument: RawInstrument,
    pub profile_number: u32,
    pub profile_date: Option<DateTime<Utc>>,
    /// blake3 hash of the raw file content, carried into provenance.
    pub file_hash: String,
    pub time: Vec<f64>,
    pub body: ProfileBody,
}

impl ParsedProfileFile {
    pub fn sample_count(&self) -> usize {
        self.time.len()
    }
}
