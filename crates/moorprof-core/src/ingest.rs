// crates/moorprof-core/src/ingest.rs

use moorprof_parser::{ParsedProfileFile, ProfileBody, RawInstrument};
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::types::{nan_vec, Channel, InstrumentKind, ProfileRecord, StepCode};

/// The three per-instrument deployment arrays, indexed by profile number
/// (1..=N contiguous). Profiles never selected for processing keep their
/// placeholder record and empty data.
#[derive(Debug)]
pub struct DeploymentStreams {
    pub ctd: Vec<ProfileRecord>,
    pub engineering: Vec<ProfileRecord>,
    pub current_meter: Vec<ProfileRecord>,
}

impl DeploymentStreams {
    pub fn allocate(profile_count: u32) -> Self {
        let empty = || {
            (1..=profile_count)
                .map(ProfileRecord::new)
                .collect::<Vec<_>>()
        };
        Self {
            ctd: empty(),
            engineering: empty(),
            current_meter: empty(),
        }
    }

    /// Stamps a placeholder status onto every record that never received
    /// data, so the audit trail distinguishes "not selected" from failures.
    pub fn mark_unimported(&mut self) {
        for records in [
            &mut self.ctd,
            &mut self.engineering,
            &mut self.current_meter,
        ] {
            for record in records.iter_mut() {
                if record.is_empty() && record.code_history.is_empty() {
                    record.log_step(StepCode::Import, "no data imported");
                }
            }
        }
    }

    pub fn profile_count(&self) -> usize {
        self.ctd.len()
    }

    /// Routes a parsed file into its stream slot. A profile number outside
    /// the deployment range indicates upstream import corruption and is
    /// fatal.
    pub fn import(&mut self, parsed: ParsedProfileFile) -> Result<()> {
        let (kind, records) = match parsed.instrument {
            RawInstrument::Ctd => (InstrumentKind::Ctd, &mut self.ctd),
            RawInstrument::Engineering => (InstrumentKind::Engineering, &mut self.engineering),
            RawInstrument::CurrentMeter => {
                (InstrumentKind::CurrentMeter, &mut self.current_meter)
            }
        };

        let count = records.len();
        let index = parsed.profile_number as usize;
        if index == 0 || index > count {
            return Err(PipelineError::ProfileOutOfRange {
                instrument: kind,
                profile_number: parsed.profile_number,
                count,
            });
        }

        let record = &mut records[index - 1];
        populate_record(record, parsed);
        info!(
            instrument = kind.as_str(),
            profile = record.profile_number,
            samples = record.len(),
            "profile imported"
        );
        Ok(())
    }
}

fn populate_record(record: &mut ProfileRecord, parsed: ParsedProfileFile) {
    let n = parsed.time.len();
    let hash_prefix: String = parsed.file_hash.chars().take(12).collect();

    record.time = parsed.time;
    record.profile_date = parsed.profile_date;
    record.profile_mask = vec![true; n];

    match parsed.body {
        ProfileBody::Ctd(columns) => {
            record.pressure = columns.pressure;
            record.set_channel(Channel::Temperature, columns.temperature);
            record.set_channel(Channel::Conductivity, columns.conductivity);
            record.set_channel(
                Channel::Salinity,
                columns.salinity.unwrap_or_else(|| nan_vec(n)),
            );
        }
        ProfileBody::Engineering(columns) => {
            record.set_channel(Channel::MotorCurrent, columns.motor_current);
            record.set_channel(Channel::BatteryVoltage, columns.battery_voltage);
        }
        ProfileBody::CurrentMeter(columns) => {
            let [beam1, beam2, beam3, beam4] = columns.vel_beam;
            record.set_channel(Channel::VelBeam1, beam1);
            record.set_channel(Channel::VelBeam2, beam2);
            record.set_channel(Channel::VelBeam3, beam3);
            record.set_channel(Channel::VelBeam4, beam4);
            record.set_channel(Channel::Heading, columns.heading);
            record.set_channel(Channel::Pitch, columns.pitch);
            record.set_channel(Channel::Roll, columns.roll);
        }
    }

    record.log_step(
        StepCode::Import,
        format!("imported {n} samples (hash {hash_prefix})"),
    );
}
