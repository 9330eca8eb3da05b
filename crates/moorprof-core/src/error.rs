// crates/moorprof-core/src/error.rs

use thiserror::Error;

use crate::types::{Channel, InstrumentKind};

/// Fatal pipeline failures. Data-quality problems never surface here; they
/// degrade the affected profile locally and leave a `data_status` entry.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("paired records disagree on profile identity: reference {reference}, secondary {secondary}")]
    ProfileMismatch { reference: u32, secondary: u32 },

    #[error("{instrument} profile {profile_number} is outside the deployment range 1..={count}")]
    ProfileOutOfRange {
        instrument: InstrumentKind,
        profile_number: u32,
        count: usize,
    },

    #[error("{instrument} profile {profile_number} is missing required channel {channel}")]
    MissingChannel {
        instrument: InstrumentKind,
        profile_number: u32,
        channel: Channel,
    },

    #[error("deployment streams have mismatched lengths: ctd {ctd}, engineering {engineering}, current meter {current_meter}")]
    StreamLengthMismatch {
        ctd: usize,
        engineering: usize,
        current_meter: usize,
    },

    #[error("file import failed: {0}")]
    Import(#[from] moorprof_parser::ParserError),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
