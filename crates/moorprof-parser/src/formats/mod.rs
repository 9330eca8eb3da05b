mod acm;
mod common;
mod ctd;
mod engineering;

pub use acm::CurrentMeterParser;
pub use ctd::CtdParser;
pub use engineering::EngineeringParser;

pub(crate) use common::{content_hash, next_record, parse_file_header, parse_timestamp, parse_value};
