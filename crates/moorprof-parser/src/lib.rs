pub mod errors;
pub mod formats;
pub mod model;
mod registry;

pub use errors::{ParserAttempt, ParserError};
pub use model::{
    CtdColumns, CurrentMeterColumns, EngineeringColumns, ParsedProfileFile, ProfileBody,
    RawInstrument,
};
pub use registry::{parse_profile_file, parse_with_parsers, ProfileFileParser};
