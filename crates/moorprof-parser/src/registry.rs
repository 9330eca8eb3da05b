use crate::errors::{ParserAttempt, ParserError};
use crate::formats::{CtdParser, CurrentMeterParser, EngineeringParser};
use crate::model::ParsedProfileFile;

pub trait ProfileFileParser {
    fn name(&self) -> &'static str;
    fn parse(&self, content: &str) -> Result<ParsedProfileFile, ParserError>;
}

/// Tries each instrument format in turn. A `FormatMismatch` falls through to
/// the next parser; any other error is a real defect in a recognized file and
/// propagates immediately.
pub fn parse_profile_file(content: &str) -> Result<ParsedProfileFile, ParserError> {
    let ctd = CtdParser;
    let engineering = EngineeringParser;
    let current_meter = CurrentMeterParser;
    let parsers: [&dyn ProfileFileParser; 3] = [&ctd, &engineering, &current_meter];
    parse_with_parsers(content, &parsers)
}

pub fn parse_with_parsers(
    content: &str,
    parsers: &[&dyn ProfileFileParser],
) -> Result<ParsedProfileFile, ParserError> {
    let mut attempts = Vec::new();

    for parser in parsers {
        match parser.parse(content) {
            Ok(parsed) => return Ok(parsed),
            Err(ParserError::FormatMismatch { reason, .. }) => {
                attempts.push(ParserAttempt::new(parser.name(), reason));
            }
            Err(err) => return Err(err),
        }
    }

    Err(ParserError::NoMatchingParser { attempts })
}
