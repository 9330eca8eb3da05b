use chrono::{DateTime, NaiveDateTime, Utc};

use crate::errors::ParserError;
use crate::model::RawInstrument;

/// First line of every unpacker file: sentinel tag, instrument, profile
/// number, and the profile start date.
#[derive(Debug, Clone)]
pub(crate) struct FileHeader {
    pub instrument: RawInstrument,
    pub profile_number: u32,
    pub profile_date: Option<DateTime<Utc>>,
}

const UNPACKER_TAG: &str = "MMPUNPACK";

pub(crate) fn parse_file_header(
    parser: &'static str,
    record: &csv::StringRecord,
) -> Result<FileHeader, ParserError> {
    let tag = record.get(0).unwrap_or_default();
    if !tag.eq_ignore_ascii_case(UNPACKER_TAG) {
        return Err(ParserError::FormatMismatch {
            parser,
            reason: format!("first field '{tag}' is not an unpacker header"),
        });
    }
    if record.len() < 3 {
        return Err(ParserError::InvalidHeader {
            parser,
            row_index: 0,
            message: format!("expected at least 3 header fields, found {}", record.len()),
        });
    }

    let instrument = RawInstrument::try_from(record.get(1).unwrap_or_default()).map_err(
        |message| ParserError::InvalidHeader {
            parser,
            row_index: 0,
            message,
        },
    )?;

    let profile_number = record
        .get(2)
        .unwrap_or_default()
        .trim()
        .parse::<u32>()
        .map_err(|err| ParserError::InvalidHeader {
            parser,
            row_index: 0,
            message: format!("invalid profile number: {err}"),
        })?;

    let profile_date = record
        .get(3)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| {
            DateTime::parse_from_rfc3339(v)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|err| ParserError::InvalidHeader {
                    parser,
                    row_index: 0,
                    message: format!("invalid profile date '{v}': {err}"),
                })
        })
        .transpose()?;

    Ok(FileHeader {
        instrument,
        profile_number,
        profile_date,
    })
}

/// Sample timestamps parse to f64 seconds since the Unix epoch; fractional
/// seconds are preserved.
pub(crate) fn parse_timestamp(
    parser: &'static str,
    value: &str,
    line_index: usize,
) -> Result<f64, ParserError> {
    static FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];
    let trimmed = value.trim().trim_end_matches('Z');
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            let micros = dt.and_utc().timestamp_micros();
            return Ok(micros as f64 / 1e6);
        }
    }
    Err(ParserError::DataRow {
        parser,
        line_index,
        message: format!("invalid timestamp '{trimmed}'"),
    })
}

/// Empty fields and literal NaN markers parse to NaN; anything else must be a
/// float.
pub(crate) fn parse_value(
    parser: &'static str,
    value: &str,
    line_index: usize,
    column: &str,
) -> Result<f64, ParserError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    trimmed.parse::<f64>().map_err(|err| ParserError::DataRow {
        parser,
        line_index,
        message: format!("failed to parse column '{column}' as float: {err}"),
    })
}

pub(crate) fn content_hash(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex().to_string()
}

pub(crate) fn next_record(
    parser: &'static str,
    records: &mut csv::StringRecordsIter<'_, &[u8]>,
    row_index: usize,
) -> Result<csv::StringRecord, ParserError> {
    match records.next() {
        Some(Ok(record)) => Ok(record),
        Some(Err(source)) => Err(ParserError::Csv { parser, source }),
        None => Err(ParserError::InvalidHeader {
            parser,
            row_index,
            message: "file ended before this row".to_string(),
        }),
    }
}
