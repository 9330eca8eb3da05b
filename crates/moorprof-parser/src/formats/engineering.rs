use crate::errors::ParserError;
use crate::formats::{content_hash, next_record, parse_file_header, parse_timestamp, parse_value};
use crate::model::{EngineeringColumns, ParsedProfileFile, ProfileBody, RawInstrument};
use crate::registry::ProfileFileParser;

const PARSER: &str = "engineering";
const COLUMN_COUNT: usize = 3;

/// Columns: time, motor current, battery voltage.
pub struct EngineeringParser;

impl ProfileFileParser for EngineeringParser {
    fn name(&self) -> &'static str {
        PARSER
    }

    fn parse(&self, content: &str) -> Result<ParsedProfileFile, ParserError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());
        let mut records = reader.records();

        let header_record = next_record(PARSER, &mut records, 0)?;
        let header = parse_file_header(PARSER, &header_record)?;
        if header.instrument != RawInstrument::Engineering {
            return Err(ParserError::FormatMismatch {
                parser: PARSER,
                reason: format!("instrument tag is '{}'", header.instrument),
            });
        }

        let column_record = next_record(PARSER, &mut records, 1)?;
        if column_record.len() != COLUMN_COUNT {
            return Err(ParserError::UnsupportedColumnCount {
                parser: PARSER,
                expected: "3",
                found: column_record.len(),
            });
        }

        let mut time = Vec::new();
        let mut motor_current = Vec::new();
        let mut battery_voltage = Vec::new();

        for (offset, record) in records.enumerate() {
            let line_index = offset + 2;
            let record = record.map_err(|source| ParserError::Csv {
                parser: PARSER,
                source,
            })?;
            if record.len() != COLUMN_COUNT {
                return Err(ParserError::DataRow {
                    parser: PARSER,
                    line_index,
                    message: format!("expected {COLUMN_COUNT} fields, found {}", record.len()),
                });
            }
            time.push(parse_timestamp(
                PARSER,
                record.get(0).unwrap_or_default(),
                line_index,
            )?);
            motor_current.push(parse_value(
                PARSER,
                record.get(1).unwrap_or_default(),
                line_index,
                "motor_current",
            )?);
            battery_voltage.push(parse_value(
                PARSER,
                record.get(2).unwrap_or_default(),
                line_index,
                "battery_voltage",
            )?);
        }

        if time.is_empty() {
            return Err(ParserError::EmptyData { parser: PARSER });
        }

        Ok(ParsedProfileFile {
            instrument: RawInstrument::Engineering,
            profile_number: header.profile_number,
            profile_date: header.profile_date,
            file_hash: content_hash(content),
            time,
            body: ProfileBody::Engineering(EngineeringColumns {
                motor_current,
                battery_voltage,
            }),
        })
    }
}
