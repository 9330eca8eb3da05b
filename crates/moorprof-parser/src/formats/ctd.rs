use crate::errors::ParserError;
use crate::formats::{content_hash, next_record, parse_file_header, parse_timestamp, parse_value};
use crate::model::{CtdColumns, ParsedProfileFile, ProfileBody, RawInstrument};
use crate::registry::ProfileFileParser;

const PARSER: &str = "ctd";

/// Columns: time, pressure, temperature, conductivity, and optionally
/// salinity when the unpacker was run with the derived-variables switch.
pub struct CtdParser;

impl ProfileFileParser for CtdParser {
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
        if header.instrument != RawInstrument::Ctd {
            return Err(ParserError::FormatMismatch {
                parser: PARSER,
                reason: format!("instrument tag is '{}'", header.instrument),
            });
        }

        let column_record = next_record(PARSER, &mut records, 1)?;
        let column_count = column_record.len();
        let has_salinity = match column_count {
            4 => false,
            5 => true,
            found => {
                return Err(ParserError::UnsupportedColumnCount {
                    parser: PARSER,
                    expected: "4 or 5",
                    found,
                })
            }
        };

        let mut time = Vec::new();
        let mut pressure = Vec::new();
        let mut temperature = Vec::new();
        let mut conductivity = Vec::new();
        let mut salinity = Vec::new();

        for (offset, record) in records.enumerate() {
            let line_index = offset + 2;
            let record = record.map_err(|source| ParserError::Csv {
                parser: PARSER,
                source,
            })?;
            if record.len() != column_count {
                return Err(ParserError::DataRow {
                    parser: PARSER,
                    line_index,
                    message: format!(
                        "expected {column_count} fields, found {}",
                        record.len()
                    ),
                });
            }
            time.push(parse_timestamp(
                PARSER,
                record.get(0).unwrap_or_default(),
                line_index,
            )?);
            pressure.push(parse_value(
                PARSER,
                record.get(1).unwrap_or_default(),
                line_index,
                "pressure",
            )?);
            temperature.push(parse_value(
                PARSER,
                record.get(2).unwrap_or_default(),
                line_index,
                "temperature",
            )?);
            conductivity.push(parse_value(
                PARSER,
                record.get(3).unwrap_or_default(),
                line_index,
                "conductivity",
            )?);
            if has_salinity {
                salinity.push(parse_value(
                    PARSER,
                    record.get(4).unwrap_or_default(),
                    line_index,
                    "salinity",
                )?);
            }
        }

        if time.is_empty() {
            return Err(ParserError::EmptyData { parser: PARSER });
        }

        Ok(ParsedProfileFile {
            instrument: RawInstrument::Ctd,
            profile_number: header.profile_number,
            profile_date: header.profile_date,
            file_hash: content_hash(content),
            time,
            body: ProfileBody::Ctd(CtdColumns {
                pressure,
                temperature,
                conductivity,
                salinity: has_salinity.then_some(salinity),
            }),
        })
    }
}
