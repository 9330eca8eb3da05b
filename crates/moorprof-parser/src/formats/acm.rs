use crate::errors::ParserError;
use crate::formats::{content_hash, next_record, parse_file_header, parse_timestamp, parse_value};
use crate::model::{CurrentMeterColumns, ParsedProfileFile, ProfileBody, RawInstrument};
use crate::registry::ProfileFileParser;

const PARSER: &str = "current_meter";
const COLUMN_COUNT: usize = 8;
const VALUE_COLUMNS: [&str; 7] = [
    "vel_beam1",
    "vel_beam2",
    "vel_beam3",
    "vel_beam4",
    "heading",
    "pitch",
    "roll",
];

/// Columns: time, the four acoustic path velocities, then heading, pitch,
/// roll from the attitude sensor.
pub struct CurrentMeterParser;

impl ProfileFileParser for CurrentMeterParser {
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
        if header.instrument != RawInstrument::CurrentMeter {
            return Err(ParserError::FormatMismatch {
                parser: PARSER,
                reason: format!("instrument tag is '{}'", header.instrument),
            });
        }

        let column_record = next_record(PARSER, &mut records, 1)?;
        if column_record.len() != COLUMN_COUNT {
            return Err(ParserError::UnsupportedColumnCount {
                parser: PARSER,
                expected: "8",
                found: column_record.len(),
            });
        }

        let mut time = Vec::new();
        let mut values: [Vec<f64>; 7] = Default::default();

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
            for (column_index, (slot, column)) in
                values.iter_mut().zip(VALUE_COLUMNS.iter()).enumerate()
            {
                slot.push(parse_value(
                    PARSER,
                    record.get(column_index + 1).unwrap_or_default(),
                    line_index,
                    column,
                )?);
            }
        }

        if time.is_empty() {
            return Err(ParserError::EmptyData { parser: PARSER });
        }

        let [beam1, beam2, beam3, beam4, heading, pitch, roll] = values;
        Ok(ParsedProfileFile {
            instrument: RawInstrument::CurrentMeter,
            profile_number: header.profile_number,
            profile_date: header.profile_date,
            file_hash: content_hash(content),
            time,
            body: ProfileBody::CurrentMeter(CurrentMeterColumns {
                vel_beam: [beam1, beam2, beam3, beam4],
                heading,
                pitch,
                roll,
            }),
        })
    }
}
