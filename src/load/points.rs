//! Headerless delimited point files.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::ReaderBuilder;
use flate2::read::GzDecoder;

use crate::error::{PipelineError, Result, SchemaError};
use crate::models::{Table, Value};

/// Columns every point file must carry, compared case-insensitively
pub const COORDINATE_COLUMNS: [&str; 2] = ["latitude", "longitude"];

/// Load a headerless delimited file into a table, naming columns positionally.
///
/// Files ending in `.gz` are decompressed on the fly. The column list is
/// checked for `latitude`/`longitude` before the file is touched.
pub fn load_points(path: &Path, delimiter: u8, columns: &[String]) -> Result<Table> {
    check_coordinate_columns(columns)?;

    let file = File::open(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader: Box<dyn Read> = if path.extension().map_or(false, |e| e == "gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(BufReader::new(file))
    };

    parse_points(reader, delimiter, columns, path)
}

/// Same as [`load_points`] over any reader.
pub fn read_points<R: Read>(reader: R, delimiter: u8, columns: &[String]) -> Result<Table> {
    check_coordinate_columns(columns)?;
    parse_points(reader, delimiter, columns, Path::new("-"))
}

/// Fail unless both coordinate columns are named.
///
/// The lowercase copy only serves the check; callers keep their own spelling.
pub fn check_coordinate_columns(columns: &[String]) -> std::result::Result<(), SchemaError> {
    let lowered: Vec<String> = columns.iter().map(|c| c.to_lowercase()).collect();
    let missing: Vec<&'static str> = COORDINATE_COLUMNS
        .iter()
        .copied()
        .filter(|required| !lowered.iter().any(|c| c == required))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::MissingCoordinates { missing })
    }
}

fn parse_points<R: Read>(
    reader: R,
    delimiter: u8,
    columns: &[String],
    path: &Path,
) -> Result<Table> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);

    let mut table = Table::new(columns.to_vec());

    for result in csv_reader.records() {
        let record = result.map_err(|source| PipelineError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

        if record.len() != columns.len() {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            return Err(SchemaError::FieldCount {
                line,
                expected: columns.len(),
                found: record.len(),
            }
            .into());
        }

        table.rows.push(record.iter().map(Value::from_field).collect());
    }

    Ok(table)
}
