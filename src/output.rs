//! Result file writer.

use std::io::{BufWriter, Write};
use std::path::Path;

use csv::WriterBuilder;
use tempfile::NamedTempFile;

use crate::error::{PipelineError, Result};
use crate::models::Table;

/// Write a table as delimited text with a header row and no index column.
///
/// Rows go to a temporary file next to `path`, which is renamed over `path`
/// only once everything is flushed. A failed write leaves no output behind.
pub fn write_table(path: &Path, table: &Table, delimiter: u8) -> Result<()> {
    let io_error = |source: std::io::Error| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    };
    let csv_error = |source: csv::Error| PipelineError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(dir).map_err(io_error)?;

    {
        let mut writer = WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(BufWriter::new(tmp.as_file()));

        writer.write_record(&table.columns).map_err(csv_error)?;
        for row in &table.rows {
            writer
                .write_record(row.iter().map(|v| v.to_string()))
                .map_err(csv_error)?;
        }

        let mut inner = writer
            .into_inner()
            .map_err(|e| io_error(e.into_error()))?;
        inner.flush().map_err(io_error)?;
    }

    tmp.persist(path).map_err(|e| io_error(e.error))?;
    Ok(())
}
