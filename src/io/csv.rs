//! CSV serialization of the accumulated table.
//!
//! The output is a header row (the table's column order) followed by one row
//! per record, UTF-8, comma-delimited, with standard CSV quoting.

use crate::table::AccumulatedTable;
use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::Path;

/// Write `table` to a CSV file at `path`.
///
/// * Creates parent directories if they don't exist.
/// * Truncates an existing file.
///
/// # Returns
/// The number of data rows written.
///
/// # Errors
/// Returns an error if the file/dirs cannot be created or any row fails to
/// serialize/flush.
pub fn write_table_csv(path: impl AsRef<Path>, table: &AccumulatedTable) -> Result<usize> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
    }
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    write_table(f, table)
}

/// Write `table` as CSV to any writer.
///
/// # Errors
/// Returns an error if any row fails to serialize or the writer fails to flush.
pub fn write_table<W: Write>(w: W, table: &AccumulatedTable) -> Result<usize> {
    let mut wtr = WriterBuilder::new().from_writer(w);
    wtr.write_record(table.columns())
        .context("write CSV header")?;
    for (i, row) in table.rows().enumerate() {
        wtr.write_record(&row)
            .with_context(|| format!("serialize CSV row #{}", i + 1))?;
    }
    wtr.flush().context("flush CSV writer")?;
    Ok(table.len())
}
