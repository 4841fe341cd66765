//! Parquet shard reading.
//!
//! This module provides:
//! - [`read_shard_rows`] to load every row of a shard through the Parquet
//!   record API, preserving schema column order
//! - [`shard_row_count`] to read the row total from file metadata without
//!   decoding any row (used by info-only listings)
//!
//! Rows come back fully materialized: the normalizer needs random access to
//! every column of a row, and a read failure anywhere in the file must abort
//! the whole shard before any image is written for it.

use anyhow::{Context, Result};
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::Row;
use std::fs::File;
use std::path::Path;

/// Read a Parquet file into a vector of records, in file order.
///
/// # Errors
/// Returns an error if the file cannot be opened, is not valid Parquet, or any
/// row fails to decode.
pub fn read_shard_rows(path: impl AsRef<Path>) -> Result<Vec<Row>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let reader = SerializedFileReader::new(file).context("open SerializedFileReader")?;
    let rows = reader.get_row_iter(None).context("build row iterator")?;

    let mut out = Vec::new();
    for (i, row) in rows.enumerate() {
        let row = row.with_context(|| format!("read row #{} of {}", i + 1, path.display()))?;
        out.push(row);
    }
    Ok(out)
}

/// Total number of rows across all row groups, from the footer only.
///
/// # Errors
/// Returns an error if the file cannot be opened or metadata cannot be read.
pub fn shard_row_count(path: impl AsRef<Path>) -> Result<u64> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let reader = SerializedFileReader::new(f).context("open SerializedFileReader")?;
    let meta = reader.metadata();

    Ok((0..meta.num_row_groups())
        .map(|i| meta.row_group(i).num_rows().cast_unsigned())
        .sum())
}
