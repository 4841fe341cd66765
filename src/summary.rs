//! Run summary and reporting.
//!
//! [`ExtractionSummary`] is computed after the table has been serialized: the
//! output file size comes from stat-ing the written file, so a summary taken
//! before saving (or after an empty run that wrote nothing) reports 0 MB.

use crate::extractor::ShardFailure;
use crate::table::{AccumulatedTable, ColumnStats};
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Counters gathered while the run processed its shards.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Shards that normalized successfully (including empty ones).
    pub shards_processed: usize,
    /// Shards skipped because they could not be read.
    pub failed_shards: Vec<ShardFailure>,
    pub images_saved: usize,
    pub image_failures: usize,
}

/// Summary handed back to the caller at the end of a run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExtractionSummary {
    pub total_records: usize,
    pub total_columns: usize,
    pub columns: Vec<String>,
    pub output_file: PathBuf,
    pub file_size_mb: f64,
    pub column_stats: Vec<ColumnStats>,
    #[serde(flatten)]
    pub run: RunStats,
}

impl ExtractionSummary {
    /// Summarize `table`, stat-ing `output_file` for its size.
    ///
    /// A missing output file counts as 0 bytes.
    ///
    /// # Errors
    /// Returns an error if `output_file` exists but cannot be stat-ed.
    pub fn collect(
        table: &AccumulatedTable,
        output_file: impl AsRef<Path>,
        run: RunStats,
    ) -> Result<Self> {
        let output_file = output_file.as_ref();
        let bytes = match fs::metadata(output_file) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => {
                return Err(e).with_context(|| format!("stat {}", output_file.display()));
            }
        };

        #[allow(clippy::cast_precision_loss)]
        let file_size_mb = bytes as f64 / BYTES_PER_MB;

        let columns: Vec<String> = table.columns().into_iter().map(String::from).collect();
        Ok(Self {
            total_records: table.len(),
            total_columns: columns.len(),
            columns,
            output_file: output_file.to_path_buf(),
            file_size_mb,
            column_stats: table.column_stats(),
            run,
        })
    }

    /// The summary as a JSON value.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<Value> {
        serde_json::to_value(self).context("serialize extraction summary")
    }

    /// Print the summary to stdout in a human-readable format.
    pub fn print(&self) {
        println!("\nExtraction completed successfully!");
        println!("Total records: {}", group_thousands(self.total_records));
        println!("Total columns: {}", self.total_columns);
        println!("Output file: {}", self.output_file.display());
        println!("File size: {:.2} MB", self.file_size_mb);
        if !self.run.failed_shards.is_empty() {
            println!("Skipped shards: {}", self.run.failed_shards.len());
            for failure in &self.run.failed_shards {
                println!("  {}: {}", failure.path.display(), failure.reason);
            }
        }
        if self.run.image_failures > 0 {
            println!("Image errors: {}", self.run.image_failures);
        }
    }

    /// Save the summary to a pretty-printed JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or written.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let formatted = serde_json::to_string_pretty(self).context("serialize extraction summary")?;
        let mut file = File::create(path).with_context(|| format!("create {}", path.display()))?;
        file.write_all(formatted.as_bytes())
            .with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }
}

/// `1234567` -> `"1,234,567"`.
#[must_use]
pub fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_separator() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn missing_output_counts_as_zero() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let s = ExtractionSummary::collect(
            &AccumulatedTable::new(),
            tmp.path().join("never_written.csv"),
            RunStats::default(),
        )?;
        assert_eq!(s.total_records, 0);
        assert_eq!(s.total_columns, 0);
        assert!(s.file_size_mb.abs() < f64::EPSILON);
        Ok(())
    }
}
