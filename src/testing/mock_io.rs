//! Temporary dataset directories for tests.
//!
//! [`ShardDir`] owns a temporary directory laid out like a real run: a `data/`
//! directory for shards, an `images/` target and an output CSV path next to
//! it. Everything is deleted when the value is dropped.

use crate::config::ExtractConfig;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary run directory with a `data/` subdirectory for shards.
pub struct ShardDir {
    #[allow(dead_code)]
    temp_dir: TempDir,
    root: PathBuf,
}

impl ShardDir {
    /// Create a new temporary run directory with an empty `data/` inside.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn new() -> std::io::Result<Self> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().to_path_buf();
        fs::create_dir(root.join("data"))?;
        Ok(Self { temp_dir, root })
    }

    /// Root of the temporary directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Directory the shards live in.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    /// Path of a shard file inside `data/`.
    #[must_use]
    pub fn shard_path(&self, filename: &str) -> PathBuf {
        self.data_dir().join(filename)
    }

    #[must_use]
    pub fn images_dir(&self) -> PathBuf {
        self.root.join("images")
    }

    #[must_use]
    pub fn output_file(&self) -> PathBuf {
        self.root.join("extracted_dataset.csv")
    }

    /// Write bytes that are not valid Parquet under a shard name.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_corrupt_shard(&self, filename: &str) -> Result<PathBuf> {
        let path = self.shard_path(filename);
        fs::write(&path, b"PAR1 this is not a parquet file")
            .with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }

    /// A configuration pointing every path into this directory.
    #[must_use]
    pub fn config(&self) -> ExtractConfig {
        ExtractConfig {
            data_dir: self.data_dir(),
            output_file: self.output_file(),
            images_dir: self.images_dir(),
            ..ExtractConfig::default()
        }
    }

    /// Sorted names of the files currently in `images/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed.
    pub fn image_files(&self) -> Result<Vec<String>> {
        let dir = self.images_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&dir).with_context(|| format!("read {}", dir.display()))? {
            let entry = entry?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}

impl Default for ShardDir {
    fn default() -> Self {
        Self::new().expect("Failed to create temporary directory")
    }
}

/// Read a CSV file back as `(header, rows)` for assertions.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or parsed.
pub fn read_csv_output(path: impl AsRef<Path>) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let path = path.as_ref();
    let mut rdr = csv::Reader::from_path(path).with_context(|| format!("open {}", path.display()))?;
    let header = rdr
        .headers()
        .context("read CSV header")?
        .iter()
        .map(String::from)
        .collect();
    let mut rows = Vec::new();
    for (i, rec) in rdr.records().enumerate() {
        let rec = rec.with_context(|| format!("parse CSV record #{}", i + 1))?;
        rows.push(rec.iter().map(String::from).collect());
    }
    Ok((header, rows))
}
