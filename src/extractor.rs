//! End-to-end extraction run.
//!
//! [`DatasetExtractor`] wires the pieces together:
//!
//! 1. [`find_shards`] enumerates the shards in lexicographic order.
//! 2. [`RecordNormalizer`] flattens each shard, saving images as configured.
//! 3. [`AccumulatedTable`] collects the records in shard order.
//! 4. [`write_table_csv`] serializes the table; [`ExtractionSummary`] reports on it.
//!
//! Processing is sequential. A shard that fails to read is logged, recorded as
//! a [`ShardFailure`], and skipped; only a missing/empty data directory and a
//! failed CSV write abort the run.
//!
//! # Example
//!
//! ```no_run
//! use flatshard::config::ExtractConfig;
//! use flatshard::extractor::DatasetExtractor;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut extractor = DatasetExtractor::new(ExtractConfig {
//!     data_dir: "dataset/data".into(),
//!     save_images: true,
//!     ..Default::default()
//! })?;
//! extractor.extract_all()?;
//! extractor.save_csv()?;
//! extractor.summary()?.print();
//! # Ok(())
//! # }
//! ```

use crate::config::ExtractConfig;
use crate::error::ExtractError;
use crate::io::csv::write_table_csv;
use crate::io::glob::{ShardRef, find_shards};
use crate::materialize::ImageMaterializer;
use crate::normalize::RecordNormalizer;
use crate::summary::{ExtractionSummary, RunStats};
use crate::table::AccumulatedTable;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::create_dir_all;
use std::path::PathBuf;
use tracing::{Span, error, info, info_span, warn};

/// A shard that contributed no rows because it could not be read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ShardFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// One extraction run over a data directory.
pub struct DatasetExtractor {
    config: ExtractConfig,
    normalizer: RecordNormalizer,
    table: AccumulatedTable,
    stats: RunStats,
    span: Span,
}

impl DatasetExtractor {
    /// Create a run logging under a fresh `extract` span.
    ///
    /// # Errors
    /// See [`with_span`](Self::with_span).
    pub fn new(config: ExtractConfig) -> Result<Self> {
        let span = info_span!("extract", data_dir = %config.data_dir.display());
        Self::with_span(config, span)
    }

    /// Create a run whose components all log under `span`.
    ///
    /// Validates the data directory and, when saving images, creates the
    /// images directory.
    ///
    /// # Errors
    /// Fails with [`ExtractError::DirectoryNotFound`] if the data directory does
    /// not exist, or if the images directory cannot be created.
    pub fn with_span(config: ExtractConfig, span: Span) -> Result<Self> {
        let enter = span.enter();
        if !config.data_dir.is_dir() {
            return Err(ExtractError::DirectoryNotFound(config.data_dir.clone()).into());
        }
        if config.save_images {
            create_dir_all(&config.images_dir)
                .with_context(|| format!("mkdir -p {}", config.images_dir.display()))?;
            info!(images_dir = %config.images_dir.display(), "images will be saved");
        }

        let materializer =
            ImageMaterializer::new(config.save_images, &config.images_dir, span.clone());
        let normalizer = RecordNormalizer::new(
            &config.image_column,
            config.decode_images,
            materializer,
            span.clone(),
        );
        drop(enter);

        Ok(Self {
            config,
            normalizer,
            table: AccumulatedTable::new(),
            stats: RunStats::default(),
            span,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    #[must_use]
    pub fn table(&self) -> &AccumulatedTable {
        &self.table
    }

    #[must_use]
    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Enumerate the shards of the data directory.
    ///
    /// # Errors
    /// See [`find_shards`].
    pub fn find_shards(&self) -> Result<Vec<ShardRef>> {
        let _enter = self.span.enter();
        let shards = find_shards(&self.config.data_dir)?;
        info!(count = shards.len(), "found parquet files");
        Ok(shards)
    }

    /// Normalize every shard and append its records to the table.
    ///
    /// Unreadable shards are logged and recorded in [`RunStats::failed_shards`].
    ///
    /// # Errors
    /// Fails only if shard enumeration fails.
    pub fn extract_all(&mut self) -> Result<&AccumulatedTable> {
        let shards = self.find_shards()?;
        let _enter = self.span.enter();
        info!("starting data extraction");

        for shard in &shards {
            let rows_before = u64::try_from(self.table.len()).unwrap_or(u64::MAX);
            let first_index = self.config.index_scope.first_index(rows_before);
            match self.normalizer.normalize_shard(shard, first_index) {
                Ok(normalized) => {
                    self.stats.shards_processed += 1;
                    self.stats.images_saved += normalized.images_saved;
                    self.stats.image_failures += normalized.image_failures;
                    self.table.extend(normalized.records);
                }
                Err(e) => {
                    warn!(shard = %shard.file_name(), "error processing shard: {e:#}");
                    self.stats.failed_shards.push(ShardFailure {
                        path: shard.path.clone(),
                        reason: format!("{e:#}"),
                    });
                }
            }
        }

        info!(
            total = self.table.len(),
            failed_shards = self.stats.failed_shards.len(),
            "total records extracted"
        );
        Ok(&self.table)
    }

    /// Serialize the table to the configured output file.
    ///
    /// An empty table is not written; a warning is logged and `Ok(0)` returned.
    ///
    /// # Errors
    /// Fails with [`ExtractError::Serialization`] if the file cannot be written.
    /// Whatever was written before the failure is left on disk.
    pub fn save_csv(&self) -> Result<usize> {
        let _enter = self.span.enter();
        if self.table.is_empty() {
            warn!("no data to save");
            return Ok(0);
        }

        let path = &self.config.output_file;
        let n = write_table_csv(path, &self.table).map_err(|e| {
            error!("error saving to CSV: {e:#}");
            ExtractError::Serialization {
                path: path.clone(),
                reason: format!("{e:#}"),
            }
        })?;

        let columns = self.table.columns();
        info!(path = %path.display(), rows = n, columns = columns.len(), "data saved");
        for (i, column) in columns.iter().enumerate() {
            info!("  {}. {column}", i + 1);
        }
        Ok(n)
    }

    /// Summarize the run against the output file as it exists now.
    ///
    /// # Errors
    /// See [`ExtractionSummary::collect`].
    pub fn summary(&self) -> Result<ExtractionSummary> {
        ExtractionSummary::collect(&self.table, &self.config.output_file, self.stats.clone())
    }
}

/// Extract, save, and summarize in one call.
///
/// # Errors
/// Fails on a missing or empty data directory, or if the CSV cannot be written.
pub fn run(config: ExtractConfig) -> Result<ExtractionSummary> {
    let mut extractor = DatasetExtractor::new(config)?;
    extractor.extract_all()?;
    extractor.save_csv()?;
    extractor.summary()
}
