//! # flatshard
//!
//! Flattens a directory of Parquet dataset shards into a single CSV table, with
//! optional extraction of embedded image payloads to individual files.
//!
//! Multimodal datasets published as Parquet (for example Hugging Face image +
//! text datasets) keep images inside the table as encoded bytes, `{bytes, path}`
//! structs, or path strings. Downstream tools that expect plain tabular data
//! need those turned into text: either a reference to a file on disk, or a
//! short description.
//!
//! ## Quick Start
//!
//! ```no_run
//! use flatshard::{ExtractConfig, run};
//! # use anyhow::Result;
//!
//! # fn main() -> Result<()> {
//! let summary = run(ExtractConfig {
//!     data_dir: "pmc_vqa/data".into(),
//!     output_file: "pmc_vqa.csv".into(),
//!     save_images: true,
//!     ..Default::default()
//! })?;
//! println!("{} records, {:.2} MB", summary.total_records, summary.file_size_mb);
//! # Ok(())
//! # }
//! ```
//!
//! ## Pipeline
//!
//! 1. **Enumerate** - [`io::glob::find_shards`] lists `*.parquet` files in
//!    lexicographic order. A missing directory or zero shards is fatal.
//! 2. **Normalize** - [`normalize::RecordNormalizer`] reads each shard and maps
//!    every row to an ordered `column -> string` record. Missing values become
//!    `""`. The image column goes through the image policy.
//! 3. **Materialize** - [`materialize::ImageMaterializer`] either writes the
//!    payload to `images_dir/image_{index:06}_{hash}.png` and stores the path,
//!    or stores a description (`"No image"`, `"Remote image: ..."`, ...).
//! 4. **Accumulate** - [`table::AccumulatedTable`] appends records in shard
//!    order, then row order.
//! 5. **Serialize and report** - [`io::csv::write_table_csv`] writes the table;
//!    [`summary::ExtractionSummary`] reports counts, columns and file size.
//!
//! ## Failure model
//!
//! - Missing data directory, no shards, or a failed CSV write abort the run
//!   with an [`ExtractError`].
//! - A shard that cannot be read contributes no rows; the run continues and the
//!   failure is listed in the summary.
//! - An image that cannot be written degrades to `"Error saving image: ..."`;
//!   the rest of the row is kept.
//!
//! ## Determinism
//!
//! Processing is single-threaded. Output row order and image file names depend
//! only on shard file names, in-shard row positions, and image bytes, so two
//! runs over the same input produce the same table and the same file names.
//! Re-running overwrites images in place.
//!
//! ## Module Overview
//!
//! - [`config`] - Run configuration
//! - [`error`] - Fatal error taxonomy
//! - [`io`] - Shard enumeration, Parquet reading, CSV writing
//! - [`image_value`] - The image cell as a closed enum
//! - [`materialize`] - Image policy and file naming
//! - [`normalize`] - Row flattening
//! - [`table`] - Accumulated output table
//! - [`summary`] - Run summary
//! - [`extractor`] - Orchestration
//! - [`testing`] - Fixtures for tests

pub mod config;
pub mod error;
pub mod extractor;
pub mod image_value;
pub mod io;
pub mod materialize;
pub mod normalize;
pub mod summary;
pub mod table;
pub mod testing;

// General re-exports
pub use config::{ExtractConfig, IndexScope};
pub use error::ExtractError;
pub use extractor::{DatasetExtractor, ShardFailure, run};
pub use image_value::ImageValue;
pub use io::csv::write_table_csv;
pub use io::glob::{ShardRef, find_shards};
pub use io::parquet::{read_shard_rows, shard_row_count};
pub use materialize::{ImageMaterializer, ImageOutcome, content_hash, image_file_name};
pub use normalize::{NormalizedRecord, RecordNormalizer, field_to_cell};
pub use summary::{ExtractionSummary, RunStats};
pub use table::{AccumulatedTable, ColumnStats};
