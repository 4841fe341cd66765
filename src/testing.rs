//! Testing utilities for extraction runs.
//!
//! This module provides helpers for end-users (and this crate's own tests) to
//! build small Parquet datasets and inspect what a run produced:
//!
//! - **Fixtures**: [`ShardBuilder`] writes Parquet shards column by column,
//!   including `{bytes, path}` image structs; [`sample_png`] and
//!   [`png_like_bytes`] produce image payloads
//! - **Mock I/O**: [`ShardDir`] is a self-deleting run directory with `data/`,
//!   `images/` and an output CSV path; [`read_csv_output`] reads the result back
//!
//! # Quick Start
//!
//! ```no_run
//! use flatshard::extractor::run;
//! use flatshard::testing::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let dir = ShardDir::new()?;
//! ShardBuilder::new()
//!     .utf8("question", vec![Some("what is shown?")])
//!     .binary("image", vec![Some(png_like_bytes(7))])
//!     .write(dir.shard_path("train-00000.parquet"))?;
//!
//! let summary = run(dir.config())?;
//! assert_eq!(summary.total_records, 1);
//! let (header, rows) = read_csv_output(dir.output_file())?;
//! assert_eq!(header, ["question", "image"]);
//! assert_eq!(rows[0][1], "Image data present");
//! # Ok(())
//! # }
//! ```

pub mod fixtures;
pub mod mock_io;

pub use fixtures::{ImageEnvelope, ShardBuilder, png_like_bytes, sample_png};
pub use mock_io::{ShardDir, read_csv_output};
