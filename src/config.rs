//! Extraction configuration.
//!
//! [`ExtractConfig`] carries every knob the extraction run reads. It is a plain
//! struct with public fields and a [`Default`] impl, so callers can override
//! just the fields they care about:
//!
//! ```
//! use flatshard::config::{ExtractConfig, IndexScope};
//!
//! let config = ExtractConfig {
//!     data_dir: "dataset/data".into(),
//!     save_images: true,
//!     index_scope: IndexScope::Global,
//!     ..Default::default()
//! };
//! assert_eq!(config.images_dir.to_str(), Some("images"));
//! ```

use std::path::PathBuf;

/// Column name that carries the embedded image in Hugging Face image datasets.
pub const DEFAULT_IMAGE_COLUMN: &str = "image";

/// Configuration for one extraction run.
#[derive(Clone, Debug)]
pub struct ExtractConfig {
    /// Directory holding the `*.parquet` shards (non-recursive).
    pub data_dir: PathBuf,
    /// Destination of the flattened CSV table.
    pub output_file: PathBuf,
    /// Write embedded image payloads to `images_dir` instead of describing them.
    pub save_images: bool,
    /// Directory receiving materialized images. Created before the first row
    /// is processed when `save_images` is set.
    pub images_dir: PathBuf,
    /// Column routed through the image policy instead of plain string coercion.
    pub image_column: String,
    /// Which row ordinal feeds the `image_{index:06}_{hash}.png` file names.
    pub index_scope: IndexScope,
    /// Decode raw image payloads into bitmaps before applying the image policy.
    /// Decoded images are re-encoded as PNG when saved.
    pub decode_images: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            output_file: PathBuf::from("extracted_dataset.csv"),
            save_images: false,
            images_dir: PathBuf::from("images"),
            image_column: DEFAULT_IMAGE_COLUMN.to_string(),
            index_scope: IndexScope::PerShard,
            decode_images: false,
        }
    }
}

/// Ordinal used when naming materialized image files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IndexScope {
    /// Row position within the current shard; restarts at zero for every shard.
    ///
    /// Two shards holding byte-identical images at the same position map to
    /// the same file name, and the later write replaces the earlier one.
    #[default]
    PerShard,
    /// Strictly increasing row position across all shards of the run.
    Global,
}

impl IndexScope {
    /// Index of the first row of a shard, given how many rows the run has
    /// already accumulated.
    #[must_use]
    pub const fn first_index(self, rows_before_shard: u64) -> u64 {
        match self {
            Self::PerShard => 0,
            Self::Global => rows_before_shard,
        }
    }
}
