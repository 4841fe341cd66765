//! Fatal error taxonomy.
//!
//! Only directory resolution and final serialization may abort a run. Both are
//! raised as [`ExtractError`] wrapped in [`anyhow::Error`], so callers that need
//! to branch on the cause can `downcast_ref::<ExtractError>()`. Everything below
//! shard granularity is recovered in place and reported through the summary.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("data directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("no parquet files found in {}", .0.display())]
    NoShards(PathBuf),

    #[error("failed to write {}: {reason}", path.display())]
    Serialization { path: PathBuf, reason: String },
}

impl ExtractError {
    /// Whether this error stems from a missing directory or an empty shard set.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::DirectoryNotFound(_) | Self::NoShards(_))
    }
}
