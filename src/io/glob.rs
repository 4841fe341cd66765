//! Shard enumeration.
//!
//! Locates every `*.parquet` file directly inside a data directory and returns
//! them in lexicographic order. The order fixes both the row order of the
//! output table and the assignment of image file names, so repeated runs over
//! an unchanged directory behave identically.
//!
//! # Examples
//!
//! ```no_run
//! use flatshard::io::glob::find_shards;
//!
//! let shards = find_shards("dataset/data")?;
//! for shard in &shards {
//!     println!("{}: {}", shard.ordinal, shard.file_name());
//! }
//! # use anyhow::Error; Ok::<(), Error>(())
//! ```

use crate::error::ExtractError;
use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern, glob_with};
use std::path::{Path, PathBuf};

/// File extension of columnar shards.
pub const SHARD_EXTENSION: &str = "parquet";

/// One source file, in processing order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShardRef {
    /// Resolved file path.
    pub path: PathBuf,
    /// Position in the enumerated order. Not persisted anywhere.
    pub ordinal: usize,
}

impl ShardRef {
    /// Final path component, for log lines and listings.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map_or_else(|| self.path.display().to_string(), |n| n.to_string_lossy().into_owned())
    }
}

/// Expand a glob pattern into a sorted vector of matching file paths.
///
/// Directories matching the pattern are skipped, and wildcards never match a
/// leading `.` in a file name. Zero matches is not an error here; see [`find_shards`] for the strict variant.
///
/// # Errors
///
/// Returns an error if the pattern is invalid or a directory entry cannot be read.
pub fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };
    let paths =
        glob_with(pattern, options).with_context(|| format!("invalid glob pattern: {pattern}"))?;

    let mut result = Vec::new();
    for entry in paths {
        let path =
            entry.with_context(|| format!("error reading glob entry for pattern: {pattern}"))?;
        if path.is_file() {
            result.push(path);
        }
    }

    // Sort for deterministic order
    result.sort();

    Ok(result)
}

/// Enumerate the Parquet shards of `dir`, sorted by file name.
///
/// Hidden files such as `._train.parquet` are not shards.
///
/// # Errors
///
/// Fails with [`ExtractError::DirectoryNotFound`] if `dir` does not exist and
/// with [`ExtractError::NoShards`] if it holds no `*.parquet` file. An empty
/// directory is indistinguishable from a misconfigured one, so it is surfaced
/// rather than treated as zero rows.
pub fn find_shards(dir: impl AsRef<Path>) -> Result<Vec<ShardRef>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(ExtractError::DirectoryNotFound(dir.to_path_buf()).into());
    }

    // Escape the directory part so brackets or stars in it match literally.
    let escaped = Pattern::escape(&dir.to_string_lossy());
    let pattern = format!("{escaped}/*.{SHARD_EXTENSION}");
    let files = expand_glob(&pattern)?;
    if files.is_empty() {
        return Err(ExtractError::NoShards(dir.to_path_buf()).into());
    }

    Ok(files
        .into_iter()
        .enumerate()
        .map(|(ordinal, path)| ShardRef { path, ordinal })
        .collect())
}
