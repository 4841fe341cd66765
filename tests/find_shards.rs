//! Shard enumeration: ordering and the not-found cases.

use anyhow::Result;
use flatshard::testing::*;
use flatshard::{ExtractError, find_shards};
use std::fs;

fn write_tiny(dir: &ShardDir, name: &str) -> Result<()> {
    ShardBuilder::new()
        .int64("id", vec![Some(1)])
        .write(dir.shard_path(name))?;
    Ok(())
}

#[test]
fn shards_are_sorted_lexicographically() -> Result<()> {
    let dir = ShardDir::new()?;
    write_tiny(&dir, "train-00002.parquet")?;
    write_tiny(&dir, "train-00000.parquet")?;
    write_tiny(&dir, "test-00000.parquet")?;
    write_tiny(&dir, "train-00001.parquet")?;

    let shards = find_shards(dir.data_dir())?;
    let names: Vec<_> = shards.iter().map(|s| s.file_name()).collect();
    assert_eq!(
        names,
        [
            "test-00000.parquet",
            "train-00000.parquet",
            "train-00001.parquet",
            "train-00002.parquet"
        ]
    );
    let ordinals: Vec<_> = shards.iter().map(|s| s.ordinal).collect();
    assert_eq!(ordinals, [0, 1, 2, 3]);
    Ok(())
}

#[test]
fn other_files_and_subdirectories_are_ignored() -> Result<()> {
    let dir = ShardDir::new()?;
    write_tiny(&dir, "a.parquet")?;
    fs::write(dir.shard_path("README.md"), "dataset card")?;
    fs::write(dir.shard_path("a.parquet.crc"), "x")?;
    fs::create_dir(dir.shard_path("nested"))?;
    write_tiny(&dir, "nested/b.parquet")?;
    fs::create_dir(dir.shard_path("dir.parquet"))?;

    let shards = find_shards(dir.data_dir())?;
    assert_eq!(shards.len(), 1);
    assert_eq!(shards[0].file_name(), "a.parquet");
    Ok(())
}

#[test]
fn missing_directory_is_not_found() {
    let err = find_shards("definitely/not/here").unwrap_err();
    let err = err.downcast_ref::<ExtractError>().expect("typed error");
    assert!(matches!(err, ExtractError::DirectoryNotFound(_)));
    assert!(err.is_not_found());
}

#[test]
fn empty_directory_is_not_found() -> Result<()> {
    let dir = ShardDir::new()?;
    fs::write(dir.shard_path("notes.txt"), "no shards here")?;

    let err = find_shards(dir.data_dir()).unwrap_err();
    let err = err.downcast_ref::<ExtractError>().expect("typed error");
    assert!(matches!(err, ExtractError::NoShards(_)));
    assert!(err.to_string().contains("no parquet files found"));
    Ok(())
}

#[test]
fn hidden_files_only_is_not_found() -> Result<()> {
    let dir = ShardDir::new()?;
    write_tiny(&dir, "._train.parquet")?;
    write_tiny(&dir, ".partial.parquet")?;

    let err = find_shards(dir.data_dir()).unwrap_err();
    let err = err.downcast_ref::<ExtractError>().expect("typed error");
    assert!(matches!(err, ExtractError::NoShards(_)));
    Ok(())
}

#[test]
fn hidden_files_are_skipped_next_to_shards() -> Result<()> {
    let dir = ShardDir::new()?;
    write_tiny(&dir, "train-00000.parquet")?;
    fs::write(dir.shard_path("._train-00000.parquet"), "appledouble")?;

    let shards = find_shards(dir.data_dir())?;
    let names: Vec<_> = shards.iter().map(|s| s.file_name()).collect();
    assert_eq!(names, ["train-00000.parquet"]);
    Ok(())
}

#[test]
fn directory_names_with_glob_characters_match_literally() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let data = tmp.path().join("split[train]");
    fs::create_dir(&data)?;
    ShardBuilder::new()
        .int64("id", vec![Some(1)])
        .write(data.join("x.parquet"))?;

    let shards = find_shards(&data)?;
    assert_eq!(shards.len(), 1);
    Ok(())
}
