//! Row flattening over real Parquet shards.

use anyhow::Result;
use flatshard::testing::*;
use flatshard::{ImageMaterializer, RecordNormalizer, ShardRef, content_hash};
use std::fs;
use tracing::Span;

fn normalizer(save_to: Option<&ShardDir>, decode: bool) -> RecordNormalizer {
    let materializer = match save_to {
        Some(dir) => {
            fs::create_dir_all(dir.images_dir()).unwrap();
            ImageMaterializer::new(true, dir.images_dir(), Span::none())
        }
        None => ImageMaterializer::new(false, "images", Span::none()),
    };
    RecordNormalizer::new("image", decode, materializer, Span::none())
}

fn shard(dir: &ShardDir, name: &str) -> ShardRef {
    ShardRef {
        path: dir.shard_path(name),
        ordinal: 0,
    }
}

#[test]
fn columns_keep_schema_order_and_missing_values_are_empty() -> Result<()> {
    let dir = ShardDir::new()?;
    ShardBuilder::new()
        .utf8("question", vec![Some("Which organ?"), None])
        .int64("id", vec![Some(7), None])
        .float64("score", vec![Some(0.5), Some(f64::NAN)])
        .utf8("answer", vec![Some("Liver"), Some("")])
        .write(dir.shard_path("s.parquet"))?;

    let out = normalizer(None, false).normalize_shard(&shard(&dir, "s.parquet"), 0)?;
    assert_eq!(out.records.len(), 2);

    let first = &out.records[0];
    let keys: Vec<_> = first.keys().map(String::as_str).collect();
    assert_eq!(keys, ["question", "id", "score", "answer"]);
    assert_eq!(first["question"], "Which organ?");
    assert_eq!(first["id"], "7");
    assert_eq!(first["score"], "0.5");

    let second = &out.records[1];
    assert_eq!(second["question"], "");
    assert_eq!(second["id"], "");
    assert_eq!(second["score"], "");
    assert_eq!(second["answer"], "");
    Ok(())
}

#[test]
fn image_column_uses_shard_local_index() -> Result<()> {
    let dir = ShardDir::new()?;
    let images: Vec<_> = (0..4u8).map(png_like_bytes).collect();
    ShardBuilder::new()
        .int64("id", vec![Some(0), Some(1), Some(2), Some(3)])
        .binary("image", images.iter().cloned().map(Some).collect())
        .write(dir.shard_path("s.parquet"))?;

    let out = normalizer(Some(&dir), false).normalize_shard(&shard(&dir, "s.parquet"), 0)?;
    assert_eq!(out.images_saved, 4);
    assert_eq!(out.image_failures, 0);

    let expected = dir
        .images_dir()
        .join(format!("image_000003_{}.png", content_hash(&images[3])));
    assert_eq!(out.records[3]["image"], expected.display().to_string());
    assert_eq!(fs::read(expected)?, images[3]);
    Ok(())
}

#[test]
fn first_index_offsets_file_names() -> Result<()> {
    let dir = ShardDir::new()?;
    let bytes = png_like_bytes(1);
    ShardBuilder::new()
        .binary("image", vec![Some(bytes.clone())])
        .write(dir.shard_path("s.parquet"))?;

    let out = normalizer(Some(&dir), false).normalize_shard(&shard(&dir, "s.parquet"), 250)?;
    assert!(out.records[0]["image"].ends_with(&format!("image_000250_{}.png", content_hash(&bytes))));
    Ok(())
}

#[test]
fn envelopes_nulls_and_paths_in_one_column() -> Result<()> {
    let dir = ShardDir::new()?;
    let payload = sample_png(2, 2, [1, 2, 3]);
    ShardBuilder::new()
        .image_envelopes(
            "image",
            vec![
                Some(ImageEnvelope::from_bytes(payload.clone())),
                None,
                Some(ImageEnvelope {
                    bytes: None,
                    path: Some("https://cdn.example.org/fig.jpg".into()),
                }),
                Some(ImageEnvelope::default()),
            ],
        )
        .write(dir.shard_path("s.parquet"))?;

    let out = normalizer(Some(&dir), false).normalize_shard(&shard(&dir, "s.parquet"), 0)?;
    let cells: Vec<_> = out.records.iter().map(|r| r["image"].clone()).collect();
    assert!(cells[0].ends_with(&format!("image_000000_{}.png", content_hash(&payload))));
    assert_eq!(cells[1], "No image");
    assert_eq!(cells[2], "Error saving image: image envelope has no bytes");
    assert_eq!(cells[3], "Error saving image: image envelope has no bytes");
    assert_eq!(out.images_saved, 1);
    assert_eq!(out.image_failures, 2);
    Ok(())
}

#[test]
fn envelopes_with_null_payload_are_present_when_not_saving() -> Result<()> {
    let dir = ShardDir::new()?;
    ShardBuilder::new()
        .image_envelopes(
            "image",
            vec![
                Some(ImageEnvelope {
                    bytes: None,
                    path: Some("fig.jpg".into()),
                }),
                Some(ImageEnvelope::default()),
            ],
        )
        .write(dir.shard_path("s.parquet"))?;

    let out = normalizer(None, false).normalize_shard(&shard(&dir, "s.parquet"), 0)?;
    let cells: Vec<_> = out.records.iter().map(|r| r["image"].as_str()).collect();
    assert_eq!(cells, ["Image data present", "Image data present"]);
    assert_eq!(out.image_failures, 0);
    Ok(())
}

#[test]
fn decoded_images_report_size_when_not_saving() -> Result<()> {
    let dir = ShardDir::new()?;
    ShardBuilder::new()
        .binary(
            "image",
            vec![Some(sample_png(100, 200, [0, 0, 0])), Some(b"junk".to_vec())],
        )
        .write(dir.shard_path("s.parquet"))?;

    let out = normalizer(None, true).normalize_shard(&shard(&dir, "s.parquet"), 0)?;
    assert_eq!(out.records[0]["image"], "Image available (size: (100, 200))");
    assert_eq!(out.records[1]["image"], "Image data present");
    Ok(())
}

#[test]
fn non_image_column_named_differently_is_plain_text() -> Result<()> {
    let dir = ShardDir::new()?;
    ShardBuilder::new()
        .utf8("image_path", vec![Some("figures/a.png")])
        .write(dir.shard_path("s.parquet"))?;

    let out = normalizer(None, false).normalize_shard(&shard(&dir, "s.parquet"), 0)?;
    assert_eq!(out.records[0]["image_path"], "figures/a.png");
    Ok(())
}

#[test]
fn corrupt_shard_is_an_error() -> Result<()> {
    let dir = ShardDir::new()?;
    dir.write_corrupt_shard("bad.parquet")?;
    let result = normalizer(None, false).normalize_shard(&shard(&dir, "bad.parquet"), 0);
    assert!(result.is_err());
    Ok(())
}
