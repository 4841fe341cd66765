//! Parquet shard fixtures.
//!
//! [`ShardBuilder`] assembles an Arrow record batch column by column and writes
//! it as a single-row-group Parquet file, in the layouts image datasets use:
//! plain binary image columns, `{bytes, path}` structs, or path strings.

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, BinaryArray, Float64Array, Int64Array, StringArray, StructArray};
use arrow::buffer::NullBuffer;
use arrow::datatypes::{DataType, Field, Fields, Schema};
use arrow::record_batch::RecordBatch;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use parquet::arrow::ArrowWriter;
use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

/// One cell of a `{bytes, path}` image column.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageEnvelope {
    pub bytes: Option<Vec<u8>>,
    pub path: Option<String>,
}

impl ImageEnvelope {
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Some(bytes.into()),
            path: None,
        }
    }
}

/// Column-by-column builder for a Parquet shard.
///
/// # Example
///
/// ```
/// use flatshard::testing::ShardBuilder;
///
/// # fn main() -> anyhow::Result<()> {
/// let dir = tempfile::tempdir()?;
/// ShardBuilder::new()
///     .int64("id", vec![Some(1), Some(2)])
///     .utf8("question", vec![Some("what?"), None])
///     .write(dir.path().join("train-00000.parquet"))?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct ShardBuilder {
    fields: Vec<Field>,
    columns: Vec<ArrayRef>,
}

impl ShardBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn column(mut self, name: &str, data_type: DataType, array: ArrayRef) -> Self {
        self.fields.push(Field::new(name, data_type, true));
        self.columns.push(array);
        self
    }

    #[must_use]
    pub fn int64(self, name: &str, values: Vec<Option<i64>>) -> Self {
        self.column(name, DataType::Int64, Arc::new(Int64Array::from(values)))
    }

    #[must_use]
    pub fn float64(self, name: &str, values: Vec<Option<f64>>) -> Self {
        self.column(name, DataType::Float64, Arc::new(Float64Array::from(values)))
    }

    #[must_use]
    pub fn utf8(self, name: &str, values: Vec<Option<&str>>) -> Self {
        self.column(
            name,
            DataType::Utf8,
            Arc::new(values.into_iter().collect::<StringArray>()),
        )
    }

    #[must_use]
    pub fn binary(self, name: &str, values: Vec<Option<Vec<u8>>>) -> Self {
        self.column(
            name,
            DataType::Binary,
            Arc::new(values.into_iter().collect::<BinaryArray>()),
        )
    }

    /// A struct column shaped like the Hugging Face `Image` feature.
    /// `None` entries are null structs.
    #[must_use]
    pub fn image_envelopes(self, name: &str, values: Vec<Option<ImageEnvelope>>) -> Self {
        let validity: Vec<bool> = values.iter().map(Option::is_some).collect();
        let bytes: BinaryArray = values
            .iter()
            .map(|v| v.as_ref().and_then(|e| e.bytes.clone()))
            .collect();
        let paths: StringArray = values
            .iter()
            .map(|v| v.as_ref().and_then(|e| e.path.clone()))
            .collect();

        let fields = envelope_fields();
        let array = StructArray::new(
            fields.clone(),
            vec![Arc::new(bytes) as ArrayRef, Arc::new(paths) as ArrayRef],
            Some(NullBuffer::from(validity)),
        );
        self.column(name, DataType::Struct(fields), Arc::new(array))
    }

    /// Write the shard to `path` as a single row group.
    ///
    /// # Errors
    /// Returns an error if column lengths differ or the file cannot be written.
    pub fn write(self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let schema = Arc::new(Schema::new(self.fields));
        let batch =
            RecordBatch::try_new(schema.clone(), self.columns).context("build RecordBatch")?;

        let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
        let mut writer = ArrowWriter::try_new(file, schema, None).context("create ArrowWriter")?;
        writer.write(&batch).context("write batch to parquet")?;
        writer.close().context("close ArrowWriter")?;
        Ok(batch.num_rows())
    }
}

fn envelope_fields() -> Fields {
    Fields::from(vec![
        Field::new("bytes", DataType::Binary, true),
        Field::new("path", DataType::Utf8, true),
    ])
}

/// PNG bytes of a `width` x `height` image filled with `rgb`.
///
/// # Panics
/// Panics if the in-memory PNG encoder fails, which it does not for RGB8.
#[must_use]
pub fn sample_png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(rgb)));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .expect("encode PNG in memory");
    out.into_inner()
}

/// Bytes that start with the PNG signature but are otherwise opaque.
#[must_use]
pub fn png_like_bytes(tag: u8) -> Vec<u8> {
    let mut v = b"\x89PNG\r\n\x1a\n".to_vec();
    v.extend_from_slice(&[tag; 16]);
    v
}
