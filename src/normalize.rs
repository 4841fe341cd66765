//! Row flattening.
//!
//! [`RecordNormalizer::normalize_shard`] reads one shard and turns every row
//! into a [`NormalizedRecord`]: an ordered `column -> string` map in schema
//! order. The image column goes through the [`ImageMaterializer`]; every
//! other column goes through [`field_to_cell`].
//!
//! A shard either normalizes completely or not at all. Any read or decode
//! error is returned to the caller, which decides whether to skip the shard.

use crate::image_value::ImageValue;
use crate::io::glob::ShardRef;
use crate::io::parquet::read_shard_rows;
use crate::materialize::ImageMaterializer;
use anyhow::Result;
use indexmap::IndexMap;
use parquet::record::Field;
use serde_json::Value;
use std::fmt;
use tracing::{Span, info};

/// One output row: column name to cell text, in source column order.
pub type NormalizedRecord = IndexMap<String, String>;

/// Records of one shard plus image bookkeeping.
#[derive(Clone, Debug, Default)]
pub struct NormalizedShard {
    pub records: Vec<NormalizedRecord>,
    /// Image files written while normalizing this shard.
    pub images_saved: usize,
    /// Image cells that degraded to an error description.
    pub image_failures: usize,
}

/// Flattens shards into string records.
#[derive(Clone, Debug)]
pub struct RecordNormalizer {
    image_column: String,
    decode_images: bool,
    materializer: ImageMaterializer,
    span: Span,
}

impl RecordNormalizer {
    #[must_use]
    pub fn new(
        image_column: impl Into<String>,
        decode_images: bool,
        materializer: ImageMaterializer,
        span: Span,
    ) -> Self {
        Self {
            image_column: image_column.into(),
            decode_images,
            materializer,
            span,
        }
    }

    #[must_use]
    pub fn image_column(&self) -> &str {
        &self.image_column
    }

    /// Normalize every row of `shard`, in file order.
    ///
    /// `first_index` is the image-naming index of the shard's first row; each
    /// following row increments it by one.
    ///
    /// # Errors
    /// Returns an error if the shard cannot be opened or any row fails to
    /// decode. No record of the shard is returned in that case, though image
    /// files written before the failure stay on disk.
    pub fn normalize_shard(&self, shard: &ShardRef, first_index: u64) -> Result<NormalizedShard> {
        let _enter = self.span.enter();
        let rows = read_shard_rows(&shard.path)?;
        info!(shard = %shard.file_name(), records = rows.len(), "processing shard");

        let mut out = NormalizedShard {
            records: Vec::with_capacity(rows.len()),
            ..NormalizedShard::default()
        };
        for (index, row) in (first_index..).zip(&rows) {
            let mut record = NormalizedRecord::with_capacity(row.len());
            for (column, value) in row.get_column_iter() {
                let cell = if *column == self.image_column {
                    let outcome = self.materializer.materialize(&self.image_value(value), index);
                    out.images_saved += usize::from(outcome.is_saved());
                    out.image_failures += usize::from(outcome.is_failure());
                    outcome.to_string()
                } else {
                    field_to_cell(value)
                };
                record.insert(column.clone(), cell);
            }
            out.records.push(record);
        }
        Ok(out)
    }

    fn image_value(&self, field: &Field) -> ImageValue {
        let value = ImageValue::from_field(field);
        if self.decode_images {
            value.decoded()
        } else {
            value
        }
    }
}

/// Canonical text of a non-image cell.
///
/// Missing values (null, and NaN floats) become the empty string. Strings are
/// copied verbatim, binary is UTF-8 text when valid and base64 otherwise, and
/// nested values render as compact JSON. Floats use the shortest round-trip
/// decimal form, booleans are `True`/`False`, and other
/// scalars use their Parquet display form.
#[must_use]
pub fn field_to_cell(field: &Field) -> String {
    match field {
        Field::Null => String::new(),
        Field::Float(v) if v.is_nan() => String::new(),
        Field::Double(v) if v.is_nan() => String::new(),
        Field::Float(v) => float_text(*v, f64::from(v.abs())),
        Field::Double(v) => float_text(*v, v.abs()),
        Field::Bool(true) => "True".to_owned(),
        Field::Bool(false) => "False".to_owned(),
        Field::Str(s) => s.clone(),
        Field::Bytes(b) => match std::str::from_utf8(b.data()) {
            Ok(s) => s.to_owned(),
            Err(_) => json_text(field.to_json_value()),
        },
        Field::Group(_) | Field::ListInternal(_) | Field::MapInternal(_) => {
            json_text(field.to_json_value())
        }
        other => other.to_string(),
    }
}

/// Shortest round-trip text of a float, always with a fractional part or an
/// exponent: `0.0`, `-1.5`, `123456.0`.
///
/// Magnitudes below `1e-4` or from `1e16` up switch to exponent form with a
/// signed, two-digit exponent (`2.5e-20`, `1e+16`).
fn float_text<T: fmt::Display + fmt::LowerExp>(value: T, magnitude: f64) -> String {
    if magnitude.is_infinite() {
        return value.to_string();
    }
    if magnitude == 0.0 || (1e-4..1e16).contains(&magnitude) {
        let plain = value.to_string();
        return if plain.contains('.') {
            plain
        } else {
            format!("{plain}.0")
        };
    }
    let sci = format!("{value:e}");
    match sci.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = exp.strip_prefix('-').map_or(("+", exp), |d| ("-", d));
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => sci,
    }
}

fn json_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
