//! The image cell as a closed set of representations.
//!
//! Dataset containers store images in several shapes: bare encoded bytes, a
//! `{bytes, path}` struct (the Hugging Face `Image` feature), or a path/URL
//! string. [`ImageValue::from_field`] maps a Parquet field onto one of the
//! variants below, and the materialization policy matches on them
//! exhaustively.

use image::{DynamicImage, GenericImageView as _};
use parquet::record::{Field, Row};
use std::fmt;
use tracing::debug;

/// Struct member holding the encoded payload in an image envelope.
pub const ENVELOPE_BYTES: &str = "bytes";
/// Struct member holding the original file path in an image envelope.
pub const ENVELOPE_PATH: &str = "path";

/// A single image cell.
#[derive(Clone)]
pub enum ImageValue {
    /// No image in this row.
    Absent,
    /// An in-memory bitmap.
    Decoded(DynamicImage),
    /// A container struct with a `bytes` member, and the path it recorded
    /// (if any). `bytes` is `None` when the member is null.
    Envelope {
        bytes: Option<Vec<u8>>,
        path: Option<String>,
    },
    /// Bare encoded bytes.
    Bytes(Vec<u8>),
    /// A local filesystem path or a remote locator.
    Path(String),
    /// Anything else; `type_name` names what was found.
    Unknown { type_name: &'static str },
}

impl ImageValue {
    /// Classify a Parquet field.
    ///
    /// Any struct with a `bytes` member is an [`ImageValue::Envelope`], even
    /// when that member is null; a struct without one is unknown.
    #[must_use]
    pub fn from_field(field: &Field) -> Self {
        match field {
            Field::Null => Self::Absent,
            Field::Bytes(b) => Self::Bytes(b.data().to_vec()),
            Field::Str(s) => Self::Path(s.clone()),
            Field::Group(row) => Self::from_envelope(row),
            other => Self::Unknown {
                type_name: field_type_name(other),
            },
        }
    }

    fn from_envelope(row: &Row) -> Self {
        let mut bytes = None;
        let mut path = None;
        let mut has_bytes_member = false;
        for (name, value) in row.get_column_iter() {
            match (name.as_str(), value) {
                (ENVELOPE_BYTES, Field::Bytes(b)) => {
                    has_bytes_member = true;
                    bytes = Some(b.data().to_vec());
                }
                (ENVELOPE_BYTES, _) => has_bytes_member = true,
                (ENVELOPE_PATH, Field::Str(s)) => path = Some(s.clone()),
                _ => {}
            }
        }

        if has_bytes_member {
            Self::Envelope { bytes, path }
        } else {
            Self::Unknown { type_name: "struct" }
        }
    }

    /// Replace encoded payloads with decoded bitmaps where the payload decodes.
    ///
    /// Payloads the `image` crate cannot decode are left untouched.
    #[must_use]
    pub fn decoded(self) -> Self {
        let bytes = match &self {
            Self::Bytes(bytes) | Self::Envelope { bytes: Some(bytes), .. } => bytes,
            _ => return self,
        };
        match image::load_from_memory(bytes) {
            Ok(img) => Self::Decoded(img),
            Err(e) => {
                debug!(%e, len = bytes.len(), "image payload did not decode; keeping raw bytes");
                self
            }
        }
    }

    /// Pixel dimensions `(width, height)`, for variants that expose them.
    #[must_use]
    pub fn size(&self) -> Option<(u32, u32)> {
        match self {
            Self::Decoded(img) => Some(img.dimensions()),
            _ => None,
        }
    }
}

impl fmt::Debug for ImageValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("Absent"),
            Self::Decoded(img) => {
                let (w, h) = img.dimensions();
                write!(f, "Decoded({w}x{h})")
            }
            Self::Envelope { bytes, path } => f
                .debug_struct("Envelope")
                .field("len", &bytes.as_ref().map(Vec::len))
                .field("path", path)
                .finish(),
            Self::Bytes(bytes) => write!(f, "Bytes(len={})", bytes.len()),
            Self::Path(p) => f.debug_tuple("Path").field(p).finish(),
            Self::Unknown { type_name } => write!(f, "Unknown({type_name})"),
        }
    }
}

/// Short, stable name for the kind of value a Parquet field holds.
#[must_use]
pub fn field_type_name(field: &Field) -> &'static str {
    match field {
        Field::Null => "null",
        Field::Bool(_) => "bool",
        Field::Byte(_) => "int8",
        Field::Short(_) => "int16",
        Field::Int(_) => "int32",
        Field::Long(_) => "int64",
        Field::UByte(_) => "uint8",
        Field::UShort(_) => "uint16",
        Field::UInt(_) => "uint32",
        Field::ULong(_) => "uint64",
        Field::Float(_) => "float",
        Field::Double(_) => "double",
        Field::Decimal(_) => "decimal",
        Field::Str(_) => "string",
        Field::Bytes(_) => "binary",
        Field::Date(_) => "date",
        Field::Group(_) => "struct",
        Field::ListInternal(_) => "list",
        Field::MapInternal(_) => "map",
        _ => "value",
    }
}
