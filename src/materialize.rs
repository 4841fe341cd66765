//! Image materialization policy.
//!
//! [`ImageMaterializer::materialize`] turns one [`ImageValue`] into the string
//! stored in the output table, writing the payload to disk when saving is
//! enabled. The outcome is an explicit [`ImageOutcome`]; failures to hash or
//! write degrade the cell to an error description and never escape.
//!
//! Saved files are named `image_{index:06}_{hash}.png`, where `hash` is the
//! first [`HASH_PREFIX_LEN`] hex digits of the SHA-256 of the bytes written
//! (raw payload bytes, or raw pixel bytes for decoded bitmaps). No collision
//! detection is done: a second write to the same name replaces the first.

use crate::image_value::ImageValue;
use anyhow::{Context, Result, anyhow};
use image::{DynamicImage, ImageFormat};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{Span, debug, error, warn};

/// Number of hex digits of the content digest kept in file names.
pub const HASH_PREFIX_LEN: usize = 8;

/// Result of applying the image policy to one cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageOutcome {
    /// The row had no image.
    NoImage,
    /// The payload was written to this file.
    Saved(PathBuf),
    /// A path string passed through unchanged.
    Reference(String),
    /// A path string that does not exist locally.
    Remote(String),
    /// A value the policy does not know how to handle.
    UnknownType(&'static str),
    /// A bitmap was present; saving is disabled.
    Available { width: u32, height: u32 },
    /// Some payload was present; saving is disabled.
    Present,
    /// Hashing or writing failed.
    Failed(String),
}

impl ImageOutcome {
    /// Whether a file was written for this cell.
    #[must_use]
    pub const fn is_saved(&self) -> bool {
        matches!(self, Self::Saved(_))
    }

    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for ImageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoImage => f.write_str("No image"),
            Self::Saved(path) => write!(f, "{}", path.display()),
            Self::Reference(path) => f.write_str(path),
            Self::Remote(path) => write!(f, "Remote image: {path}"),
            Self::UnknownType(name) => write!(f, "Unknown image type: {name}"),
            Self::Available { width, height } => {
                write!(f, "Image available (size: ({width}, {height}))")
            }
            Self::Present => f.write_str("Image data present"),
            Self::Failed(reason) => write!(f, "Error saving image: {reason}"),
        }
    }
}

/// Applies the image policy for one run.
#[derive(Clone, Debug)]
pub struct ImageMaterializer {
    save_images: bool,
    images_dir: PathBuf,
    span: Span,
}

impl ImageMaterializer {
    /// Build a materializer that logs under `span`.
    ///
    /// The images directory is not created here; the run creates it once
    /// before the first shard is processed.
    #[must_use]
    pub fn new(save_images: bool, images_dir: impl Into<PathBuf>, span: Span) -> Self {
        Self {
            save_images,
            images_dir: images_dir.into(),
            span,
        }
    }

    #[must_use]
    pub fn saves_images(&self) -> bool {
        self.save_images
    }

    #[must_use]
    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    /// Apply the policy to `value`, the image of the row at `index`.
    pub fn materialize(&self, value: &ImageValue, index: u64) -> ImageOutcome {
        let _enter = self.span.enter();
        if self.save_images {
            self.save(value, index)
        } else {
            describe(value)
        }
    }

    fn save(&self, value: &ImageValue, index: u64) -> ImageOutcome {
        let written = match value {
            ImageValue::Absent => return ImageOutcome::NoImage,
            ImageValue::Decoded(img) => self.write_bitmap(img, index),
            ImageValue::Envelope {
                bytes: Some(bytes), ..
            }
            | ImageValue::Bytes(bytes) => self.write_bytes(bytes, index),
            ImageValue::Envelope { bytes: None, .. } => {
                Err(anyhow!("image envelope has no bytes"))
            }
            ImageValue::Path(path) => {
                if Path::new(path).exists() {
                    return ImageOutcome::Reference(path.clone());
                }
                warn!(%path, "cannot save remote image");
                return ImageOutcome::Remote(path.clone());
            }
            ImageValue::Unknown { type_name } => {
                warn!(type_name = *type_name, "unknown image data type");
                return ImageOutcome::UnknownType(*type_name);
            }
        };

        match written {
            Ok(path) => {
                debug!(path = %path.display(), "saved image");
                ImageOutcome::Saved(path)
            }
            Err(e) => {
                error!(record = index, "error saving image: {e:#}");
                ImageOutcome::Failed(format!("{e:#}"))
            }
        }
    }

    fn write_bytes(&self, bytes: &[u8], index: u64) -> Result<PathBuf> {
        let path = self.images_dir.join(image_file_name(index, &content_hash(bytes)));
        fs::write(&path, bytes).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }

    fn write_bitmap(&self, img: &DynamicImage, index: u64) -> Result<PathBuf> {
        let path = self
            .images_dir
            .join(image_file_name(index, &content_hash(img.as_bytes())));
        img.save_with_format(&path, ImageFormat::Png)
            .with_context(|| format!("encode PNG to {}", path.display()))?;
        Ok(path)
    }
}

/// Describe an image without touching the filesystem.
#[must_use]
pub fn describe(value: &ImageValue) -> ImageOutcome {
    match value {
        ImageValue::Absent => ImageOutcome::NoImage,
        ImageValue::Path(path) => ImageOutcome::Reference(path.clone()),
        other => match other.size() {
            Some((width, height)) => ImageOutcome::Available { width, height },
            None => ImageOutcome::Present,
        },
    }
}

/// First [`HASH_PREFIX_LEN`] lowercase hex digits of the SHA-256 of `data`.
#[must_use]
pub fn content_hash(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    digest
        .iter()
        .take(HASH_PREFIX_LEN / 2)
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// `image_{index:06}_{hash}.png`.
#[must_use]
pub fn image_file_name(index: u64, hash: &str) -> String {
    format!("image_{index:06}_{hash}.png")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_eight_hex_digits() {
        // SHA-256("abc") = ba7816bf...
        assert_eq!(content_hash(b"abc"), "ba7816bf");
        assert_eq!(content_hash(b"").len(), HASH_PREFIX_LEN);
    }

    #[test]
    fn file_name_pads_index() {
        assert_eq!(image_file_name(3, "deadbeef"), "image_000003_deadbeef.png");
        assert_eq!(
            image_file_name(1_234_567, "deadbeef"),
            "image_1234567_deadbeef.png"
        );
    }

    #[test]
    fn outcome_strings() {
        assert_eq!(ImageOutcome::NoImage.to_string(), "No image");
        assert_eq!(
            ImageOutcome::Remote("http://example.com/x.png".into()).to_string(),
            "Remote image: http://example.com/x.png"
        );
        assert_eq!(
            ImageOutcome::Available {
                width: 100,
                height: 200
            }
            .to_string(),
            "Image available (size: (100, 200))"
        );
        assert_eq!(
            ImageOutcome::UnknownType("int64").to_string(),
            "Unknown image type: int64"
        );
        assert_eq!(ImageOutcome::Present.to_string(), "Image data present");
    }

    #[test]
    fn describe_without_saving() {
        assert_eq!(describe(&ImageValue::Absent), ImageOutcome::NoImage);
        assert_eq!(
            describe(&ImageValue::Path("a/b.png".into())),
            ImageOutcome::Reference("a/b.png".into())
        );
        assert_eq!(
            describe(&ImageValue::Bytes(vec![1, 2])),
            ImageOutcome::Present
        );
        assert_eq!(
            describe(&ImageValue::Decoded(DynamicImage::new_rgb8(100, 200))),
            ImageOutcome::Available {
                width: 100,
                height: 200
            }
        );
    }
}
