//! Pure Rust codec backend built on the `image` crate.
//!
//! ## Format mapping
//!
//! | Extension | Format |
//! |---|---|
//! | `jpg`, `jpeg` | JPEG |
//! | `png` | PNG |
//! | `tif`, `tiff` | TIFF |
//! | `webp` | WebP (lossless) |
//! | `bmp` | BMP |
//!
//! Decoding guesses the format from the file contents, so a mislabelled
//! input still decodes. Encoding always follows the output extension.

use super::backend::{BackendError, ImageBackend};
use image::{ImageFormat, ImageReader, RgbImage};
use std::io::BufWriter;
use std::path::Path;

const FORMATS: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
    ("bmp", ImageFormat::Bmp),
];

/// Look up the container format for `path`'s extension (case-insensitive).
pub fn format_for_path(path: &Path) -> Result<ImageFormat, BackendError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    FORMATS
        .iter()
        .find(|(candidate, _)| *candidate == ext)
        .map(|(_, fmt)| *fmt)
        .ok_or(BackendError::UnsupportedFormat(ext))
}

/// Backend using the `image` crate's decoders and encoders.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, path: &Path) -> Result<RgbImage, BackendError> {
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        let img = reader.decode().map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })?;
        Ok(img.to_rgb8())
    }

    fn encode(&self, image: &RgbImage, path: &Path) -> Result<(), BackendError> {
        let format = format_for_path(path)?;
        let file = std::fs::File::create(path)?;
        let mut writer = BufWriter::new(file);
        image.write_to(&mut writer, format).map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to encode {}: {}", path.display(), e))
        })
    }
}
