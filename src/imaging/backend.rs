//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the seam between the edge pipeline and the
//! filesystem: decode a file into RGB pixels, encode RGB pixels back into a
//! file. The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use image::RgbImage;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
}

/// Trait for image codec backends.
///
/// `Sync` so a single backend can be shared with the row-task pool.
pub trait ImageBackend: Sync {
    /// Read and decode an image as 8-bit RGB. Alpha is discarded.
    fn decode(&self, path: &Path) -> Result<RgbImage, BackendError>;

    /// Encode `image` into the container implied by `path`'s extension.
    fn encode(&self, image: &RgbImage, path: &Path) -> Result<(), BackendError>;
}
