//! Sobel edge maps.
//!
//! The pipeline for one image is three stages, each consuming the previous
//! stage's output:
//!
//! ```text
//! RgbImage ─▶ gradient ─▶ normalize ─▶ threshold ─▶ RgbImage
//!  (u8)       (gx²+gy²)   (0..=255)    (RenderMode)
//! ```
//!
//! | Stage | Module | Parallelism |
//! |---|---|---|
//! | Gradient engine | [`gradient`] | one task per interior row |
//! | Normalizer | [`normalize`] | parallel max-reduction, then a barrier |
//! | Thresholder | [`threshold`] | per pixel |
//!
//! The batch driver in [`crate::process`] chains the stages and reports
//! each one as it starts.

pub mod gradient;
pub mod grid;
pub mod kernel;
pub mod normalize;
pub mod progress;
pub mod threshold;

pub use gradient::{Gradients, compute_gradients};
pub use grid::{CHANNELS, ChannelGrid};
pub use normalize::{NormalizeError, max_magnitude, normalize};
pub use progress::RowProgress;
pub use threshold::{RenderMode, render, render_pixel};

use image::RgbImage;

/// Outcome of running the full pipeline on one image.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeMap {
    pub image: RgbImage,
    /// Pre-normalization maximum, or `None` when no edges were found.
    pub max_magnitude: Option<f32>,
}

impl EdgeMap {
    /// The all-black result used when an image has no gradient at all.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::new(width, height),
            max_magnitude: None,
        }
    }
}
