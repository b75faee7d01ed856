//! Thresholding and final rendering to 8-bit RGB.
//!
//! | Mode | Significant pixel | Other pixel |
//! |---|---|---|
//! | [`RenderMode::Intensity`] | n/a, every pixel written through | written through |
//! | [`RenderMode::Stretch`] | channels divided by their max, times 255 | written through |
//! | [`RenderMode::Binary`] | `(255, 255, 255)` | `(0, 0, 0)` |
//!
//! A pixel is significant when any of its rescaled channels is strictly
//! greater than the threshold. A negative threshold makes every pixel
//! significant. Float channels are truncated towards zero when converted to
//! `u8`.

use super::grid::{CHANNELS, ChannelGrid};
use super::normalize::OUTPUT_MAX;
use image::RgbImage;
use rayon::prelude::*;

/// How rescaled magnitudes become output pixels.
///
/// Binary rendering only exists together with a threshold, so a binary
/// request without one cannot reach this stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Edge-intensity map: rescaled magnitudes, no thresholding.
    #[default]
    Intensity,
    /// Significant pixels are brightened so their strongest channel is 255.
    Stretch { threshold: i32 },
    /// Significant pixels white, everything else black.
    Binary { threshold: i32 },
}

impl RenderMode {
    /// Build a mode from the three user-facing switches.
    ///
    /// Returns the mode and whether `binary` had to be dropped because no
    /// threshold was enabled.
    pub fn from_flags(threshold: Option<i32>, binary: bool) -> (Self, bool) {
        match (threshold, binary) {
            (None, binary) => (Self::Intensity, binary),
            (Some(threshold), false) => (Self::Stretch { threshold }, false),
            (Some(threshold), true) => (Self::Binary { threshold }, false),
        }
    }
}

/// Whether any channel strictly exceeds `threshold`.
pub fn is_significant(pixel: [f32; CHANNELS], threshold: i32) -> bool {
    let threshold = threshold as f32;
    pixel.iter().any(|&v| v > threshold)
}

/// Apply `mode` to one rescaled pixel.
pub fn render_pixel(pixel: [f32; CHANNELS], mode: RenderMode) -> [f32; CHANNELS] {
    match mode {
        RenderMode::Intensity => pixel,
        RenderMode::Stretch { threshold } => {
            if is_significant(pixel, threshold) {
                stretch(pixel)
            } else {
                pixel
            }
        }
        RenderMode::Binary { threshold } => {
            if is_significant(pixel, threshold) {
                [OUTPUT_MAX; CHANNELS]
            } else {
                [0.0; CHANNELS]
            }
        }
    }
}

/// Scale the pixel so its largest channel becomes 255.
fn stretch(pixel: [f32; CHANNELS]) -> [f32; CHANNELS] {
    let max = pixel.iter().copied().fold(f32::MIN, f32::max);
    if max <= 0.0 {
        return pixel;
    }
    pixel.map(|v| v / max * OUTPUT_MAX)
}

/// Render the rescaled grid into an RGB image of the same dimensions.
pub fn render(rescaled: &ChannelGrid, mode: RenderMode) -> RgbImage {
    let mut image = RgbImage::new(rescaled.width() as u32, rescaled.height() as u32);

    image
        .par_chunks_exact_mut(CHANNELS)
        .zip(rescaled.as_slice().par_chunks_exact(CHANNELS))
        .for_each(|(out, cell)| {
            let rendered = render_pixel([cell[0], cell[1], cell[2]], mode);
            for (dst, v) in out.iter_mut().zip(rendered) {
                *dst = v as u8;
            }
        });

    image
}
