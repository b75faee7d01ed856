//! Gradient engine: per-channel Sobel responses, one parallel task per row.
//!
//! For every interior pixel the 3×3 neighbourhood is convolved with
//! [`SOBEL_X`] and [`SOBEL_Y`] (true convolution, i.e. the kernel is applied
//! mirrored), and the magnitude is stored as `gx² + gy²`. The square root is
//! deliberately omitted; downstream thresholds are calibrated against the
//! squared response.
//!
//! Responses are accumulated in `i32` over the raw 8-bit samples and only
//! then scaled into colour units (`1/255`). A flat neighbourhood therefore
//! yields exactly zero, which the normalizer relies on to recognise an image
//! without edges.
//!
//! Border rows and columns are never written and stay at zero.
//!
//! Each row task owns disjoint `&mut` row slices of the three output grids and
//! reads only the shared source image, so the pass needs no locking. Tasks run
//! on whichever rayon pool the caller is installed in.

use super::grid::{CHANNELS, ChannelGrid};
use super::kernel::{Kernel3, SOBEL_X, SOBEL_Y};
use super::progress::RowProgress;
use image::RgbImage;
use rayon::prelude::*;

/// Largest 8-bit sample; divides integer responses into colour units.
const SAMPLE_MAX: f32 = 255.0;

/// Output of the gradient pass. All three grids share the source dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradients {
    pub gx: ChannelGrid,
    pub gy: ChannelGrid,
    pub magnitude: ChannelGrid,
}

impl Gradients {
    fn zeroed(width: usize, height: usize) -> Self {
        Self {
            gx: ChannelGrid::new(width, height),
            gy: ChannelGrid::new(width, height),
            magnitude: ChannelGrid::new(width, height),
        }
    }
}

/// Run the gradient pass over `source`.
///
/// Returns once every row task has finished, so all writes are visible to the
/// caller. `progress` is bumped once per interior row.
pub fn compute_gradients(source: &RgbImage, progress: &RowProgress) -> Gradients {
    let (width, height) = (source.width() as usize, source.height() as usize);
    let mut out = Gradients::zeroed(width, height);
    if width == 0 || height < 3 {
        return out;
    }

    let row_len = width * CHANNELS;
    let interior = row_len..(height - 1) * row_len;

    out.gx.as_mut_slice()[interior.clone()]
        .par_chunks_mut(row_len)
        .zip(out.gy.as_mut_slice()[interior.clone()].par_chunks_mut(row_len))
        .zip(out.magnitude.as_mut_slice()[interior].par_chunks_mut(row_len))
        .enumerate()
        .for_each(|(i, ((gx_row, gy_row), mag_row))| {
            sweep_row(source, i + 1, gx_row, gy_row, mag_row);
            progress.complete_row();
        });

    out
}

/// Convolve one interior row `y`, writing into that row's slices.
fn sweep_row(
    source: &RgbImage,
    y: usize,
    gx_row: &mut [f32],
    gy_row: &mut [f32],
    mag_row: &mut [f32],
) {
    let width = source.width() as usize;
    for x in 1..width.saturating_sub(1) {
        let (gx, gy) = convolve_at(source, x, y, &SOBEL_X, &SOBEL_Y);
        let base = x * CHANNELS;
        for c in 0..CHANNELS {
            let gx_c = gx[c] as f32 / SAMPLE_MAX;
            let gy_c = gy[c] as f32 / SAMPLE_MAX;
            gx_row[base + c] = gx_c;
            gy_row[base + c] = gy_c;
            mag_row[base + c] = gx_c * gx_c + gy_c * gy_c;
        }
    }
}

/// Both integer kernel responses at `(x, y)`. The caller guarantees `(x, y)`
/// is interior.
#[inline]
fn convolve_at(
    source: &RgbImage,
    x: usize,
    y: usize,
    kernel_x: &Kernel3,
    kernel_y: &Kernel3,
) -> ([i32; CHANNELS], [i32; CHANNELS]) {
    let mut gx = [0i32; CHANNELS];
    let mut gy = [0i32; CHANNELS];
    let samples = source.as_raw();
    let row_len = source.width() as usize * CHANNELS;

    // Kernel cell (ky, kx) weights the sample at (x + 1 - kx, y + 1 - ky).
    for ky in 0..3 {
        let sy = y + 1 - ky;
        for kx in 0..3 {
            let sx = x + 1 - kx;
            let base = sy * row_len + sx * CHANNELS;
            let Some(sample) = samples.get(base..base + CHANNELS) else {
                continue;
            };
            let (wx, wy) = (kernel_x[ky][kx], kernel_y[ky][kx]);
            for c in 0..CHANNELS {
                gx[c] += wx * i32::from(sample[c]);
                gy[c] += wy * i32::from(sample[c]);
            }
        }
    }

    (gx, gy)
}
