//! Global normalization of the magnitude grid into `0.0..=255.0`.
//!
//! This is the barrier between the gradient pass and thresholding: the
//! maximum is a reduction over the whole grid, so it can only be taken after
//! every row task has finished. The two steps are separate calls so the
//! driver can report them as separate stages:
//!
//! ```text
//! let max = max_magnitude(&magnitude);
//! let rescaled = normalize(magnitude, max)?;
//! ```

use super::grid::ChannelGrid;
use rayon::prelude::*;
use thiserror::Error;

/// Upper bound of the rescaled range.
pub const OUTPUT_MAX: f32 = 255.0;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeError {
    /// The magnitude grid is empty or zero everywhere, so there is nothing
    /// to scale against.
    #[error("no edges detected")]
    NoEdges,
}

/// Largest value in the grid, or `0.0` for an empty grid.
pub fn max_magnitude(magnitude: &ChannelGrid) -> f32 {
    magnitude
        .as_slice()
        .par_iter()
        .copied()
        .reduce(|| 0.0, f32::max)
}

/// Rescale every cell to `value / max * 255`, consuming the grid.
///
/// `max` is the grid's [`max_magnitude`]. Fails with
/// [`NormalizeError::NoEdges`] instead of dividing by a non-positive maximum.
pub fn normalize(mut magnitude: ChannelGrid, max: f32) -> Result<ChannelGrid, NormalizeError> {
    if !(max > 0.0 && max.is_finite()) {
        return Err(NormalizeError::NoEdges);
    }

    magnitude
        .as_mut_slice()
        .par_iter_mut()
        .for_each(|v| *v = *v / max * OUTPUT_MAX);

    Ok(magnitude)
}
