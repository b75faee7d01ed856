//! # edgemap
//!
//! Batch Sobel edge maps. Each input image is decoded, run through a
//! per-channel Sobel operator, normalized into `0..=255`, optionally
//! thresholded, and written as `<name>edge.<ext>` in the output directory.
//!
//! # Architecture: Three-Stage Pipeline
//!
//! ```text
//! 1. Gradient   pixels     →  gx, gy, gx²+gy²   (one rayon task per row)
//! 2. Normalize  magnitude  →  0..=255           (global max, then rescale)
//! 3. Threshold  rescaled   →  RGB8              (intensity, stretch, binary)
//! ```
//!
//! Each stage takes ownership of the previous stage's output and nothing is
//! shared between images: every image gets its own worker pool, row counter
//! and buffers.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`edges`] | The three stages, the grid type and the kernel pair |
//! | [`process`] | Batch driver: per-image pool lifecycle, failure isolation, progress events |
//! | [`config`] | Layered TOML config, validation, binary-mode downgrade |
//! | [`imaging`] | Decode/encode behind the [`imaging::ImageBackend`] trait |
//! | [`naming`] | `<name>edge.<ext>` output file names |
//! | [`output`] | Human-readable formatting of progress events |
//!
//! # Design Decisions
//!
//! ## Squared Magnitude
//!
//! The magnitude is `gx² + gy²` without a square root. Thresholds and
//! existing outputs are calibrated against this contrast curve, so it is
//! kept as is.
//!
//! ## No Edges Is Not An Error
//!
//! A uniform image has a maximum magnitude of zero and cannot be normalized.
//! The normalizer reports [`edges::NormalizeError::NoEdges`] instead of
//! dividing, and the driver writes an all-black image of the same size.

pub mod config;
pub mod edges;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod process;
