//! Image decode/encode, pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` with content sniffing, converted to RGB8 |
//! | **Encode** | `ImageBuffer::write_to`, format from the output extension |
//!
//! The module is split into:
//! - **Backend**: [`ImageBackend`] trait, the seam tests replace with a mock
//! - **Rust backend**: [`RustBackend`] on top of the `image` crate

pub mod backend;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use rust_backend::{RustBackend, format_for_path};
