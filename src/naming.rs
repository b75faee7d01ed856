//! Output filename convention.
//!
//! An edge map is written next to its siblings in the output directory as
//! the source name with `edge` inserted before the last extension:
//!
//! - `photo.jpg` → `photoedge.jpg`
//! - `scan.v2.png` → `scan.v2edge.png`
//! - `.png` → `edge.png`
//!
//! Names without any `.` have no container format to reuse and are rejected.

use std::path::{Path, PathBuf};

/// Suffix inserted before the extension.
pub const EDGE_SUFFIX: &str = "edge";

/// Split a file name at its last `.` into `(base, extension)`.
///
/// Unlike [`Path::file_stem`], a leading dot counts as the separator, so
/// `.png` splits into `("", "png")`.
pub fn split_extension(file_name: &str) -> Option<(&str, &str)> {
    file_name.rsplit_once('.')
}

/// Output file name for a source file name, or `None` without an extension.
pub fn edge_file_name(file_name: &str) -> Option<String> {
    let (base, ext) = split_extension(file_name)?;
    Some(format!("{base}{EDGE_SUFFIX}.{ext}"))
}

/// Full output path for `source` inside `output_dir`.
pub fn edge_output_path(source: &Path, output_dir: &Path) -> Option<PathBuf> {
    let name = source.file_name()?.to_str()?;
    edge_file_name(name).map(|n| output_dir.join(n))
}
