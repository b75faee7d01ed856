//! CLI output formatting for batch runs.
//!
//! # Output Format
//!
//! ```text
//! Result directory: /home/me/Edge-detection/finished
//! Input: /photos/cat.png
//!     Exists: yes
//!     Size: 640 x 480
//!     Applying Sobel operator
//!     Completed 211 rows out of 480
//!     Completed 480 rows out of 480
//!     Finding maximum value
//!     Normalizing and rendering
//!     Writing image
//!     Done: /home/me/Edge-detection/finished/catedge.png
//!
//! Processed 1 image (0 without edges), 0 failed
//! ```
//!
//! # Architecture
//!
//! Each `format_*` function returns `Vec<String>` (or a `String`) for
//! testability; `main` does the printing. Format functions are pure: no I/O,
//! no side effects.

use crate::config::ConfigNotice;
use crate::process::{BatchResult, ProcessEvent, Stage};

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn stage_label(stage: Stage) -> &'static str {
    match stage {
        Stage::Gradients => "Applying Sobel operator",
        Stage::FindingMaximum => "Finding maximum value",
        Stage::Normalizing => "Normalizing and rendering",
        Stage::Writing => "Writing image",
    }
}

/// Format one progress event as output lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    let i = indent(1);
    match event {
        ProcessEvent::BatchStarted { output_dir } => {
            vec![format!("Result directory: {}", output_dir.display())]
        }
        ProcessEvent::ImageStarted { path, exists } => vec![
            format!("Input: {}", path.display()),
            format!("{i}Exists: {}", yes_no(*exists)),
        ],
        ProcessEvent::ImageDecoded { width, height } => {
            vec![format!("{i}Size: {width} x {height}")]
        }
        ProcessEvent::StageStarted(stage) => vec![format!("{i}{}", stage_label(*stage))],
        ProcessEvent::RowsCompleted { completed, total } => {
            vec![format!("{i}Completed {completed} rows out of {total}")]
        }
        ProcessEvent::NoEdges => vec![format!("{i}No edges detected, writing a blank image")],
        ProcessEvent::ImageFinished { output } => {
            vec![format!("{i}Done: {}", output.display()), String::new()]
        }
        ProcessEvent::ImageFailed { path, error } => vec![
            format!("{i}Failed: {}", path.display()),
            format!("{i}{error}"),
            String::new(),
        ],
    }
}

/// Format a configuration notice.
pub fn format_notice(notice: &ConfigNotice) -> String {
    format!("Note: {notice}")
}

/// One-line summary printed after the batch.
pub fn format_summary(result: &BatchResult) -> String {
    let processed = result.succeeded();
    let noun = if processed == 1 { "image" } else { "images" };
    format!(
        "Processed {} {} ({} without edges), {} failed",
        processed,
        noun,
        result.without_edges(),
        result.failed()
    )
}
