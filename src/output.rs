//! CLI output formatting.
//!
//! Each command has a `format_*` function (returns lines) for testability
//! and the binary prints them. Format functions are pure: no I/O, no side
//! effects.
//!
//! ## Batch
//!
//! ```text
//! 001-dawn.png → out/001-dawn.jpg (12 ms)
//! travel/rome.gif
//!     Error: Conversion failed: decode failed: ...
//!
//! Converted 1 of 2 files, 1 failed
//! ```

use crate::batch::{BatchEvent, BatchReport};
use crate::imaging::{Dimensions, Format};
use std::path::Path;
use std::time::Duration;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn format_elapsed(elapsed: Duration) -> String {
    format!("{} ms", elapsed.as_millis())
}

/// Lines for a single batch progress event.
pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Converted {
            relative,
            output,
            elapsed,
        } => vec![format!(
            "{} → {} ({})",
            relative.display(),
            output.display(),
            format_elapsed(*elapsed)
        )],
        BatchEvent::Failed { relative, error } => vec![
            relative.display().to_string(),
            format!("{}Error: {}", indent(1), error),
        ],
    }
}

/// Closing summary line for a batch.
pub fn format_batch_summary(report: &BatchReport) -> String {
    let total = report.total();
    let noun = if total == 1 { "file" } else { "files" };
    if report.failed.is_empty() {
        format!("Converted {} {}", report.converted.len(), noun)
    } else {
        format!(
            "Converted {} of {} {}, {} failed",
            report.converted.len(),
            total,
            noun,
            report.failed.len()
        )
    }
}

/// One-line description of a single conversion, for `convert` output.
pub fn format_conversion(
    input: &Path,
    from: Format,
    output: &Path,
    to: Format,
    size: Dimensions,
) -> String {
    let size = match (size.width, size.height) {
        (0, 0) => "original size".to_string(),
        (w, 0) => format!("width {w}"),
        (0, h) => format!("height {h}"),
        (w, h) => format!("{w}x{h}"),
    };
    format!(
        "{} ({}) → {} ({}), {}",
        input.display(),
        from,
        output.display(),
        to,
        size
    )
}
