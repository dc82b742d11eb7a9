//! CLI output formatting.
//!
//! Each display has a `format_*` function (returns `Vec<String>` or `String`)
//! for testability and, where the CLI needs it, a `print_*` wrapper that
//! writes to stdout. Format functions are pure.
//!
//! ```text
//! holiday.png (image/png → image/webp, compression 0.5)
//!      0% Loading image
//!     25% Compressing image
//!    100% Done
//! Saved out/holiday.webp (182.4 KB → 41.0 KB, -78%)
//! ```

use crate::media_type::{ACCEPT_LIST, MediaType};
use crate::progress::ProgressEvent;
use std::path::Path;

/// Header line announcing a conversion.
pub fn format_conversion_header(name: &str, from: &str, to: &str, compression: f32) -> String {
    format!("{name} ({from} → {to}, compression {compression})")
}

pub fn format_progress_event(event: &ProgressEvent) -> String {
    format!("    {:>3.0}% {}", event.percent, event.message)
}

/// Human-readable byte count.
pub fn format_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{bytes} B")
    }
}

pub fn format_saved(path: &Path, input_len: usize, output_len: usize) -> String {
    let change = if input_len == 0 {
        String::new()
    } else {
        let pct = (output_len as f64 / input_len as f64 - 1.0) * 100.0;
        format!(", {pct:+.0}%")
    };
    format!(
        "Saved {} ({} → {}{})",
        path.display(),
        format_size(input_len),
        format_size(output_len),
        change
    )
}

pub fn format_failure(message: &str) -> String {
    format!("Conversion failed: {message}")
}

/// The canonical type table and the picker accept list.
pub fn format_type_table() -> Vec<String> {
    let mut lines = vec!["Supported types".to_string()];
    for media_type in MediaType::all() {
        lines.push(format!(
            "    {:<14} {}",
            media_type.mime(),
            media_type.extensions().join(", ")
        ));
    }
    lines.push(format!("Accept: {ACCEPT_LIST}"));
    lines
}

pub fn print_type_table() {
    for line in format_type_table() {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_names_both_types() {
        assert_eq!(
            format_conversion_header("a.png", "image/png", "image/webp", 0.5),
            "a.png (image/png → image/webp, compression 0.5)"
        );
    }

    #[test]
    fn progress_is_right_aligned() {
        let event = ProgressEvent {
            percent: 25.0,
            message: "Compressing image".to_string(),
        };
        assert_eq!(format_progress_event(&event), "     25% Compressing image");
    }

    #[test]
    fn sizes_pick_a_unit() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn saved_line_reports_change() {
        let line = format_saved(Path::new("out/a.webp"), 2048, 512);
        assert_eq!(line, "Saved out/a.webp (2.0 KB → 512 B, -75%)");
    }

    #[test]
    fn saved_line_without_input_size() {
        let line = format_saved(Path::new("a.webp"), 0, 10);
        assert_eq!(line, "Saved a.webp (0 B → 10 B)");
    }

    #[test]
    fn type_table_lists_every_entry() {
        let lines = format_type_table();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[2], "    image/jpeg     jpeg, jpg");
        assert_eq!(lines.last().unwrap(), "Accept: image/*");
    }
}
