//! Sizes, durations and the end-of-build summary.

use owo_colors::OwoColorize;
use std::time::Duration;

use super::colors_enabled;

/// One written file in the build summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryEntry {
    pub file_name: String,
    pub bytes: u64,
}

/// Human-readable byte size.
///
/// ```
/// use figpack_cli::ui::format_size;
///
/// assert_eq!(format_size(512), "512 B");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    match unit {
        0 => format!("{bytes} B"),
        _ => format!("{size:.2} {}", UNITS[unit]),
    }
}

/// Human-readable elapsed time: `ms` below a second, seconds below a minute.
///
/// ```
/// use figpack_cli::ui::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_millis(42)), "42ms");
/// assert_eq!(format_duration(Duration::from_millis(2500)), "2.50s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1_000 {
        format!("{millis}ms")
    } else if millis < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

fn summary_lines(out_dir: &str, entries: &[SummaryEntry], elapsed: Duration) -> Vec<String> {
    let width = entries
        .iter()
        .map(|e| e.file_name.len())
        .max()
        .unwrap_or(0);

    let mut lines = Vec::with_capacity(entries.len() + 1);
    for entry in entries {
        lines.push(format!(
            "  {out_dir}/{:<width$}  {}",
            entry.file_name,
            format_size(entry.bytes)
        ));
    }
    let total: u64 = entries.iter().map(|e| e.bytes).sum();
    lines.push(format!(
        "  {} files, {} in {}",
        entries.len(),
        format_size(total),
        format_duration(elapsed)
    ));
    lines
}

/// Print the written files with their sizes and the total.
pub fn print_build_summary(out_dir: &str, entries: &[SummaryEntry], elapsed: Duration) {
    let lines = summary_lines(out_dir, entries, elapsed);
    let Some((total, files)) = lines.split_last() else {
        return;
    };

    eprintln!();
    for file in files {
        if colors_enabled() {
            eprintln!("{}", file.dimmed());
        } else {
            eprintln!("{file}");
        }
    }
    if colors_enabled() {
        eprintln!("{}", total.green());
    } else {
        eprintln!("{total}");
    }
}
