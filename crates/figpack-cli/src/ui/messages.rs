//! One-line status messages on stderr.

use owo_colors::OwoColorize;

use super::colors_enabled;

fn line(symbol: &str, message: &str, style: fn(&str) -> String) -> String {
    if colors_enabled() {
        format!("{} {}", style(symbol), message)
    } else {
        format!("{symbol} {message}")
    }
}

pub fn success(message: &str) {
    eprintln!("{}", line("✓", message, |s| s.green().bold().to_string()));
}

pub fn info(message: &str) {
    eprintln!("{}", line("ℹ", message, |s| s.blue().bold().to_string()));
}

/// Print a warning, used for skipped rebuilds.
pub fn warning(message: &str) {
    eprintln!("{}", line("⚠", message, |s| s.yellow().bold().to_string()));
}

pub fn error(message: &str) {
    eprintln!("{}", line("✗", message, |s| s.red().bold().to_string()));
}
