//! Terminal output: status lines, a spinner and the build summary.
//!
//! Everything here writes to stderr so `main.js` piped to stdout by other
//! tools is never interleaved with progress output.
//!
//! ```no_run
//! use figpack_cli::ui;
//!
//! ui::init_colors(false);
//! let spinner = ui::Spinner::new("Bundling src/main.ts");
//! spinner.finish("Bundled");
//! ui::success("Wrote dist/manifest.json");
//! ```

mod format;
mod messages;
mod spinner;

pub use format::{format_duration, format_size, print_build_summary, SummaryEntry};
pub use messages::{info, success, warning};
pub use spinner::Spinner;

use std::sync::atomic::{AtomicBool, Ordering};

static COLORS: AtomicBool = AtomicBool::new(true);

/// Whether colors should be used, from `NO_COLOR`, `FORCE_COLOR` and the terminal.
///
/// `NO_COLOR` wins over `FORCE_COLOR`.
pub fn should_use_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    console::user_attended_stderr()
}

/// Decide once whether status output is colored.
///
/// `--no-color` always disables colors; otherwise the environment decides.
pub fn init_colors(no_color: bool) {
    let enabled = !no_color && should_use_color();
    COLORS.store(enabled, Ordering::Relaxed);
    console::set_colors_enabled_stderr(enabled);
}

/// Current color setting.
pub fn colors_enabled() -> bool {
    COLORS.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_no_color_env_disables() {
        unsafe { std::env::set_var("NO_COLOR", "1"); }
        unsafe { std::env::set_var("FORCE_COLOR", "1"); }
        assert!(!should_use_color());
        unsafe { std::env::remove_var("NO_COLOR"); }
        unsafe { std::env::remove_var("FORCE_COLOR"); }
    }

    #[test]
    #[serial]
    fn test_force_color_env_enables() {
        unsafe { std::env::remove_var("NO_COLOR"); }
        unsafe { std::env::set_var("FORCE_COLOR", "1"); }
        assert!(should_use_color());
        unsafe { std::env::remove_var("FORCE_COLOR"); }
    }

    #[test]
    #[serial]
    fn test_flag_overrides_environment() {
        unsafe { std::env::set_var("FORCE_COLOR", "1"); }
        init_colors(true);
        assert!(!colors_enabled());
        init_colors(false);
        assert!(colors_enabled());
        unsafe { std::env::remove_var("FORCE_COLOR"); }
    }
}
