//! Spinner for the one-shot bundle step.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use super::{colors_enabled, messages};

/// Spinner shown while the engine runs.
///
/// Hidden when stderr is not a terminal; the finish message is then
/// printed as a plain status line instead.
pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let pb = if console::user_attended_stderr() {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        let template = if colors_enabled() {
            "{spinner:.cyan} {msg}"
        } else {
            "{spinner} {msg}"
        };
        if let Ok(style) = ProgressStyle::default_spinner().template(template) {
            pb.set_style(style.tick_strings(&["◐", "◓", "◑", "◒", "●"]));
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Self { pb }
    }

    pub fn finish(&self, message: &str) {
        self.pb.finish_and_clear();
        messages::success(message);
    }

    pub fn fail(&self, message: &str) {
        self.pb.finish_and_clear();
        messages::error(message);
    }
}
