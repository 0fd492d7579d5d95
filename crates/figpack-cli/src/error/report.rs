//! Miette report conversion for CLI errors.

use crate::error::CliError;
use miette::Report;

/// Convert a [`CliError`] into a report for the terminal.
///
/// Orchestrator errors already carry codes and help text, so they are
/// wrapped directly; everything else is rendered from its message.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Host(e) => Report::new(e),
        CliError::Fatal(e) => Report::new(e),
        CliError::Config(e) => miette::miette!("Configuration error: {}", e),
        other => miette::miette!("{}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_host_errors_keep_diagnostic_code() {
        let err = CliError::Host(figpack::HostError::Config(
            figpack::ConfigError::MissingServerAddress,
        ));
        let report = cli_error_to_miette(err);
        let code = report.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("figpack::config::missing_server"));
    }

    #[test]
    fn test_plain_errors_use_message() {
        let report = cli_error_to_miette(CliError::FileNotFound(PathBuf::from("index.html")));
        assert!(report.to_string().contains("index.html"));
    }
}
