use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Build mode.
///
/// `build` defaults to production and `dev` to development.
#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Minified, no source maps
    #[value(name = "production")]
    Production,

    /// Readable output with inline source maps
    #[value(name = "development")]
    Development,
}

impl Mode {
    pub fn is_production(self) -> bool {
        matches!(self, Mode::Production)
    }
}
