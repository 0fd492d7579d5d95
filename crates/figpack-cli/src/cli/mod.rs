//! Command-line interface definition.
//!
//! - `figpack build` - bundle once and write the plugin to the output directory
//! - `figpack dev` - watch, rebuild and serve the UI with live reload

mod commands;
pub mod enums;
mod validation;

use clap::Parser;

pub use commands::{BuildArgs, Command, CommonArgs, DevArgs};
pub use enums::Mode;
pub use validation::parse_port;

/// figpack - build design-tool plugins
#[derive(Parser, Debug)]
#[command(
    name = "figpack",
    version,
    about = "Build and watch design-tool plugins",
    long_about = "figpack bundles a plugin's main script with esbuild, writes its manifest.json\n\
                  next to it and, in dev mode, keeps rebuilding on every change while serving\n\
                  the UI page with live reload."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}
