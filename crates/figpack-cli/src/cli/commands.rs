use clap::{Args, Subcommand};
use std::path::PathBuf;

use super::enums::Mode;
use super::validation::parse_port;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Bundle the plugin once for distribution
    ///
    /// Writes main.js, manifest.json and the UI page into the output
    /// directory. Exits non-zero when the bundle fails.
    Build(BuildArgs),

    /// Start a watch session with a live-reload server
    ///
    /// Rebuilds main.js on every source change and writes a preview
    /// index.html that reloads itself after each successful build.
    Dev(DevArgs),
}

/// Options shared by every command.
#[derive(Args, Debug, Default)]
pub struct CommonArgs {
    /// Path to the config file (defaults to ./figpack.config.json)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Project root containing the entry and index.html
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Output directory, relative to the project root
    #[arg(short = 'd', long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Build mode; production minifies and drops source maps
    #[arg(short, long, value_enum)]
    pub mode: Option<Mode>,

    /// esbuild executable to run instead of the detected one
    #[arg(long, value_name = "PATH")]
    pub esbuild: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Args, Debug)]
pub struct DevArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Host the dev server binds to and the preview page points at
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Port for the dev server
    #[arg(short, long, value_name = "PORT", value_parser = parse_port)]
    pub port: Option<u16>,
}
