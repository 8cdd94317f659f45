use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "popcycle",
    author,
    version,
    about = "Timed desktop popups and wallpaper rotation"
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Configuration file; defaults to `popcycle.toml` in the config directory.
    #[arg(long, value_name = "FILE", env = "POPCYCLE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Directory that relative `images`/`wallpaper` folders resolve against.
    #[arg(long, value_name = "DIR", global = true)]
    pub base_dir: Option<PathBuf>,

    /// Seed for the random pickers (defaults to the current time).
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Leave the desktop wallpaper alone regardless of configuration.
    #[arg(long)]
    pub no_wallpaper: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate configuration and report resolved folders without opening windows.
    Check,
    /// Print the effective configuration as TOML.
    Config,
}

pub fn parse() -> Cli {
    Cli::parse()
}
