mod cli;
mod desktop;
mod paths;
mod run;

use anyhow::Result;

use crate::cli::Command;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Check) => run::check(cli.run),
        Some(Command::Config) => run::print_config(cli.run),
        None => run::run(cli.run),
    }
}
