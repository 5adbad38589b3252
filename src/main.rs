use std::process::ExitCode;

use clap::Parser;
use pathmock::cli::{run_cli, Cli};
use pathmock::logging::{init_logging, LogConfig};

fn main() -> anyhow::Result<ExitCode> {
    init_logging(&LogConfig::from_env())?;
    run_cli(Cli::parse())
}
