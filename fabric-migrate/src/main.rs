use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod apply_cmd;
mod cli;
mod inputs;
mod parse_cmd;
mod path_guard;
mod plan_cmd;
mod profiles_cmd;
mod validate_cmd;

use cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = inputs::config(cli.config.as_deref())?;
    match cli.command {
        Command::Parse(args) => parse_cmd::run_parse(args, &config),
        Command::Validate(args) => validate_cmd::run_validate(args, &config),
        Command::Plan(args) => plan_cmd::run_plan(args, &config),
        Command::Apply(args) => apply_cmd::run_apply(args, &config),
        Command::Profiles(args) => profiles_cmd::run_profiles(args),
    }
}

/// Logs go to stderr so `--format json` output stays parseable.
fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
