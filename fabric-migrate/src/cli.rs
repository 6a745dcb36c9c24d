use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "fabric-migrate")]
#[command(about = "Migrate legacy switch VLANs and SVIs into fabric tenants")]
pub struct Cli {
    /// Settings file; the embedded defaults apply when omitted.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Parse legacy running-configs into VLAN and interface inventories.
    Parse(ParseArgs),
    /// Check a desired-state table against the fabric without writing.
    Validate(ValidateArgs),
    /// List network and application objects a table would touch.
    Plan(PlanArgs),
    /// Validate, then create every missing object.
    Apply(ApplyArgs),
    /// Create missing per-leaf and per-pair access profiles.
    Profiles(ProfilesArgs),
}

#[derive(Parser, Debug)]
pub struct ParseArgs {
    #[arg(required = true)]
    pub configs: Vec<PathBuf>,
    /// Print per-VRF interface counts only.
    #[arg(long)]
    pub summary: bool,
    /// Write a desired-state table seeded from the parsed inventories.
    #[arg(long)]
    pub seed_table: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    #[arg(long)]
    pub table: PathBuf,
    #[arg(long)]
    pub fabric: PathBuf,
    /// Legacy configs to cross-check rows against.
    #[arg(long, num_args = 1..)]
    pub configs: Vec<PathBuf>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct PlanArgs {
    #[arg(long)]
    pub table: PathBuf,
    #[arg(long)]
    pub fabric: PathBuf,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct ApplyArgs {
    #[arg(long)]
    pub table: PathBuf,
    #[arg(long)]
    pub fabric: PathBuf,
    #[arg(long, num_args = 1..)]
    pub configs: Vec<PathBuf>,
    /// Write every create request that was sent.
    #[arg(long)]
    pub journal: Option<PathBuf>,
    /// Write the fabric state after reconciliation.
    #[arg(long)]
    pub write_fabric: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct ProfilesArgs {
    #[arg(long)]
    pub fabric: PathBuf,
    #[arg(long)]
    pub write_fabric: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
