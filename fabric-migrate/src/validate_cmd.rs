use anyhow::{bail, Result};
use fabric_migrate::report::render_validation;
use fabric_migrate::settings::MigrationConfig;
use fabric_migrate::validate::validate;

use crate::cli::{OutputFormat, ValidateArgs};
use crate::inputs;

pub fn run_validate(args: ValidateArgs, config: &MigrationConfig) -> Result<()> {
    let rows = inputs::table_rows(&args.table)?;
    let (fabric, snapshot) = inputs::fabric(&args.fabric)?;
    let inventory = inputs::inventory(&args.configs, config)?;

    let report = validate(&rows, inventory.as_ref(), &snapshot, &fabric, config);

    match args.format {
        OutputFormat::Text => println!("{}", render_validation(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if !report.is_clean() {
        bail!("validation failed: {} errors", report.errors.len());
    }
    Ok(())
}
