use anyhow::{bail, Result};
use fabric_migrate::plan::build_plan;
use fabric_migrate::report::{render_plan, render_validation};
use fabric_migrate::settings::MigrationConfig;
use fabric_migrate::validate::validate;

use crate::cli::{OutputFormat, PlanArgs};
use crate::inputs;

pub fn run_plan(args: PlanArgs, config: &MigrationConfig) -> Result<()> {
    let rows = inputs::table_rows(&args.table)?;
    let (fabric, snapshot) = inputs::fabric(&args.fabric)?;

    let checked = validate(&rows, None, &snapshot, &fabric, config);
    if !checked.is_clean() {
        eprintln!("{}", render_validation(&checked));
        bail!("plan refused: {} validation errors", checked.errors.len());
    }

    let plan = build_plan(&checked.rows, &snapshot);
    match args.format {
        OutputFormat::Text => println!("{}", render_plan(&plan)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
    }
    Ok(())
}
