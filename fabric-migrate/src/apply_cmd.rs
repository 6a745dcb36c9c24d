use std::path::Path;

use anyhow::{bail, Context, Result};
use fabric_migrate::engine::{reconcile, ReconcileReport};
use fabric_migrate::report::{render_outcomes, render_validation};
use fabric_migrate::settings::MigrationConfig;
use fabric_migrate::validate::{validate, ValidationReport};
use serde::Serialize;
use tracing::warn;

use crate::cli::{ApplyArgs, OutputFormat};
use crate::inputs;
use crate::path_guard;

#[derive(Serialize)]
struct ApplyReport<'a> {
    validation: &'a ValidationReport,
    reconcile: Option<&'a ReconcileReport>,
}

pub fn run_apply(args: ApplyArgs, config: &MigrationConfig) -> Result<()> {
    let mut sources = vec![args.table.as_path(), args.fabric.as_path()];
    sources.extend(args.configs.iter().map(|p| p.as_path()));
    let outputs: Vec<&Path> = [&args.journal, &args.write_fabric]
        .into_iter()
        .flatten()
        .map(|p| p.as_path())
        .collect();
    path_guard::ensure_outputs_distinct(&outputs, &sources)?;

    let rows = inputs::table_rows(&args.table)?;
    let (mut fabric, mut snapshot) = inputs::fabric(&args.fabric)?;
    let inventory = inputs::inventory(&args.configs, config)?;

    let checked = validate(&rows, inventory.as_ref(), &snapshot, &fabric, config);
    if !checked.is_clean() {
        print_report(args.format, &checked, None)?;
        bail!(
            "apply refused: {} validation errors, nothing was created",
            checked.errors.len()
        );
    }

    let report = reconcile(&checked.rows, &mut snapshot, &mut fabric, config);

    if let Some(path) = &args.journal {
        fabric
            .save_journal(path)
            .with_context(|| "failed to write create journal")?;
    }
    if let Some(path) = &args.write_fabric {
        fabric
            .save_state(path)
            .with_context(|| "failed to write fabric state")?;
    }

    print_report(args.format, &checked, Some(&report))?;

    if report.has_failures() {
        warn!(failed = report.failed(), "some objects were not created");
        bail!("apply finished with {} failed objects", report.failed());
    }
    Ok(())
}

fn print_report(
    format: OutputFormat,
    validation: &ValidationReport,
    reconcile: Option<&ReconcileReport>,
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("{}", render_validation(validation));
            if let Some(report) = reconcile {
                println!();
                println!("{}", render_outcomes(report));
            }
        }
        OutputFormat::Json => {
            let report = ApplyReport {
                validation,
                reconcile,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
