use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use fabric_migrate::settings::MigrationConfig;
use fabric_migrate::table::seed_from_inventory;
use switch_config_core::{
    format_inventory_json, format_inventory_text, format_summary_text, FabricInventory,
};

use crate::cli::{OutputFormat, ParseArgs};
use crate::inputs;
use crate::path_guard;

pub fn run_parse(args: ParseArgs, config: &MigrationConfig) -> Result<()> {
    let inventories = inputs::device_inventories(&args.configs, config)?;

    if let Some(out_path) = &args.seed_table {
        let sources: Vec<&Path> = args.configs.iter().map(|p| p.as_path()).collect();
        path_guard::ensure_outputs_distinct(&[out_path.as_path()], &sources)?;
        let fabric: FabricInventory = inventories.iter().cloned().collect();
        let table = seed_from_inventory(&fabric);
        fs::write(out_path, serde_json::to_string_pretty(&table)?)
            .with_context(|| format!("failed to write seed table {}", out_path.display()))?;
    }

    match args.format {
        OutputFormat::Text if args.summary => {
            for inventory in &inventories {
                println!("{}", format_summary_text(&inventory.summary()));
            }
        }
        OutputFormat::Text => {
            for inventory in &inventories {
                println!("{}", format_inventory_text(inventory));
            }
        }
        OutputFormat::Json if args.summary => {
            let summary: Vec<_> = inventories.iter().flat_map(|inv| inv.summary()).collect();
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Json => println!("{}", format_inventory_json(&inventories)),
    }
    Ok(())
}
