use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fabric_migrate::offline::OfflineFabric;
use fabric_migrate::settings::{default_config, load_config, MigrationConfig};
use fabric_migrate::snapshot::FabricSnapshot;
use fabric_migrate::table::{DesiredStateTable, TableRow};
use switch_config_core::{parse_file, DeviceInventory, FabricInventory};
use tracing::info;

pub fn config(path: Option<&Path>) -> Result<MigrationConfig> {
    match path {
        Some(path) => load_config(path).context("failed to load settings"),
        None => Ok(default_config()),
    }
}

pub fn table_rows(path: &Path) -> Result<Vec<TableRow>> {
    let rows = DesiredStateTable::load(path)?
        .bound_rows()
        .with_context(|| format!("invalid desired-state table {}", path.display()))?;
    info!(table = %path.display(), rows = rows.len(), "loaded desired-state table");
    Ok(rows)
}

/// Offline fabric plus the snapshot read from it.
pub fn fabric(path: &Path) -> Result<(OfflineFabric, FabricSnapshot)> {
    let fabric = OfflineFabric::load(path)?;
    let snapshot = FabricSnapshot::load(&fabric)
        .with_context(|| format!("failed to read fabric state {}", path.display()))?;
    Ok((fabric, snapshot))
}

pub fn device_inventories(
    paths: &[PathBuf],
    config: &MigrationConfig,
) -> Result<Vec<DeviceInventory>> {
    let opts = config.parser.parse_options();
    paths
        .iter()
        .map(|path| {
            parse_file(path, &opts).with_context(|| format!("failed to parse {}", path.display()))
        })
        .collect()
}

/// Inventories for the cross-check, `None` when no configs were given.
pub fn inventory(paths: &[PathBuf], config: &MigrationConfig) -> Result<Option<FabricInventory>> {
    if paths.is_empty() {
        return Ok(None);
    }
    Ok(Some(device_inventories(paths, config)?.into_iter().collect()))
}
