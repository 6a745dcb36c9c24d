//! Desired-state table as exported from the migration sheet.
//!
//! The file is `{"columns": [...], "rows": [[...], ...]}`: the header row and
//! the value rows. Columns are addressed by name through a [`ColumnBinding`]
//! resolved once at load time, so reordered or extra columns are harmless.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use switch_config_core::{FabricInventory, L2_ONLY_DESCRIPTION};
use thiserror::Error;

pub const COL_DEVICE: &str = "apparato";
pub const COL_TENANT: &str = "tenant";
pub const COL_VRF: &str = "vrf";
pub const COL_VLAN_NUMBER: &str = "vlan_number";
pub const COL_L2_VLAN_NAME: &str = "l2_vlan_name";
pub const COL_APP_PROFILE: &str = "app_profile";
pub const COL_EPG: &str = "epg";
pub const COL_IP_ADDR: &str = "ip_addr";
pub const COL_ROUTE_TYPE: &str = "route_type";
pub const COL_DESCR: &str = "descr";
pub const COL_INTERFACES: &str = "interfaces";

const KNOWN_COLUMNS: [&str; 11] = [
    COL_DEVICE,
    COL_TENANT,
    COL_VRF,
    COL_VLAN_NUMBER,
    COL_L2_VLAN_NAME,
    COL_APP_PROFILE,
    COL_EPG,
    COL_IP_ADDR,
    COL_ROUTE_TYPE,
    COL_DESCR,
    COL_INTERFACES,
];

#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to read table {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to decode table {path}: {source}")]
    Decode {
        path: String,
        source: serde_json::Error,
    },
    #[error("required column `{0}` is missing")]
    MissingColumn(&'static str),
    #[error("column `{0}` appears more than once")]
    DuplicateColumn(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesiredStateTable {
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
}

impl DesiredStateTable {
    pub fn load(path: &Path) -> Result<Self, TableError> {
        let raw = fs::read_to_string(path).map_err(|source| TableError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw, &path.display().to_string())
    }

    pub fn from_json(raw: &str, origin: &str) -> Result<Self, TableError> {
        serde_json::from_str(raw).map_err(|source| TableError::Decode {
            path: origin.to_string(),
            source,
        })
    }

    /// Bind the header and read every value row by column name.
    pub fn bound_rows(&self) -> Result<Vec<TableRow>, TableError> {
        let binding = ColumnBinding::bind(&self.columns)?;
        Ok(self
            .rows
            .iter()
            .enumerate()
            .map(|(idx, cells)| binding.read(idx + 2, cells))
            .collect())
    }
}

/// Column positions resolved from the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnBinding {
    tenant: usize,
    vrf: usize,
    vlan_number: usize,
    l2_vlan_name: usize,
    device: Option<usize>,
    app_profile: Option<usize>,
    epg: Option<usize>,
    ip_addr: Option<usize>,
    route_type: Option<usize>,
    descr: Option<usize>,
    interfaces: Option<usize>,
}

impl ColumnBinding {
    /// Resolve known columns by name, case-insensitively. Unknown headers are
    /// ignored; a known header given twice is an error.
    pub fn bind(headers: &[String]) -> Result<Self, TableError> {
        let mut seen: Vec<String> = Vec::new();
        for header in headers {
            let name = normalize(header);
            if KNOWN_COLUMNS.contains(&name.as_str()) {
                if seen.contains(&name) {
                    return Err(TableError::DuplicateColumn(name));
                }
                seen.push(name);
            }
        }

        let find = |column: &str| headers.iter().position(|h| normalize(h) == column);
        let required =
            |column: &'static str| find(column).ok_or(TableError::MissingColumn(column));

        Ok(Self {
            tenant: required(COL_TENANT)?,
            vrf: required(COL_VRF)?,
            vlan_number: required(COL_VLAN_NUMBER)?,
            l2_vlan_name: required(COL_L2_VLAN_NAME)?,
            device: find(COL_DEVICE),
            app_profile: find(COL_APP_PROFILE),
            epg: find(COL_EPG),
            ip_addr: find(COL_IP_ADDR),
            route_type: find(COL_ROUTE_TYPE),
            descr: find(COL_DESCR),
            interfaces: find(COL_INTERFACES),
        })
    }

    pub fn read(&self, row: usize, cells: &[Value]) -> TableRow {
        let at = |idx: usize| cells.get(idx).and_then(cell_text);
        let optional = |idx: Option<usize>| idx.and_then(at);
        TableRow {
            row,
            device: optional(self.device),
            tenant: at(self.tenant),
            vrf: at(self.vrf),
            vlan_number: at(self.vlan_number),
            l2_vlan_name: at(self.l2_vlan_name),
            app_profile: optional(self.app_profile),
            epg: optional(self.epg),
            ip_addr: optional(self.ip_addr),
            route_type: optional(self.route_type),
            descr: optional(self.descr),
            interfaces: optional(self.interfaces),
        }
    }
}

/// One value row with cells looked up by name. Empty cells read as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRow {
    pub row: usize,
    pub device: Option<String>,
    pub tenant: Option<String>,
    pub vrf: Option<String>,
    pub vlan_number: Option<String>,
    pub l2_vlan_name: Option<String>,
    pub app_profile: Option<String>,
    pub epg: Option<String>,
    pub ip_addr: Option<String>,
    pub route_type: Option<String>,
    pub descr: Option<String>,
    /// One binding per line.
    pub interfaces: Option<String>,
}

/// Table skeleton for hand-editing: one row per SVI and one per L2-only
/// VLAN. Tenant, app profile, EPG, route type and interfaces are left blank.
pub fn seed_from_inventory(inventory: &FabricInventory) -> DesiredStateTable {
    let mut rows = Vec::new();
    for device in inventory.iter() {
        for (vrf, interfaces) in &device.vrfs {
            for record in interfaces.values() {
                let Some(vlan) = record.svi_vlan else {
                    continue;
                };
                rows.push(seed_row(
                    &device.device,
                    vrf,
                    vlan,
                    record.l2_vlan_name.as_deref().unwrap_or_default(),
                    record.gateway().unwrap_or_default(),
                    record.description.as_deref().unwrap_or_default(),
                ));
            }
        }
        for (vlan, name) in device.vlans.l2_only() {
            rows.push(seed_row(
                &device.device,
                "",
                vlan,
                name,
                "",
                L2_ONLY_DESCRIPTION,
            ));
        }
    }

    DesiredStateTable {
        columns: KNOWN_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows,
    }
}

fn seed_row(
    device: &str,
    vrf: &str,
    vlan: u16,
    l2_name: &str,
    gateway: &str,
    description: &str,
) -> Vec<Value> {
    let vlan = format!("Vlan{vlan}");
    [
        device,
        "",
        vrf,
        vlan.as_str(),
        l2_name,
        "",
        "",
        gateway,
        "",
        description,
        "",
    ]
    .into_iter()
    .map(|cell| Value::String(cell.to_string()))
    .collect()
}

fn normalize(header: &str) -> String {
    header.trim().to_ascii_lowercase()
}

/// Sheet exports carry numbers for numeric-looking cells.
fn cell_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use switch_config_core::parse;

    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn columns_are_found_by_name_in_any_order() {
        let table = DesiredStateTable {
            columns: headers(&["descr", "L2_VLAN_NAME", "extra", "vlan_number", "vrf", "tenant"]),
            rows: vec![vec![
                json!("users"),
                json!("USERS"),
                json!("ignored"),
                json!(10),
                json!("RED"),
                json!("PROD"),
            ]],
        };

        let rows = table.bound_rows().expect("bind");
        assert_eq!(
            rows,
            vec![TableRow {
                row: 2,
                tenant: Some("PROD".to_string()),
                vrf: Some("RED".to_string()),
                vlan_number: Some("10".to_string()),
                l2_vlan_name: Some("USERS".to_string()),
                descr: Some("users".to_string()),
                ..TableRow::default()
            }]
        );
    }

    #[test]
    fn missing_required_column_fails_fast() {
        let err = ColumnBinding::bind(&headers(&["tenant", "vrf", "l2_vlan_name"]))
            .expect_err("vlan_number missing");
        assert!(matches!(err, TableError::MissingColumn("vlan_number")));
    }

    #[test]
    fn duplicate_known_column_is_rejected() {
        let err = ColumnBinding::bind(&headers(&[
            "tenant",
            "vrf",
            "vlan_number",
            "l2_vlan_name",
            "Tenant",
        ]))
        .expect_err("duplicate");
        assert!(matches!(err, TableError::DuplicateColumn(name) if name == "tenant"));
    }

    #[test]
    fn short_rows_and_blank_cells_read_as_none() {
        let table = DesiredStateTable::from_json(
            r#"{"columns":["tenant","vrf","vlan_number","l2_vlan_name","ip_addr"],
                "rows":[["PROD","  ",null]]}"#,
            "inline",
        )
        .expect("decode");
        let row = &table.bound_rows().expect("bind")[0];
        assert_eq!(row.tenant.as_deref(), Some("PROD"));
        assert_eq!(row.vrf, None);
        assert_eq!(row.vlan_number, None);
        assert_eq!(row.ip_addr, None);
    }

    #[test]
    fn seed_lists_svis_then_l2_only_vlans() {
        let inv = parse(
            "core1",
            "vlan 10\n  name USERS\nvlan 20\n  name PRINTERS\n\ninterface Vlan10\n  vrf member RED\n  ip address 10.0.0.2/24\n  hsrp 1\n    ip 10.0.0.1\n\n",
        )
        .expect("parse");
        let table = seed_from_inventory(&std::iter::once(inv).collect());

        let rows = table.bound_rows().expect("seed binds");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].vrf.as_deref(), Some("RED"));
        assert_eq!(rows[0].vlan_number.as_deref(), Some("Vlan10"));
        assert_eq!(rows[0].ip_addr.as_deref(), Some("10.0.0.1/24"));
        assert_eq!(rows[0].tenant, None);
        assert_eq!(rows[1].l2_vlan_name.as_deref(), Some("PRINTERS"));
        assert_eq!(rows[1].descr.as_deref(), Some("L2 only vlan"));
    }
}
