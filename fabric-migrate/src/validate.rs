//! Fail-closed validation of the desired-state table.
//!
//! Every row goes through a structural pass; rows that survive it are checked
//! against the fabric snapshot (conflicts and interfaces) and, when parsed
//! configurations are supplied, against the legacy inventory. All findings
//! are collected before anything is returned, so one run reports every
//! problem. Any [`RowError`] means nothing may be created.

use std::collections::BTreeMap;

use serde::Serialize;
use switch_config_core::FabricInventory;
use thiserror::Error;
use tracing::debug;

use crate::desired::{DesiredRow, InterfaceBinding, RouteType, VlanId};
use crate::dn::{ObjectDn, PathDn};
use crate::remote::{InterfaceFilter, PortKind, RemoteQuery};
use crate::settings::MigrationConfig;
use crate::snapshot::FabricSnapshot;
use crate::table::TableRow;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowError {
    #[error("row {row}: {message}")]
    Structural { row: usize, message: String },
    #[error("row {row}: conflict: {message}")]
    Conflict { row: usize, message: String },
}

impl RowError {
    pub fn row(&self) -> usize {
        match self {
            Self::Structural { row, .. } | Self::Conflict { row, .. } => *row,
        }
    }

    fn structural(row: usize, message: impl Into<String>) -> Self {
        Self::Structural {
            row,
            message: message.into(),
        }
    }

    fn conflict(row: usize, message: impl Into<String>) -> Self {
        Self::Conflict {
            row,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowWarning {
    pub row: usize,
    pub code: &'static str,
    pub message: String,
}

impl RowWarning {
    pub fn new(row: usize, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            row,
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Rows that passed the structural pass.
    pub rows: Vec<DesiredRow>,
    pub errors: Vec<RowError>,
    pub warnings: Vec<RowWarning>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

pub fn validate(
    table: &[TableRow],
    inventory: Option<&FabricInventory>,
    snapshot: &FabricSnapshot,
    query: &dyn RemoteQuery,
    config: &MigrationConfig,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    for raw in table {
        match structural(raw, config) {
            Ok(row) => report.rows.push(row),
            Err(errors) => report.errors.extend(errors),
        }
    }

    {
        let mut claimed: BTreeMap<(&str, &str), &DesiredRow> = BTreeMap::new();
        for row in &report.rows {
            conflicts(row, snapshot, &mut report.errors, &mut report.warnings);
            cross_row(row, &mut claimed, &mut report.errors);
            interfaces(row, snapshot, query, &mut report.errors);
            if let Some(inventory) = inventory {
                legacy(row, inventory, &mut report.warnings);
            }
        }
    }

    debug!(
        rows = report.rows.len(),
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "validation finished"
    );
    report
}

/// Type a raw row, collecting every problem instead of stopping at the first.
fn structural(raw: &TableRow, config: &MigrationConfig) -> Result<DesiredRow, Vec<RowError>> {
    let at = raw.row;
    let mut errors = Vec::new();
    let mut required = |value: &Option<String>, column: &str| match value {
        Some(v) => v.clone(),
        None => {
            errors.push(RowError::structural(at, format!("{column} is empty")));
            String::new()
        }
    };
    let tenant = required(&raw.tenant, "tenant");
    let vrf = required(&raw.vrf, "vrf");
    let l2_name = required(&raw.l2_vlan_name, "l2 vlan name");

    let vlan = match raw.vlan_number.as_deref().map(str::parse::<VlanId>) {
        Some(Ok(vlan)) => Some(vlan),
        Some(Err(message)) => {
            errors.push(RowError::structural(at, message));
            None
        }
        None => {
            errors.push(RowError::structural(at, "vlan number is empty"));
            None
        }
    };

    let route_type = raw
        .route_type
        .as_deref()
        .unwrap_or_default()
        .parse::<RouteType>()
        .unwrap_or_else(|message| {
            errors.push(RowError::structural(at, message));
            RouteType::default()
        });

    if let Some(ip) = raw.ip_addr.as_deref() {
        if !ip.contains('/') {
            errors.push(RowError::structural(
                at,
                format!("ip address `{ip}` must carry a mask, e.g. 10.0.0.1/24"),
            ));
        }
    }

    let mut bindings = Vec::new();
    for line in raw
        .interfaces
        .as_deref()
        .unwrap_or_default()
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
    {
        match InterfaceBinding::parse(line) {
            Ok(binding) => bindings.push(binding),
            Err(message) => errors.push(RowError::structural(at, message)),
        }
    }

    let Some(vlan) = vlan.filter(|_| errors.is_empty()) else {
        return Err(errors);
    };

    let mut row = DesiredRow::new(at, &tenant, &vrf, vlan, &l2_name, &config.naming);
    row.device = raw.device.clone();
    if let Some(app) = &raw.app_profile {
        row.app_profile = app.clone();
    }
    if let Some(epg) = &raw.epg {
        row.epg = epg.clone();
    }
    row.subnet = raw.ip_addr.clone();
    row.route_type = route_type;
    row.description = raw.descr.clone().unwrap_or_default();
    row.bindings = bindings;
    Ok(row)
}

fn conflicts(
    row: &DesiredRow,
    snapshot: &FabricSnapshot,
    errors: &mut Vec<RowError>,
    warnings: &mut Vec<RowWarning>,
) {
    let Some(bd) = snapshot.bridge_domain(&row.tenant, &row.bridge_domain) else {
        return;
    };

    if let Some(subnet) = row.subnet.as_deref() {
        // Re-applying the subnet a bridge domain already carries is a rerun,
        // not a second subnet.
        if !bd.subnets.is_empty() && !bd.subnets.iter().any(|s| s == subnet) {
            errors.push(RowError::conflict(
                row.row,
                format!(
                    "bridge domain {} already carries subnet {}; refusing to add {subnet}",
                    row.bridge_domain,
                    bd.subnets.join(", ")
                ),
            ));
        }
    }

    match bd.vrf.as_deref() {
        None => warnings.push(RowWarning::new(
            row.row,
            "bd_without_vrf",
            format!(
                "bridge domain {} exists without a VRF binding; it will be bound to {}",
                row.bridge_domain, row.vrf
            ),
        )),
        Some(current) if current != row.vrf => warnings.push(RowWarning::new(
            row.row,
            "bd_vrf_mismatch",
            format!(
                "bridge domain {} is bound to VRF {current}; it will be rebound to {}",
                row.bridge_domain, row.vrf
            ),
        )),
        Some(_) => {}
    }
}

/// Rows sharing a bridge domain must agree on its VRF and subnet.
fn cross_row<'a>(
    row: &'a DesiredRow,
    claimed: &mut BTreeMap<(&'a str, &'a str), &'a DesiredRow>,
    errors: &mut Vec<RowError>,
) {
    let key = (row.tenant.as_str(), row.bridge_domain.as_str());
    let Some(first) = claimed.get(&key).copied() else {
        claimed.insert(key, row);
        return;
    };
    if first.vrf != row.vrf {
        errors.push(RowError::conflict(
            row.row,
            format!(
                "bridge domain {} is already placed in VRF {} by row {}",
                row.bridge_domain, first.vrf, first.row
            ),
        ));
    }
    if let (Some(a), Some(b)) = (first.subnet.as_deref(), row.subnet.as_deref()) {
        if a != b {
            errors.push(RowError::conflict(
                row.row,
                format!(
                    "bridge domain {} already gets subnet {a} from row {}",
                    row.bridge_domain, first.row
                ),
            ));
        }
    }
}

fn interfaces(
    row: &DesiredRow,
    snapshot: &FabricSnapshot,
    query: &dyn RemoteQuery,
    errors: &mut Vec<RowError>,
) {
    let mut paths = Vec::new();
    for binding in &row.bindings {
        match binding {
            InterfaceBinding::Port {
                node, module, port, ..
            } => {
                let key = format!("{module}/{port}");
                if !snapshot.has_node(*node) {
                    errors.push(RowError::conflict(
                        row.row,
                        format!("node {node} does not exist"),
                    ));
                    continue;
                }
                match snapshot.port(*node, &key) {
                    None => errors.push(RowError::conflict(
                        row.row,
                        format!("port eth{key} on node {node} is not configured"),
                    )),
                    Some(state) if state.kind != PortKind::Access => {
                        errors.push(RowError::conflict(
                            row.row,
                            format!(
                                "port eth{key} on node {node} is in a bundle, use policy group {} or change port",
                                state.policy_group
                            ),
                        ))
                    }
                    Some(_) => paths.extend(binding.port_path().map(|p| p.to_string())),
                }
            }
            InterfaceBinding::Bundle { name } => match snapshot.bundle_path(name) {
                Some(path) if PathDn::parse(path).is_some() => paths.push(path.to_string()),
                Some(path) => errors.push(RowError::conflict(
                    row.row,
                    format!("bundle {name} has an unusable path {path}"),
                )),
                None => {
                    let known: Vec<&str> = snapshot.bundle_names().collect();
                    errors.push(RowError::conflict(
                        row.row,
                        format!(
                            "unknown port-channel/vPC {name}, expected one of: {}",
                            known.join(", ")
                        ),
                    ));
                }
            },
        }
    }

    if paths.is_empty() {
        return;
    }

    let filter = InterfaceFilter::encap(row.vlan.get());
    let bound = match query.query_interface_config(&filter) {
        Ok(bound) => bound,
        Err(err) => {
            errors.push(RowError::conflict(
                row.row,
                format!("cannot check {} usage: {err}", filter.encap_value()),
            ));
            return;
        }
    };
    for attachment in &bound {
        let Some((tenant, app, epg, path)) = attachment.owner() else {
            continue;
        };
        if !paths.iter().any(|p| p == path) {
            continue;
        }
        if (tenant, app, epg) == (row.tenant.as_str(), row.app_profile.as_str(), row.epg.as_str()) {
            continue;
        }
        let owner = ObjectDn::Epg {
            tenant: tenant.to_string(),
            app_profile: app.to_string(),
            epg: epg.to_string(),
        };
        let label = PathDn::parse(path).map_or_else(|| path.to_string(), |p| p.label());
        errors.push(RowError::conflict(
            row.row,
            format!(
                "encap {} on {label} is already used by {owner}",
                filter.encap_value()
            ),
        ));
    }
}

fn legacy(row: &DesiredRow, inventory: &FabricInventory, warnings: &mut Vec<RowWarning>) {
    let vlan = row.vlan.get();
    let gateway = match row.device.as_deref() {
        Some(device) => {
            let Some(inv) = inventory.get(device) else {
                warnings.push(RowWarning::new(
                    row.row,
                    "unknown_device",
                    format!("device {device} was not among the parsed configs"),
                ));
                return;
            };
            if !inv.knows_vlan(vlan) {
                warnings.push(RowWarning::new(
                    row.row,
                    "vlan_not_on_device",
                    format!("{} is not configured on {device}", row.vlan),
                ));
                return;
            }
            inv.find_svi(vlan).and_then(|(_, svi)| svi.gateway())
        }
        None => {
            if !inventory.knows_vlan(vlan) {
                warnings.push(RowWarning::new(
                    row.row,
                    "vlan_not_in_inventory",
                    format!("{} is not configured on any parsed device", row.vlan),
                ));
                return;
            }
            inventory.find_svi(vlan).and_then(|(_, svi)| svi.gateway())
        }
    };

    if let (Some(subnet), Some(gateway)) = (row.subnet.as_deref(), gateway) {
        if subnet != gateway {
            warnings.push(RowWarning::new(
                row.row,
                "gateway_mismatch",
                format!("subnet {subnet} differs from legacy gateway {gateway}"),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use switch_config_core::parse;

    use super::*;
    use crate::offline::OfflineFabric;
    use crate::test_support::{fabric_state, table_row};

    fn run(rows: &[TableRow], fabric: &OfflineFabric) -> ValidationReport {
        let snapshot = FabricSnapshot::from_state(fabric.state());
        validate(rows, None, &snapshot, fabric, &MigrationConfig::default())
    }

    #[test]
    fn clean_row_is_typed_with_derived_names() {
        let fabric = OfflineFabric::new(fabric_state());
        let mut raw = table_row(2, "PROD", "RED", "Vlan30", "APPS");
        raw.ip_addr = Some("10.30.0.1/24".to_string());
        raw.route_type = Some("public".to_string());
        raw.interfaces = Some("eth,1,101,1,6\nvPC_DB".to_string());

        let report = run(&[raw], &fabric);
        assert!(report.is_clean(), "{:?}", report.errors);
        let row = &report.rows[0];
        assert_eq!(row.bridge_domain, "APPS_BD");
        assert_eq!(row.app_profile, "RED_ANP");
        assert_eq!(row.route_type, RouteType::Public);
        assert_eq!(row.bindings.len(), 2);
    }

    #[test]
    fn structural_errors_are_all_collected() {
        let fabric = OfflineFabric::new(fabric_state());
        let mut raw = table_row(2, "", "RED", "Vlan5000", "");
        raw.tenant = None;
        raw.l2_vlan_name = None;
        raw.route_type = Some("global".to_string());
        raw.interfaces = Some("eth,1,101,5".to_string());

        let report = run(&[raw], &fabric);
        assert!(report.rows.is_empty());
        assert_eq!(report.errors.len(), 5);
        assert!(report
            .errors
            .iter()
            .all(|e| matches!(e, RowError::Structural { row: 2, .. })));
    }

    #[test]
    fn second_subnet_on_existing_bd_is_one_conflict() {
        let fabric = OfflineFabric::new(fabric_state());
        let mut raw = table_row(2, "PROD", "RED", "Vlan10", "USERS");
        raw.ip_addr = Some("10.99.0.1/24".to_string());

        let report = run(&[raw], &fabric);
        assert_eq!(report.errors.len(), 1);
        assert!(matches!(report.errors[0], RowError::Conflict { row: 2, .. }));
    }

    #[test]
    fn same_subnet_on_existing_bd_is_a_rerun() {
        let fabric = OfflineFabric::new(fabric_state());
        let mut raw = table_row(2, "PROD", "RED", "Vlan10", "USERS");
        raw.ip_addr = Some("10.10.0.1/24".to_string());

        assert!(run(&[raw], &fabric).is_clean());
    }

    #[test]
    fn unbound_and_rebound_bds_only_warn() {
        let fabric = OfflineFabric::new(fabric_state());
        let report = run(
            &[
                table_row(2, "PROD", "RED", "Vlan40", "LEGACY"),
                table_row(3, "PROD", "RED", "Vlan50", "MOVED"),
            ],
            &fabric,
        );
        assert!(report.is_clean());
        let codes: Vec<_> = report.warnings.iter().map(|w| (w.row, w.code)).collect();
        assert_eq!(codes, vec![(2, "bd_without_vrf"), (3, "bd_vrf_mismatch")]);
    }

    #[test]
    fn rows_sharing_a_bd_must_agree() {
        let fabric = OfflineFabric::new(fabric_state());
        let mut first = table_row(2, "PROD", "RED", "Vlan30", "APPS");
        first.ip_addr = Some("10.30.0.1/24".to_string());
        let mut second = table_row(3, "PROD", "BLUE", "Vlan30", "APPS");
        second.ip_addr = Some("10.31.0.1/24".to_string());

        let report = run(&[first, second], &fabric);
        let rows: Vec<_> = report.errors.iter().map(RowError::row).collect();
        assert_eq!(rows, vec![3, 3]);
    }

    #[test]
    fn interface_checks_reject_unknown_and_bundled_ports() {
        let fabric = OfflineFabric::new(fabric_state());
        let mut raw = table_row(2, "PROD", "RED", "Vlan30", "APPS");
        raw.interfaces =
            Some("eth,1,109,1,1\neth,1,101,1,9\neth,1,101,1,7\nvPC_NOPE".to_string());

        let report = run(&[raw], &fabric);
        let messages: Vec<String> = report.errors.iter().map(ToString::to_string).collect();
        assert_eq!(messages.len(), 4, "{messages:?}");
        assert!(messages[0].contains("node 109 does not exist"));
        assert!(messages[1].contains("not configured"));
        assert!(messages[2].contains("use policy group PC_STORAGE"));
        assert!(messages[3].contains("vPC_DB"));
    }

    #[test]
    fn encap_used_by_another_epg_on_same_path_is_fatal() {
        let fabric = OfflineFabric::new(fabric_state());
        let mut raw = table_row(2, "PROD", "RED", "Vlan10", "OTHER");
        raw.interfaces = Some("eth,1,101,1,5".to_string());

        let report = run(&[raw], &fabric);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0]
            .to_string()
            .contains("encap vlan-10 on 101 eth1/5 is already used by uni/tn-PROD/ap-RED_ANP/epg-USERS_EPG"));
    }

    #[test]
    fn encap_bound_to_the_same_epg_is_a_rerun() {
        let fabric = OfflineFabric::new(fabric_state());
        let mut raw = table_row(2, "PROD", "RED", "Vlan10", "USERS");
        raw.interfaces = Some("eth,1,101,1,5".to_string());

        assert!(run(&[raw], &fabric).is_clean());
    }

    #[test]
    fn failed_encap_query_fails_closed() {
        let fabric = OfflineFabric::new(fabric_state()).failing_queries();
        let mut raw = table_row(2, "PROD", "RED", "Vlan30", "APPS");
        raw.interfaces = Some("eth,1,101,1,6".to_string());

        let report = run(&[raw], &fabric);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].to_string().contains("cannot check vlan-30"));
    }

    #[test]
    fn legacy_inventory_cross_check_warns() {
        let fabric = OfflineFabric::new(fabric_state());
        let snapshot = FabricSnapshot::from_state(fabric.state());
        let inventory: FabricInventory = std::iter::once(
            parse(
                "core1",
                "vlan 30\n  name APPS\n\ninterface Vlan30\n  vrf member RED\n  ip address 10.30.0.2/24\n  hsrp 1\n    ip 10.30.0.1\n\n",
            )
            .expect("parse"),
        )
        .collect();

        let mut matching = table_row(2, "PROD", "RED", "Vlan30", "APPS");
        matching.device = Some("core1".to_string());
        matching.ip_addr = Some("10.30.0.1/24".to_string());
        let mut drifted = matching.clone();
        drifted.row = 3;
        drifted.ip_addr = Some("10.30.0.254/24".to_string());
        let mut missing = table_row(4, "PROD", "RED", "Vlan31", "MISC");
        missing.device = Some("core1".to_string());
        let mut stranger = table_row(5, "PROD", "RED", "Vlan32", "MISC2");
        stranger.device = Some("core9".to_string());

        let report = validate(
            &[matching, drifted, missing, stranger],
            Some(&inventory),
            &snapshot,
            &fabric,
            &MigrationConfig::default(),
        );
        let codes: Vec<_> = report.warnings.iter().map(|w| (w.row, w.code)).collect();
        assert_eq!(
            codes,
            vec![
                (3, "gateway_mismatch"),
                (4, "vlan_not_on_device"),
                (5, "unknown_device"),
            ]
        );
    }
}
