//! Dry-run view of what a migration would touch.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::desired::DesiredRow;
use crate::snapshot::FabricSnapshot;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkEntry {
    pub tenant: String,
    pub vrf: String,
    pub bridge_domain: String,
    pub tenant_new: bool,
    pub vrf_new: bool,
    pub bridge_domain_new: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationEntry {
    pub tenant: String,
    pub app_profile: String,
    pub epg: String,
    pub app_profile_new: bool,
    pub epg_new: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub network: Vec<NetworkEntry>,
    pub application: Vec<ApplicationEntry>,
}

impl Plan {
    /// Number of distinct objects the plan would create.
    pub fn new_objects(&self) -> usize {
        let mut tenants = BTreeSet::new();
        let mut count = 0;
        for entry in &self.network {
            if entry.tenant_new && tenants.insert(entry.tenant.as_str()) {
                count += 1;
            }
            count += usize::from(entry.vrf_new) + usize::from(entry.bridge_domain_new);
        }
        for entry in &self.application {
            count += usize::from(entry.app_profile_new) + usize::from(entry.epg_new);
        }
        count
    }
}

/// Unique (tenant, VRF, bridge domain) and (tenant, app profile, EPG)
/// triples in first-seen order, each flagged against the snapshot. Nothing is
/// sent to the fabric.
pub fn build_plan(rows: &[DesiredRow], snapshot: &FabricSnapshot) -> Plan {
    let mut plan = Plan::default();
    let mut seen_network = BTreeSet::new();
    let mut seen_vrfs = BTreeSet::new();
    let mut seen_apps = BTreeSet::new();
    let mut seen_application = BTreeSet::new();

    for row in rows {
        let tenant = row.tenant.as_str();
        if seen_network.insert((tenant, row.vrf.as_str(), row.bridge_domain.as_str())) {
            let first_vrf_mention = seen_vrfs.insert((tenant, row.vrf.as_str()));
            plan.network.push(NetworkEntry {
                tenant: row.tenant.clone(),
                vrf: row.vrf.clone(),
                bridge_domain: row.bridge_domain.clone(),
                tenant_new: !snapshot.has_tenant(tenant),
                vrf_new: first_vrf_mention && !snapshot.has_vrf(tenant, &row.vrf),
                bridge_domain_new: snapshot
                    .bridge_domain(tenant, &row.bridge_domain)
                    .is_none(),
            });
        }

        if seen_application.insert((tenant, row.app_profile.as_str(), row.epg.as_str())) {
            let first_app_mention = seen_apps.insert((tenant, row.app_profile.as_str()));
            plan.application.push(ApplicationEntry {
                tenant: row.tenant.clone(),
                app_profile: row.app_profile.clone(),
                epg: row.epg.clone(),
                app_profile_new: first_app_mention
                    && !snapshot.has_app_profile(tenant, &row.app_profile),
                epg_new: snapshot
                    .epg(tenant, &row.app_profile, &row.epg)
                    .is_none(),
            });
        }
    }
    plan
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::desired::VlanId;
    use crate::settings::NamingConfig;
    use crate::test_support::fabric_state;

    fn row(number: usize, tenant: &str, vrf: &str, l2: &str) -> DesiredRow {
        let vlan = VlanId::new(100).expect("vlan");
        DesiredRow::new(number, tenant, vrf, vlan, l2, &NamingConfig::default())
    }

    #[test]
    fn plan_dedupes_and_flags_against_snapshot() {
        let snapshot = FabricSnapshot::from_state(&fabric_state());
        let rows = [
            row(2, "PROD", "RED", "USERS"),
            row(3, "PROD", "RED", "USERS"),
            row(4, "PROD", "GREEN", "LAB"),
            row(5, "DEV", "GREEN", "LAB"),
            row(6, "PROD", "GREEN", "LAB2"),
        ];

        let plan = build_plan(&rows, &snapshot);

        let network: Vec<_> = plan
            .network
            .iter()
            .map(|n| {
                (
                    n.tenant.as_str(),
                    n.bridge_domain.as_str(),
                    n.tenant_new,
                    n.vrf_new,
                    n.bridge_domain_new,
                )
            })
            .collect();
        assert_eq!(
            network,
            vec![
                ("PROD", "USERS_BD", false, false, false),
                ("PROD", "LAB_BD", false, true, true),
                ("DEV", "LAB_BD", true, true, true),
                ("PROD", "LAB2_BD", false, false, true),
            ]
        );

        let apps: Vec<_> = plan
            .application
            .iter()
            .map(|a| (a.app_profile.as_str(), a.app_profile_new, a.epg_new))
            .collect();
        assert_eq!(
            apps,
            vec![
                ("RED_ANP", false, false),
                ("GREEN_ANP", true, true),
                ("GREEN_ANP", true, true),
                ("GREEN_ANP", false, true),
            ]
        );
        assert_eq!(plan.new_objects(), 11);
    }
}
