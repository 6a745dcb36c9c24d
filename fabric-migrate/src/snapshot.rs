//! In-memory index of the controller's existing objects.
//!
//! Loaded once per run through [`RemoteQuery`] and then owned by the engines,
//! which extend it only after a create is confirmed.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::remote::{FabricState, PortKind, RemoteError, RemoteQuery};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FabricSnapshot {
    tenants: BTreeMap<String, TenantState>,
    /// node → `module/port` → port state.
    ports: BTreeMap<u32, BTreeMap<String, PortState>>,
    /// Bundle policy group name → path DN.
    bundles: BTreeMap<String, String>,
    leaves: BTreeMap<u32, String>,
    interface_profiles: BTreeSet<String>,
    /// Switch profile → associated interface profiles.
    switch_profiles: BTreeMap<String, BTreeSet<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenantState {
    pub vrfs: BTreeSet<String>,
    pub bridge_domains: BTreeMap<String, BridgeDomainState>,
    /// App profile → EPG → EPG state.
    pub app_profiles: BTreeMap<String, BTreeMap<String, EpgState>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeDomainState {
    pub vrf: Option<String>,
    pub subnets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpgState {
    pub bridge_domain: Option<String>,
    /// Path DN → encap.
    pub paths: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortState {
    pub kind: PortKind,
    pub policy_group: String,
}

impl FabricSnapshot {
    pub fn load(query: &dyn RemoteQuery) -> Result<Self, RemoteError> {
        let state = query.query_existing_objects()?;
        let snapshot = Self::from_state(&state);
        debug!(
            tenants = snapshot.tenants.len(),
            nodes = snapshot.ports.len(),
            bundles = snapshot.bundles.len(),
            "fabric snapshot loaded"
        );
        Ok(snapshot)
    }

    pub fn from_state(state: &FabricState) -> Self {
        let mut snapshot = Self::default();
        for tenant in &state.tenants {
            let entry = snapshot.tenants.entry(tenant.name.clone()).or_default();
            entry.vrfs.extend(tenant.vrfs.iter().cloned());
            for bd in &tenant.bridge_domains {
                entry.bridge_domains.insert(
                    bd.name.clone(),
                    BridgeDomainState {
                        vrf: bd.vrf.clone(),
                        subnets: bd.subnets.clone(),
                    },
                );
            }
            for app in &tenant.app_profiles {
                let epgs = entry.app_profiles.entry(app.name.clone()).or_default();
                for epg in &app.epgs {
                    epgs.insert(
                        epg.name.clone(),
                        EpgState {
                            bridge_domain: epg.bridge_domain.clone(),
                            paths: epg
                                .paths
                                .iter()
                                .map(|p| (p.path.clone(), p.encap.clone()))
                                .collect(),
                        },
                    );
                }
            }
        }
        for port in &state.ports {
            snapshot.ports.entry(port.node).or_default().insert(
                port.port.clone(),
                PortState {
                    kind: port.kind,
                    policy_group: port.policy_group.clone(),
                },
            );
        }
        for bundle in &state.bundles {
            snapshot
                .bundles
                .insert(bundle.name.clone(), bundle.path.clone());
        }
        for leaf in &state.leaves {
            snapshot.leaves.insert(leaf.id, leaf.name.clone());
        }
        snapshot
            .interface_profiles
            .extend(state.interface_profiles.iter().cloned());
        for profile in &state.switch_profiles {
            snapshot
                .switch_profiles
                .entry(profile.name.clone())
                .or_default()
                .extend(profile.interface_profiles.iter().cloned());
        }
        snapshot
    }

    pub fn tenant(&self, tenant: &str) -> Option<&TenantState> {
        self.tenants.get(tenant)
    }

    pub fn has_tenant(&self, tenant: &str) -> bool {
        self.tenants.contains_key(tenant)
    }

    pub fn has_vrf(&self, tenant: &str, vrf: &str) -> bool {
        self.tenant(tenant).is_some_and(|t| t.vrfs.contains(vrf))
    }

    pub fn bridge_domain(&self, tenant: &str, bd: &str) -> Option<&BridgeDomainState> {
        self.tenant(tenant)?.bridge_domains.get(bd)
    }

    pub fn has_subnet(&self, tenant: &str, bd: &str, subnet: &str) -> bool {
        self.bridge_domain(tenant, bd)
            .is_some_and(|state| state.subnets.iter().any(|s| s == subnet))
    }

    pub fn has_app_profile(&self, tenant: &str, app: &str) -> bool {
        self.tenant(tenant)
            .is_some_and(|t| t.app_profiles.contains_key(app))
    }

    pub fn epg(&self, tenant: &str, app: &str, epg: &str) -> Option<&EpgState> {
        self.tenant(tenant)?.app_profiles.get(app)?.get(epg)
    }

    pub fn has_static_path(&self, tenant: &str, app: &str, epg: &str, path: &str) -> bool {
        self.epg(tenant, app, epg)
            .is_some_and(|state| state.paths.contains_key(path))
    }

    /// Whether the node is a known leaf or has any configured port.
    pub fn has_node(&self, node: u32) -> bool {
        self.leaves.contains_key(&node) || self.ports.contains_key(&node)
    }

    /// Configured port on `node`, `port` given as `module/port`.
    pub fn port(&self, node: u32, port: &str) -> Option<&PortState> {
        self.ports.get(&node)?.get(port)
    }

    pub fn bundle_path(&self, name: &str) -> Option<&str> {
        self.bundles.get(name).map(String::as_str)
    }

    pub fn bundle_names(&self) -> impl Iterator<Item = &str> {
        self.bundles.keys().map(String::as_str)
    }

    /// Leaves in ascending node id order.
    pub fn leaves(&self) -> impl Iterator<Item = (u32, &str)> {
        self.leaves.iter().map(|(id, name)| (*id, name.as_str()))
    }

    pub fn has_interface_profile(&self, name: &str) -> bool {
        self.interface_profiles.contains(name)
    }

    pub fn has_switch_profile(&self, name: &str) -> bool {
        self.switch_profiles.contains_key(name)
    }

    pub fn has_profile_association(&self, switch_profile: &str, interface_profile: &str) -> bool {
        self.switch_profiles
            .get(switch_profile)
            .is_some_and(|assoc| assoc.contains(interface_profile))
    }

    pub(crate) fn record_tenant(&mut self, tenant: &str) {
        self.tenants.entry(tenant.to_string()).or_default();
    }

    pub(crate) fn record_vrf(&mut self, tenant: &str, vrf: &str) {
        self.tenant_mut(tenant).vrfs.insert(vrf.to_string());
    }

    pub(crate) fn record_bridge_domain(&mut self, tenant: &str, bd: &str) {
        self.tenant_mut(tenant)
            .bridge_domains
            .entry(bd.to_string())
            .or_default();
    }

    pub(crate) fn record_vrf_binding(&mut self, tenant: &str, bd: &str, vrf: &str) {
        self.bridge_domain_mut(tenant, bd).vrf = Some(vrf.to_string());
    }

    pub(crate) fn record_subnet(&mut self, tenant: &str, bd: &str, subnet: &str) {
        let state = self.bridge_domain_mut(tenant, bd);
        if !state.subnets.iter().any(|s| s == subnet) {
            state.subnets.push(subnet.to_string());
        }
    }

    pub(crate) fn record_app_profile(&mut self, tenant: &str, app: &str) {
        self.tenant_mut(tenant)
            .app_profiles
            .entry(app.to_string())
            .or_default();
    }

    pub(crate) fn record_epg(&mut self, tenant: &str, app: &str, epg: &str, bd: &str) {
        self.epg_mut(tenant, app, epg).bridge_domain = Some(bd.to_string());
    }

    pub(crate) fn record_static_path(
        &mut self,
        tenant: &str,
        app: &str,
        epg: &str,
        path: &str,
        encap: &str,
    ) {
        self.epg_mut(tenant, app, epg)
            .paths
            .insert(path.to_string(), encap.to_string());
    }

    pub(crate) fn record_interface_profile(&mut self, name: &str) {
        self.interface_profiles.insert(name.to_string());
    }

    pub(crate) fn record_switch_profile(&mut self, name: &str) {
        self.switch_profiles.entry(name.to_string()).or_default();
    }

    pub(crate) fn record_profile_association(
        &mut self,
        switch_profile: &str,
        interface_profile: &str,
    ) {
        self.switch_profiles
            .entry(switch_profile.to_string())
            .or_default()
            .insert(interface_profile.to_string());
    }

    fn tenant_mut(&mut self, tenant: &str) -> &mut TenantState {
        self.tenants.entry(tenant.to_string()).or_default()
    }

    fn bridge_domain_mut(&mut self, tenant: &str, bd: &str) -> &mut BridgeDomainState {
        self.tenant_mut(tenant)
            .bridge_domains
            .entry(bd.to_string())
            .or_default()
    }

    fn epg_mut(&mut self, tenant: &str, app: &str, epg: &str) -> &mut EpgState {
        self.tenant_mut(tenant)
            .app_profiles
            .entry(app.to_string())
            .or_default()
            .entry(epg.to_string())
            .or_default()
    }
}
