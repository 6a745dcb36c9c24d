//! A fabric controller backed by a JSON state dump.
//!
//! Creates follow the controller's `status=created` semantics: creating an
//! object that already exists, or whose parent is missing, is refused with
//! `400`. Names listed with [`OfflineFabric::reject`] answer `500`. Every
//! create is journaled whatever its status.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dn::ObjectDn;
use crate::remote::{
    request_dn, AppProfileRecord, Attributes, BridgeDomainRecord, EpgRecord, FabricState,
    InterfaceFilter, ObjectKind, PathAttachment, RemoteCommand, RemoteError, RemoteQuery,
    StaticPathRecord, SwitchProfileRecord, TenantRecord, STATUS_OK,
};

pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_SERVER_ERROR: u16 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub kind: ObjectKind,
    pub attributes: Attributes,
    pub status: u16,
}

#[derive(Debug, Clone, Default)]
pub struct OfflineFabric {
    state: FabricState,
    rejected: BTreeSet<String>,
    fail_queries: bool,
    journal: Vec<JournalEntry>,
}

impl OfflineFabric {
    pub fn new(state: FabricState) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }

    pub fn load(path: &Path) -> Result<Self, RemoteError> {
        let raw = fs::read_to_string(path).map_err(|source| RemoteError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let state = serde_json::from_str(&raw).map_err(|source| RemoteError::Decode {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::new(state))
    }

    /// Answer `500` to creates whose `name` attribute or DN is in `names`.
    pub fn reject<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rejected.extend(names.into_iter().map(Into::into));
        self
    }

    /// Make every interface query fail.
    pub fn failing_queries(mut self) -> Self {
        self.fail_queries = true;
        self
    }

    pub fn state(&self) -> &FabricState {
        &self.state
    }

    pub fn journal(&self) -> &[JournalEntry] {
        &self.journal
    }

    pub fn save_state(&self, path: &Path) -> Result<(), RemoteError> {
        write_json(path, &self.state)
    }

    pub fn save_journal(&self, path: &Path) -> Result<(), RemoteError> {
        write_json(path, &self.journal)
    }

    fn apply(&mut self, kind: ObjectKind, attributes: &Attributes) -> u16 {
        let Some(dn) = request_dn(attributes) else {
            return STATUS_BAD_REQUEST;
        };
        if dn.kind() != kind {
            return STATUS_BAD_REQUEST;
        }
        let name_rejected = attributes
            .get("name")
            .is_some_and(|name| self.rejected.contains(name));
        if name_rejected || self.rejected.contains(&dn.to_string()) {
            return STATUS_SERVER_ERROR;
        }
        let created = match dn {
            ObjectDn::Tenant { tenant } => self.create_tenant(tenant),
            ObjectDn::Vrf { tenant, vrf } => self
                .tenant_mut(&tenant)
                .is_some_and(|t| push_unique(&mut t.vrfs, vrf)),
            ObjectDn::BridgeDomain {
                tenant,
                bridge_domain,
            } => self.tenant_mut(&tenant).is_some_and(|t| {
                if t.bridge_domains.iter().any(|bd| bd.name == bridge_domain) {
                    return false;
                }
                t.bridge_domains.push(BridgeDomainRecord {
                    name: bridge_domain,
                    ..BridgeDomainRecord::default()
                });
                true
            }),
            ObjectDn::VrfBinding {
                tenant,
                bridge_domain,
            } => {
                let vrf = attributes.get("tnFvCtxName").cloned();
                match (self.bridge_domain_mut(&tenant, &bridge_domain), vrf) {
                    (Some(bd), Some(vrf)) => {
                        bd.vrf = Some(vrf);
                        true
                    }
                    _ => false,
                }
            }
            ObjectDn::Subnet {
                tenant,
                bridge_domain,
                subnet,
            } => self
                .bridge_domain_mut(&tenant, &bridge_domain)
                .is_some_and(|bd| push_unique(&mut bd.subnets, subnet)),
            ObjectDn::AppProfile {
                tenant,
                app_profile,
            } => self.tenant_mut(&tenant).is_some_and(|t| {
                if t.app_profiles.iter().any(|ap| ap.name == app_profile) {
                    return false;
                }
                t.app_profiles.push(AppProfileRecord {
                    name: app_profile,
                    ..AppProfileRecord::default()
                });
                true
            }),
            ObjectDn::Epg {
                tenant,
                app_profile,
                epg,
            } => {
                let bridge_domain = attributes.get("tnFvBDName").cloned();
                self.app_profile_mut(&tenant, &app_profile)
                    .is_some_and(|ap| {
                        if ap.epgs.iter().any(|e| e.name == epg) {
                            return false;
                        }
                        ap.epgs.push(EpgRecord {
                            name: epg,
                            bridge_domain,
                            paths: Vec::new(),
                        });
                        true
                    })
            }
            ObjectDn::StaticPath {
                tenant,
                app_profile,
                epg,
                path,
            } => {
                let encap = attributes.get("encap").cloned().unwrap_or_default();
                self.epg_mut(&tenant, &app_profile, &epg).is_some_and(|e| {
                    if e.paths.iter().any(|p| p.path == path) {
                        return false;
                    }
                    e.paths.push(StaticPathRecord { path, encap });
                    true
                })
            }
            ObjectDn::InterfaceProfile { name } => {
                push_unique(&mut self.state.interface_profiles, name)
            }
            ObjectDn::SwitchProfile { name } => {
                if self.state.switch_profiles.iter().any(|p| p.name == name) {
                    false
                } else {
                    self.state.switch_profiles.push(SwitchProfileRecord {
                        name,
                        interface_profiles: Vec::new(),
                    });
                    true
                }
            }
            ObjectDn::ProfileAssociation {
                switch_profile,
                interface_profile,
            } => {
                let known = self.state.interface_profiles.contains(&interface_profile);
                known
                    && self
                        .state
                        .switch_profiles
                        .iter_mut()
                        .find(|p| p.name == switch_profile)
                        .is_some_and(|p| push_unique(&mut p.interface_profiles, interface_profile))
            }
        };

        if created {
            STATUS_OK
        } else {
            STATUS_BAD_REQUEST
        }
    }

    fn create_tenant(&mut self, tenant: String) -> bool {
        if self.state.tenants.iter().any(|t| t.name == tenant) {
            return false;
        }
        self.state.tenants.push(TenantRecord {
            name: tenant,
            ..TenantRecord::default()
        });
        true
    }

    fn tenant_mut(&mut self, tenant: &str) -> Option<&mut TenantRecord> {
        self.state.tenants.iter_mut().find(|t| t.name == tenant)
    }

    fn bridge_domain_mut(&mut self, tenant: &str, bd: &str) -> Option<&mut BridgeDomainRecord> {
        self.tenant_mut(tenant)?
            .bridge_domains
            .iter_mut()
            .find(|b| b.name == bd)
    }

    fn app_profile_mut(&mut self, tenant: &str, app: &str) -> Option<&mut AppProfileRecord> {
        self.tenant_mut(tenant)?
            .app_profiles
            .iter_mut()
            .find(|a| a.name == app)
    }

    fn epg_mut(&mut self, tenant: &str, app: &str, epg: &str) -> Option<&mut EpgRecord> {
        self.app_profile_mut(tenant, app)?
            .epgs
            .iter_mut()
            .find(|e| e.name == epg)
    }
}

impl RemoteQuery for OfflineFabric {
    fn query_existing_objects(&self) -> Result<FabricState, RemoteError> {
        Ok(self.state.clone())
    }

    fn query_interface_config(
        &self,
        filter: &InterfaceFilter,
    ) -> Result<Vec<PathAttachment>, RemoteError> {
        if self.fail_queries {
            return Err(RemoteError::Query(format!(
                "{} rejected by offline fabric",
                filter.expression()
            )));
        }
        let encap = filter.encap_value();
        let mut out = Vec::new();
        for tenant in &self.state.tenants {
            for app in &tenant.app_profiles {
                for epg in &app.epgs {
                    for path in epg.paths.iter().filter(|p| p.encap == encap) {
                        let dn = ObjectDn::StaticPath {
                            tenant: tenant.name.clone(),
                            app_profile: app.name.clone(),
                            epg: epg.name.clone(),
                            path: path.path.clone(),
                        };
                        out.push(PathAttachment {
                            dn: dn.to_string(),
                            encap: path.encap.clone(),
                        });
                    }
                }
            }
        }
        Ok(out)
    }
}

impl RemoteCommand for OfflineFabric {
    fn create(&mut self, kind: ObjectKind, attributes: &Attributes) -> Result<u16, RemoteError> {
        let status = self.apply(kind, attributes);
        debug!(
            kind = %kind,
            dn = attributes.get("dn").map(String::as_str).unwrap_or("-"),
            status,
            "offline create"
        );
        self.journal.push(JournalEntry {
            kind,
            attributes: attributes.clone(),
            status,
        });
        Ok(status)
    }
}

fn push_unique(list: &mut Vec<String>, value: String) -> bool {
    if list.contains(&value) {
        return false;
    }
    list.push(value);
    true
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), RemoteError> {
    let body = serde_json::to_string_pretty(value).map_err(|source| RemoteError::Decode {
        path: path.display().to_string(),
        source,
    })?;
    fs::write(path, body + "\n").map_err(|source| RemoteError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload;
    use crate::settings::FabricConfig;

    #[test]
    fn created_objects_refuse_a_second_create() {
        let mut fabric = OfflineFabric::default();
        assert_eq!(
            fabric.create(ObjectKind::Tenant, &payload::tenant("PROD")).ok(),
            Some(STATUS_OK)
        );
        assert_eq!(
            fabric.create(ObjectKind::Tenant, &payload::tenant("PROD")).ok(),
            Some(STATUS_BAD_REQUEST)
        );
        assert_eq!(fabric.journal().len(), 2);
        assert_eq!(fabric.state().tenants.len(), 1);
    }

    #[test]
    fn missing_parent_is_a_bad_request() {
        let mut fabric = OfflineFabric::default();
        let attrs = payload::vrf("PROD", "RED", &FabricConfig::default());
        assert_eq!(
            fabric.create(ObjectKind::Vrf, &attrs).ok(),
            Some(STATUS_BAD_REQUEST)
        );
    }

    #[test]
    fn kind_must_match_dn() {
        let mut fabric = OfflineFabric::default();
        assert_eq!(
            fabric.create(ObjectKind::Vrf, &payload::tenant("PROD")).ok(),
            Some(STATUS_BAD_REQUEST)
        );
    }

    #[test]
    fn rejected_names_answer_server_error() {
        let mut fabric = OfflineFabric::default().reject(["PROD"]);
        assert_eq!(
            fabric.create(ObjectKind::Tenant, &payload::tenant("PROD")).ok(),
            Some(STATUS_SERVER_ERROR)
        );
        assert!(fabric.state().tenants.is_empty());
    }

    #[test]
    fn interface_query_returns_bindings_with_matching_encap() {
        let fabric_cfg = FabricConfig::default();
        let path = "topology/pod-1/paths-101/pathep-[eth1/5]";
        let mut fabric = OfflineFabric::default();
        for (kind, attrs) in [
            (ObjectKind::Tenant, payload::tenant("PROD")),
            (ObjectKind::AppProfile, payload::app_profile("PROD", "RED_ANP")),
            (
                ObjectKind::Epg,
                payload::epg("PROD", "RED_ANP", "USERS_EPG", "USERS_BD", ""),
            ),
            (
                ObjectKind::StaticPath,
                payload::static_path("PROD", "RED_ANP", "USERS_EPG", path, "vlan-10", &fabric_cfg),
            ),
        ] {
            assert_eq!(fabric.create(kind, &attrs).ok(), Some(STATUS_OK), "{kind}");
        }

        let hits = fabric
            .query_interface_config(&InterfaceFilter::encap(10))
            .expect("query");
        assert_eq!(hits.len(), 1);
        assert_eq!(
            hits[0].owner(),
            Some(("PROD", "RED_ANP", "USERS_EPG", path))
        );
        let misses = fabric
            .query_interface_config(&InterfaceFilter::encap(20))
            .expect("query");
        assert!(misses.is_empty());
    }

    #[test]
    fn state_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("fabric.json");
        let mut fabric = OfflineFabric::default();
        fabric
            .create(ObjectKind::Tenant, &payload::tenant("PROD"))
            .expect("create");
        fabric.save_state(&path).expect("save");

        let reloaded = OfflineFabric::load(&path).expect("load");
        assert_eq!(reloaded.state(), fabric.state());
        assert!(reloaded.journal().is_empty());
    }
}
