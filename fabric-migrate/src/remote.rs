//! Seams to the fabric controller.
//!
//! The migration core never talks HTTP itself. It reads the controller's
//! object graph through [`RemoteQuery`] and issues creates through
//! [`RemoteCommand`]; transport, login and sessions belong to whoever
//! implements those traits.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dn::ObjectDn;

/// Status code a successful create answers with.
pub const STATUS_OK: u16 = 200;

/// Flat attribute map sent with a create.
pub type Attributes = BTreeMap<String, String>;

/// Object classes the migration can create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Tenant,
    Vrf,
    BridgeDomain,
    /// Bridge-domain → VRF relation.
    VrfBinding,
    Subnet,
    AppProfile,
    Epg,
    /// Static EPG binding on a port, port-channel or vPC path.
    StaticPath,
    InterfaceProfile,
    SwitchProfile,
    /// Switch profile → interface profile relation.
    ProfileAssociation,
}

impl ObjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tenant => "tenant",
            Self::Vrf => "vrf",
            Self::BridgeDomain => "bridge_domain",
            Self::VrfBinding => "vrf_binding",
            Self::Subnet => "subnet",
            Self::AppProfile => "app_profile",
            Self::Epg => "epg",
            Self::StaticPath => "static_path",
            Self::InterfaceProfile => "interface_profile",
            Self::SwitchProfile => "switch_profile",
            Self::ProfileAssociation => "profile_association",
        }
    }

    /// Controller class name of the object.
    pub fn class_name(self) -> &'static str {
        match self {
            Self::Tenant => "fvTenant",
            Self::Vrf => "fvCtx",
            Self::BridgeDomain => "fvBD",
            Self::VrfBinding => "fvRsCtx",
            Self::Subnet => "fvSubnet",
            Self::AppProfile => "fvAp",
            Self::Epg => "fvAEPg",
            Self::StaticPath => "fvRsPathAtt",
            Self::InterfaceProfile => "infraAccPortP",
            Self::SwitchProfile => "infraNodeP",
            Self::ProfileAssociation => "infraRsAccPortP",
        }
    }
}

impl Display for ObjectKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("remote query failed: {0}")]
    Query(String),
    #[error("remote command failed: {0}")]
    Command(String),
    #[error("fabric file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid fabric JSON {path}: {source}")]
    Decode {
        path: String,
        source: serde_json::Error,
    },
}

/// Read side of the controller.
pub trait RemoteQuery {
    /// Tenants, VRFs, bridge domains with subnets, application profiles,
    /// EPGs, access ports, bundles and leaf profiles.
    fn query_existing_objects(&self) -> Result<FabricState, RemoteError>;

    /// Static path bindings matching `filter`.
    fn query_interface_config(
        &self,
        filter: &InterfaceFilter,
    ) -> Result<Vec<PathAttachment>, RemoteError>;
}

/// Write side of the controller.
pub trait RemoteCommand {
    /// Create one object. [`STATUS_OK`] means success; any other status or an
    /// error is a failure the caller does not inspect further.
    fn create(&mut self, kind: ObjectKind, attributes: &Attributes) -> Result<u16, RemoteError>;
}

/// Filter for [`RemoteQuery::query_interface_config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceFilter {
    pub encap_vlan: u16,
}

impl InterfaceFilter {
    pub fn encap(vlan: u16) -> Self {
        Self { encap_vlan: vlan }
    }

    pub fn encap_value(&self) -> String {
        format!("vlan-{}", self.encap_vlan)
    }

    /// Query filter expression as the controller spells it.
    pub fn expression(&self) -> String {
        format!("eq(fvRsPathAtt.encap,\"{}\")", self.encap_value())
    }
}

/// One existing static path binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathAttachment {
    pub dn: String,
    pub encap: String,
}

impl PathAttachment {
    /// `(tenant, app_profile, epg, path)` of the binding, when the DN is well formed.
    pub fn owner(&self) -> Option<(&str, &str, &str, &str)> {
        let (tenant_part, rest) = self.dn.strip_prefix("uni/tn-")?.split_once("/ap-")?;
        let (app, rest) = rest.split_once("/epg-")?;
        let (epg, rest) = rest.split_once("/rspathAtt-[")?;
        let path = rest.strip_suffix(']')?;
        Some((tenant_part, app, epg, path))
    }
}

/// Controller object graph as returned by [`RemoteQuery::query_existing_objects`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FabricState {
    pub tenants: Vec<TenantRecord>,
    pub ports: Vec<PortRecord>,
    pub bundles: Vec<BundleRecord>,
    pub leaves: Vec<LeafRecord>,
    pub interface_profiles: Vec<String>,
    pub switch_profiles: Vec<SwitchProfileRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TenantRecord {
    pub name: String,
    pub vrfs: Vec<String>,
    pub bridge_domains: Vec<BridgeDomainRecord>,
    pub app_profiles: Vec<AppProfileRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeDomainRecord {
    pub name: String,
    pub vrf: Option<String>,
    pub subnets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppProfileRecord {
    pub name: String,
    pub epgs: Vec<EpgRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpgRecord {
    pub name: String,
    pub bridge_domain: Option<String>,
    pub paths: Vec<StaticPathRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticPathRecord {
    pub path: String,
    pub encap: String,
}

/// How an access port is consumed by interface policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortKind {
    Access,
    PortChannel,
    Vpc,
}

/// A leaf port with an interface policy group applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRecord {
    pub node: u32,
    /// `module/port`, e.g. `1/5`.
    pub port: String,
    pub kind: PortKind,
    pub policy_group: String,
}

/// A port-channel or vPC and the path DN EPGs bind to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleRecord {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafRecord {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchProfileRecord {
    pub name: String,
    pub interface_profiles: Vec<String>,
}

/// Parse the DN carried in a create request.
pub fn request_dn(attributes: &Attributes) -> Option<ObjectDn> {
    attributes.get("dn").and_then(|dn| ObjectDn::parse(dn))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_attachment_owner_keeps_nested_brackets() {
        let att = PathAttachment {
            dn: "uni/tn-PROD/ap-RED_ANP/epg-USERS_EPG/rspathAtt-[topology/pod-1/paths-101/pathep-[eth1/5]]".to_string(),
            encap: "vlan-10".to_string(),
        };
        assert_eq!(
            att.owner(),
            Some((
                "PROD",
                "RED_ANP",
                "USERS_EPG",
                "topology/pod-1/paths-101/pathep-[eth1/5]"
            ))
        );
    }

    #[test]
    fn encap_filter_expression() {
        let filter = InterfaceFilter::encap(10);
        assert_eq!(filter.expression(), "eq(fvRsPathAtt.encap,\"vlan-10\")");
    }

    #[test]
    fn fabric_state_tolerates_missing_sections() {
        let state: FabricState =
            serde_json::from_str(r#"{"tenants":[{"name":"PROD"}]}"#).expect("decode");
        assert_eq!(state.tenants[0].name, "PROD");
        assert!(state.ports.is_empty());
    }
}
