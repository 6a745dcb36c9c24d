//! Typed desired-state rows.
//!
//! A [`DesiredRow`] is what survives the structural pass of the validator:
//! every name resolved, the VLAN parsed and every interface line turned into
//! an [`InterfaceBinding`].

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::Serialize;

use crate::dn::PathDn;
use crate::settings::NamingConfig;

/// Subnet scope requested by a row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteType {
    #[default]
    Private,
    Public,
    Shared,
}

impl RouteType {
    /// Value of the subnet `scope` attribute.
    pub fn scope(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Public => "public",
            Self::Shared => "shared",
        }
    }
}

impl FromStr for RouteType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "private" => Ok(Self::Private),
            "public" => Ok(Self::Public),
            "shared" => Ok(Self::Shared),
            other => Err(format!(
                "route type `{other}` must be one of private, public, shared"
            )),
        }
    }
}

/// Access VLAN id in `1..=4094`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct VlanId(u16);

impl VlanId {
    pub const MIN: u16 = 1;
    pub const MAX: u16 = 4094;

    pub fn new(id: u16) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&id).then_some(Self(id))
    }

    pub fn get(self) -> u16 {
        self.0
    }

    /// Encapsulation string used on static paths, e.g. `vlan-10`.
    pub fn encap(self) -> String {
        format!("vlan-{}", self.0)
    }
}

impl FromStr for VlanId {
    type Err = String;

    /// Accepts `Vlan10` (any case) or a bare `10`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let digits = match trimmed.get(..4) {
            Some(prefix) if prefix.eq_ignore_ascii_case("vlan") => &trimmed[4..],
            _ => trimmed,
        };
        let id: u16 = digits
            .parse()
            .map_err(|_| format!("vlan `{trimmed}` must be Vlan<id> or <id>"))?;
        Self::new(id).ok_or_else(|| {
            format!(
                "vlan id {id} out of range {}..={}",
                Self::MIN,
                Self::MAX
            )
        })
    }
}

impl Display for VlanId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Vlan{}", self.0)
    }
}

/// Where an EPG gets statically bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InterfaceBinding {
    /// `eth,pod,node,module,port`.
    Port {
        media: String,
        pod: u32,
        node: u32,
        module: u32,
        port: u32,
    },
    /// A port-channel or vPC policy group name.
    Bundle { name: String },
}

impl InterfaceBinding {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        if !line.contains(',') {
            return Ok(Self::Bundle {
                name: line.to_string(),
            });
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let malformed =
            || format!("interface `{line}` must be a bundle name or `eth,pod,node,module,port`");
        let [media, pod, node, module, port] = fields.as_slice() else {
            return Err(malformed());
        };
        if media.is_empty() {
            return Err(malformed());
        }
        let number = |field: &str| field.parse::<u32>().map_err(|_| malformed());
        Ok(Self::Port {
            media: media.to_string(),
            pod: number(*pod)?,
            node: number(*node)?,
            module: number(*module)?,
            port: number(*port)?,
        })
    }

    /// Path DN for a physical port. Bundles resolve through the fabric's
    /// bundle map instead.
    pub fn port_path(&self) -> Option<PathDn> {
        match self {
            Self::Port {
                pod,
                node,
                module,
                port,
                ..
            } => Some(PathDn::access_port(*pod, *node, *module, *port)),
            Self::Bundle { .. } => None,
        }
    }
}

impl Display for InterfaceBinding {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Port {
                media,
                pod,
                node,
                module,
                port,
            } => write!(f, "{media},{pod},{node},{module},{port}"),
            Self::Bundle { name } => f.write_str(name),
        }
    }
}

/// One migration unit with every object name resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DesiredRow {
    /// Sheet row number; the header is row 1.
    pub row: usize,
    pub device: Option<String>,
    pub tenant: String,
    pub vrf: String,
    pub vlan: VlanId,
    pub l2_name: String,
    pub bridge_domain: String,
    pub app_profile: String,
    pub epg: String,
    /// Gateway address with mask, e.g. `10.0.0.1/24`.
    pub subnet: Option<String>,
    pub subnet_name: String,
    pub route_type: RouteType,
    pub description: String,
    pub bindings: Vec<InterfaceBinding>,
}

impl DesiredRow {
    /// Row with derived names and no subnet or bindings.
    pub fn new(
        row: usize,
        tenant: &str,
        vrf: &str,
        vlan: VlanId,
        l2_name: &str,
        naming: &NamingConfig,
    ) -> Self {
        Self {
            row,
            device: None,
            tenant: tenant.to_string(),
            vrf: vrf.to_string(),
            vlan,
            l2_name: l2_name.to_string(),
            bridge_domain: naming.bridge_domain(l2_name),
            app_profile: naming.app_profile(vrf),
            epg: naming.epg(l2_name),
            subnet: None,
            subnet_name: naming.subnet(l2_name),
            route_type: RouteType::default(),
            description: String::new(),
            bindings: Vec::new(),
        }
    }
}
