//! Create payloads. Every payload carries its target `dn` plus the attributes
//! of that object class.

use crate::dn::ObjectDn;
use crate::remote::Attributes;
use crate::settings::FabricConfig;

/// Forwarding profile chosen once, when a bridge domain is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BdMode {
    /// No gateway: flood ARP and unknown unicast, no routing.
    L2,
    /// Gateway subnet: route, proxy unknown unicast, learn only in-subnet.
    L3,
}

impl BdMode {
    pub fn for_subnet(subnet: Option<&str>) -> Self {
        if subnet.is_some() {
            Self::L3
        } else {
            Self::L2
        }
    }
}

fn attrs<const N: usize>(dn: &ObjectDn, pairs: [(&str, &str); N]) -> Attributes {
    let mut out = Attributes::new();
    out.insert("dn".to_string(), dn.to_string());
    for (key, value) in pairs {
        out.insert(key.to_string(), value.to_string());
    }
    out
}

pub fn tenant(tenant: &str) -> Attributes {
    let dn = ObjectDn::Tenant {
        tenant: tenant.to_string(),
    };
    attrs(&dn, [("name", tenant)])
}

pub fn vrf(tenant: &str, vrf: &str, fabric: &FabricConfig) -> Attributes {
    let dn = ObjectDn::Vrf {
        tenant: tenant.to_string(),
        vrf: vrf.to_string(),
    };
    attrs(
        &dn,
        [("name", vrf), ("pcEnfPref", fabric.vrf_enforcement.as_str())],
    )
}

pub fn bridge_domain(tenant: &str, bd: &str, mode: BdMode) -> Attributes {
    let dn = ObjectDn::BridgeDomain {
        tenant: tenant.to_string(),
        bridge_domain: bd.to_string(),
    };
    match mode {
        BdMode::L2 => attrs(
            &dn,
            [
                ("name", bd),
                ("arpFlood", "yes"),
                ("multiDstPktAct", "bd-flood"),
                ("unkMcastAct", "flood"),
                ("unicastRoute", "no"),
                ("unkMacUcastAct", "flood"),
            ],
        ),
        BdMode::L3 => attrs(
            &dn,
            [
                ("name", bd),
                ("arpFlood", "no"),
                ("multiDstPktAct", "bd-flood"),
                ("unkMcastAct", "opt-flood"),
                ("unicastRoute", "yes"),
                ("unkMacUcastAct", "proxy"),
                ("limitIpLearnToSubnets", "yes"),
            ],
        ),
    }
}

pub fn vrf_binding(tenant: &str, bd: &str, vrf: &str) -> Attributes {
    let dn = ObjectDn::VrfBinding {
        tenant: tenant.to_string(),
        bridge_domain: bd.to_string(),
    };
    attrs(&dn, [("tnFvCtxName", vrf)])
}

pub fn subnet(
    tenant: &str,
    bd: &str,
    ip: &str,
    name: &str,
    scope: &str,
    fabric: &FabricConfig,
) -> Attributes {
    let dn = ObjectDn::Subnet {
        tenant: tenant.to_string(),
        bridge_domain: bd.to_string(),
        subnet: ip.to_string(),
    };
    let preferred = if fabric.subnet_preferred { "yes" } else { "no" };
    attrs(
        &dn,
        [
            ("ip", ip),
            ("name", name),
            ("scope", scope),
            ("preferred", preferred),
        ],
    )
}

pub fn app_profile(tenant: &str, app: &str) -> Attributes {
    let dn = ObjectDn::AppProfile {
        tenant: tenant.to_string(),
        app_profile: app.to_string(),
    };
    attrs(&dn, [("name", app)])
}

pub fn epg(tenant: &str, app: &str, epg: &str, bd: &str, description: &str) -> Attributes {
    let dn = ObjectDn::Epg {
        tenant: tenant.to_string(),
        app_profile: app.to_string(),
        epg: epg.to_string(),
    };
    attrs(
        &dn,
        [("name", epg), ("descr", description), ("tnFvBDName", bd)],
    )
}

pub fn static_path(
    tenant: &str,
    app: &str,
    epg: &str,
    path: &str,
    encap: &str,
    fabric: &FabricConfig,
) -> Attributes {
    let dn = ObjectDn::StaticPath {
        tenant: tenant.to_string(),
        app_profile: app.to_string(),
        epg: epg.to_string(),
        path: path.to_string(),
    };
    attrs(
        &dn,
        [
            ("tDn", path),
            ("encap", encap),
            ("instrImedcy", fabric.deploy_immediacy.as_str()),
            ("mode", "regular"),
        ],
    )
}

pub fn interface_profile(name: &str) -> Attributes {
    let dn = ObjectDn::InterfaceProfile {
        name: name.to_string(),
    };
    attrs(&dn, [("name", name)])
}

/// Switch profile with one selector spanning `from..=to`.
pub fn switch_profile(name: &str, selector: &str, from: u32, to: u32) -> Attributes {
    let dn = ObjectDn::SwitchProfile {
        name: name.to_string(),
    };
    let from = from.to_string();
    let to = to.to_string();
    attrs(
        &dn,
        [
            ("name", name),
            ("selector", selector),
            ("nodeFrom", from.as_str()),
            ("nodeTo", to.as_str()),
        ],
    )
}

pub fn profile_association(switch_profile: &str, interface_profile: &str) -> Attributes {
    let dn = ObjectDn::ProfileAssociation {
        switch_profile: switch_profile.to_string(),
        interface_profile: interface_profile.to_string(),
    };
    let target = ObjectDn::InterfaceProfile {
        name: interface_profile.to_string(),
    }
    .to_string();
    attrs(&dn, [("tDn", target.as_str())])
}
