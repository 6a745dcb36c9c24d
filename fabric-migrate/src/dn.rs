//! Distinguished names of controller objects and fabric paths.

use std::fmt::{self, Display, Formatter};
use std::sync::LazyLock;

use regex::Regex;

use crate::remote::ObjectKind;

static SINGLE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^topology/pod-(\d+)/paths-(\d+)/pathep-\[(.+)\]$").expect("valid regex")
});
static PROTECTED_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^topology/pod-(\d+)/protpaths-(\d+)-(\d+)/pathep-\[(.+)\]$").expect("valid regex")
});

/// DN of every object the migration creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectDn {
    Tenant {
        tenant: String,
    },
    Vrf {
        tenant: String,
        vrf: String,
    },
    BridgeDomain {
        tenant: String,
        bridge_domain: String,
    },
    VrfBinding {
        tenant: String,
        bridge_domain: String,
    },
    Subnet {
        tenant: String,
        bridge_domain: String,
        subnet: String,
    },
    AppProfile {
        tenant: String,
        app_profile: String,
    },
    Epg {
        tenant: String,
        app_profile: String,
        epg: String,
    },
    StaticPath {
        tenant: String,
        app_profile: String,
        epg: String,
        path: String,
    },
    InterfaceProfile {
        name: String,
    },
    SwitchProfile {
        name: String,
    },
    ProfileAssociation {
        switch_profile: String,
        interface_profile: String,
    },
}

impl ObjectDn {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Tenant { .. } => ObjectKind::Tenant,
            Self::Vrf { .. } => ObjectKind::Vrf,
            Self::BridgeDomain { .. } => ObjectKind::BridgeDomain,
            Self::VrfBinding { .. } => ObjectKind::VrfBinding,
            Self::Subnet { .. } => ObjectKind::Subnet,
            Self::AppProfile { .. } => ObjectKind::AppProfile,
            Self::Epg { .. } => ObjectKind::Epg,
            Self::StaticPath { .. } => ObjectKind::StaticPath,
            Self::InterfaceProfile { .. } => ObjectKind::InterfaceProfile,
            Self::SwitchProfile { .. } => ObjectKind::SwitchProfile,
            Self::ProfileAssociation { .. } => ObjectKind::ProfileAssociation,
        }
    }

    /// Parse a DN produced by [`Display`]. Bracketed segments may contain `/`.
    pub fn parse(dn: &str) -> Option<Self> {
        let segments = split_segments(dn);
        let (root, rest) = segments.split_first()?;
        if *root != "uni" {
            return None;
        }

        if let Some((first, tail)) = rest.split_first() {
            if let Some(tenant) = first.strip_prefix("tn-") {
                return parse_tenant_child(tenant.to_string(), tail);
            }
            if *first == "infra" {
                return parse_infra_child(tail);
            }
        }
        None
    }
}

fn parse_tenant_child(tenant: String, tail: &[&str]) -> Option<ObjectDn> {
    match tail {
        [] => Some(ObjectDn::Tenant { tenant }),
        [seg] => {
            if let Some(vrf) = seg.strip_prefix("ctx-") {
                Some(ObjectDn::Vrf {
                    tenant,
                    vrf: vrf.to_string(),
                })
            } else if let Some(bd) = seg.strip_prefix("BD-") {
                Some(ObjectDn::BridgeDomain {
                    tenant,
                    bridge_domain: bd.to_string(),
                })
            } else {
                seg.strip_prefix("ap-").map(|ap| ObjectDn::AppProfile {
                    tenant,
                    app_profile: ap.to_string(),
                })
            }
        }
        [bd_seg, child] => {
            if let Some(bd) = bd_seg.strip_prefix("BD-") {
                if *child == "rsctx" {
                    return Some(ObjectDn::VrfBinding {
                        tenant,
                        bridge_domain: bd.to_string(),
                    });
                }
                return bracketed(child, "subnet-").map(|subnet| ObjectDn::Subnet {
                    tenant,
                    bridge_domain: bd.to_string(),
                    subnet: subnet.to_string(),
                });
            }
            let ap = bd_seg.strip_prefix("ap-")?;
            let epg = child.strip_prefix("epg-")?;
            Some(ObjectDn::Epg {
                tenant,
                app_profile: ap.to_string(),
                epg: epg.to_string(),
            })
        }
        [ap_seg, epg_seg, path_seg] => Some(ObjectDn::StaticPath {
            tenant,
            app_profile: ap_seg.strip_prefix("ap-")?.to_string(),
            epg: epg_seg.strip_prefix("epg-")?.to_string(),
            path: bracketed(path_seg, "rspathAtt-")?.to_string(),
        }),
        _ => None,
    }
}

fn parse_infra_child(tail: &[&str]) -> Option<ObjectDn> {
    match tail {
        [seg] => {
            if let Some(name) = seg.strip_prefix("accportprof-") {
                Some(ObjectDn::InterfaceProfile {
                    name: name.to_string(),
                })
            } else {
                seg.strip_prefix("nprof-").map(|name| ObjectDn::SwitchProfile {
                    name: name.to_string(),
                })
            }
        }
        [profile_seg, rel] => {
            let switch_profile = profile_seg.strip_prefix("nprof-")?.to_string();
            match ObjectDn::parse(bracketed(rel, "rsaccPortP-")?)? {
                ObjectDn::InterfaceProfile { name } => Some(ObjectDn::ProfileAssociation {
                    switch_profile,
                    interface_profile: name,
                }),
                _ => None,
            }
        }
        _ => None,
    }
}

impl Display for ObjectDn {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tenant { tenant } => write!(f, "uni/tn-{tenant}"),
            Self::Vrf { tenant, vrf } => write!(f, "uni/tn-{tenant}/ctx-{vrf}"),
            Self::BridgeDomain {
                tenant,
                bridge_domain,
            } => write!(f, "uni/tn-{tenant}/BD-{bridge_domain}"),
            Self::VrfBinding {
                tenant,
                bridge_domain,
            } => write!(f, "uni/tn-{tenant}/BD-{bridge_domain}/rsctx"),
            Self::Subnet {
                tenant,
                bridge_domain,
                subnet,
            } => write!(f, "uni/tn-{tenant}/BD-{bridge_domain}/subnet-[{subnet}]"),
            Self::AppProfile {
                tenant,
                app_profile,
            } => write!(f, "uni/tn-{tenant}/ap-{app_profile}"),
            Self::Epg {
                tenant,
                app_profile,
                epg,
            } => write!(f, "uni/tn-{tenant}/ap-{app_profile}/epg-{epg}"),
            Self::StaticPath {
                tenant,
                app_profile,
                epg,
                path,
            } => write!(
                f,
                "uni/tn-{tenant}/ap-{app_profile}/epg-{epg}/rspathAtt-[{path}]"
            ),
            Self::InterfaceProfile { name } => write!(f, "uni/infra/accportprof-{name}"),
            Self::SwitchProfile { name } => write!(f, "uni/infra/nprof-{name}"),
            Self::ProfileAssociation {
                switch_profile,
                interface_profile,
            } => write!(
                f,
                "uni/infra/nprof-{switch_profile}/rsaccPortP-[uni/infra/accportprof-{interface_profile}]"
            ),
        }
    }
}

/// Fabric path an EPG can be statically bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathDn {
    /// One leaf: a physical port or a port-channel.
    Single {
        pod: u32,
        node: u32,
        endpoint: String,
    },
    /// A vPC spanning two leaves.
    Protected {
        pod: u32,
        nodes: (u32, u32),
        endpoint: String,
    },
}

impl PathDn {
    pub fn access_port(pod: u32, node: u32, module: u32, port: u32) -> Self {
        Self::Single {
            pod,
            node,
            endpoint: format!("eth{module}/{port}"),
        }
    }

    pub fn parse(dn: &str) -> Option<Self> {
        if let Some(caps) = SINGLE_PATH.captures(dn) {
            return Some(Self::Single {
                pod: caps[1].parse().ok()?,
                node: caps[2].parse().ok()?,
                endpoint: caps[3].to_string(),
            });
        }
        let caps = PROTECTED_PATH.captures(dn)?;
        Some(Self::Protected {
            pod: caps[1].parse().ok()?,
            nodes: (caps[2].parse().ok()?, caps[3].parse().ok()?),
            endpoint: caps[4].to_string(),
        })
    }

    /// Short human form, e.g. `101 eth1/5` or `113-114 vPC_DB`.
    pub fn label(&self) -> String {
        match self {
            Self::Single { node, endpoint, .. } => format!("{node} {endpoint}"),
            Self::Protected {
                nodes: (a, b),
                endpoint,
                ..
            } => format!("{a}-{b} {endpoint}"),
        }
    }
}

impl Display for PathDn {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single {
                pod,
                node,
                endpoint,
            } => write!(f, "topology/pod-{pod}/paths-{node}/pathep-[{endpoint}]"),
            Self::Protected {
                pod,
                nodes: (a, b),
                endpoint,
            } => write!(f, "topology/pod-{pod}/protpaths-{a}-{b}/pathep-[{endpoint}]"),
        }
    }
}

fn bracketed<'a>(segment: &'a str, prefix: &str) -> Option<&'a str> {
    segment
        .strip_prefix(prefix)?
        .strip_prefix('[')?
        .strip_suffix(']')
}

/// Split on `/` outside of `[...]`.
fn split_segments(dn: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, ch) in dn.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '/' if depth == 0 => {
                out.push(&dn[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    out.push(&dn[start..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(dn: ObjectDn) {
        let text = dn.to_string();
        assert_eq!(ObjectDn::parse(&text), Some(dn), "{text}");
    }

    #[test]
    fn tenant_tree_dns_parse_back() {
        let tenant = "PROD".to_string();
        round_trip(ObjectDn::Tenant {
            tenant: tenant.clone(),
        });
        round_trip(ObjectDn::VrfBinding {
            tenant: tenant.clone(),
            bridge_domain: "USERS_BD".to_string(),
        });
        round_trip(ObjectDn::Subnet {
            tenant: tenant.clone(),
            bridge_domain: "USERS_BD".to_string(),
            subnet: "10.0.0.1/24".to_string(),
        });
        round_trip(ObjectDn::StaticPath {
            tenant,
            app_profile: "RED_ANP".to_string(),
            epg: "USERS_EPG".to_string(),
            path: "topology/pod-1/paths-101/pathep-[eth1/5]".to_string(),
        });
    }

    #[test]
    fn profile_association_nests_interface_profile_dn() {
        let dn = ObjectDn::ProfileAssociation {
            switch_profile: "Leaf-101_LeafProf".to_string(),
            interface_profile: "Leaf-101_IntProf".to_string(),
        };
        assert_eq!(
            dn.to_string(),
            "uni/infra/nprof-Leaf-101_LeafProf/rsaccPortP-[uni/infra/accportprof-Leaf-101_IntProf]"
        );
        round_trip(dn);
    }

    #[test]
    fn foreign_dns_are_rejected() {
        assert_eq!(ObjectDn::parse("topology/pod-1/node-101"), None);
        assert_eq!(ObjectDn::parse("uni/tn-PROD/out-WAN"), None);
    }

    #[test]
    fn path_dns_parse_single_and_protected() {
        let vpc = PathDn::parse("topology/pod-1/protpaths-113-114/pathep-[vPC_DB_PolGrp]")
            .expect("vpc path");
        assert_eq!(vpc.label(), "113-114 vPC_DB_PolGrp");

        let port = PathDn::access_port(1, 101, 1, 5);
        assert_eq!(port.to_string(), "topology/pod-1/paths-101/pathep-[eth1/5]");
        assert_eq!(PathDn::parse(&port.to_string()), Some(port));
        assert_eq!(PathDn::parse("topology/pod-1/node-101"), None);
    }
}
