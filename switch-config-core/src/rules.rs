//! Line classification rules.
//!
//! Every rule is a pure function from one configuration line to an optional
//! [`LineEvent`]. The parser decides which rule set applies based on its
//! current block; a line no rule claims is simply ignored.

use std::sync::LazyLock;

use regex::Regex;

static VLAN_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^vlan\s+(\d+)\s*$").expect("valid regex"));
static VLAN_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+name\s+(\S.*?)\s*$").expect("valid regex"));
static INTERFACE_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^interface\s+(\S+)\s*$").expect("valid regex"));
static VRF_MEMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+vrf member\s+(\S+)").expect("valid regex"));
static DESCRIPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+description\s+(\S.*?)\s*$").expect("valid regex"));
static IP_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s+ip address\s+(\S+)(\s+secondary)?").expect("valid regex")
});
static HSRP_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+hsrp\s+(\d+)").expect("valid regex"));
static HSRP_VIP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s+ip\s+(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})\s*$").expect("valid regex")
});
static ACCESS_VLAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+switchport access vlan\s+(\d+)").expect("valid regex"));
static PORT_MODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+switchport mode\s+(\S+)").expect("valid regex"));
static TRUNK_ADD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s+switchport trunk allowed vlan add\s+(\S+)").expect("valid regex")
});
static TRUNK_SET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s+switchport trunk allowed vlan\s+(\d\S*)").expect("valid regex")
});
static SVI_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^vlan(\d+)$").expect("valid regex"));

/// A recognised configuration line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent<'a> {
    /// `vlan <id>` at column zero.
    VlanHeader(u16),
    /// `  name <name>` inside a VLAN block.
    VlanName(&'a str),
    /// `interface <name>` at column zero.
    InterfaceHeader(&'a str),
    /// Whitespace-only line; closes the current block.
    BlockEnd,
    VrfMember(&'a str),
    Description(&'a str),
    /// Primary interface address, with its prefix length as written.
    IpAddress(&'a str),
    HsrpGroup(&'a str),
    /// HSRP virtual address, without a mask.
    HsrpVip(&'a str),
    AccessVlan(u16),
    PortMode(&'a str),
    TrunkAllowed(&'a str),
    TrunkAllowedAdd(&'a str),
}

type Rule = for<'a> fn(&'a str) -> Option<LineEvent<'a>>;

/// Rules evaluated inside an interface block, first match wins.
///
/// `ip address` must be tried before the bare HSRP `ip` rule.
pub const INTERFACE_RULES: &[Rule] = &[
    vrf_member,
    description,
    ip_address,
    hsrp_group,
    hsrp_vip,
    access_vlan,
    port_mode,
    trunk_allowed_add,
    trunk_allowed,
];

/// Lines that open or close a block regardless of the current state.
pub fn structural(line: &str) -> Option<LineEvent<'_>> {
    if line.trim().is_empty() {
        return Some(LineEvent::BlockEnd);
    }
    vlan_header(line).or_else(|| interface_header(line))
}

pub fn vlan_header(line: &str) -> Option<LineEvent<'_>> {
    let caps = VLAN_HEADER.captures(line)?;
    let id = caps.get(1)?.as_str().parse::<u16>().ok()?;
    Some(LineEvent::VlanHeader(id))
}

pub fn vlan_name(line: &str) -> Option<LineEvent<'_>> {
    capture(&VLAN_NAME, line).map(LineEvent::VlanName)
}

pub fn interface_header(line: &str) -> Option<LineEvent<'_>> {
    capture(&INTERFACE_HEADER, line).map(LineEvent::InterfaceHeader)
}

pub fn vrf_member(line: &str) -> Option<LineEvent<'_>> {
    capture(&VRF_MEMBER, line).map(LineEvent::VrfMember)
}

pub fn description(line: &str) -> Option<LineEvent<'_>> {
    capture(&DESCRIPTION, line).map(LineEvent::Description)
}

pub fn ip_address(line: &str) -> Option<LineEvent<'_>> {
    let caps = IP_ADDRESS.captures(line)?;
    if caps.get(2).is_some() {
        return None;
    }
    Some(LineEvent::IpAddress(caps.get(1)?.as_str()))
}

pub fn hsrp_group(line: &str) -> Option<LineEvent<'_>> {
    capture(&HSRP_GROUP, line).map(LineEvent::HsrpGroup)
}

pub fn hsrp_vip(line: &str) -> Option<LineEvent<'_>> {
    capture(&HSRP_VIP, line).map(LineEvent::HsrpVip)
}

pub fn access_vlan(line: &str) -> Option<LineEvent<'_>> {
    let id = capture(&ACCESS_VLAN, line)?.parse::<u16>().ok()?;
    Some(LineEvent::AccessVlan(id))
}

pub fn port_mode(line: &str) -> Option<LineEvent<'_>> {
    capture(&PORT_MODE, line).map(LineEvent::PortMode)
}

pub fn trunk_allowed_add(line: &str) -> Option<LineEvent<'_>> {
    capture(&TRUNK_ADD, line).map(LineEvent::TrunkAllowedAdd)
}

pub fn trunk_allowed(line: &str) -> Option<LineEvent<'_>> {
    capture(&TRUNK_SET, line).map(LineEvent::TrunkAllowed)
}

/// VLAN id of a switched virtual interface name such as `Vlan10`.
pub fn svi_vlan_id(interface: &str) -> Option<u16> {
    SVI_NAME.captures(interface)?.get(1)?.as_str().parse().ok()
}

/// Prefix length of an address written as `a.b.c.d/len`.
pub fn prefix_len(address: &str) -> Option<u8> {
    let (_, len) = address.split_once('/')?;
    len.trim().parse().ok()
}

fn capture<'a>(re: &Regex, line: &'a str) -> Option<&'a str> {
    re.captures(line).and_then(|c| c.get(1)).map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(line: &str) -> Option<LineEvent<'_>> {
        INTERFACE_RULES.iter().find_map(|rule| rule(line))
    }

    #[test]
    fn headers_only_match_at_column_zero() {
        assert_eq!(vlan_header("vlan 10"), Some(LineEvent::VlanHeader(10)));
        assert_eq!(vlan_header("  vlan 10"), None);
        assert_eq!(vlan_header("vlan 1,10-20"), None);
        assert_eq!(
            interface_header("interface Ethernet1/5"),
            Some(LineEvent::InterfaceHeader("Ethernet1/5"))
        );
    }

    #[test]
    fn ip_address_wins_over_hsrp_vip() {
        assert_eq!(
            classify("  ip address 10.0.0.1/24"),
            Some(LineEvent::IpAddress("10.0.0.1/24"))
        );
        assert_eq!(
            classify("    ip 10.0.0.254"),
            Some(LineEvent::HsrpVip("10.0.0.254"))
        );
    }

    #[test]
    fn secondary_addresses_are_ignored() {
        assert_eq!(classify("  ip address 10.1.0.1/24 secondary"), None);
    }

    #[test]
    fn trunk_add_is_distinct_from_trunk_set() {
        assert_eq!(
            classify("  switchport trunk allowed vlan add 30-40"),
            Some(LineEvent::TrunkAllowedAdd("30-40"))
        );
        assert_eq!(
            classify("  switchport trunk allowed vlan 10,20"),
            Some(LineEvent::TrunkAllowed("10,20"))
        );
    }

    #[test]
    fn unknown_syntax_is_not_claimed() {
        assert_eq!(classify("  no shutdown"), None);
        assert_eq!(classify("  ip router ospf 1 area 0"), None);
        assert_eq!(structural("feature hsrp"), None);
    }

    #[test]
    fn svi_names_are_case_insensitive() {
        assert_eq!(svi_vlan_id("Vlan42"), Some(42));
        assert_eq!(svi_vlan_id("vlan7"), Some(7));
        assert_eq!(svi_vlan_id("Ethernet1/1"), None);
        assert_eq!(prefix_len("10.0.0.1/24"), Some(24));
        assert_eq!(prefix_len("10.0.0.1"), None);
    }
}
