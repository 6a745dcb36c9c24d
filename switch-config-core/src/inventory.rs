use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::rules::prefix_len;

/// Layer-3 and layer-2 facts collected for one interface block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InterfaceRecord {
    pub ip_address: Option<String>,
    pub description: Option<String>,
    pub hsrp_group: Option<String>,
    /// Virtual address carrying the interface address mask, e.g. `10.0.0.254/24`.
    pub hsrp_vip: Option<String>,
    /// VLAN name of the SVI or access VLAN, or the trunk list on trunk ports.
    pub l2_vlan_name: Option<String>,
    pub trunk_allowed_vlans: Option<String>,
    pub access_vlan: Option<u16>,
    pub port_mode: Option<String>,
    /// Set for `VlanN` interfaces.
    pub svi_vlan: Option<u16>,
}

impl InterfaceRecord {
    /// Gateway address the fabric should take over: the HSRP VIP when present,
    /// the interface address otherwise.
    pub fn gateway(&self) -> Option<&str> {
        self.hsrp_vip.as_deref().or(self.ip_address.as_deref())
    }
}

/// VLAN id → name for one device, with the VLANs never bound to an SVI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VlanCatalog {
    names: BTreeMap<u16, String>,
    l2_only: BTreeSet<u16>,
}

impl VlanCatalog {
    pub fn name(&self, id: u16) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &str)> {
        self.names.iter().map(|(id, name)| (*id, name.as_str()))
    }

    /// Named VLANs that no routed interface claimed, in ascending id order.
    pub fn l2_only(&self) -> impl Iterator<Item = (u16, &str)> {
        self.l2_only
            .iter()
            .filter_map(|id| self.names.get(id).map(|name| (*id, name.as_str())))
    }

    pub fn is_l2_only(&self, id: u16) -> bool {
        self.l2_only.contains(&id)
    }

    pub(crate) fn bind(&mut self, id: u16, name: &str) {
        self.names.insert(id, name.to_string());
        self.l2_only.insert(id);
    }

    pub(crate) fn mark_routed(&mut self, id: u16) {
        self.l2_only.remove(&id);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Bound VLAN name carries the transit prefix.
    TransitVlanName,
    /// Description mentions the transit keyword.
    TransitDescription,
}

/// An interface block deliberately left out of the inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedInterface {
    pub interface: String,
    pub vrf: String,
    pub reason: SkipReason,
    pub detail: String,
}

/// Everything parsed from one device configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceInventory {
    pub device: String,
    /// VRF → interface → record. The empty VRF name holds interfaces with no
    /// `vrf member` line.
    pub vrfs: BTreeMap<String, BTreeMap<String, InterfaceRecord>>,
    pub vlans: VlanCatalog,
    pub skipped: Vec<SkippedInterface>,
}

impl DeviceInventory {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            ..Self::default()
        }
    }

    pub fn vrf(&self, vrf: &str) -> Option<&BTreeMap<String, InterfaceRecord>> {
        self.vrfs.get(vrf)
    }

    pub fn interface(&self, vrf: &str, interface: &str) -> Option<&InterfaceRecord> {
        self.vrfs.get(vrf)?.get(interface)
    }

    pub fn interface_count(&self) -> usize {
        self.vrfs.values().map(BTreeMap::len).sum()
    }

    /// Locate the SVI routing `vlan`, returning its VRF and record.
    pub fn find_svi(&self, vlan: u16) -> Option<(&str, &InterfaceRecord)> {
        self.vrfs.iter().find_map(|(vrf, interfaces)| {
            interfaces
                .values()
                .find(|record| record.svi_vlan == Some(vlan))
                .map(|record| (vrf.as_str(), record))
        })
    }

    /// Whether the device declares or routes `vlan`.
    pub fn knows_vlan(&self, vlan: u16) -> bool {
        self.vlans.name(vlan).is_some() || self.find_svi(vlan).is_some()
    }

    pub(crate) fn commit(&mut self, vrf: String, interface: String, record: InterfaceRecord) {
        self.vrfs.entry(vrf).or_default().insert(interface, record);
    }

    /// Per-VRF interface counts and host address totals.
    pub fn summary(&self) -> Vec<VrfSummary> {
        self.vrfs
            .iter()
            .map(|(vrf, interfaces)| VrfSummary {
                device: self.device.clone(),
                vrf: vrf.clone(),
                interfaces: interfaces.len(),
                host_addresses: interfaces
                    .values()
                    .filter_map(|r| r.ip_address.as_deref())
                    .filter_map(ipv4_block_size)
                    .sum(),
            })
            .collect()
    }

    /// Flatten into tabular rows: interfaces first, then L2-only VLANs.
    pub fn export_rows(&self) -> Vec<ExportRow> {
        let mut rows = Vec::with_capacity(self.interface_count() + self.vlans.len());
        for (vrf, interfaces) in &self.vrfs {
            for (name, record) in interfaces {
                rows.push(ExportRow {
                    device: self.device.clone(),
                    vrf: vrf.clone(),
                    interface: name.clone(),
                    l2_vlan_name: record.l2_vlan_name.clone().unwrap_or_default(),
                    ip_address: record.ip_address.clone().unwrap_or_default(),
                    hsrp_group: record.hsrp_group.clone().unwrap_or_default(),
                    hsrp_vip: record.hsrp_vip.clone().unwrap_or_default(),
                    description: record.description.clone().unwrap_or_default(),
                });
            }
        }
        for (id, name) in self.vlans.l2_only() {
            rows.push(ExportRow {
                device: self.device.clone(),
                vrf: String::new(),
                interface: id.to_string(),
                l2_vlan_name: name.to_string(),
                ip_address: String::new(),
                hsrp_group: String::new(),
                hsrp_vip: String::new(),
                description: L2_ONLY_DESCRIPTION.to_string(),
            });
        }
        rows
    }
}

pub const L2_ONLY_DESCRIPTION: &str = "L2 only vlan";

/// One line of the tabular inventory export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub device: String,
    pub vrf: String,
    pub interface: String,
    pub l2_vlan_name: String,
    pub ip_address: String,
    pub hsrp_group: String,
    pub hsrp_vip: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VrfSummary {
    pub device: String,
    pub vrf: String,
    pub interfaces: usize,
    pub host_addresses: u64,
}

/// Inventories for several devices keyed by device name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FabricInventory {
    pub devices: BTreeMap<String, DeviceInventory>,
}

impl FabricInventory {
    pub fn insert(&mut self, inventory: DeviceInventory) {
        self.devices.insert(inventory.device.clone(), inventory);
    }

    pub fn get(&self, device: &str) -> Option<&DeviceInventory> {
        self.devices.get(device)
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceInventory> {
        self.devices.values()
    }

    /// First SVI routing `vlan` on any device.
    pub fn find_svi(&self, vlan: u16) -> Option<(&str, &InterfaceRecord)> {
        self.devices
            .values()
            .find_map(|inv| inv.find_svi(vlan).map(|(_, record)| (inv.device.as_str(), record)))
    }

    pub fn knows_vlan(&self, vlan: u16) -> bool {
        self.devices.values().any(|inv| inv.knows_vlan(vlan))
    }
}

impl FromIterator<DeviceInventory> for FabricInventory {
    fn from_iter<T: IntoIterator<Item = DeviceInventory>>(iter: T) -> Self {
        let mut out = Self::default();
        for inventory in iter {
            out.insert(inventory);
        }
        out
    }
}

/// Addresses covered by an IPv4 prefix, `None` for IPv6 or unmasked values.
fn ipv4_block_size(address: &str) -> Option<u64> {
    if !address.contains('.') {
        return None;
    }
    let len = prefix_len(address)?;
    (len <= 32).then(|| 1u64 << (32 - u32::from(len)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_size_follows_prefix_length() {
        assert_eq!(ipv4_block_size("10.0.0.1/24"), Some(256));
        assert_eq!(ipv4_block_size("10.0.0.1/32"), Some(1));
        assert_eq!(ipv4_block_size("10.0.0.1"), None);
        assert_eq!(ipv4_block_size("2001:db8::1/64"), None);
    }

    #[test]
    fn l2_only_drops_routed_vlans() {
        let mut catalog = VlanCatalog::default();
        catalog.bind(10, "USERS");
        catalog.bind(20, "PRINTERS");
        catalog.mark_routed(10);

        let l2: Vec<_> = catalog.l2_only().collect();
        assert_eq!(l2, vec![(20, "PRINTERS")]);
        assert_eq!(catalog.name(10), Some("USERS"));
    }

    #[test]
    fn gateway_prefers_hsrp_vip() {
        let record = InterfaceRecord {
            ip_address: Some("10.0.0.2/24".to_string()),
            hsrp_vip: Some("10.0.0.1/24".to_string()),
            ..InterfaceRecord::default()
        };
        assert_eq!(record.gateway(), Some("10.0.0.1/24"));
    }
}
