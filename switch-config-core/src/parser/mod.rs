//! Running-config state machine.
//!
//! The parser walks the text once, line by line, in one of three states:
//! idle, inside a `vlan` block, or inside an `interface` block. Interface
//! lines feed an accumulator that is committed to the inventory when the
//! block ends (blank line, a new column-zero line, or end of input).

use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};

use crate::inventory::{DeviceInventory, InterfaceRecord, SkipReason, SkippedInterface};
use crate::rules::{self, prefix_len, svi_vlan_id, LineEvent, INTERFACE_RULES};

/// Errors that can occur while turning config text into a [`DeviceInventory`].
#[derive(Debug, Error)]
pub enum ParseError {
    /// Device names key the inventory and cannot be blank.
    #[error("device name must not be empty")]
    EmptyDeviceName,
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    /// The file path has no usable stem to name the device after.
    #[error("cannot derive a device name from {0}")]
    NoDeviceName(String),
}

/// Patterns marking transit/uplink interfaces that must not be migrated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// VLAN name prefix reserved for transit links.
    pub transit_prefix: String,
    /// Case-insensitive keyword looked for in descriptions.
    pub transit_keyword: String,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            transit_prefix: "TR-".to_string(),
            transit_keyword: "transit".to_string(),
        }
    }
}

enum State {
    Idle,
    InVlanBlock(u16),
    InInterfaceBlock(Accumulator),
}

#[derive(Debug, Default)]
struct Accumulator {
    name: String,
    vrf: String,
    description: Option<String>,
    ip_address: Option<String>,
    hsrp_group: Option<String>,
    hsrp_vip: Option<String>,
    access_vlan: Option<u16>,
    port_mode: Option<String>,
    trunk: Option<String>,
}

impl Accumulator {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    fn apply(&mut self, event: LineEvent<'_>) {
        match event {
            LineEvent::VrfMember(vrf) => self.vrf = vrf.to_string(),
            LineEvent::Description(text) => self.description = Some(text.to_string()),
            LineEvent::IpAddress(addr) => self.ip_address = Some(addr.to_string()),
            LineEvent::HsrpGroup(group) => self.hsrp_group = Some(group.to_string()),
            LineEvent::HsrpVip(vip) => self.hsrp_vip = Some(vip.to_string()),
            LineEvent::AccessVlan(id) => self.access_vlan = Some(id),
            LineEvent::PortMode(mode) => self.port_mode = Some(mode.to_string()),
            LineEvent::TrunkAllowed(list) => self.trunk = Some(list.to_string()),
            LineEvent::TrunkAllowedAdd(list) => match &mut self.trunk {
                Some(existing) => {
                    existing.push(',');
                    existing.push_str(list);
                }
                None => self.trunk = Some(list.to_string()),
            },
            LineEvent::VlanHeader(_)
            | LineEvent::VlanName(_)
            | LineEvent::InterfaceHeader(_)
            | LineEvent::BlockEnd => {}
        }
    }

    fn is_trunk(&self) -> bool {
        self.port_mode.as_deref() == Some("trunk")
    }
}

/// Parse config text with the default transit patterns.
pub fn parse(device: &str, text: &str) -> Result<DeviceInventory, ParseError> {
    parse_with_options(device, text, &ParseOptions::default())
}

/// Parse config text for `device`.
///
/// Unrecognised lines are ignored, so the only failure is a blank device name.
pub fn parse_with_options(
    device: &str,
    text: &str,
    opts: &ParseOptions,
) -> Result<DeviceInventory, ParseError> {
    let device = device.trim();
    if device.is_empty() {
        return Err(ParseError::EmptyDeviceName);
    }

    let mut inventory = DeviceInventory::new(device);
    let mut state = State::Idle;
    for line in text.lines() {
        state = step(state, line, &mut inventory, opts);
    }
    if let State::InInterfaceBlock(acc) = state {
        commit(acc, &mut inventory, opts);
    }

    debug!(
        device,
        interfaces = inventory.interface_count(),
        vlans = inventory.vlans.len(),
        skipped = inventory.skipped.len(),
        "parsed device config"
    );
    Ok(inventory)
}

/// Parse a config file; the device is named after the file stem.
pub fn parse_file(path: &Path, opts: &ParseOptions) -> Result<DeviceInventory, ParseError> {
    let device = path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ParseError::NoDeviceName(path.display().to_string()))?;
    let bytes = fs::read(path).map_err(|source| ParseError::Io {
        path: path.display().to_string(),
        source,
    })?;
    // Legacy configs regularly carry latin-1 descriptions.
    let text = String::from_utf8_lossy(&bytes);
    parse_with_options(device, &text, opts)
}

fn step(state: State, line: &str, inventory: &mut DeviceInventory, opts: &ParseOptions) -> State {
    if let Some(event) = rules::structural(line) {
        if let State::InInterfaceBlock(acc) = state {
            commit(acc, inventory, opts);
        }
        return match event {
            LineEvent::VlanHeader(id) => State::InVlanBlock(id),
            LineEvent::InterfaceHeader(name) => State::InInterfaceBlock(Accumulator::new(name)),
            _ => State::Idle,
        };
    }

    // Any other column-zero line opens a block we do not model.
    if !line.starts_with(char::is_whitespace) {
        if let State::InInterfaceBlock(acc) = state {
            commit(acc, inventory, opts);
        }
        return State::Idle;
    }

    match state {
        State::Idle => State::Idle,
        State::InVlanBlock(id) => {
            if let Some(LineEvent::VlanName(name)) = rules::vlan_name(line) {
                inventory.vlans.bind(id, name);
            }
            State::InVlanBlock(id)
        }
        State::InInterfaceBlock(mut acc) => {
            if let Some(event) = INTERFACE_RULES.iter().find_map(|rule| rule(line)) {
                acc.apply(event);
            }
            State::InInterfaceBlock(acc)
        }
    }
}

fn commit(acc: Accumulator, inventory: &mut DeviceInventory, opts: &ParseOptions) {
    let svi_vlan = svi_vlan_id(&acc.name);
    if let Some(id) = svi_vlan {
        inventory.vlans.mark_routed(id);
    }

    let catalog_name = svi_vlan
        .and_then(|id| inventory.vlans.name(id))
        .or_else(|| acc.access_vlan.and_then(|id| inventory.vlans.name(id)))
        .map(str::to_string);

    if let Some((reason, detail)) = transit_match(catalog_name.as_deref(), &acc, opts) {
        info!(
            device = %inventory.device,
            interface = %acc.name,
            %detail,
            "excluded transit interface"
        );
        inventory.skipped.push(SkippedInterface {
            interface: acc.name,
            vrf: acc.vrf,
            reason,
            detail,
        });
        return;
    }

    let l2_vlan_name = catalog_name.or_else(|| {
        if acc.is_trunk() {
            acc.trunk.clone()
        } else {
            None
        }
    });
    let hsrp_vip = acc.hsrp_vip.map(|vip| {
        match acc.ip_address.as_deref().and_then(prefix_len) {
            Some(len) => format!("{vip}/{len}"),
            None => vip,
        }
    });

    let record = InterfaceRecord {
        ip_address: acc.ip_address,
        description: acc.description,
        hsrp_group: acc.hsrp_group,
        hsrp_vip,
        l2_vlan_name,
        trunk_allowed_vlans: acc.trunk,
        access_vlan: acc.access_vlan,
        port_mode: acc.port_mode,
        svi_vlan,
    };
    inventory.commit(acc.vrf, acc.name, record);
}

fn transit_match(
    vlan_name: Option<&str>,
    acc: &Accumulator,
    opts: &ParseOptions,
) -> Option<(SkipReason, String)> {
    if let Some(name) = vlan_name {
        if !opts.transit_prefix.is_empty() && name.starts_with(&opts.transit_prefix) {
            return Some((SkipReason::TransitVlanName, name.to_string()));
        }
    }
    let keyword = opts.transit_keyword.to_lowercase();
    match acc.description.as_deref() {
        Some(text) if !keyword.is_empty() && text.to_lowercase().contains(&keyword) => {
            Some((SkipReason::TransitDescription, text.to_string()))
        }
        _ => None,
    }
}
