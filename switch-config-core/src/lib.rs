//! Line-oriented parsing of legacy switch running-configs into per-device
//! VLAN and interface inventories.

pub mod format;
pub mod inventory;
pub mod parser;
pub mod rules;

pub use format::{format_inventory_json, format_inventory_text, format_summary_text};
pub use inventory::{
    DeviceInventory, ExportRow, FabricInventory, InterfaceRecord, SkipReason, SkippedInterface,
    VlanCatalog, VrfSummary, L2_ONLY_DESCRIPTION,
};
pub use parser::{parse, parse_file, parse_with_options, ParseError, ParseOptions};
