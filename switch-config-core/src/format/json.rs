use crate::inventory::DeviceInventory;

/// Format device inventories as JSON.
pub fn format_inventory_json(inventories: &[DeviceInventory]) -> String {
    serde_json::to_string_pretty(inventories).unwrap_or_else(|_| "[]".to_string())
}
