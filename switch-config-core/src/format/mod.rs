//! Inventory output formatters.

pub mod json;
pub mod text;

pub use json::format_inventory_json;
pub use text::{format_inventory_text, format_summary_text};
