use crate::inventory::{DeviceInventory, VrfSummary};

/// Format the tabular export of one device, one `|`-separated row per line.
pub fn format_inventory_text(inventory: &DeviceInventory) -> String {
    let mut lines = Vec::new();
    lines.push("device|vrf|interface|l2 vlan name|ip address|hsrp grp|hsrp vip|description".to_string());
    for row in inventory.export_rows() {
        lines.push(format!(
            "{}|{}|{}|{}|{}|{}|{}|{}",
            row.device,
            row.vrf,
            row.interface,
            row.l2_vlan_name,
            row.ip_address,
            row.hsrp_group,
            row.hsrp_vip,
            row.description
        ));
    }
    for skipped in &inventory.skipped {
        lines.push(format!(
            "# skipped {} vrf={} ({})",
            skipped.interface, skipped.vrf, skipped.detail
        ));
    }
    lines.join("\n")
}

/// Format per-VRF summary lines.
pub fn format_summary_text(rows: &[VrfSummary]) -> String {
    rows.iter()
        .map(|row| {
            format!(
                "device={} vrf={} interfaces={} host_addresses={}",
                row.device,
                if row.vrf.is_empty() { "-" } else { &row.vrf },
                row.interfaces,
                row.host_addresses
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn text_export_lists_skipped_interfaces_last() {
        let inv = parse(
            "sw1",
            "interface Vlan9\n  description transit link\n\ninterface Vlan10\n  ip address 10.0.0.1/24\n\n",
        )
        .expect("parse");
        let out = format_inventory_text(&inv);
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines[1], "sw1||Vlan10||10.0.0.1/24|||");
        assert_eq!(lines[2], "# skipped Vlan9 vrf= (transit link)");
    }

    #[test]
    fn summary_marks_global_vrf() {
        let rows = vec![VrfSummary {
            device: "sw1".to_string(),
            vrf: String::new(),
            interfaces: 2,
            host_addresses: 512,
        }];
        assert_eq!(
            format_summary_text(&rows),
            "device=sw1 vrf=- interfaces=2 host_addresses=512"
        );
    }
}
