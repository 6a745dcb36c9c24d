use crate::remote::FabricState;
use crate::table::TableRow;

pub(crate) fn fabric_state() -> FabricState {
    let raw = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../fixtures/fabric.json"));
    serde_json::from_str(raw).expect("fixture fabric state")
}

pub(crate) fn table_row(row: usize, tenant: &str, vrf: &str, vlan: &str, l2: &str) -> TableRow {
    let cell = |value: &str| (!value.is_empty()).then(|| value.to_string());
    TableRow {
        row,
        tenant: cell(tenant),
        vrf: cell(vrf),
        vlan_number: cell(vlan),
        l2_vlan_name: cell(l2),
        ..TableRow::default()
    }
}
