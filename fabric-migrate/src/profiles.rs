//! Per-leaf and per-pair access profiles.
//!
//! Every leaf gets `Leaf-<id>_IntProf` and `Leaf-<id>_LeafProf`; leaves taken
//! two at a time in node id order also get `Leaf-<a>-<b>_...` profiles for
//! vPC pairs. A switch profile carries one selector over its nodes and is
//! associated with the interface profile of the same name.

use crate::engine::{Gate, ReconcileReport, Reconciler};
use crate::payload;
use crate::remote::{ObjectKind, RemoteCommand};
use crate::snapshot::FabricSnapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafProfiles {
    pub interface_profile: String,
    pub switch_profile: String,
    pub selector: String,
    pub node_from: u32,
    pub node_to: u32,
}

impl LeafProfiles {
    fn named(prefix: String, node_from: u32, node_to: u32) -> Self {
        Self {
            interface_profile: format!("{prefix}_IntProf"),
            switch_profile: format!("{prefix}_LeafProf"),
            selector: format!("{prefix}_SwSel"),
            node_from,
            node_to,
        }
    }

    pub fn single(node: u32) -> Self {
        Self::named(format!("Leaf-{node}"), node, node)
    }

    pub fn pair(first: u32, second: u32) -> Self {
        Self::named(format!("Leaf-{first}-{second}"), first, second)
    }
}

/// Profiles the fabric's leaves call for: singles first, then pairs. An odd
/// leaf out gets no pair profile.
pub fn expected_profiles(snapshot: &FabricSnapshot) -> Vec<LeafProfiles> {
    let ids: Vec<u32> = snapshot.leaves().map(|(id, _)| id).collect();
    let singles = ids.iter().map(|id| LeafProfiles::single(*id));
    let pairs = ids
        .chunks_exact(2)
        .map(|pair| LeafProfiles::pair(pair[0], pair[1]));
    singles.chain(pairs).collect()
}

/// Create missing interface profiles, then missing switch profiles and their
/// interface-profile associations.
pub fn reconcile_switch_profiles(
    snapshot: &mut FabricSnapshot,
    remote: &mut dyn RemoteCommand,
) -> ReconcileReport {
    let expected = expected_profiles(snapshot);
    let mut run = Reconciler::new(snapshot, remote);

    let interface_gates: Vec<Gate> = expected
        .iter()
        .map(|p| {
            let name = p.interface_profile.as_str();
            run.ensure(
                None,
                ObjectKind::InterfaceProfile,
                name,
                run.snapshot().has_interface_profile(name),
                Ok(()),
                || payload::interface_profile(name),
                |s| s.record_interface_profile(name),
            )
        })
        .collect();

    for (profiles, interface_gate) in expected.iter().zip(interface_gates) {
        let switch = profiles.switch_profile.as_str();
        let interface = profiles.interface_profile.as_str();
        let switch_gate = run.ensure(
            None,
            ObjectKind::SwitchProfile,
            switch,
            run.snapshot().has_switch_profile(switch),
            Ok(()),
            || {
                payload::switch_profile(
                    switch,
                    &profiles.selector,
                    profiles.node_from,
                    profiles.node_to,
                )
            },
            |s| s.record_switch_profile(switch),
        );
        let _ = run.ensure(
            None,
            ObjectKind::ProfileAssociation,
            &format!("{switch} -> {interface}"),
            run.snapshot().has_profile_association(switch, interface),
            switch_gate.and(interface_gate),
            || payload::profile_association(switch, interface),
            |s| s.record_profile_association(switch, interface),
        );
    }

    run.finish()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::engine::{CreateFailure, OutcomeStatus};
    use crate::offline::OfflineFabric;
    use crate::test_support::fabric_state;

    #[test]
    fn leaves_pair_up_in_id_order() {
        let snapshot = FabricSnapshot::from_state(&fabric_state());
        let names: Vec<String> = expected_profiles(&snapshot)
            .into_iter()
            .map(|p| p.switch_profile)
            .collect();
        assert_eq!(
            names,
            vec![
                "Leaf-101_LeafProf",
                "Leaf-102_LeafProf",
                "Leaf-103_LeafProf",
                "Leaf-101-102_LeafProf",
            ]
        );
        assert_eq!(LeafProfiles::pair(101, 102).selector, "Leaf-101-102_SwSel");
    }

    #[test]
    fn missing_profiles_are_created_once() {
        let mut fabric = OfflineFabric::new(fabric_state());
        let mut snapshot = FabricSnapshot::from_state(fabric.state());

        let first = reconcile_switch_profiles(&mut snapshot, &mut fabric);
        // Leaf-101 is fully provisioned in the fixture.
        assert_eq!(first.already_exists(), 3);
        assert_eq!(first.created(), 9);
        assert_eq!(snapshot, FabricSnapshot::from_state(fabric.state()));

        let creates = fabric.journal().len();
        let second = reconcile_switch_profiles(&mut snapshot, &mut fabric);
        assert_eq!(second.created(), 0);
        assert_eq!(second.already_exists(), 12);
        assert_eq!(fabric.journal().len(), creates);
    }

    #[test]
    fn association_waits_for_its_interface_profile() {
        let mut fabric = OfflineFabric::new(fabric_state()).reject(["Leaf-102_IntProf"]);
        let mut snapshot = FabricSnapshot::from_state(fabric.state());

        let report = reconcile_switch_profiles(&mut snapshot, &mut fabric);
        let association = report
            .outcomes
            .iter()
            .find(|o| o.name == "Leaf-102_LeafProf -> Leaf-102_IntProf")
            .expect("association outcome");
        assert_eq!(
            association.status,
            OutcomeStatus::Failed(CreateFailure::DependencyFailed(
                ObjectKind::InterfaceProfile
            ))
        );
        assert!(snapshot.has_switch_profile("Leaf-102_LeafProf"));
    }
}
