//! Idempotent reconciliation of desired rows against the fabric.
//!
//! Each row is walked in dependency order: tenant, VRF, bridge domain, VRF
//! binding, subnet, application profile, EPG and static paths. Objects the
//! snapshot already knows are reported as existing and never re-created.
//! A failed create fails every object of the same row that depends on it;
//! other rows carry on. Nothing is rolled back.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::desired::{DesiredRow, InterfaceBinding};
use crate::dn::PathDn;
use crate::payload::{self, BdMode};
use crate::remote::{Attributes, ObjectKind, RemoteCommand, STATUS_OK};
use crate::settings::MigrationConfig;
use crate::snapshot::FabricSnapshot;
use crate::validate::RowWarning;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum CreateFailure {
    #[error("controller answered {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("not attempted, {0} failed")]
    DependencyFailed(ObjectKind),
    #[error("no fabric path for {0}")]
    UnknownPath(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "failure", rename_all = "snake_case")]
pub enum OutcomeStatus {
    AlreadyExists,
    Created,
    Failed(CreateFailure),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    /// Table row, `None` for fabric-wide objects such as switch profiles.
    pub row: Option<usize>,
    pub kind: ObjectKind,
    pub name: String,
    pub status: OutcomeStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub outcomes: Vec<Outcome>,
    pub warnings: Vec<RowWarning>,
}

impl ReconcileReport {
    pub fn created(&self) -> usize {
        self.count(|s| matches!(s, OutcomeStatus::Created))
    }

    pub fn already_exists(&self) -> usize {
        self.count(|s| matches!(s, OutcomeStatus::AlreadyExists))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, OutcomeStatus::Failed(_)))
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    fn count(&self, pred: impl Fn(&OutcomeStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

/// `Err` carries the kind of the object whose create failed upstream.
pub(crate) type Gate = Result<(), ObjectKind>;

/// Shared create-or-skip bookkeeping for the engines.
pub(crate) struct Reconciler<'a> {
    snapshot: &'a mut FabricSnapshot,
    remote: &'a mut dyn RemoteCommand,
    report: ReconcileReport,
}

impl<'a> Reconciler<'a> {
    pub(crate) fn new(snapshot: &'a mut FabricSnapshot, remote: &'a mut dyn RemoteCommand) -> Self {
        Self {
            snapshot,
            remote,
            report: ReconcileReport::default(),
        }
    }

    pub(crate) fn snapshot(&self) -> &FabricSnapshot {
        self.snapshot
    }

    pub(crate) fn warn(&mut self, warning: RowWarning) {
        warn!(row = warning.row, code = warning.code, "{}", warning.message);
        self.report.warnings.push(warning);
    }

    /// Report an existing object, or create it when `gate` allows and record
    /// it in the snapshot once the controller confirms.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn ensure(
        &mut self,
        row: Option<usize>,
        kind: ObjectKind,
        name: &str,
        exists: bool,
        gate: Gate,
        attributes: impl FnOnce() -> Attributes,
        record: impl FnOnce(&mut FabricSnapshot),
    ) -> Gate {
        if exists {
            debug!(?row, %kind, object = name, "already exists");
            self.push(row, kind, name, OutcomeStatus::AlreadyExists);
            return Ok(());
        }
        if let Err(upstream) = gate {
            debug!(?row, %kind, object = name, %upstream, "skipped after upstream failure");
            self.push(
                row,
                kind,
                name,
                OutcomeStatus::Failed(CreateFailure::DependencyFailed(upstream)),
            );
            return Err(upstream);
        }

        match self.remote.create(kind, &attributes()) {
            Ok(STATUS_OK) => {
                record(&mut *self.snapshot);
                info!(?row, %kind, object = name, "created");
                self.push(row, kind, name, OutcomeStatus::Created);
                Ok(())
            }
            Ok(status) => self.fail(row, kind, name, CreateFailure::Status(status)),
            Err(err) => self.fail(row, kind, name, CreateFailure::Transport(err.to_string())),
        }
    }

    pub(crate) fn fail(
        &mut self,
        row: Option<usize>,
        kind: ObjectKind,
        name: &str,
        failure: CreateFailure,
    ) -> Gate {
        warn!(?row, %kind, object = name, %failure, "create failed");
        self.push(row, kind, name, OutcomeStatus::Failed(failure));
        Err(kind)
    }

    pub(crate) fn finish(self) -> ReconcileReport {
        self.report
    }

    fn push(&mut self, row: Option<usize>, kind: ObjectKind, name: &str, status: OutcomeStatus) {
        self.report.outcomes.push(Outcome {
            row,
            kind,
            name: name.to_string(),
            status,
        });
    }
}

/// Bring the fabric in line with `rows`. The snapshot is extended with every
/// confirmed create, so a second pass over the same rows creates nothing.
pub fn reconcile(
    rows: &[DesiredRow],
    snapshot: &mut FabricSnapshot,
    remote: &mut dyn RemoteCommand,
    config: &MigrationConfig,
) -> ReconcileReport {
    let mut run = Reconciler::new(snapshot, remote);
    for row in rows {
        reconcile_row(&mut run, row, config);
    }
    let report = run.finish();
    info!(
        created = report.created(),
        existing = report.already_exists(),
        failed = report.failed(),
        "reconciliation finished"
    );
    report
}

fn reconcile_row(run: &mut Reconciler<'_>, row: &DesiredRow, config: &MigrationConfig) {
    let at = Some(row.row);
    let tenant = row.tenant.as_str();
    let bd_name = row.bridge_domain.as_str();
    let fabric = &config.fabric;

    let tenant_gate = run.ensure(
        at,
        ObjectKind::Tenant,
        tenant,
        run.snapshot().has_tenant(tenant),
        Ok(()),
        || payload::tenant(tenant),
        |s| s.record_tenant(tenant),
    );

    let vrf_gate = run.ensure(
        at,
        ObjectKind::Vrf,
        &row.vrf,
        run.snapshot().has_vrf(tenant, &row.vrf),
        tenant_gate,
        || payload::vrf(tenant, &row.vrf, fabric),
        |s| s.record_vrf(tenant, &row.vrf),
    );

    let existing_bd = run.snapshot().bridge_domain(tenant, bd_name).cloned();
    let mode = BdMode::for_subnet(row.subnet.as_deref());
    let bd_gate = run.ensure(
        at,
        ObjectKind::BridgeDomain,
        bd_name,
        existing_bd.is_some(),
        vrf_gate,
        || payload::bridge_domain(tenant, bd_name, mode),
        |s| s.record_bridge_domain(tenant, bd_name),
    );

    let bound_vrf = existing_bd.as_ref().and_then(|bd| bd.vrf.clone());
    let bound = bound_vrf.as_deref() == Some(row.vrf.as_str());
    if existing_bd.is_some() && !bound {
        // The repair binding takes the row's VRF without checking what the
        // bridge domain's endpoints expect.
        let message = match &bound_vrf {
            Some(current) => format!(
                "bridge domain {bd_name} is bound to VRF {current}; rebinding to {}",
                row.vrf
            ),
            None => format!(
                "bridge domain {bd_name} has no VRF binding; binding to {}",
                row.vrf
            ),
        };
        run.warn(RowWarning::new(row.row, "vrf_repair_binding", message));
    }
    let _ = run.ensure(
        at,
        ObjectKind::VrfBinding,
        &format!("{bd_name} -> {}", row.vrf),
        bound,
        bd_gate.and(vrf_gate),
        || payload::vrf_binding(tenant, bd_name, &row.vrf),
        |s| s.record_vrf_binding(tenant, bd_name, &row.vrf),
    );

    if let Some(subnet) = row.subnet.as_deref() {
        let _ = run.ensure(
            at,
            ObjectKind::Subnet,
            subnet,
            run.snapshot().has_subnet(tenant, bd_name, subnet),
            bd_gate,
            || {
                payload::subnet(
                    tenant,
                    bd_name,
                    subnet,
                    &row.subnet_name,
                    row.route_type.scope(),
                    fabric,
                )
            },
            |s| s.record_subnet(tenant, bd_name, subnet),
        );
    }

    let app_gate = run.ensure(
        at,
        ObjectKind::AppProfile,
        &row.app_profile,
        run.snapshot().has_app_profile(tenant, &row.app_profile),
        tenant_gate.and(bd_gate),
        || payload::app_profile(tenant, &row.app_profile),
        |s| s.record_app_profile(tenant, &row.app_profile),
    );

    let epg_gate = run.ensure(
        at,
        ObjectKind::Epg,
        &row.epg,
        run.snapshot()
            .epg(tenant, &row.app_profile, &row.epg)
            .is_some(),
        app_gate.and(bd_gate),
        || payload::epg(tenant, &row.app_profile, &row.epg, bd_name, &row.description),
        |s| s.record_epg(tenant, &row.app_profile, &row.epg, bd_name),
    );

    let encap = row.vlan.encap();
    for binding in &row.bindings {
        let Some(path) = resolve_path(run.snapshot(), binding) else {
            let _ = run.fail(
                at,
                ObjectKind::StaticPath,
                &binding.to_string(),
                CreateFailure::UnknownPath(binding.to_string()),
            );
            continue;
        };
        let label = PathDn::parse(&path)
            .map(|p| p.label())
            .unwrap_or_else(|| path.clone());
        let _ = run.ensure(
            at,
            ObjectKind::StaticPath,
            &label,
            run.snapshot()
                .has_static_path(tenant, &row.app_profile, &row.epg, &path),
            epg_gate,
            || payload::static_path(tenant, &row.app_profile, &row.epg, &path, &encap, fabric),
            |s| s.record_static_path(tenant, &row.app_profile, &row.epg, &path, &encap),
        );
    }
}

fn resolve_path(snapshot: &FabricSnapshot, binding: &InterfaceBinding) -> Option<String> {
    match binding {
        InterfaceBinding::Bundle { name } => snapshot.bundle_path(name).map(str::to_string),
        InterfaceBinding::Port { .. } => binding.port_path().map(|p| p.to_string()),
    }
}
