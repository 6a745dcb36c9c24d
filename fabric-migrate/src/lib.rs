//! Migration of legacy switch VLANs and SVIs into a fabric controller's
//! tenant model.
//!
//! Legacy running-configs are parsed by `switch-config-core`. The rows that
//! describe the target state live in a desired-state table, usually seeded
//! from those inventories and then edited by hand. This crate validates the
//! table against the live fabric and creates whatever is missing, in
//! dependency order, without touching what already exists.
//!
//! # Architecture
//!
//! ## Desired state
//!
//! - [`table`]: Desired-state table loading, column binding and seeding
//! - [`desired`]: Typed rows: VLAN ids, route types, interface bindings
//! - [`settings`]: Naming suffixes, parser patterns and fabric defaults
//!
//! ## Fabric model
//!
//! - [`remote`]: Query and command seams plus the fabric state document
//! - [`dn`]: Distinguished names for managed objects and topology paths
//! - [`snapshot`]: Indexed view of what the fabric already holds
//! - [`payload`]: Attribute sets for each managed object class
//! - [`offline`]: File-backed fabric used for dry runs and tests
//!
//! ## Migration
//!
//! - [`validate`]: Structural, conflict and interface checks before any write
//! - [`plan`]: Dry-run listing of network and application objects
//! - [`engine`]: Idempotent, dependency-gated reconciliation
//! - [`profiles`]: Per-leaf and per-pair access profiles
//!
//! ## Reporting
//!
//! - [`report`]: Terminal-friendly colored output
//!
//! # Workflow
//!
//! 1. **Parse** legacy configs and seed a desired-state table
//! 2. **Validate** the table against the fabric; any error stops the run
//! 3. **Plan** to see which objects are new
//! 4. **Apply** to create missing objects, row by row
//! 5. **Profiles** to provision leaf access profiles
//!
//! # Examples
//!
//! ```ignore
//! use fabric_migrate::engine::reconcile;
//! use fabric_migrate::offline::OfflineFabric;
//! use fabric_migrate::settings::default_config;
//! use fabric_migrate::snapshot::FabricSnapshot;
//! use fabric_migrate::table::DesiredStateTable;
//! use fabric_migrate::validate::validate;
//!
//! let config = default_config();
//! let mut fabric = OfflineFabric::load("fabric.json".as_ref())?;
//! let mut snapshot = FabricSnapshot::load(&fabric)?;
//! let rows = DesiredStateTable::load("rows.json".as_ref())?.bound_rows()?;
//!
//! let checked = validate(&rows, None, &snapshot, &fabric, &config);
//! if checked.is_clean() {
//!     let report = reconcile(&checked.rows, &mut snapshot, &mut fabric, &config);
//!     println!("created {}", report.created());
//! }
//! ```

pub mod desired;
pub mod dn;
pub mod engine;
pub mod offline;
pub mod payload;
pub mod plan;
pub mod profiles;
pub mod remote;
pub mod report;
pub mod settings;
pub mod snapshot;
pub mod table;
#[cfg(test)]
mod test_support;
pub mod validate;
