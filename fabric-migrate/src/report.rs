use colored::Colorize;

use crate::engine::{Outcome, OutcomeStatus, ReconcileReport};
use crate::plan::Plan;
use crate::validate::{RowWarning, ValidationReport};

/// Render validation findings, errors first.
pub fn render_validation(report: &ValidationReport) -> String {
    let mut out = Vec::new();
    for error in &report.errors {
        out.push(format!("ERROR {error}").red().to_string());
    }
    out.extend(render_warnings(&report.warnings));
    out.push(
        format!(
            "validation rows={} errors={} warnings={}",
            report.rows.len(),
            report.errors.len(),
            report.warnings.len()
        )
        .cyan()
        .to_string(),
    );
    out.join("\n")
}

fn render_warnings(warnings: &[RowWarning]) -> Vec<String> {
    warnings
        .iter()
        .map(|w| {
            format!("WARN row {}: {} ({})", w.row, w.message, w.code)
                .yellow()
                .to_string()
        })
        .collect()
}

/// One line per outcome: created green, existing yellow, failed red.
pub fn render_outcomes(report: &ReconcileReport) -> String {
    let mut out: Vec<String> = report.outcomes.iter().map(render_outcome).collect();
    out.extend(render_warnings(&report.warnings));
    out.push(
        format!(
            "outcomes created={} exists={} failed={}",
            report.created(),
            report.already_exists(),
            report.failed()
        )
        .cyan()
        .to_string(),
    );
    out.join("\n")
}

fn render_outcome(outcome: &Outcome) -> String {
    let row = outcome
        .row
        .map_or_else(|| "-".to_string(), |r| r.to_string());
    let line = format!("row={row} kind={} name={}", outcome.kind, outcome.name);
    match &outcome.status {
        OutcomeStatus::Created => format!("CREATED {line}").green().to_string(),
        OutcomeStatus::AlreadyExists => format!("EXISTS  {line}").yellow().to_string(),
        OutcomeStatus::Failed(failure) => format!("FAILED  {line} reason={failure}")
            .red()
            .to_string(),
    }
}

pub fn render_plan(plan: &Plan) -> String {
    let flag = |new: bool| if new { "new".green() } else { "exists".yellow() };
    let mut out = vec!["network".bold().to_string()];
    for entry in &plan.network {
        out.push(format!(
            "- tenant={} ({}) vrf={} ({}) bd={} ({})",
            entry.tenant,
            flag(entry.tenant_new),
            entry.vrf,
            flag(entry.vrf_new),
            entry.bridge_domain,
            flag(entry.bridge_domain_new)
        ));
    }
    out.push("application".bold().to_string());
    for entry in &plan.application {
        out.push(format!(
            "- tenant={} app_profile={} ({}) epg={} ({})",
            entry.tenant,
            entry.app_profile,
            flag(entry.app_profile_new),
            entry.epg,
            flag(entry.epg_new)
        ));
    }
    out.push(
        format!("plan new_objects={}", plan.new_objects())
            .cyan()
            .to_string(),
    );
    out.join("\n")
}
