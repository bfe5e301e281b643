//! Register exports
//!
//! CSV: comma-separated, every field double-quote-wrapped (embedded
//! quotes doubled), header row first, one record per row, fixed column
//! order per report type. JSON: pretty-printed serde output. Anything
//! else is rejected as unsupported.

use std::fmt;
use std::str::FromStr;

use grc_common::{GrcError, GrcResult};

use crate::assets::Asset;
use crate::audit::AuditEvent;
use crate::risks::Risk;
use crate::soa::SoaRecord;
use crate::treatment::TreatmentPlan;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = GrcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(GrcError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Quote-wrap one CSV field, doubling embedded quotes
fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn csv_row(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| csv_field(f))
        .collect::<Vec<_>>()
        .join(",")
}

fn csv_document(header: &[&str], rows: Vec<Vec<String>>) -> String {
    let mut out = String::new();
    out.push_str(&csv_row(
        &header.iter().map(|h| h.to_string()).collect::<Vec<_>>(),
    ));
    out.push('\n');
    for row in rows {
        out.push_str(&csv_row(&row));
        out.push('\n');
    }
    out
}

/// Asset report columns: id, name, type, owner, confidentiality,
/// integrity, availability, asset_value, value_band, status, open_risks
pub fn assets_csv(records: &[Asset]) -> String {
    let header = [
        "id",
        "name",
        "type",
        "owner",
        "confidentiality",
        "integrity",
        "availability",
        "asset_value",
        "value_band",
        "status",
        "open_risks",
    ];
    let rows = records
        .iter()
        .map(|a| {
            vec![
                a.id.to_string(),
                a.name.clone(),
                a.asset_type.to_string(),
                a.owner.clone(),
                a.confidentiality.to_string(),
                a.integrity.to_string(),
                a.availability.to_string(),
                a.value().to_string(),
                a.value_band().to_string(),
                a.status.to_string(),
                a.associated_risks
                    .iter()
                    .filter(|r| r.status.is_open())
                    .count()
                    .to_string(),
            ]
        })
        .collect();
    csv_document(&header, rows)
}

/// Risk report columns: id, title, category, owner, likelihood, impact,
/// inherent_score, inherent_band, revised_likelihood, revised_impact,
/// residual_score, residual_band, treatment_decision, status
pub fn risks_csv(records: &[Risk]) -> String {
    let header = [
        "id",
        "title",
        "category",
        "owner",
        "likelihood",
        "impact",
        "inherent_score",
        "inherent_band",
        "revised_likelihood",
        "revised_impact",
        "residual_score",
        "residual_band",
        "treatment_decision",
        "status",
    ];
    let rows = records
        .iter()
        .map(|r| {
            vec![
                r.id.to_string(),
                r.title.clone(),
                r.category.to_string(),
                r.owner.clone(),
                r.likelihood.to_string(),
                r.impact.to_string(),
                r.inherent_score().to_string(),
                r.inherent_band().to_string(),
                r.revised_likelihood.to_string(),
                r.revised_impact.to_string(),
                r.residual_score().to_string(),
                r.residual_band().to_string(),
                r.treatment_decision.to_string(),
                r.status.to_string(),
            ]
        })
        .collect();
    csv_document(&header, rows)
}

/// SOA report columns: control_id, control_name, applicability,
/// implementation_status, priority, responsible_owner, target_date,
/// next_review, justification
pub fn soa_csv(records: &[SoaRecord]) -> String {
    let header = [
        "control_id",
        "control_name",
        "applicability",
        "implementation_status",
        "priority",
        "responsible_owner",
        "target_date",
        "next_review",
        "justification",
    ];
    let rows = records
        .iter()
        .map(|r| {
            vec![
                r.control_id.clone(),
                r.control_name().to_string(),
                r.applicability.to_string(),
                r.implementation_status
                    .map(|s| s.to_string())
                    .unwrap_or_default(),
                r.priority.map(|p| p.to_string()).unwrap_or_default(),
                r.responsible_owner.clone(),
                r.target_date.map(|d| d.to_string()).unwrap_or_default(),
                r.next_review.map(|d| d.to_string()).unwrap_or_default(),
                r.justification.clone(),
            ]
        })
        .collect();
    csv_document(&header, rows)
}

/// Treatment report columns: id, title, owner, status, progress,
/// action_items, milestones
pub fn plans_csv(records: &[TreatmentPlan]) -> String {
    let header = [
        "id",
        "title",
        "owner",
        "status",
        "progress",
        "action_items",
        "milestones",
    ];
    let rows = records
        .iter()
        .map(|p| {
            vec![
                p.id.to_string(),
                p.title.clone(),
                p.owner.clone(),
                p.status.to_string(),
                p.progress().to_string(),
                p.action_items.len().to_string(),
                p.milestones.len().to_string(),
            ]
        })
        .collect();
    csv_document(&header, rows)
}

/// Audit report columns: timestamp, event_type, actor, target, details
pub fn audit_csv(events: &[AuditEvent]) -> String {
    let header = ["timestamp", "event_type", "actor", "target", "details"];
    let rows = events
        .iter()
        .map(|e| {
            vec![
                e.timestamp.to_rfc3339(),
                format!("{:?}", e.event_type),
                e.actor.clone(),
                e.target.clone(),
                e.details.clone(),
            ]
        })
        .collect();
    csv_document(&header, rows)
}

/// Export assets in the requested format
pub fn export_assets(records: &[Asset], format: ExportFormat) -> GrcResult<String> {
    match format {
        ExportFormat::Csv => Ok(assets_csv(records)),
        ExportFormat::Json => to_json(records),
    }
}

/// Export risks in the requested format
pub fn export_risks(records: &[Risk], format: ExportFormat) -> GrcResult<String> {
    match format {
        ExportFormat::Csv => Ok(risks_csv(records)),
        ExportFormat::Json => to_json(records),
    }
}

/// Export the SOA in the requested format
pub fn export_soa(records: &[SoaRecord], format: ExportFormat) -> GrcResult<String> {
    match format {
        ExportFormat::Csv => Ok(soa_csv(records)),
        ExportFormat::Json => to_json(records),
    }
}

/// Export treatment plans in the requested format
pub fn export_plans(records: &[TreatmentPlan], format: ExportFormat) -> GrcResult<String> {
    match format {
        ExportFormat::Csv => Ok(plans_csv(records)),
        ExportFormat::Json => to_json(records),
    }
}

/// Export the audit trail in the requested format
pub fn export_audit(events: &[AuditEvent], format: ExportFormat) -> GrcResult<String> {
    match format {
        ExportFormat::Csv => Ok(audit_csv(events)),
        ExportFormat::Json => to_json(events),
    }
}

fn to_json<T: serde::Serialize>(records: &[T]) -> GrcResult<String> {
    serde_json::to_string_pretty(records)
        .map_err(|e| GrcError::UnsupportedFormat(format!("json serialization failed: {e}")))
}
