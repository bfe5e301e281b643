//! OpenGRC Register Engine
//!
//! In-memory governance, risk, and compliance registers for the
//! management console.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        REGISTER ENGINE                                  │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐  ┌─────────────┐ │
//! │  │    Asset     │  │     Risk     │  │     SOA      │  │  Treatment  │ │
//! │  │   Register   │  │   Register   │  │   Tracker    │  │    Plans    │ │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘  └──────┬──────┘ │
//! │         │                 │                 │                 │        │
//! │  ┌──────▼─────────────────▼─────────────────▼─────────────────▼──────┐ │
//! │  │                     QUERY PIPELINE                                │ │
//! │  │        Filter (AND) | Stable Sort | Paginate                      │ │
//! │  └───────────────────────────────────────────────────────────────────┘ │
//! │                                │                                        │
//! │  ┌──────────────┐  ┌──────────▼─────────┐  ┌──────────────┐           │
//! │  │    Audit     │  │      Scoring       │  │   Reports    │           │
//! │  │    Trail     │  │  (CIA / L x I)     │  │  & Exports   │           │
//! │  │ (Hash Chain) │  │                    │  │  (CSV/JSON)  │           │
//! │  └──────────────┘  └────────────────────┘  └──────────────┘           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![allow(dead_code)]

pub mod assets;
pub mod audit;
pub mod catalog;
pub mod export;
pub mod query;
pub mod reporting;
pub mod risks;
pub mod scoring;
pub mod seed;
pub mod soa;
pub mod treatment;

use chrono::NaiveDate;
use uuid::Uuid;

pub use assets::{Asset, AssetDraft, AssetFilter, AssetRegister, AssetSortKey, AssetStatus};
pub use audit::{AuditEvent, AuditEventType, AuditFilter, AuditTrail};
pub use export::ExportFormat;
pub use grc_common::{GrcError, GrcResult, Rating};
pub use query::{Direction, Page, SortState};
pub use risks::{Risk, RiskDraft, RiskFilter, RiskRegister, RiskSortKey};
pub use scoring::{RiskBand, ValueBand};
pub use soa::{Applicability, SoaRecord, SoaRegister};
pub use treatment::{TreatmentPlan, TreatmentRegister};

/// The application-state module behind the console
///
/// Owns one register per view plus the shared audit trail, and exposes
/// audited command functions. Queries go straight to the registers;
/// mutations come through here so every change lands in the audit log.
#[derive(Clone)]
pub struct GrcEngine {
    /// Asset register
    pub assets: AssetRegister,
    /// Risk register
    pub risks: RiskRegister,
    /// Statement of applicability
    pub soa: SoaRegister,
    /// Treatment plans
    pub treatment: TreatmentRegister,
    /// Tamper-evident mutation log
    pub audit: AuditTrail,
}

impl GrcEngine {
    /// Create an empty engine (SOA pre-seeded from the catalog)
    pub fn new() -> Self {
        Self {
            assets: AssetRegister::new(),
            risks: RiskRegister::new(),
            soa: SoaRegister::new(),
            treatment: TreatmentRegister::new(),
            audit: AuditTrail::new(),
        }
    }

    // ---- asset commands ----

    /// Create an asset
    pub fn create_asset(&self, draft: AssetDraft, actor: &str) -> GrcResult<Asset> {
        let asset = self.assets.create(draft)?;
        self.audit.log(
            AuditEventType::RecordCreated,
            actor,
            &format!("asset:{}", asset.id),
            &format!("Created asset '{}'", asset.name),
        );
        Ok(asset)
    }

    /// Update an asset
    pub fn update_asset(&self, id: Uuid, draft: AssetDraft, actor: &str) -> GrcResult<Asset> {
        let asset = self.assets.update(id, draft)?;
        self.audit.log(
            AuditEventType::RecordUpdated,
            actor,
            &format!("asset:{}", asset.id),
            &format!("Updated asset '{}'", asset.name),
        );
        Ok(asset)
    }

    /// Change an asset's lifecycle status
    pub fn set_asset_status(&self, id: Uuid, status: AssetStatus, actor: &str) -> GrcResult<Asset> {
        let asset = self.assets.set_status(id, status)?;
        self.audit.log(
            AuditEventType::RecordUpdated,
            actor,
            &format!("asset:{}", asset.id),
            &format!("Status changed to {}", status),
        );
        Ok(asset)
    }

    /// Soft-delete an asset into the trash view
    pub fn delete_asset(&self, id: Uuid, actor: &str) -> GrcResult<Asset> {
        let asset = self.assets.soft_delete(id)?;
        self.audit.log(
            AuditEventType::RecordDeleted,
            actor,
            &format!("asset:{}", id),
            &format!("Moved asset '{}' to trash", asset.name),
        );
        Ok(asset)
    }

    /// Restore an asset from the trash view
    pub fn restore_asset(&self, id: Uuid, actor: &str) -> GrcResult<Asset> {
        let asset = self.assets.restore(id)?;
        self.audit.log(
            AuditEventType::RecordRestored,
            actor,
            &format!("asset:{}", id),
            &format!("Restored asset '{}'", asset.name),
        );
        Ok(asset)
    }

    /// Permanently delete an asset
    pub fn purge_asset(&self, id: Uuid, actor: &str) -> GrcResult<()> {
        self.assets.purge(id)?;
        self.audit.log(
            AuditEventType::RecordPurged,
            actor,
            &format!("asset:{}", id),
            "Permanently deleted asset",
        );
        Ok(())
    }

    // ---- risk commands ----

    /// Create a risk and attach references to its related assets
    pub fn create_risk(&self, draft: RiskDraft, actor: &str) -> GrcResult<Risk> {
        let risk = self.risks.create(draft)?;
        for asset_id in &risk.related_assets {
            self.assets.add_risk_ref(
                *asset_id,
                assets::RiskRef {
                    risk_id: risk.id,
                    status: risk.status,
                    severity: risk.inherent_band(),
                },
            );
        }
        self.audit.log(
            AuditEventType::RecordCreated,
            actor,
            &format!("risk:{}", risk.id),
            &format!("Created risk '{}'", risk.title),
        );
        Ok(risk)
    }

    /// Update a risk and re-sync its asset references
    pub fn update_risk(&self, id: Uuid, draft: RiskDraft, actor: &str) -> GrcResult<Risk> {
        let risk = self.risks.update(id, draft)?;
        self.assets.remove_risk_refs(risk.id);
        for asset_id in &risk.related_assets {
            self.assets.add_risk_ref(
                *asset_id,
                assets::RiskRef {
                    risk_id: risk.id,
                    status: risk.status,
                    severity: risk.inherent_band(),
                },
            );
        }
        self.audit.log(
            AuditEventType::RecordUpdated,
            actor,
            &format!("risk:{}", risk.id),
            &format!("Updated risk '{}'", risk.title),
        );
        Ok(risk)
    }

    /// Delete a risk and drop its asset references
    pub fn delete_risk(&self, id: Uuid, actor: &str) -> GrcResult<()> {
        self.risks.delete(id)?;
        self.assets.remove_risk_refs(id);
        self.audit.log(
            AuditEventType::RecordDeleted,
            actor,
            &format!("risk:{}", id),
            "Deleted risk",
        );
        Ok(())
    }

    // ---- SOA commands ----

    /// Change a control's applicability (cascades per the SOA rules)
    pub fn set_control_applicability(
        &self,
        control_id: &str,
        applicability: Applicability,
        actor: &str,
    ) -> GrcResult<SoaRecord> {
        let record = self.soa.set_applicability(control_id, applicability, actor)?;
        self.audit.log(
            AuditEventType::ApplicabilityChanged,
            actor,
            &format!("control:{}", control_id),
            &format!("Applicability set to {}", applicability),
        );
        Ok(record)
    }

    /// Change a control's implementation status
    pub fn set_control_implementation(
        &self,
        control_id: &str,
        status: Option<soa::ImplementationStatus>,
        actor: &str,
    ) -> GrcResult<SoaRecord> {
        let record = self
            .soa
            .set_implementation_status(control_id, status, actor)?;
        self.audit.log(
            AuditEventType::RecordUpdated,
            actor,
            &format!("control:{}", control_id),
            "Implementation status updated",
        );
        Ok(record)
    }

    /// Update a control's detail fields
    pub fn update_control_details(
        &self,
        control_id: &str,
        update: soa::SoaDetailsUpdate,
        actor: &str,
    ) -> GrcResult<SoaRecord> {
        let record = self.soa.update_details(control_id, update, actor)?;
        self.audit.log(
            AuditEventType::RecordUpdated,
            actor,
            &format!("control:{}", control_id),
            "Control details updated",
        );
        Ok(record)
    }

    // ---- treatment commands ----

    /// Create a treatment plan
    pub fn create_plan(&self, draft: treatment::PlanDraft, actor: &str) -> GrcResult<TreatmentPlan> {
        let plan = self.treatment.create(draft)?;
        self.audit.log(
            AuditEventType::RecordCreated,
            actor,
            &format!("plan:{}", plan.id),
            &format!("Created treatment plan '{}'", plan.title),
        );
        Ok(plan)
    }

    /// Update a treatment plan
    pub fn update_plan(
        &self,
        id: Uuid,
        draft: treatment::PlanDraft,
        actor: &str,
    ) -> GrcResult<TreatmentPlan> {
        let plan = self.treatment.update(id, draft)?;
        self.audit.log(
            AuditEventType::RecordUpdated,
            actor,
            &format!("plan:{}", plan.id),
            &format!("Updated treatment plan '{}'", plan.title),
        );
        Ok(plan)
    }

    /// Delete a treatment plan
    pub fn delete_plan(&self, id: Uuid, actor: &str) -> GrcResult<()> {
        self.treatment.delete(id)?;
        self.audit.log(
            AuditEventType::RecordDeleted,
            actor,
            &format!("plan:{}", id),
            "Deleted treatment plan",
        );
        Ok(())
    }

    /// Add an action item to a plan
    pub fn add_action_item(
        &self,
        plan_id: Uuid,
        draft: treatment::ActionItemDraft,
        actor: &str,
    ) -> GrcResult<treatment::ActionItem> {
        let item = self.treatment.add_action_item(plan_id, draft)?;
        self.audit.log(
            AuditEventType::RecordCreated,
            actor,
            &format!("plan:{}/action:{}", plan_id, item.id),
            &format!("Added action item '{}'", item.title),
        );
        Ok(item)
    }

    /// Update an action item's status and progress
    pub fn update_action_item(
        &self,
        plan_id: Uuid,
        item_id: Uuid,
        status: treatment::TaskStatus,
        progress: u8,
        actor: &str,
    ) -> GrcResult<treatment::ActionItem> {
        let item = self
            .treatment
            .update_action_item(plan_id, item_id, status, progress)?;
        self.audit.log(
            AuditEventType::RecordUpdated,
            actor,
            &format!("plan:{}/action:{}", plan_id, item_id),
            &format!("Progress {}%, status {}", item.progress, item.status),
        );
        Ok(item)
    }

    /// Add a milestone to a plan
    pub fn add_milestone(
        &self,
        plan_id: Uuid,
        title: String,
        due_date: Option<NaiveDate>,
        actor: &str,
    ) -> GrcResult<treatment::Milestone> {
        let milestone = self.treatment.add_milestone(plan_id, title, due_date)?;
        self.audit.log(
            AuditEventType::RecordCreated,
            actor,
            &format!("plan:{}/milestone:{}", plan_id, milestone.id),
            &format!("Added milestone '{}'", milestone.title),
        );
        Ok(milestone)
    }

    /// Update a milestone's status and progress
    pub fn update_milestone(
        &self,
        plan_id: Uuid,
        milestone_id: Uuid,
        status: treatment::TaskStatus,
        progress: u8,
        actor: &str,
    ) -> GrcResult<treatment::Milestone> {
        let milestone = self
            .treatment
            .update_milestone(plan_id, milestone_id, status, progress)?;
        self.audit.log(
            AuditEventType::RecordUpdated,
            actor,
            &format!("plan:{}/milestone:{}", plan_id, milestone_id),
            &format!("Progress {}%, status {}", milestone.progress, milestone.status),
        );
        Ok(milestone)
    }

    // ---- exports ----

    /// Export the (non-deleted) asset register
    pub fn export_assets(&self, format: ExportFormat, actor: &str) -> GrcResult<String> {
        let out = export::export_assets(&self.assets.active(), format)?;
        self.log_export("assets", format, actor);
        Ok(out)
    }

    /// Export the risk register
    pub fn export_risks(&self, format: ExportFormat, actor: &str) -> GrcResult<String> {
        let out = export::export_risks(&self.risks.all(), format)?;
        self.log_export("risks", format, actor);
        Ok(out)
    }

    /// Export the statement of applicability
    pub fn export_soa(&self, format: ExportFormat, actor: &str) -> GrcResult<String> {
        let out = export::export_soa(&self.soa.all(), format)?;
        self.log_export("soa", format, actor);
        Ok(out)
    }

    /// Export the treatment plans
    pub fn export_plans(&self, format: ExportFormat, actor: &str) -> GrcResult<String> {
        let out = export::export_plans(&self.treatment.all(), format)?;
        self.log_export("plans", format, actor);
        Ok(out)
    }

    /// Export the audit trail
    pub fn export_audit(&self, format: ExportFormat, actor: &str) -> GrcResult<String> {
        let out = export::export_audit(&self.audit.get_events(None), format)?;
        self.log_export("audit", format, actor);
        Ok(out)
    }

    fn log_export(&self, register: &str, format: ExportFormat, actor: &str) {
        self.audit.log(
            AuditEventType::ExportGenerated,
            actor,
            &format!("export:{}", register),
            &format!("Exported {} register as {}", register, format),
        );
    }
}

impl Default for GrcEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risks::{RiskCategory, RiskStatus, TreatmentDecision};

    fn asset_draft(name: &str) -> AssetDraft {
        AssetDraft {
            name: name.into(),
            asset_type: assets::AssetType::Hardware,
            owner: "ops".into(),
            description: String::new(),
            confidentiality: Rating::new(4).unwrap(),
            integrity: Rating::new(4).unwrap(),
            availability: Rating::new(4).unwrap(),
        }
    }

    fn risk_draft(title: &str, related: Vec<Uuid>) -> RiskDraft {
        RiskDraft {
            title: title.into(),
            description: String::new(),
            category: RiskCategory::Security,
            owner: "ciso".into(),
            likelihood: Rating::new(5).unwrap(),
            impact: Rating::new(4).unwrap(),
            revised_likelihood: None,
            revised_impact: None,
            related_assets: related,
            iso_mapping: Vec::new(),
            new_control_mapping: Vec::new(),
            treatment_decision: TreatmentDecision::Mitigate,
            status: RiskStatus::Open,
        }
    }

    #[test]
    fn test_every_command_is_audited() {
        let engine = GrcEngine::new();
        let asset = engine.create_asset(asset_draft("Server"), "alice").unwrap();
        engine.delete_asset(asset.id, "alice").unwrap();
        engine.restore_asset(asset.id, "alice").unwrap();

        assert_eq!(engine.audit.count(), 3);
        assert!(engine.audit.verify_integrity().valid);
    }

    #[test]
    fn test_risk_refs_follow_risk_lifecycle() {
        let engine = GrcEngine::new();
        let asset = engine.create_asset(asset_draft("DB"), "alice").unwrap();
        let risk = engine
            .create_risk(risk_draft("Breach", vec![asset.id]), "alice")
            .unwrap();

        let asset = engine.assets.get(asset.id).unwrap();
        assert_eq!(asset.associated_risks.len(), 1);
        assert_eq!(asset.associated_risks[0].severity, RiskBand::High);
        assert!(asset.has_open_high_risks());

        let mut closed = risk_draft("Breach", vec![asset.id]);
        closed.status = RiskStatus::Closed;
        engine.update_risk(risk.id, closed, "alice").unwrap();
        let asset = engine.assets.get(asset.id).unwrap();
        assert!(!asset.has_open_risks());

        engine.delete_risk(risk.id, "alice").unwrap();
        let asset = engine.assets.get(asset.id).unwrap();
        assert!(asset.associated_risks.is_empty());
    }

    #[test]
    fn test_export_rejects_unsupported_format() {
        assert!(matches!(
            "pdf".parse::<ExportFormat>(),
            Err(GrcError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_failed_validation_leaves_state_untouched() {
        let engine = GrcEngine::new();
        let before = engine.audit.count();
        let result = engine.create_asset(
            AssetDraft {
                name: String::new(),
                ..asset_draft("x")
            },
            "alice",
        );
        assert!(result.is_err());
        assert!(engine.assets.active().is_empty());
        assert_eq!(engine.audit.count(), before);
    }
}
