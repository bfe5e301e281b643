//! API models
//!
//! Views carry the derived fields (scores, bands, progress) the console
//! tables render, computed through the engine's scoring module at
//! serialization time.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use grc_registers::assets::{Asset, AssetStatus, AssetType, RiskRef};
use grc_registers::risks::{Risk, RiskCategory, RiskStatus, TreatmentDecision};
use grc_registers::scoring::{RiskBand, ValueBand};
use grc_registers::soa::{
    Applicability, HistoryEntry, ImplementationStatus, Priority, SoaRecord,
};
use grc_registers::treatment::{ActionItem, Milestone, PlanStatus, TreatmentPlan};
use grc_registers::Rating;

/// Asset row for the console table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetView {
    pub id: Uuid,
    pub name: String,
    pub asset_type: AssetType,
    pub owner: String,
    pub description: String,
    pub confidentiality: Rating,
    pub integrity: Rating,
    pub availability: Rating,
    pub asset_value: u8,
    pub value_band: ValueBand,
    pub status: AssetStatus,
    pub associated_risks: Vec<RiskRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Asset> for AssetView {
    fn from(asset: Asset) -> Self {
        let asset_value = asset.value();
        let value_band = asset.value_band();
        Self {
            id: asset.id,
            name: asset.name,
            asset_type: asset.asset_type,
            owner: asset.owner,
            description: asset.description,
            confidentiality: asset.confidentiality,
            integrity: asset.integrity,
            availability: asset.availability,
            asset_value,
            value_band,
            status: asset.status,
            associated_risks: asset.associated_risks,
            created_at: asset.created_at,
            updated_at: asset.updated_at,
        }
    }
}

/// Risk row for the console table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: RiskCategory,
    pub owner: String,
    pub likelihood: Rating,
    pub impact: Rating,
    pub inherent_score: u8,
    pub inherent_band: RiskBand,
    pub revised_likelihood: Rating,
    pub revised_impact: Rating,
    pub residual_score: u8,
    pub residual_band: RiskBand,
    pub related_assets: Vec<Uuid>,
    pub iso_mapping: Vec<String>,
    pub new_control_mapping: Vec<String>,
    pub treatment_decision: TreatmentDecision,
    pub status: RiskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Risk> for RiskView {
    fn from(risk: Risk) -> Self {
        let inherent_score = risk.inherent_score();
        let inherent_band = risk.inherent_band();
        let residual_score = risk.residual_score();
        let residual_band = risk.residual_band();
        Self {
            id: risk.id,
            title: risk.title,
            description: risk.description,
            category: risk.category,
            owner: risk.owner,
            likelihood: risk.likelihood,
            impact: risk.impact,
            inherent_score,
            inherent_band,
            revised_likelihood: risk.revised_likelihood,
            revised_impact: risk.revised_impact,
            residual_score,
            residual_band,
            related_assets: risk.related_assets,
            iso_mapping: risk.iso_mapping,
            new_control_mapping: risk.new_control_mapping,
            treatment_decision: risk.treatment_decision,
            status: risk.status,
            created_at: risk.created_at,
            updated_at: risk.updated_at,
        }
    }
}

/// SOA row for the console table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoaView {
    pub control_id: String,
    pub control_name: String,
    pub category: Option<String>,
    pub applicability: Applicability,
    pub implementation_status: Option<ImplementationStatus>,
    pub priority: Option<Priority>,
    pub evidence: Option<String>,
    pub justification: String,
    pub responsible_owner: String,
    pub target_date: Option<NaiveDate>,
    pub next_review: Option<NaiveDate>,
    pub status_history: Vec<HistoryEntry>,
    pub updated_at: DateTime<Utc>,
}

impl From<SoaRecord> for SoaView {
    fn from(record: SoaRecord) -> Self {
        let control_name = record.control_name().to_string();
        let category = record.category().map(|c| c.to_string());
        Self {
            control_id: record.control_id,
            control_name,
            category,
            applicability: record.applicability,
            implementation_status: record.implementation_status,
            priority: record.priority,
            evidence: record.evidence,
            justification: record.justification,
            responsible_owner: record.responsible_owner,
            target_date: record.target_date,
            next_review: record.next_review,
            status_history: record.status_history,
            updated_at: record.updated_at,
        }
    }
}

/// Treatment plan row for the console table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub owner: String,
    pub status: PlanStatus,
    pub progress: u8,
    pub risk_ids: Vec<Uuid>,
    pub action_items: Vec<ActionItem>,
    pub milestones: Vec<Milestone>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TreatmentPlan> for PlanView {
    fn from(plan: TreatmentPlan) -> Self {
        let progress = plan.progress();
        Self {
            id: plan.id,
            title: plan.title,
            description: plan.description,
            owner: plan.owner,
            status: plan.status,
            progress,
            risk_ids: plan.risk_ids,
            action_items: plan.action_items,
            milestones: plan.milestones,
            created_at: plan.created_at,
            updated_at: plan.updated_at,
        }
    }
}

fn default_actor() -> String {
    "console".to_string()
}

/// Mutation request wrapper carrying the acting user
#[derive(Debug, Deserialize)]
pub struct Authored<T> {
    #[serde(flatten)]
    pub body: T,
    #[serde(default = "default_actor")]
    pub actor: String,
}

/// Applicability update request
#[derive(Debug, Deserialize)]
pub struct ApplicabilityUpdate {
    pub applicability: Applicability,
    #[serde(default = "default_actor")]
    pub actor: String,
}

/// Implementation status update request
#[derive(Debug, Deserialize)]
pub struct ImplementationUpdate {
    pub implementation_status: Option<ImplementationStatus>,
    #[serde(default = "default_actor")]
    pub actor: String,
}

/// Action item / milestone progress update request
#[derive(Debug, Deserialize)]
pub struct ProgressUpdate {
    pub status: grc_registers::treatment::TaskStatus,
    pub progress: u8,
    #[serde(default = "default_actor")]
    pub actor: String,
}

/// Milestone creation request
#[derive(Debug, Deserialize)]
pub struct MilestoneCreate {
    pub title: String,
    pub due_date: Option<NaiveDate>,
    #[serde(default = "default_actor")]
    pub actor: String,
}
