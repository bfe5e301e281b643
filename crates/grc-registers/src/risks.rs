//! Risk Register
//!
//! Inherent and residual scores are computed from the current
//! likelihood/impact ratings at every read; nothing is cached, so the
//! numbers can never go stale after an update.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use grc_common::{GrcError, GrcResult, Rating};

use crate::catalog;
use crate::query::{self, Direction, Page, SortValue};
use crate::scoring::{self, RiskBand};

/// Risk category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskCategory {
    Strategic,
    Operational,
    Financial,
    Compliance,
    Security,
    Privacy,
    Reputational,
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strategic => write!(f, "Strategic"),
            Self::Operational => write!(f, "Operational"),
            Self::Financial => write!(f, "Financial"),
            Self::Compliance => write!(f, "Compliance"),
            Self::Security => write!(f, "Security"),
            Self::Privacy => write!(f, "Privacy"),
            Self::Reputational => write!(f, "Reputational"),
        }
    }
}

impl FromStr for RiskCategory {
    type Err = GrcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strategic" => Ok(Self::Strategic),
            "operational" => Ok(Self::Operational),
            "financial" => Ok(Self::Financial),
            "compliance" => Ok(Self::Compliance),
            "security" => Ok(Self::Security),
            "privacy" => Ok(Self::Privacy),
            "reputational" => Ok(Self::Reputational),
            _ => Err(GrcError::InvalidValue {
                field: "risk category",
                value: s.to_string(),
            }),
        }
    }
}

/// Risk lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskStatus {
    Open,
    InProgress,
    Accepted,
    Closed,
}

impl RiskStatus {
    /// Open and in-progress risks count as "open" for derived-state
    /// predicates on the asset register
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open | Self::InProgress)
    }
}

impl fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "Open"),
            Self::InProgress => write!(f, "In Progress"),
            Self::Accepted => write!(f, "Accepted"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

impl FromStr for RiskStatus {
    type Err = GrcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "open" => Ok(Self::Open),
            "in_progress" | "inprogress" => Ok(Self::InProgress),
            "accepted" => Ok(Self::Accepted),
            "closed" => Ok(Self::Closed),
            _ => Err(GrcError::InvalidValue {
                field: "risk status",
                value: s.to_string(),
            }),
        }
    }
}

/// Treatment decision for a risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreatmentDecision {
    Mitigate,
    Accept,
    Transfer,
    Avoid,
}

impl fmt::Display for TreatmentDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mitigate => write!(f, "Mitigate"),
            Self::Accept => write!(f, "Accept"),
            Self::Transfer => write!(f, "Transfer"),
            Self::Avoid => write!(f, "Avoid"),
        }
    }
}

impl FromStr for TreatmentDecision {
    type Err = GrcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mitigate" => Ok(Self::Mitigate),
            "accept" => Ok(Self::Accept),
            "transfer" => Ok(Self::Transfer),
            "avoid" => Ok(Self::Avoid),
            _ => Err(GrcError::InvalidValue {
                field: "treatment decision",
                value: s.to_string(),
            }),
        }
    }
}

/// Risk record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Risk {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: RiskCategory,
    pub owner: String,
    /// Pre-mitigation likelihood
    pub likelihood: Rating,
    /// Pre-mitigation impact
    pub impact: Rating,
    /// Post-treatment likelihood
    pub revised_likelihood: Rating,
    /// Post-treatment impact
    pub revised_impact: Rating,
    /// Asset ids this risk applies to (by convention, not enforced)
    pub related_assets: Vec<Uuid>,
    /// Annex A control ids mapped to this risk
    pub iso_mapping: Vec<String>,
    /// Additional (non-catalog) control ids
    pub new_control_mapping: Vec<String>,
    pub treatment_decision: TreatmentDecision,
    pub status: RiskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Risk {
    /// Inherent score: likelihood x impact
    pub fn inherent_score(&self) -> u8 {
        scoring::risk_score(self.likelihood, self.impact)
    }

    /// Residual score: revised likelihood x revised impact
    pub fn residual_score(&self) -> u8 {
        scoring::risk_score(self.revised_likelihood, self.revised_impact)
    }

    /// Band of the inherent score
    pub fn inherent_band(&self) -> RiskBand {
        scoring::risk_band(self.inherent_score())
    }

    /// Band of the residual score
    pub fn residual_band(&self) -> RiskBand {
        scoring::risk_band(self.residual_score())
    }
}

/// Fields accepted when creating or updating a risk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: RiskCategory,
    pub owner: String,
    pub likelihood: Rating,
    pub impact: Rating,
    /// Defaults to `likelihood` when absent (no treatment applied yet)
    pub revised_likelihood: Option<Rating>,
    /// Defaults to `impact` when absent
    pub revised_impact: Option<Rating>,
    #[serde(default)]
    pub related_assets: Vec<Uuid>,
    #[serde(default)]
    pub iso_mapping: Vec<String>,
    #[serde(default)]
    pub new_control_mapping: Vec<String>,
    pub treatment_decision: TreatmentDecision,
    #[serde(default = "default_status")]
    pub status: RiskStatus,
}

fn default_status() -> RiskStatus {
    RiskStatus::Open
}

impl RiskDraft {
    fn validate(&self) -> GrcResult<()> {
        if self.title.trim().is_empty() {
            return Err(GrcError::MissingField("title"));
        }
        if self.owner.trim().is_empty() {
            return Err(GrcError::MissingField("owner"));
        }
        for control_id in &self.iso_mapping {
            if catalog::lookup(control_id).is_none() {
                return Err(GrcError::UnknownControl(control_id.clone()));
            }
        }
        Ok(())
    }
}

/// Sortable risk columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskSortKey {
    Title,
    Owner,
    Category,
    InherentScore,
    ResidualScore,
    Status,
    UpdatedAt,
}

impl RiskSortKey {
    fn value_of(&self, risk: &Risk) -> SortValue {
        match self {
            Self::Title => SortValue::Text(risk.title.clone()),
            Self::Owner => SortValue::Text(risk.owner.clone()),
            Self::Category => SortValue::Text(risk.category.to_string()),
            Self::InherentScore => SortValue::Number(risk.inherent_score() as i64),
            Self::ResidualScore => SortValue::Number(risk.residual_score() as i64),
            Self::Status => SortValue::Text(risk.status.to_string()),
            Self::UpdatedAt => SortValue::Number(risk.updated_at.timestamp_millis()),
        }
    }
}

impl FromStr for RiskSortKey {
    type Err = GrcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "title" => Ok(Self::Title),
            "owner" => Ok(Self::Owner),
            "category" => Ok(Self::Category),
            "inherent_score" | "score" => Ok(Self::InherentScore),
            "residual_score" => Ok(Self::ResidualScore),
            "status" => Ok(Self::Status),
            "updated_at" | "updated" => Ok(Self::UpdatedAt),
            _ => Err(GrcError::InvalidValue {
                field: "risk sort key",
                value: s.to_string(),
            }),
        }
    }
}

/// Risk filter; `None` fields are unconstrained, predicates AND together
#[derive(Debug, Clone, Default)]
pub struct RiskFilter {
    pub category: Option<RiskCategory>,
    pub status: Option<RiskStatus>,
    pub owner: Option<String>,
    pub treatment_decision: Option<TreatmentDecision>,
    pub inherent_band: Option<RiskBand>,
    pub residual_band: Option<RiskBand>,
    pub related_asset: Option<Uuid>,
    pub search: Option<String>,
}

impl RiskFilter {
    /// True when the risk satisfies every set predicate
    pub fn matches(&self, risk: &Risk) -> bool {
        if let Some(c) = self.category {
            if risk.category != c {
                return false;
            }
        }
        if let Some(s) = self.status {
            if risk.status != s {
                return false;
            }
        }
        if let Some(owner) = &self.owner {
            if !owner.is_empty() && !risk.owner.eq_ignore_ascii_case(owner) {
                return false;
            }
        }
        if let Some(t) = self.treatment_decision {
            if risk.treatment_decision != t {
                return false;
            }
        }
        if let Some(band) = self.inherent_band {
            if risk.inherent_band() != band {
                return false;
            }
        }
        if let Some(band) = self.residual_band {
            if risk.residual_band() != band {
                return false;
            }
        }
        if let Some(asset_id) = self.related_asset {
            if !risk.related_assets.contains(&asset_id) {
                return false;
            }
        }
        if let Some(text) = &self.search {
            if !text.is_empty() && !self.matches_text(risk, text) {
                return false;
            }
        }
        true
    }

    fn matches_text(&self, risk: &Risk, text: &str) -> bool {
        query::contains_ci(&risk.title, text)
            || query::contains_ci(&risk.id.to_string(), text)
            || query::contains_ci(&risk.owner, text)
            || query::contains_ci(&risk.category.to_string(), text)
            || query::contains_ci(&risk.description, text)
            || risk
                .iso_mapping
                .iter()
                .any(|control_id| query::contains_ci(control_id, text))
    }
}

/// Risk register
#[derive(Clone)]
pub struct RiskRegister {
    risks: Arc<RwLock<Vec<Risk>>>,
}

impl RiskRegister {
    pub fn new() -> Self {
        Self {
            risks: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Create a risk from a validated draft
    pub fn create(&self, draft: RiskDraft) -> GrcResult<Risk> {
        draft.validate()?;
        let now = Utc::now();
        let risk = Risk {
            id: Uuid::new_v4(),
            title: draft.title,
            description: draft.description,
            category: draft.category,
            owner: draft.owner,
            likelihood: draft.likelihood,
            impact: draft.impact,
            revised_likelihood: draft.revised_likelihood.unwrap_or(draft.likelihood),
            revised_impact: draft.revised_impact.unwrap_or(draft.impact),
            related_assets: draft.related_assets,
            iso_mapping: draft.iso_mapping,
            new_control_mapping: draft.new_control_mapping,
            treatment_decision: draft.treatment_decision,
            status: draft.status,
            created_at: now,
            updated_at: now,
        };
        self.risks.write().push(risk.clone());
        tracing::info!(risk_id = %risk.id, title = %risk.title, "risk created");
        Ok(risk)
    }

    /// Get risk by id
    pub fn get(&self, id: Uuid) -> Option<Risk> {
        self.risks.read().iter().find(|r| r.id == id).cloned()
    }

    /// Replace the editable fields of a risk
    pub fn update(&self, id: Uuid, draft: RiskDraft) -> GrcResult<Risk> {
        draft.validate()?;
        let mut risks = self.risks.write();
        let risk = risks
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| GrcError::NotFound(id.to_string()))?;
        risk.title = draft.title;
        risk.description = draft.description;
        risk.category = draft.category;
        risk.owner = draft.owner;
        risk.likelihood = draft.likelihood;
        risk.impact = draft.impact;
        risk.revised_likelihood = draft.revised_likelihood.unwrap_or(draft.likelihood);
        risk.revised_impact = draft.revised_impact.unwrap_or(draft.impact);
        risk.related_assets = draft.related_assets;
        risk.iso_mapping = draft.iso_mapping;
        risk.new_control_mapping = draft.new_control_mapping;
        risk.treatment_decision = draft.treatment_decision;
        risk.status = draft.status;
        risk.updated_at = Utc::now();
        Ok(risk.clone())
    }

    /// Remove a risk from the register
    pub fn delete(&self, id: Uuid) -> GrcResult<()> {
        let mut risks = self.risks.write();
        let before = risks.len();
        risks.retain(|r| r.id != id);
        if risks.len() == before {
            return Err(GrcError::NotFound(id.to_string()));
        }
        Ok(())
    }

    /// All risks in insertion order
    pub fn all(&self) -> Vec<Risk> {
        self.risks.read().clone()
    }

    /// Run the full table pipeline: filter -> stable sort -> paginate
    pub fn query(
        &self,
        filter: &RiskFilter,
        sort: RiskSortKey,
        direction: Direction,
        page_size: usize,
        page: usize,
    ) -> Page<Risk> {
        let mut records: Vec<Risk> = self
            .risks
            .read()
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        query::sort_records(&mut records, direction, |r| sort.value_of(r));
        query::paginate(&records, page_size, page)
    }
}

impl Default for RiskRegister {
    fn default() -> Self {
        Self::new()
    }
}
