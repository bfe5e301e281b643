//! Asset Register
//!
//! Owns the in-memory asset records and every query/command the console
//! runs against them. Asset value is always derived from the current CIA
//! ratings through [`crate::scoring`]; it is never stored.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use grc_common::{GrcError, GrcResult, Rating};

use crate::query::{self, Direction, Page, SortValue};
use crate::risks::RiskStatus;
use crate::scoring::{self, RiskBand, ValueBand};

/// Asset type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetType {
    Hardware,
    Software,
    Information,
    Service,
    People,
    Site,
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hardware => write!(f, "Hardware"),
            Self::Software => write!(f, "Software"),
            Self::Information => write!(f, "Information"),
            Self::Service => write!(f, "Service"),
            Self::People => write!(f, "People"),
            Self::Site => write!(f, "Site"),
        }
    }
}

impl FromStr for AssetType {
    type Err = GrcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hardware" => Ok(Self::Hardware),
            "software" => Ok(Self::Software),
            "information" => Ok(Self::Information),
            "service" => Ok(Self::Service),
            "people" => Ok(Self::People),
            "site" => Ok(Self::Site),
            _ => Err(GrcError::InvalidValue {
                field: "asset type",
                value: s.to_string(),
            }),
        }
    }
}

/// Asset lifecycle status
///
/// `Deleted` is the soft-deleted (trash) state; purging removes the
/// record entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetStatus {
    Active,
    InRepair,
    Decommissioned,
    Deleted,
}

impl fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::InRepair => write!(f, "In-Repair"),
            Self::Decommissioned => write!(f, "Decommissioned"),
            Self::Deleted => write!(f, "Deleted"),
        }
    }
}

impl FromStr for AssetStatus {
    type Err = GrcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "in-repair" | "inrepair" => Ok(Self::InRepair),
            "decommissioned" => Ok(Self::Decommissioned),
            "deleted" => Ok(Self::Deleted),
            _ => Err(GrcError::InvalidValue {
                field: "asset status",
                value: s.to_string(),
            }),
        }
    }
}

/// Reference to a risk associated with an asset
///
/// Kept in sync by the engine whenever the referenced risk changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskRef {
    pub risk_id: Uuid,
    pub status: RiskStatus,
    pub severity: RiskBand,
}

/// Asset record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: Uuid,
    pub name: String,
    pub asset_type: AssetType,
    pub owner: String,
    pub description: String,
    pub confidentiality: Rating,
    pub integrity: Rating,
    pub availability: Rating,
    pub status: AssetStatus,
    pub associated_risks: Vec<RiskRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Asset {
    /// Asset value derived from the current CIA ratings
    pub fn value(&self) -> u8 {
        scoring::asset_value(self.confidentiality, self.integrity, self.availability)
    }

    /// Qualitative band of the asset value
    pub fn value_band(&self) -> ValueBand {
        scoring::value_band(self.value())
    }

    /// At least one associated risk is still open
    pub fn has_open_risks(&self) -> bool {
        self.associated_risks.iter().any(|r| r.status.is_open())
    }

    /// At least one open associated risk carries High severity
    pub fn has_open_high_risks(&self) -> bool {
        self.associated_risks
            .iter()
            .any(|r| r.status.is_open() && r.severity == RiskBand::High)
    }
}

/// Fields accepted when creating or updating an asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetDraft {
    pub name: String,
    pub asset_type: AssetType,
    pub owner: String,
    #[serde(default)]
    pub description: String,
    pub confidentiality: Rating,
    pub integrity: Rating,
    pub availability: Rating,
}

impl AssetDraft {
    fn validate(&self) -> GrcResult<()> {
        if self.name.trim().is_empty() {
            return Err(GrcError::MissingField("name"));
        }
        if self.owner.trim().is_empty() {
            return Err(GrcError::MissingField("owner"));
        }
        Ok(())
    }
}

/// Sortable asset columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetSortKey {
    Name,
    Owner,
    Type,
    Value,
    Status,
    UpdatedAt,
}

impl AssetSortKey {
    fn value_of(&self, asset: &Asset) -> SortValue {
        match self {
            Self::Name => SortValue::Text(asset.name.clone()),
            Self::Owner => SortValue::Text(asset.owner.clone()),
            Self::Type => SortValue::Text(asset.asset_type.to_string()),
            Self::Value => SortValue::Number(asset.value() as i64),
            Self::Status => SortValue::Text(asset.status.to_string()),
            Self::UpdatedAt => SortValue::Number(asset.updated_at.timestamp_millis()),
        }
    }
}

impl FromStr for AssetSortKey {
    type Err = GrcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "owner" => Ok(Self::Owner),
            "type" => Ok(Self::Type),
            "value" => Ok(Self::Value),
            "status" => Ok(Self::Status),
            "updated_at" | "updated" => Ok(Self::UpdatedAt),
            _ => Err(GrcError::InvalidValue {
                field: "asset sort key",
                value: s.to_string(),
            }),
        }
    }
}

/// Asset filter; `None` fields are unconstrained, predicates AND together
#[derive(Debug, Clone, Default)]
pub struct AssetFilter {
    pub asset_type: Option<AssetType>,
    pub status: Option<AssetStatus>,
    pub owner: Option<String>,
    pub value_band: Option<ValueBand>,
    pub search: Option<String>,
    pub has_open_risks: bool,
    pub has_open_high_risks: bool,
}

impl AssetFilter {
    /// True when the asset satisfies every set predicate
    pub fn matches(&self, asset: &Asset) -> bool {
        if let Some(t) = self.asset_type {
            if asset.asset_type != t {
                return false;
            }
        }
        if let Some(s) = self.status {
            if asset.status != s {
                return false;
            }
        }
        if let Some(owner) = &self.owner {
            if !owner.is_empty() && !asset.owner.eq_ignore_ascii_case(owner) {
                return false;
            }
        }
        if let Some(band) = self.value_band {
            if asset.value_band() != band {
                return false;
            }
        }
        if let Some(text) = &self.search {
            if !text.is_empty() && !self.matches_text(asset, text) {
                return false;
            }
        }
        if self.has_open_risks && !asset.has_open_risks() {
            return false;
        }
        if self.has_open_high_risks && !asset.has_open_high_risks() {
            return false;
        }
        true
    }

    fn matches_text(&self, asset: &Asset, text: &str) -> bool {
        query::contains_ci(&asset.name, text)
            || query::contains_ci(&asset.id.to_string(), text)
            || query::contains_ci(&asset.owner, text)
            || query::contains_ci(&asset.asset_type.to_string(), text)
            || query::contains_ci(&asset.description, text)
            || asset
                .associated_risks
                .iter()
                .any(|r| query::contains_ci(&r.risk_id.to_string(), text))
    }
}

/// Asset register
#[derive(Clone)]
pub struct AssetRegister {
    assets: Arc<RwLock<Vec<Asset>>>,
}

impl AssetRegister {
    pub fn new() -> Self {
        Self {
            assets: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Create an asset from a validated draft
    pub fn create(&self, draft: AssetDraft) -> GrcResult<Asset> {
        draft.validate()?;
        let now = Utc::now();
        let asset = Asset {
            id: Uuid::new_v4(),
            name: draft.name,
            asset_type: draft.asset_type,
            owner: draft.owner,
            description: draft.description,
            confidentiality: draft.confidentiality,
            integrity: draft.integrity,
            availability: draft.availability,
            status: AssetStatus::Active,
            associated_risks: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.assets.write().push(asset.clone());
        tracing::info!(asset_id = %asset.id, name = %asset.name, "asset created");
        Ok(asset)
    }

    /// Get asset by id
    pub fn get(&self, id: Uuid) -> Option<Asset> {
        self.assets.read().iter().find(|a| a.id == id).cloned()
    }

    /// Replace the editable fields of an asset
    pub fn update(&self, id: Uuid, draft: AssetDraft) -> GrcResult<Asset> {
        draft.validate()?;
        let mut assets = self.assets.write();
        let asset = assets
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| GrcError::NotFound(id.to_string()))?;
        asset.name = draft.name;
        asset.asset_type = draft.asset_type;
        asset.owner = draft.owner;
        asset.description = draft.description;
        asset.confidentiality = draft.confidentiality;
        asset.integrity = draft.integrity;
        asset.availability = draft.availability;
        asset.updated_at = Utc::now();
        Ok(asset.clone())
    }

    /// Change lifecycle status (Active / In-Repair / Decommissioned)
    pub fn set_status(&self, id: Uuid, status: AssetStatus) -> GrcResult<Asset> {
        let mut assets = self.assets.write();
        let asset = assets
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| GrcError::NotFound(id.to_string()))?;
        asset.status = status;
        asset.updated_at = Utc::now();
        Ok(asset.clone())
    }

    /// Soft delete: move the asset to the trash view
    pub fn soft_delete(&self, id: Uuid) -> GrcResult<Asset> {
        self.set_status(id, AssetStatus::Deleted)
    }

    /// Bring a trashed asset back to Active
    pub fn restore(&self, id: Uuid) -> GrcResult<Asset> {
        self.set_status(id, AssetStatus::Active)
    }

    /// Permanently remove an asset from the register
    pub fn purge(&self, id: Uuid) -> GrcResult<()> {
        let mut assets = self.assets.write();
        let before = assets.len();
        assets.retain(|a| a.id != id);
        if assets.len() == before {
            return Err(GrcError::NotFound(id.to_string()));
        }
        tracing::info!(asset_id = %id, "asset purged");
        Ok(())
    }

    /// All non-deleted assets in insertion order
    pub fn active(&self) -> Vec<Asset> {
        self.assets
            .read()
            .iter()
            .filter(|a| a.status != AssetStatus::Deleted)
            .cloned()
            .collect()
    }

    /// Trash view: soft-deleted assets
    pub fn trash(&self) -> Vec<Asset> {
        self.assets
            .read()
            .iter()
            .filter(|a| a.status == AssetStatus::Deleted)
            .cloned()
            .collect()
    }

    /// Attach a risk reference to an asset (no-op for unknown assets:
    /// related-asset ids are by convention, not enforced)
    pub fn add_risk_ref(&self, asset_id: Uuid, risk_ref: RiskRef) {
        let mut assets = self.assets.write();
        if let Some(asset) = assets.iter_mut().find(|a| a.id == asset_id) {
            asset.associated_risks.push(risk_ref);
            asset.updated_at = Utc::now();
        }
    }

    /// Refresh status/severity of a risk reference on every asset
    pub fn update_risk_refs(&self, risk_id: Uuid, status: RiskStatus, severity: RiskBand) {
        let mut assets = self.assets.write();
        for asset in assets.iter_mut() {
            for risk_ref in asset.associated_risks.iter_mut() {
                if risk_ref.risk_id == risk_id {
                    risk_ref.status = status;
                    risk_ref.severity = severity;
                }
            }
        }
    }

    /// Drop a risk reference from every asset
    pub fn remove_risk_refs(&self, risk_id: Uuid) {
        let mut assets = self.assets.write();
        for asset in assets.iter_mut() {
            asset.associated_risks.retain(|r| r.risk_id != risk_id);
        }
    }

    /// Run the full table pipeline: filter -> stable sort -> paginate
    ///
    /// Deleted assets only appear when the filter explicitly targets the
    /// Deleted status (the trash view).
    pub fn query(
        &self,
        filter: &AssetFilter,
        sort: AssetSortKey,
        direction: Direction,
        page_size: usize,
        page: usize,
    ) -> Page<Asset> {
        let source = if filter.status == Some(AssetStatus::Deleted) {
            self.trash()
        } else {
            self.active()
        };
        let mut records: Vec<Asset> = source.into_iter().filter(|a| filter.matches(a)).collect();
        query::sort_records(&mut records, direction, |a| sort.value_of(a));
        query::paginate(&records, page_size, page)
    }
}

impl Default for AssetRegister {
    fn default() -> Self {
        Self::new()
    }
}
