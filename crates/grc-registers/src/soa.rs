//! Statement of Applicability
//!
//! One record per Annex A catalog control. The update handler owns the
//! cross-field consistency rule: excluding a control clears its
//! implementation fields in the same update, and every applicability
//! transition lands exactly one entry in the append-only status history.

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use grc_common::{GrcError, GrcResult};

use crate::catalog::{self, ControlCategory};
use crate::query::{self, Direction, Page, SortValue};

/// Justification stamped onto a control when it is excluded from scope
pub const EXCLUSION_JUSTIFICATION: &str =
    "Excluded from scope: control determined not applicable to the organization.";

/// Control applicability (tri-state)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Applicability {
    /// Not yet decided
    Tbd,
    Applicable,
    NotApplicable,
}

impl fmt::Display for Applicability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tbd => write!(f, "TBD"),
            Self::Applicable => write!(f, "Applicable"),
            Self::NotApplicable => write!(f, "Not Applicable"),
        }
    }
}

impl FromStr for Applicability {
    type Err = GrcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "tbd" => Ok(Self::Tbd),
            "applicable" => Ok(Self::Applicable),
            "not_applicable" | "notapplicable" => Ok(Self::NotApplicable),
            _ => Err(GrcError::InvalidValue {
                field: "applicability",
                value: s.to_string(),
            }),
        }
    }
}

/// Implementation progress for an applicable control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImplementationStatus {
    NotStarted,
    InProgress,
    Implemented,
}

impl fmt::Display for ImplementationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "Not Started"),
            Self::InProgress => write!(f, "In Progress"),
            Self::Implemented => write!(f, "Implemented"),
        }
    }
}

impl FromStr for ImplementationStatus {
    type Err = GrcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "not_started" | "notstarted" => Ok(Self::NotStarted),
            "in_progress" | "inprogress" => Ok(Self::InProgress),
            "implemented" => Ok(Self::Implemented),
            _ => Err(GrcError::InvalidValue {
                field: "implementation status",
                value: s.to_string(),
            }),
        }
    }
}

/// Control priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
        }
    }
}

impl FromStr for Priority {
    type Err = GrcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(GrcError::InvalidValue {
                field: "priority",
                value: s.to_string(),
            }),
        }
    }
}

/// One immutable status-history entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: DateTime<Utc>,
    pub description: String,
    pub actor: String,
}

/// SOA record for one catalog control
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoaRecord {
    /// Annex A control id this record tracks
    pub control_id: String,
    pub applicability: Applicability,
    /// Always `None` while the control is not applicable
    pub implementation_status: Option<ImplementationStatus>,
    pub priority: Option<Priority>,
    pub evidence: Option<String>,
    pub justification: String,
    pub responsible_owner: String,
    pub target_date: Option<NaiveDate>,
    pub next_review: Option<NaiveDate>,
    /// Append-only; never pruned
    pub status_history: Vec<HistoryEntry>,
    pub updated_at: DateTime<Utc>,
}

impl SoaRecord {
    fn new(control_id: &str) -> Self {
        Self {
            control_id: control_id.to_string(),
            applicability: Applicability::Tbd,
            implementation_status: None,
            priority: None,
            evidence: None,
            justification: String::new(),
            responsible_owner: String::new(),
            target_date: None,
            next_review: None,
            status_history: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Control category from the catalog
    pub fn category(&self) -> Option<ControlCategory> {
        catalog::lookup(&self.control_id).map(|c| c.category)
    }

    /// Control name from the catalog
    pub fn control_name(&self) -> &'static str {
        catalog::lookup(&self.control_id).map(|c| c.name).unwrap_or("")
    }

    fn push_history(&mut self, description: String, actor: &str) {
        self.status_history.push(HistoryEntry {
            date: Utc::now(),
            description,
            actor: actor.to_string(),
        });
    }
}

/// Editable detail fields; `None` leaves the current value untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SoaDetailsUpdate {
    pub responsible_owner: Option<String>,
    pub priority: Option<Priority>,
    pub evidence: Option<String>,
    pub justification: Option<String>,
    pub target_date: Option<NaiveDate>,
    pub next_review: Option<NaiveDate>,
}

/// Sortable SOA columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoaSortKey {
    /// Catalog order (A.5.1 before A.5.10)
    ControlId,
    Owner,
    Applicability,
    ImplementationStatus,
    TargetDate,
}

impl SoaSortKey {
    fn value_of(&self, record: &SoaRecord) -> SortValue {
        match self {
            Self::ControlId => {
                let position = catalog::all()
                    .iter()
                    .position(|c| c.id == record.control_id)
                    .unwrap_or(usize::MAX);
                SortValue::Number(position as i64)
            }
            Self::Owner => SortValue::Text(record.responsible_owner.clone()),
            Self::Applicability => SortValue::Text(record.applicability.to_string()),
            Self::ImplementationStatus => SortValue::Text(
                record
                    .implementation_status
                    .map(|s| s.to_string())
                    .unwrap_or_default(),
            ),
            Self::TargetDate => SortValue::Number(
                record
                    .target_date
                    .map(|d| d.and_hms_opt(0, 0, 0).map(|t| t.and_utc().timestamp()).unwrap_or(0))
                    .unwrap_or(i64::MAX),
            ),
        }
    }
}

impl FromStr for SoaSortKey {
    type Err = GrcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "control_id" | "control" => Ok(Self::ControlId),
            "owner" => Ok(Self::Owner),
            "applicability" => Ok(Self::Applicability),
            "implementation_status" | "status" => Ok(Self::ImplementationStatus),
            "target_date" => Ok(Self::TargetDate),
            _ => Err(GrcError::InvalidValue {
                field: "soa sort key",
                value: s.to_string(),
            }),
        }
    }
}

/// SOA filter; `None` fields are unconstrained, predicates AND together
#[derive(Debug, Clone, Default)]
pub struct SoaFilter {
    pub applicability: Option<Applicability>,
    pub implementation_status: Option<ImplementationStatus>,
    pub priority: Option<Priority>,
    pub owner: Option<String>,
    pub category: Option<ControlCategory>,
    pub search: Option<String>,
}

impl SoaFilter {
    /// True when the record satisfies every set predicate
    pub fn matches(&self, record: &SoaRecord) -> bool {
        if let Some(a) = self.applicability {
            if record.applicability != a {
                return false;
            }
        }
        if let Some(s) = self.implementation_status {
            if record.implementation_status != Some(s) {
                return false;
            }
        }
        if let Some(p) = self.priority {
            if record.priority != Some(p) {
                return false;
            }
        }
        if let Some(owner) = &self.owner {
            if !owner.is_empty() && !record.responsible_owner.eq_ignore_ascii_case(owner) {
                return false;
            }
        }
        if let Some(c) = self.category {
            if record.category() != Some(c) {
                return false;
            }
        }
        if let Some(text) = &self.search {
            if !text.is_empty() && !self.matches_text(record, text) {
                return false;
            }
        }
        true
    }

    fn matches_text(&self, record: &SoaRecord, text: &str) -> bool {
        query::contains_ci(&record.control_id, text)
            || query::contains_ci(record.control_name(), text)
            || query::contains_ci(&record.responsible_owner, text)
            || query::contains_ci(&record.justification, text)
            || record
                .evidence
                .as_deref()
                .is_some_and(|e| query::contains_ci(e, text))
    }
}

/// Statement-of-applicability register
#[derive(Clone)]
pub struct SoaRegister {
    records: Arc<RwLock<Vec<SoaRecord>>>,
}

impl SoaRegister {
    /// Seed one TBD record per catalog control
    pub fn new() -> Self {
        let records = catalog::all()
            .iter()
            .map(|control| SoaRecord::new(control.id))
            .collect();
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    /// All records in catalog order
    pub fn all(&self) -> Vec<SoaRecord> {
        self.records.read().clone()
    }

    /// Get the record for a control
    pub fn get(&self, control_id: &str) -> GrcResult<SoaRecord> {
        self.records
            .read()
            .iter()
            .find(|r| r.control_id == control_id)
            .cloned()
            .ok_or_else(|| GrcError::UnknownControl(control_id.to_string()))
    }

    /// Applicability transition with the cross-field cascade
    ///
    /// Moving to NotApplicable clears implementation status, priority and
    /// evidence, and replaces the justification with the exclusion
    /// template. Moving back to Applicable does not restore the discarded
    /// values. Setting the current value again is a no-op.
    pub fn set_applicability(
        &self,
        control_id: &str,
        applicability: Applicability,
        actor: &str,
    ) -> GrcResult<SoaRecord> {
        let mut records = self.records.write();
        let record = records
            .iter_mut()
            .find(|r| r.control_id == control_id)
            .ok_or_else(|| GrcError::UnknownControl(control_id.to_string()))?;

        if record.applicability == applicability {
            return Ok(record.clone());
        }

        let previous = record.applicability;
        record.applicability = applicability;
        if applicability == Applicability::NotApplicable {
            record.implementation_status = None;
            record.priority = None;
            record.evidence = None;
            record.justification = EXCLUSION_JUSTIFICATION.to_string();
        }
        record.push_history(
            format!("Applicability changed from {} to {}", previous, applicability),
            actor,
        );
        record.updated_at = Utc::now();
        tracing::info!(control_id, %applicability, "applicability changed");
        Ok(record.clone())
    }

    /// Set implementation progress; rejected while the control is excluded
    pub fn set_implementation_status(
        &self,
        control_id: &str,
        status: Option<ImplementationStatus>,
        actor: &str,
    ) -> GrcResult<SoaRecord> {
        let mut records = self.records.write();
        let record = records
            .iter_mut()
            .find(|r| r.control_id == control_id)
            .ok_or_else(|| GrcError::UnknownControl(control_id.to_string()))?;

        if record.applicability == Applicability::NotApplicable && status.is_some() {
            return Err(GrcError::ControlNotApplicable(control_id.to_string()));
        }

        let previous = record.implementation_status;
        record.implementation_status = status;
        record.push_history(
            format!(
                "Implementation status changed from {} to {}",
                previous.map(|s| s.to_string()).unwrap_or_else(|| "None".into()),
                status.map(|s| s.to_string()).unwrap_or_else(|| "None".into()),
            ),
            actor,
        );
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    /// Update detail fields; priority and evidence are rejected while the
    /// control is excluded
    pub fn update_details(
        &self,
        control_id: &str,
        update: SoaDetailsUpdate,
        actor: &str,
    ) -> GrcResult<SoaRecord> {
        let mut records = self.records.write();
        let record = records
            .iter_mut()
            .find(|r| r.control_id == control_id)
            .ok_or_else(|| GrcError::UnknownControl(control_id.to_string()))?;

        if record.applicability == Applicability::NotApplicable
            && (update.priority.is_some() || update.evidence.is_some())
        {
            return Err(GrcError::ControlNotApplicable(control_id.to_string()));
        }

        let mut changed = Vec::new();
        if let Some(owner) = update.responsible_owner {
            record.responsible_owner = owner;
            changed.push("owner");
        }
        if let Some(priority) = update.priority {
            record.priority = Some(priority);
            changed.push("priority");
        }
        if let Some(evidence) = update.evidence {
            record.evidence = Some(evidence);
            changed.push("evidence");
        }
        if let Some(justification) = update.justification {
            record.justification = justification;
            changed.push("justification");
        }
        if let Some(target_date) = update.target_date {
            record.target_date = Some(target_date);
            changed.push("target date");
        }
        if let Some(next_review) = update.next_review {
            record.next_review = Some(next_review);
            changed.push("next review");
        }

        if !changed.is_empty() {
            record.push_history(format!("Updated {}", changed.join(", ")), actor);
            record.updated_at = Utc::now();
        }
        Ok(record.clone())
    }

    /// Run the full table pipeline: filter -> stable sort -> paginate
    pub fn query(
        &self,
        filter: &SoaFilter,
        sort: SoaSortKey,
        direction: Direction,
        page_size: usize,
        page: usize,
    ) -> Page<SoaRecord> {
        let mut records: Vec<SoaRecord> = self
            .records
            .read()
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        query::sort_records(&mut records, direction, |r| sort.value_of(r));
        query::paginate(&records, page_size, page)
    }
}

impl Default for SoaRegister {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_from_catalog() {
        let register = SoaRegister::new();
        let records = register.all();
        assert_eq!(records.len(), 93);
        assert!(records.iter().all(|r| r.applicability == Applicability::Tbd));
    }

    #[test]
    fn test_exclusion_cascade_clears_fields() {
        let register = SoaRegister::new();
        register
            .set_applicability("A.8.15", Applicability::Applicable, "alice")
            .unwrap();
        register
            .set_implementation_status("A.8.15", Some(ImplementationStatus::Implemented), "alice")
            .unwrap();
        register
            .update_details(
                "A.8.15",
                SoaDetailsUpdate {
                    priority: Some(Priority::High),
                    evidence: Some("Log pipeline runbook".into()),
                    ..Default::default()
                },
                "alice",
            )
            .unwrap();

        let history_before = register.get("A.8.15").unwrap().status_history.len();
        let record = register
            .set_applicability("A.8.15", Applicability::NotApplicable, "alice")
            .unwrap();

        assert_eq!(record.implementation_status, None);
        assert_eq!(record.priority, None);
        assert_eq!(record.evidence, None);
        assert_eq!(record.justification, EXCLUSION_JUSTIFICATION);
        // exactly one new history entry for the transition
        assert_eq!(record.status_history.len(), history_before + 1);
    }

    #[test]
    fn test_reapplying_does_not_restore() {
        let register = SoaRegister::new();
        register
            .set_applicability("A.5.1", Applicability::Applicable, "bob")
            .unwrap();
        register
            .set_implementation_status("A.5.1", Some(ImplementationStatus::InProgress), "bob")
            .unwrap();
        register
            .set_applicability("A.5.1", Applicability::NotApplicable, "bob")
            .unwrap();
        let record = register
            .set_applicability("A.5.1", Applicability::Applicable, "bob")
            .unwrap();
        assert_eq!(record.implementation_status, None);
        assert_eq!(record.priority, None);
    }

    #[test]
    fn test_same_value_is_noop() {
        let register = SoaRegister::new();
        let before = register.get("A.6.1").unwrap();
        let after = register
            .set_applicability("A.6.1", Applicability::Tbd, "carol")
            .unwrap();
        assert_eq!(after.status_history.len(), before.status_history.len());
    }

    #[test]
    fn test_implementation_rejected_when_excluded() {
        let register = SoaRegister::new();
        register
            .set_applicability("A.7.1", Applicability::NotApplicable, "dave")
            .unwrap();
        assert!(matches!(
            register.set_implementation_status(
                "A.7.1",
                Some(ImplementationStatus::NotStarted),
                "dave"
            ),
            Err(GrcError::ControlNotApplicable(_))
        ));
    }

    #[test]
    fn test_unknown_control_rejected() {
        let register = SoaRegister::new();
        assert!(matches!(
            register.set_applicability("A.9.1", Applicability::Applicable, "eve"),
            Err(GrcError::UnknownControl(_))
        ));
    }

    #[test]
    fn test_history_is_append_only_and_ordered() {
        let register = SoaRegister::new();
        register
            .set_applicability("A.8.1", Applicability::Applicable, "alice")
            .unwrap();
        register
            .set_implementation_status("A.8.1", Some(ImplementationStatus::InProgress), "bob")
            .unwrap();
        register
            .update_details(
                "A.8.1",
                SoaDetailsUpdate {
                    responsible_owner: Some("it-sec".into()),
                    ..Default::default()
                },
                "carol",
            )
            .unwrap();

        let record = register.get("A.8.1").unwrap();
        assert_eq!(record.status_history.len(), 3);
        let dates: Vec<_> = record.status_history.iter().map(|h| h.date).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);
        assert_eq!(record.status_history[0].actor, "alice");
        assert_eq!(record.status_history[2].actor, "carol");
    }

    #[test]
    fn test_control_id_sort_uses_catalog_order() {
        let register = SoaRegister::new();
        let page = register.query(
            &SoaFilter::default(),
            SoaSortKey::ControlId,
            Direction::Asc,
            93,
            1,
        );
        let ids: Vec<_> = page.items.iter().map(|r| r.control_id.clone()).collect();
        // catalog order, not lexicographic: A.5.9 before A.5.10
        let i9 = ids.iter().position(|id| id == "A.5.9").unwrap();
        let i10 = ids.iter().position(|id| id == "A.5.10").unwrap();
        assert!(i9 < i10);
    }
}
