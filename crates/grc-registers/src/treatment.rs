//! Risk Treatment Plans
//!
//! One plan holds many action items and milestones. Plan progress is the
//! mean of its action-item progress, computed on read.

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use grc_common::{GrcError, GrcResult};

use crate::query::{self, Direction, Page, SortValue};

/// Plan lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanStatus {
    Draft,
    Active,
    OnHold,
    Completed,
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "Draft"),
            Self::Active => write!(f, "Active"),
            Self::OnHold => write!(f, "On Hold"),
            Self::Completed => write!(f, "Completed"),
        }
    }
}

impl FromStr for PlanStatus {
    type Err = GrcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "draft" => Ok(Self::Draft),
            "active" => Ok(Self::Active),
            "on_hold" | "onhold" => Ok(Self::OnHold),
            "completed" => Ok(Self::Completed),
            _ => Err(GrcError::InvalidValue {
                field: "plan status",
                value: s.to_string(),
            }),
        }
    }
}

/// Action item / milestone status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Open,
    InProgress,
    Blocked,
    Completed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "Open"),
            Self::InProgress => write!(f, "In Progress"),
            Self::Blocked => write!(f, "Blocked"),
            Self::Completed => write!(f, "Completed"),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = GrcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "open" => Ok(Self::Open),
            "in_progress" | "inprogress" => Ok(Self::InProgress),
            "blocked" => Ok(Self::Blocked),
            "completed" => Ok(Self::Completed),
            _ => Err(GrcError::InvalidValue {
                field: "task status",
                value: s.to_string(),
            }),
        }
    }
}

/// Action item within a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionItem {
    pub id: Uuid,
    pub title: String,
    pub owner: String,
    pub status: TaskStatus,
    /// 0..=100
    pub progress: u8,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

/// Milestone within a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    pub id: Uuid,
    pub title: String,
    pub status: TaskStatus,
    /// 0..=100
    pub progress: u8,
    pub due_date: Option<NaiveDate>,
}

/// Treatment plan record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreatmentPlan {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub owner: String,
    pub status: PlanStatus,
    /// Risk ids this plan treats (by convention, not enforced)
    pub risk_ids: Vec<Uuid>,
    pub action_items: Vec<ActionItem>,
    pub milestones: Vec<Milestone>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TreatmentPlan {
    /// Mean of action-item progress; 0 for a plan with no action items
    pub fn progress(&self) -> u8 {
        if self.action_items.is_empty() {
            return 0;
        }
        let total: u32 = self.action_items.iter().map(|a| a.progress as u32).sum();
        (total / self.action_items.len() as u32) as u8
    }

    /// Action items past their due date and not completed
    pub fn overdue_items(&self, today: NaiveDate) -> Vec<&ActionItem> {
        self.action_items
            .iter()
            .filter(|a| {
                a.status != TaskStatus::Completed && a.due_date.is_some_and(|due| due < today)
            })
            .collect()
    }
}

/// Fields accepted when creating or updating a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub owner: String,
    #[serde(default)]
    pub risk_ids: Vec<Uuid>,
    #[serde(default = "default_plan_status")]
    pub status: PlanStatus,
}

fn default_plan_status() -> PlanStatus {
    PlanStatus::Draft
}

impl PlanDraft {
    fn validate(&self) -> GrcResult<()> {
        if self.title.trim().is_empty() {
            return Err(GrcError::MissingField("title"));
        }
        if self.owner.trim().is_empty() {
            return Err(GrcError::MissingField("owner"));
        }
        Ok(())
    }
}

/// Fields accepted when creating an action item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionItemDraft {
    pub title: String,
    pub owner: String,
    #[serde(default = "default_task_status")]
    pub status: TaskStatus,
    /// Clamped to 0..=100
    #[serde(default)]
    pub progress: u8,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

fn default_task_status() -> TaskStatus {
    TaskStatus::Open
}

impl ActionItemDraft {
    fn validate(&self) -> GrcResult<()> {
        if self.title.trim().is_empty() {
            return Err(GrcError::MissingField("title"));
        }
        if self.owner.trim().is_empty() {
            return Err(GrcError::MissingField("owner"));
        }
        if let (Some(start), Some(due)) = (self.start_date, self.due_date) {
            if due < start {
                return Err(GrcError::InvalidDateRange(format!(
                    "due date {} precedes start date {}",
                    due, start
                )));
            }
        }
        Ok(())
    }
}

/// Sortable plan columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanSortKey {
    Title,
    Owner,
    Status,
    Progress,
    UpdatedAt,
}

impl PlanSortKey {
    fn value_of(&self, plan: &TreatmentPlan) -> SortValue {
        match self {
            Self::Title => SortValue::Text(plan.title.clone()),
            Self::Owner => SortValue::Text(plan.owner.clone()),
            Self::Status => SortValue::Text(plan.status.to_string()),
            Self::Progress => SortValue::Number(plan.progress() as i64),
            Self::UpdatedAt => SortValue::Number(plan.updated_at.timestamp_millis()),
        }
    }
}

impl FromStr for PlanSortKey {
    type Err = GrcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "title" => Ok(Self::Title),
            "owner" => Ok(Self::Owner),
            "status" => Ok(Self::Status),
            "progress" => Ok(Self::Progress),
            "updated_at" | "updated" => Ok(Self::UpdatedAt),
            _ => Err(GrcError::InvalidValue {
                field: "plan sort key",
                value: s.to_string(),
            }),
        }
    }
}

/// Plan filter; `None` fields are unconstrained, predicates AND together
#[derive(Debug, Clone, Default)]
pub struct PlanFilter {
    pub status: Option<PlanStatus>,
    pub owner: Option<String>,
    pub risk_id: Option<Uuid>,
    pub search: Option<String>,
}

impl PlanFilter {
    /// True when the plan satisfies every set predicate
    pub fn matches(&self, plan: &TreatmentPlan) -> bool {
        if let Some(s) = self.status {
            if plan.status != s {
                return false;
            }
        }
        if let Some(owner) = &self.owner {
            if !owner.is_empty() && !plan.owner.eq_ignore_ascii_case(owner) {
                return false;
            }
        }
        if let Some(risk_id) = self.risk_id {
            if !plan.risk_ids.contains(&risk_id) {
                return false;
            }
        }
        if let Some(text) = &self.search {
            if !text.is_empty()
                && !(query::contains_ci(&plan.title, text)
                    || query::contains_ci(&plan.id.to_string(), text)
                    || query::contains_ci(&plan.owner, text)
                    || query::contains_ci(&plan.description, text))
            {
                return false;
            }
        }
        true
    }
}

/// Treatment plan register
#[derive(Clone)]
pub struct TreatmentRegister {
    plans: Arc<RwLock<Vec<TreatmentPlan>>>,
}

impl TreatmentRegister {
    pub fn new() -> Self {
        Self {
            plans: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Create a plan from a validated draft
    pub fn create(&self, draft: PlanDraft) -> GrcResult<TreatmentPlan> {
        draft.validate()?;
        let now = Utc::now();
        let plan = TreatmentPlan {
            id: Uuid::new_v4(),
            title: draft.title,
            description: draft.description,
            owner: draft.owner,
            status: draft.status,
            risk_ids: draft.risk_ids,
            action_items: Vec::new(),
            milestones: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.plans.write().push(plan.clone());
        tracing::info!(plan_id = %plan.id, title = %plan.title, "treatment plan created");
        Ok(plan)
    }

    /// Get plan by id
    pub fn get(&self, id: Uuid) -> Option<TreatmentPlan> {
        self.plans.read().iter().find(|p| p.id == id).cloned()
    }

    /// Replace the editable fields of a plan
    pub fn update(&self, id: Uuid, draft: PlanDraft) -> GrcResult<TreatmentPlan> {
        draft.validate()?;
        let mut plans = self.plans.write();
        let plan = plans
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| GrcError::NotFound(id.to_string()))?;
        plan.title = draft.title;
        plan.description = draft.description;
        plan.owner = draft.owner;
        plan.status = draft.status;
        plan.risk_ids = draft.risk_ids;
        plan.updated_at = Utc::now();
        Ok(plan.clone())
    }

    /// Remove a plan (and its items/milestones with it)
    pub fn delete(&self, id: Uuid) -> GrcResult<()> {
        let mut plans = self.plans.write();
        let before = plans.len();
        plans.retain(|p| p.id != id);
        if plans.len() == before {
            return Err(GrcError::NotFound(id.to_string()));
        }
        Ok(())
    }

    /// Add an action item to a plan
    pub fn add_action_item(&self, plan_id: Uuid, draft: ActionItemDraft) -> GrcResult<ActionItem> {
        draft.validate()?;
        let mut plans = self.plans.write();
        let plan = plans
            .iter_mut()
            .find(|p| p.id == plan_id)
            .ok_or_else(|| GrcError::NotFound(plan_id.to_string()))?;
        let item = ActionItem {
            id: Uuid::new_v4(),
            title: draft.title,
            owner: draft.owner,
            status: draft.status,
            progress: draft.progress.min(100),
            start_date: draft.start_date,
            due_date: draft.due_date,
        };
        plan.action_items.push(item.clone());
        plan.updated_at = Utc::now();
        Ok(item)
    }

    /// Update an action item's status and progress
    pub fn update_action_item(
        &self,
        plan_id: Uuid,
        item_id: Uuid,
        status: TaskStatus,
        progress: u8,
    ) -> GrcResult<ActionItem> {
        let mut plans = self.plans.write();
        let plan = plans
            .iter_mut()
            .find(|p| p.id == plan_id)
            .ok_or_else(|| GrcError::NotFound(plan_id.to_string()))?;
        let item = plan
            .action_items
            .iter_mut()
            .find(|a| a.id == item_id)
            .ok_or_else(|| GrcError::NotFound(item_id.to_string()))?;
        item.status = status;
        item.progress = progress.min(100);
        let item = item.clone();
        plan.updated_at = Utc::now();
        Ok(item)
    }

    /// Add a milestone to a plan
    pub fn add_milestone(
        &self,
        plan_id: Uuid,
        title: String,
        due_date: Option<NaiveDate>,
    ) -> GrcResult<Milestone> {
        if title.trim().is_empty() {
            return Err(GrcError::MissingField("title"));
        }
        let mut plans = self.plans.write();
        let plan = plans
            .iter_mut()
            .find(|p| p.id == plan_id)
            .ok_or_else(|| GrcError::NotFound(plan_id.to_string()))?;
        let milestone = Milestone {
            id: Uuid::new_v4(),
            title,
            status: TaskStatus::Open,
            progress: 0,
            due_date,
        };
        plan.milestones.push(milestone.clone());
        plan.updated_at = Utc::now();
        Ok(milestone)
    }

    /// Update a milestone's status and progress
    pub fn update_milestone(
        &self,
        plan_id: Uuid,
        milestone_id: Uuid,
        status: TaskStatus,
        progress: u8,
    ) -> GrcResult<Milestone> {
        let mut plans = self.plans.write();
        let plan = plans
            .iter_mut()
            .find(|p| p.id == plan_id)
            .ok_or_else(|| GrcError::NotFound(plan_id.to_string()))?;
        let milestone = plan
            .milestones
            .iter_mut()
            .find(|m| m.id == milestone_id)
            .ok_or_else(|| GrcError::NotFound(milestone_id.to_string()))?;
        milestone.status = status;
        milestone.progress = progress.min(100);
        let milestone = milestone.clone();
        plan.updated_at = Utc::now();
        Ok(milestone)
    }

    /// All plans in insertion order
    pub fn all(&self) -> Vec<TreatmentPlan> {
        self.plans.read().clone()
    }

    /// Action items past due across all plans
    pub fn overdue_items(&self, today: NaiveDate) -> Vec<(Uuid, ActionItem)> {
        self.plans
            .read()
            .iter()
            .flat_map(|p| {
                p.overdue_items(today)
                    .into_iter()
                    .map(|a| (p.id, a.clone()))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Run the full table pipeline: filter -> stable sort -> paginate
    pub fn query(
        &self,
        filter: &PlanFilter,
        sort: PlanSortKey,
        direction: Direction,
        page_size: usize,
        page: usize,
    ) -> Page<TreatmentPlan> {
        let mut records: Vec<TreatmentPlan> = self
            .plans
            .read()
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        query::sort_records(&mut records, direction, |p| sort.value_of(p));
        query::paginate(&records, page_size, page)
    }
}

impl Default for TreatmentRegister {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan_draft(title: &str) -> PlanDraft {
        PlanDraft {
            title: title.into(),
            description: String::new(),
            owner: "ciso".into(),
            risk_ids: Vec::new(),
            status: PlanStatus::Active,
        }
    }

    fn item_draft(title: &str, progress: u8) -> ActionItemDraft {
        ActionItemDraft {
            title: title.into(),
            owner: "ops".into(),
            status: TaskStatus::InProgress,
            progress,
            start_date: None,
            due_date: None,
        }
    }

    #[test]
    fn test_progress_is_mean_of_action_items() {
        let register = TreatmentRegister::new();
        let plan = register.create(plan_draft("Patch rollout")).unwrap();
        assert_eq!(register.get(plan.id).unwrap().progress(), 0);

        register.add_action_item(plan.id, item_draft("a", 100)).unwrap();
        register.add_action_item(plan.id, item_draft("b", 50)).unwrap();
        register.add_action_item(plan.id, item_draft("c", 0)).unwrap();

        assert_eq!(register.get(plan.id).unwrap().progress(), 50);
    }

    #[test]
    fn test_progress_clamped_to_100() {
        let register = TreatmentRegister::new();
        let plan = register.create(plan_draft("Clamp")).unwrap();
        let item = register.add_action_item(plan.id, item_draft("a", 250)).unwrap();
        assert_eq!(item.progress, 100);

        let updated = register
            .update_action_item(plan.id, item.id, TaskStatus::Completed, 200)
            .unwrap();
        assert_eq!(updated.progress, 100);
        assert!(register.get(plan.id).unwrap().progress() <= 100);
    }

    #[test]
    fn test_date_ordering_validated() {
        let register = TreatmentRegister::new();
        let plan = register.create(plan_draft("Dates")).unwrap();
        let mut bad = item_draft("backwards", 0);
        bad.start_date = NaiveDate::from_ymd_opt(2026, 6, 1);
        bad.due_date = NaiveDate::from_ymd_opt(2026, 5, 1);
        assert!(matches!(
            register.add_action_item(plan.id, bad),
            Err(GrcError::InvalidDateRange(_))
        ));
    }

    #[test]
    fn test_overdue_items() {
        let register = TreatmentRegister::new();
        let plan = register.create(plan_draft("Overdue")).unwrap();
        let mut late = item_draft("late", 10);
        late.due_date = NaiveDate::from_ymd_opt(2026, 1, 15);
        register.add_action_item(plan.id, late).unwrap();

        let mut done = item_draft("done", 100);
        done.status = TaskStatus::Completed;
        done.due_date = NaiveDate::from_ymd_opt(2026, 1, 15);
        register.add_action_item(plan.id, done).unwrap();

        let today = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        let overdue = register.overdue_items(today);
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].1.title, "late");
    }

    #[test]
    fn test_create_requires_title_and_owner() {
        let register = TreatmentRegister::new();
        let mut draft = plan_draft("x");
        draft.title = "  ".into();
        assert!(matches!(
            register.create(draft),
            Err(GrcError::MissingField("title"))
        ));
    }
}
