//! Dashboards and Reports

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::assets::AssetStatus;
use crate::catalog::ControlCategory;
use crate::scoring::{RiskBand, ValueBand};
use crate::soa::{Applicability, ImplementationStatus, Priority};
use crate::treatment::TaskStatus;
use crate::GrcEngine;

/// Report generator
pub struct ReportGenerator;

impl ReportGenerator {
    /// Risk counts by band, inherent and residual
    pub fn risk_summary(engine: &GrcEngine) -> RiskSummary {
        let risks = engine.risks.all();
        let count_inherent =
            |band| risks.iter().filter(|r| r.inherent_band() == band).count();
        let count_residual =
            |band| risks.iter().filter(|r| r.residual_band() == band).count();

        RiskSummary {
            total: risks.len(),
            open: risks.iter().filter(|r| r.status.is_open()).count(),
            inherent_high: count_inherent(RiskBand::High),
            inherent_medium: count_inherent(RiskBand::Medium),
            inherent_low: count_inherent(RiskBand::Low),
            residual_high: count_residual(RiskBand::High),
            residual_medium: count_residual(RiskBand::Medium),
            residual_low: count_residual(RiskBand::Low),
        }
    }

    /// Asset counts by value band and lifecycle status
    pub fn asset_summary(engine: &GrcEngine) -> AssetSummary {
        let assets = engine.assets.active();
        let count_band = |band| assets.iter().filter(|a| a.value_band() == band).count();

        AssetSummary {
            total: assets.len(),
            critical: count_band(ValueBand::Critical),
            high: count_band(ValueBand::High),
            medium: count_band(ValueBand::Medium),
            low: count_band(ValueBand::Low),
            in_repair: assets
                .iter()
                .filter(|a| a.status == AssetStatus::InRepair)
                .count(),
            decommissioned: assets
                .iter()
                .filter(|a| a.status == AssetStatus::Decommissioned)
                .count(),
            trashed: engine.assets.trash().len(),
        }
    }

    /// SOA applicability and implementation progress
    pub fn soa_summary(engine: &GrcEngine) -> SoaSummary {
        let records = engine.soa.all();
        let applicable = records
            .iter()
            .filter(|r| r.applicability == Applicability::Applicable)
            .count();
        let implemented = records
            .iter()
            .filter(|r| r.implementation_status == Some(ImplementationStatus::Implemented))
            .count();

        SoaSummary {
            total: records.len(),
            applicable,
            not_applicable: records
                .iter()
                .filter(|r| r.applicability == Applicability::NotApplicable)
                .count(),
            tbd: records
                .iter()
                .filter(|r| r.applicability == Applicability::Tbd)
                .count(),
            implemented,
            in_progress: records
                .iter()
                .filter(|r| r.implementation_status == Some(ImplementationStatus::InProgress))
                .count(),
            implemented_percent: if applicable > 0 {
                (implemented as f64 / applicable as f64) * 100.0
            } else {
                0.0
            },
        }
    }

    /// Treatment plan progress and overdue work
    pub fn treatment_summary(engine: &GrcEngine, today: NaiveDate) -> TreatmentSummary {
        let plans = engine.treatment.all();
        let open_actions = plans
            .iter()
            .flat_map(|p| p.action_items.iter())
            .filter(|a| a.status != TaskStatus::Completed)
            .count();

        TreatmentSummary {
            plans: plans.len(),
            open_actions,
            overdue_actions: engine.treatment.overdue_items(today).len(),
            average_progress: if plans.is_empty() {
                0
            } else {
                (plans.iter().map(|p| p.progress() as u32).sum::<u32>() / plans.len() as u32) as u8
            },
        }
    }

    /// Gap analysis: applicable controls not yet implemented
    pub fn gap_analysis(engine: &GrcEngine) -> GapAnalysis {
        let records = engine.soa.all();
        let gaps: Vec<Gap> = records
            .iter()
            .filter(|r| r.applicability == Applicability::Applicable)
            .filter(|r| r.implementation_status != Some(ImplementationStatus::Implemented))
            .map(|r| Gap {
                control_id: r.control_id.clone(),
                control_name: r.control_name().to_string(),
                implementation_status: r.implementation_status,
                remediation_priority: r
                    .priority
                    .unwrap_or_else(|| default_priority(r.category())),
            })
            .collect();

        GapAnalysis {
            total_applicable: records
                .iter()
                .filter(|r| r.applicability == Applicability::Applicable)
                .count(),
            gap_count: gaps.len(),
            gaps,
            generated_at: Utc::now(),
        }
    }

    /// Executive summary across all four registers
    pub fn executive_summary(engine: &GrcEngine, today: NaiveDate) -> ExecutiveSummary {
        ExecutiveSummary {
            generated_at: Utc::now(),
            assets: Self::asset_summary(engine),
            risks: Self::risk_summary(engine),
            soa: Self::soa_summary(engine),
            treatment: Self::treatment_summary(engine, today),
        }
    }
}

fn default_priority(category: Option<ControlCategory>) -> Priority {
    match category {
        Some(ControlCategory::Technological) => Priority::High,
        Some(_) => Priority::Medium,
        None => Priority::Low,
    }
}

/// Risk dashboard counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskSummary {
    pub total: usize,
    pub open: usize,
    pub inherent_high: usize,
    pub inherent_medium: usize,
    pub inherent_low: usize,
    pub residual_high: usize,
    pub residual_medium: usize,
    pub residual_low: usize,
}

/// Asset dashboard counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetSummary {
    pub total: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub in_repair: usize,
    pub decommissioned: usize,
    pub trashed: usize,
}

/// SOA dashboard counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoaSummary {
    pub total: usize,
    pub applicable: usize,
    pub not_applicable: usize,
    pub tbd: usize,
    pub implemented: usize,
    pub in_progress: usize,
    pub implemented_percent: f64,
}

/// Treatment dashboard counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreatmentSummary {
    pub plans: usize,
    pub open_actions: usize,
    pub overdue_actions: usize,
    pub average_progress: u8,
}

/// One unimplemented applicable control
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gap {
    pub control_id: String,
    pub control_name: String,
    pub implementation_status: Option<ImplementationStatus>,
    pub remediation_priority: Priority,
}

/// Gap analysis report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GapAnalysis {
    pub total_applicable: usize,
    pub gap_count: usize,
    pub gaps: Vec<Gap>,
    pub generated_at: DateTime<Utc>,
}

/// Executive summary report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub generated_at: DateTime<Utc>,
    pub assets: AssetSummary,
    pub risks: RiskSummary,
    pub soa: SoaSummary,
    pub treatment: TreatmentSummary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetDraft, AssetType};
    use crate::risks::{RiskCategory, RiskDraft, RiskStatus, TreatmentDecision};
    use grc_common::Rating;

    fn engine_with_data() -> GrcEngine {
        let engine = GrcEngine::new();
        engine
            .create_asset(
                AssetDraft {
                    name: "Core database".into(),
                    asset_type: AssetType::Information,
                    owner: "dba".into(),
                    description: String::new(),
                    confidentiality: Rating::new(5).unwrap(),
                    integrity: Rating::new(5).unwrap(),
                    availability: Rating::new(5).unwrap(),
                },
                "test",
            )
            .unwrap();
        engine
            .create_risk(
                RiskDraft {
                    title: "Data breach".into(),
                    description: String::new(),
                    category: RiskCategory::Security,
                    owner: "ciso".into(),
                    likelihood: Rating::new(5).unwrap(),
                    impact: Rating::new(5).unwrap(),
                    revised_likelihood: Some(Rating::new(2).unwrap()),
                    revised_impact: Some(Rating::new(3).unwrap()),
                    related_assets: Vec::new(),
                    iso_mapping: Vec::new(),
                    new_control_mapping: Vec::new(),
                    treatment_decision: TreatmentDecision::Mitigate,
                    status: RiskStatus::Open,
                },
                "test",
            )
            .unwrap();
        engine
    }

    #[test]
    fn test_risk_summary_bands() {
        let engine = engine_with_data();
        let summary = ReportGenerator::risk_summary(&engine);
        assert_eq!(summary.total, 1);
        assert_eq!(summary.inherent_high, 1);
        assert_eq!(summary.residual_low, 1);
        assert_eq!(summary.residual_high, 0);
    }

    #[test]
    fn test_asset_summary_bands() {
        let engine = engine_with_data();
        let summary = ReportGenerator::asset_summary(&engine);
        assert_eq!(summary.total, 1);
        assert_eq!(summary.critical, 1);
    }

    #[test]
    fn test_gap_analysis_counts_unimplemented_applicable() {
        let engine = engine_with_data();
        engine
            .set_control_applicability("A.8.15", crate::soa::Applicability::Applicable, "test")
            .unwrap();
        engine
            .set_control_applicability("A.8.16", crate::soa::Applicability::Applicable, "test")
            .unwrap();
        engine
            .set_control_implementation(
                "A.8.15",
                Some(ImplementationStatus::Implemented),
                "test",
            )
            .unwrap();

        let gaps = ReportGenerator::gap_analysis(&engine);
        assert_eq!(gaps.total_applicable, 2);
        assert_eq!(gaps.gap_count, 1);
        assert_eq!(gaps.gaps[0].control_id, "A.8.16");
        // technological controls default to high priority
        assert_eq!(gaps.gaps[0].remediation_priority, Priority::High);
    }

    #[test]
    fn test_soa_summary_percent() {
        let engine = GrcEngine::new();
        let summary = ReportGenerator::soa_summary(&engine);
        assert_eq!(summary.total, 93);
        assert_eq!(summary.tbd, 93);
        assert_eq!(summary.implemented_percent, 0.0);
    }
}
