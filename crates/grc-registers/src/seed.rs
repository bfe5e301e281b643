//! Demo data
//!
//! Seeds the in-memory registers with the datasets the console starts
//! with. Everything goes through the engine commands so the audit trail
//! reflects the seeding.

use chrono::NaiveDate;
use uuid::Uuid;

use grc_common::{GrcResult, Rating};

use crate::assets::{AssetDraft, AssetType};
use crate::risks::{RiskCategory, RiskDraft, RiskStatus, TreatmentDecision};
use crate::soa::{Applicability, ImplementationStatus, Priority, SoaDetailsUpdate};
use crate::treatment::{ActionItemDraft, PlanDraft, PlanStatus, TaskStatus};
use crate::GrcEngine;

const ACTOR: &str = "system";

/// Populate an engine with the demo datasets
pub fn seed_demo_data(engine: &GrcEngine) -> GrcResult<()> {
    let assets = seed_assets(engine)?;
    let risks = seed_risks(engine, &assets)?;
    seed_soa(engine)?;
    seed_treatment(engine, &risks)?;
    tracing::info!("demo data seeded");
    Ok(())
}

fn rating(value: u8) -> GrcResult<Rating> {
    Rating::new(value)
}

fn asset(
    name: &str,
    asset_type: AssetType,
    owner: &str,
    description: &str,
    c: u8,
    i: u8,
    a: u8,
) -> GrcResult<AssetDraft> {
    Ok(AssetDraft {
        name: name.into(),
        asset_type,
        owner: owner.into(),
        description: description.into(),
        confidentiality: rating(c)?,
        integrity: rating(i)?,
        availability: rating(a)?,
    })
}

fn seed_assets(engine: &GrcEngine) -> GrcResult<Vec<Uuid>> {
    let drafts = [
        asset(
            "Customer database",
            AssetType::Information,
            "Dana Whitfield",
            "Primary PostgreSQL cluster holding customer PII",
            5,
            5,
            5,
        )?,
        asset(
            "HR payroll service",
            AssetType::Service,
            "Priya Raman",
            "Outsourced payroll processing portal",
            5,
            4,
            3,
        )?,
        asset(
            "Office laptops",
            AssetType::Hardware,
            "Tom Okafor",
            "Standard-issue endpoint fleet",
            3,
            3,
            2,
        )?,
        asset(
            "Source repository",
            AssetType::Software,
            "Dana Whitfield",
            "Self-hosted git server",
            4,
            5,
            4,
        )?,
        asset(
            "Headquarters server room",
            AssetType::Site,
            "Facilities",
            "On-premise rack space, badge access",
            2,
            3,
            4,
        )?,
        asset(
            "Support engineers",
            AssetType::People,
            "Priya Raman",
            "Tier-2 support team with production access",
            4,
            2,
            2,
        )?,
    ];

    let mut ids = Vec::new();
    for draft in drafts {
        ids.push(engine.create_asset(draft, ACTOR)?.id);
    }
    Ok(ids)
}

fn seed_risks(engine: &GrcEngine, assets: &[Uuid]) -> GrcResult<Vec<Uuid>> {
    let drafts = [
        RiskDraft {
            title: "Ransomware outbreak on endpoint fleet".into(),
            description: "Phishing-delivered ransomware encrypting shared drives".into(),
            category: RiskCategory::Security,
            owner: "Dana Whitfield".into(),
            likelihood: rating(4)?,
            impact: rating(5)?,
            revised_likelihood: Some(rating(2)?),
            revised_impact: Some(rating(4)?),
            related_assets: vec![assets[2], assets[0]],
            iso_mapping: vec!["A.8.7".into(), "A.8.13".into()],
            new_control_mapping: Vec::new(),
            treatment_decision: TreatmentDecision::Mitigate,
            status: RiskStatus::InProgress,
        },
        RiskDraft {
            title: "Customer data exfiltration".into(),
            description: "Unauthorized bulk export of customer PII".into(),
            category: RiskCategory::Privacy,
            owner: "Dana Whitfield".into(),
            likelihood: rating(5)?,
            impact: rating(5)?,
            revised_likelihood: Some(rating(3)?),
            revised_impact: Some(rating(5)?),
            related_assets: vec![assets[0]],
            iso_mapping: vec!["A.8.12".into(), "A.5.34".into()],
            new_control_mapping: Vec::new(),
            treatment_decision: TreatmentDecision::Mitigate,
            status: RiskStatus::Open,
        },
        RiskDraft {
            title: "Payroll provider outage".into(),
            description: "Extended unavailability of the outsourced payroll service".into(),
            category: RiskCategory::Operational,
            owner: "Priya Raman".into(),
            likelihood: rating(2)?,
            impact: rating(3)?,
            revised_likelihood: None,
            revised_impact: None,
            related_assets: vec![assets[1]],
            iso_mapping: vec!["A.5.22".into()],
            new_control_mapping: Vec::new(),
            treatment_decision: TreatmentDecision::Transfer,
            status: RiskStatus::Open,
        },
        RiskDraft {
            title: "Server room power failure".into(),
            description: "Single UPS feed to the on-premise rack".into(),
            category: RiskCategory::Operational,
            owner: "Facilities".into(),
            likelihood: rating(3)?,
            impact: rating(4)?,
            revised_likelihood: Some(rating(2)?),
            revised_impact: Some(rating(2)?),
            related_assets: vec![assets[4]],
            iso_mapping: vec!["A.7.11".into()],
            new_control_mapping: Vec::new(),
            treatment_decision: TreatmentDecision::Mitigate,
            status: RiskStatus::Accepted,
        },
        RiskDraft {
            title: "Insider source-code leak".into(),
            description: "Departing engineer cloning private repositories".into(),
            category: RiskCategory::Security,
            owner: "Tom Okafor".into(),
            likelihood: rating(2)?,
            impact: rating(4)?,
            revised_likelihood: None,
            revised_impact: None,
            related_assets: vec![assets[3], assets[5]],
            iso_mapping: vec!["A.8.4".into(), "A.6.5".into()],
            new_control_mapping: Vec::new(),
            treatment_decision: TreatmentDecision::Mitigate,
            status: RiskStatus::Open,
        },
    ];

    let mut ids = Vec::new();
    for draft in drafts {
        ids.push(engine.create_risk(draft, ACTOR)?.id);
    }
    Ok(ids)
}

fn seed_soa(engine: &GrcEngine) -> GrcResult<()> {
    let applicable = [
        ("A.5.1", Some(ImplementationStatus::Implemented), Priority::High),
        ("A.5.34", Some(ImplementationStatus::InProgress), Priority::High),
        ("A.6.5", Some(ImplementationStatus::NotStarted), Priority::Medium),
        ("A.7.11", Some(ImplementationStatus::InProgress), Priority::Medium),
        ("A.8.7", Some(ImplementationStatus::Implemented), Priority::High),
        ("A.8.12", Some(ImplementationStatus::InProgress), Priority::High),
        ("A.8.13", Some(ImplementationStatus::Implemented), Priority::High),
        ("A.8.15", Some(ImplementationStatus::Implemented), Priority::Medium),
    ];
    for (control_id, status, priority) in applicable {
        engine.set_control_applicability(control_id, Applicability::Applicable, ACTOR)?;
        engine.set_control_implementation(control_id, status, ACTOR)?;
        engine.update_control_details(
            control_id,
            SoaDetailsUpdate {
                responsible_owner: Some("Dana Whitfield".into()),
                priority: Some(priority),
                target_date: NaiveDate::from_ymd_opt(2026, 12, 31),
                ..Default::default()
            },
            ACTOR,
        )?;
    }

    // no cloud services in scope yet
    engine.set_control_applicability("A.5.23", Applicability::NotApplicable, ACTOR)?;
    Ok(())
}

fn seed_treatment(engine: &GrcEngine, risks: &[Uuid]) -> GrcResult<()> {
    let plan = engine.create_plan(
        PlanDraft {
            title: "Ransomware resilience programme".into(),
            description: "Reduce likelihood and blast radius of endpoint ransomware".into(),
            owner: "Dana Whitfield".into(),
            risk_ids: vec![risks[0]],
            status: PlanStatus::Active,
        },
        ACTOR,
    )?;

    let items = [
        ActionItemDraft {
            title: "Deploy EDR to all endpoints".into(),
            owner: "Tom Okafor".into(),
            status: TaskStatus::Completed,
            progress: 100,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 12),
            due_date: NaiveDate::from_ymd_opt(2026, 3, 31),
        },
        ActionItemDraft {
            title: "Quarterly phishing simulation".into(),
            owner: "Priya Raman".into(),
            status: TaskStatus::InProgress,
            progress: 40,
            start_date: NaiveDate::from_ymd_opt(2026, 2, 1),
            due_date: NaiveDate::from_ymd_opt(2026, 11, 30),
        },
        ActionItemDraft {
            title: "Immutable offsite backups".into(),
            owner: "Dana Whitfield".into(),
            status: TaskStatus::Open,
            progress: 0,
            start_date: NaiveDate::from_ymd_opt(2026, 6, 1),
            due_date: NaiveDate::from_ymd_opt(2026, 9, 30),
        },
    ];
    for draft in items {
        engine.add_action_item(plan.id, draft, ACTOR)?;
    }

    engine.add_milestone(
        plan.id,
        "Tabletop exercise complete".into(),
        NaiveDate::from_ymd_opt(2026, 10, 15),
        ACTOR,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_populates_all_registers() {
        let engine = GrcEngine::new();
        seed_demo_data(&engine).unwrap();

        assert_eq!(engine.assets.active().len(), 6);
        assert_eq!(engine.risks.all().len(), 5);
        assert_eq!(engine.treatment.all().len(), 1);
        assert!(engine.audit.count() > 0);
        assert!(engine.audit.verify_integrity().valid);

        // applicability decisions recorded
        let soa = engine.soa.get("A.5.23").unwrap();
        assert_eq!(soa.applicability, Applicability::NotApplicable);
    }

    #[test]
    fn test_seeded_relations_are_consistent() {
        let engine = GrcEngine::new();
        seed_demo_data(&engine).unwrap();

        // the customer database carries references from two open risks
        let db = engine
            .assets
            .active()
            .into_iter()
            .find(|a| a.name == "Customer database")
            .unwrap();
        assert_eq!(db.associated_risks.len(), 2);
        assert!(db.has_open_risks());

        // plan progress is the mean of its action items
        let plan = &engine.treatment.all()[0];
        assert_eq!(plan.progress(), (100 + 40) / 3);
    }
}
