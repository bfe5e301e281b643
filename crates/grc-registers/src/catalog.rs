//! Annex A control catalog
//!
//! The fixed ISO 27001:2022 Annex A control list (93 controls) that
//! risks and the SOA tracker reference by id. The catalog is static;
//! registers validate control ids against it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Annex A control theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlCategory {
    /// A.5 - Organizational controls
    Organizational,
    /// A.6 - People controls
    People,
    /// A.7 - Physical controls
    Physical,
    /// A.8 - Technological controls
    Technological,
}

impl fmt::Display for ControlCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Organizational => write!(f, "Organizational"),
            Self::People => write!(f, "People"),
            Self::Physical => write!(f, "Physical"),
            Self::Technological => write!(f, "Technological"),
        }
    }
}

impl std::str::FromStr for ControlCategory {
    type Err = grc_common::GrcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "organizational" => Ok(Self::Organizational),
            "people" => Ok(Self::People),
            "physical" => Ok(Self::Physical),
            "technological" => Ok(Self::Technological),
            _ => Err(grc_common::GrcError::InvalidValue {
                field: "control category",
                value: s.to_string(),
            }),
        }
    }
}

/// Catalog control definition
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AnnexControl {
    /// Control id, e.g. "A.5.1"
    pub id: &'static str,
    /// Control name from the standard
    pub name: &'static str,
    /// Control theme
    pub category: ControlCategory,
}

/// All 93 Annex A controls
pub fn all() -> &'static [AnnexControl] {
    CONTROLS
}

/// Look up a control by id
pub fn lookup(id: &str) -> Option<&'static AnnexControl> {
    CONTROLS.iter().find(|c| c.id == id)
}

use ControlCategory::{Organizational, People, Physical, Technological};

macro_rules! control {
    ($id:literal, $name:literal, $category:expr) => {
        AnnexControl {
            id: $id,
            name: $name,
            category: $category,
        }
    };
}

const CONTROLS: &[AnnexControl] = &[
    // A.5 - Organizational
    control!("A.5.1", "Policies for information security", Organizational),
    control!("A.5.2", "Information security roles and responsibilities", Organizational),
    control!("A.5.3", "Segregation of duties", Organizational),
    control!("A.5.4", "Management responsibilities", Organizational),
    control!("A.5.5", "Contact with authorities", Organizational),
    control!("A.5.6", "Contact with special interest groups", Organizational),
    control!("A.5.7", "Threat intelligence", Organizational),
    control!("A.5.8", "Information security in project management", Organizational),
    control!("A.5.9", "Inventory of information and other associated assets", Organizational),
    control!("A.5.10", "Acceptable use of information and other associated assets", Organizational),
    control!("A.5.11", "Return of assets", Organizational),
    control!("A.5.12", "Classification of information", Organizational),
    control!("A.5.13", "Labelling of information", Organizational),
    control!("A.5.14", "Information transfer", Organizational),
    control!("A.5.15", "Access control", Organizational),
    control!("A.5.16", "Identity management", Organizational),
    control!("A.5.17", "Authentication information", Organizational),
    control!("A.5.18", "Access rights", Organizational),
    control!("A.5.19", "Information security in supplier relationships", Organizational),
    control!("A.5.20", "Addressing information security within supplier agreements", Organizational),
    control!("A.5.21", "Managing information security in the ICT supply chain", Organizational),
    control!("A.5.22", "Monitoring, review and change management of supplier services", Organizational),
    control!("A.5.23", "Information security for use of cloud services", Organizational),
    control!("A.5.24", "Information security incident management planning and preparation", Organizational),
    control!("A.5.25", "Assessment and decision on information security events", Organizational),
    control!("A.5.26", "Response to information security incidents", Organizational),
    control!("A.5.27", "Learning from information security incidents", Organizational),
    control!("A.5.28", "Collection of evidence", Organizational),
    control!("A.5.29", "Information security during disruption", Organizational),
    control!("A.5.30", "ICT readiness for business continuity", Organizational),
    control!("A.5.31", "Legal, statutory, regulatory and contractual requirements", Organizational),
    control!("A.5.32", "Intellectual property rights", Organizational),
    control!("A.5.33", "Protection of records", Organizational),
    control!("A.5.34", "Privacy and protection of PII", Organizational),
    control!("A.5.35", "Independent review of information security", Organizational),
    control!("A.5.36", "Compliance with policies, rules and standards for information security", Organizational),
    control!("A.5.37", "Documented operating procedures", Organizational),
    // A.6 - People
    control!("A.6.1", "Screening", People),
    control!("A.6.2", "Terms and conditions of employment", People),
    control!("A.6.3", "Information security awareness, education and training", People),
    control!("A.6.4", "Disciplinary process", People),
    control!("A.6.5", "Responsibilities after termination or change of employment", People),
    control!("A.6.6", "Confidentiality or non-disclosure agreements", People),
    control!("A.6.7", "Remote working", People),
    control!("A.6.8", "Information security event reporting", People),
    // A.7 - Physical
    control!("A.7.1", "Physical security perimeters", Physical),
    control!("A.7.2", "Physical entry", Physical),
    control!("A.7.3", "Securing offices, rooms and facilities", Physical),
    control!("A.7.4", "Physical security monitoring", Physical),
    control!("A.7.5", "Protecting against physical and environmental threats", Physical),
    control!("A.7.6", "Working in secure areas", Physical),
    control!("A.7.7", "Clear desk and clear screen", Physical),
    control!("A.7.8", "Equipment siting and protection", Physical),
    control!("A.7.9", "Security of assets off-premises", Physical),
    control!("A.7.10", "Storage media", Physical),
    control!("A.7.11", "Supporting utilities", Physical),
    control!("A.7.12", "Cabling security", Physical),
    control!("A.7.13", "Equipment maintenance", Physical),
    control!("A.7.14", "Secure disposal or re-use of equipment", Physical),
    // A.8 - Technological
    control!("A.8.1", "User endpoint devices", Technological),
    control!("A.8.2", "Privileged access rights", Technological),
    control!("A.8.3", "Information access restriction", Technological),
    control!("A.8.4", "Access to source code", Technological),
    control!("A.8.5", "Secure authentication", Technological),
    control!("A.8.6", "Capacity management", Technological),
    control!("A.8.7", "Protection against malware", Technological),
    control!("A.8.8", "Management of technical vulnerabilities", Technological),
    control!("A.8.9", "Configuration management", Technological),
    control!("A.8.10", "Information deletion", Technological),
    control!("A.8.11", "Data masking", Technological),
    control!("A.8.12", "Data leakage prevention", Technological),
    control!("A.8.13", "Information backup", Technological),
    control!("A.8.14", "Redundancy of information processing facilities", Technological),
    control!("A.8.15", "Logging", Technological),
    control!("A.8.16", "Monitoring activities", Technological),
    control!("A.8.17", "Clock synchronization", Technological),
    control!("A.8.18", "Use of privileged utility programs", Technological),
    control!("A.8.19", "Installation of software on operational systems", Technological),
    control!("A.8.20", "Networks security", Technological),
    control!("A.8.21", "Security of network services", Technological),
    control!("A.8.22", "Segregation of networks", Technological),
    control!("A.8.23", "Web filtering", Technological),
    control!("A.8.24", "Use of cryptography", Technological),
    control!("A.8.25", "Secure development life cycle", Technological),
    control!("A.8.26", "Application security requirements", Technological),
    control!("A.8.27", "Secure system architecture and engineering principles", Technological),
    control!("A.8.28", "Secure coding", Technological),
    control!("A.8.29", "Security testing in development and acceptance", Technological),
    control!("A.8.30", "Outsourced development", Technological),
    control!("A.8.31", "Separation of development, test and production environments", Technological),
    control!("A.8.32", "Change management", Technological),
    control!("A.8.33", "Test information", Technological),
    control!("A.8.34", "Protection of information systems during audit testing", Technological),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_has_93_controls() {
        assert_eq!(all().len(), 93);
    }

    #[test]
    fn test_theme_counts() {
        let count = |cat| all().iter().filter(|c| c.category == cat).count();
        assert_eq!(count(Organizational), 37);
        assert_eq!(count(People), 8);
        assert_eq!(count(Physical), 14);
        assert_eq!(count(Technological), 34);
    }

    #[test]
    fn test_lookup() {
        let control = lookup("A.8.15").unwrap();
        assert_eq!(control.name, "Logging");
        assert_eq!(control.category, Technological);
        assert!(lookup("A.9.1").is_none());
    }

    #[test]
    fn test_ids_unique() {
        let mut ids: Vec<_> = all().iter().map(|c| c.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 93);
    }
}
