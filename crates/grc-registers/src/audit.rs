//! Audit Trail (Tamper-Evident)
//!
//! Append-only log of register mutations with a SHA-256 hash chain.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

/// Audit trail with hash chain
#[derive(Clone)]
pub struct AuditTrail {
    events: Arc<RwLock<Vec<AuditEvent>>>,
    last_hash: Arc<RwLock<String>>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self {
            events: Arc::new(RwLock::new(Vec::new())),
            last_hash: Arc::new(RwLock::new("genesis".into())),
        }
    }

    /// Log an audit event
    pub fn log(&self, event_type: AuditEventType, actor: &str, target: &str, details: &str) {
        let prev_hash = self.last_hash.read().clone();

        let event = AuditEvent::new(event_type, actor, target, details, &prev_hash);
        let new_hash = event.hash.clone();

        self.events.write().push(event);
        *self.last_hash.write() = new_hash;
    }

    /// Get events, optionally filtered
    pub fn get_events(&self, filter: Option<AuditFilter>) -> Vec<AuditEvent> {
        let events = self.events.read();
        match filter {
            Some(f) => events.iter().filter(|e| f.matches(e)).cloned().collect(),
            None => events.clone(),
        }
    }

    /// Number of recorded events
    pub fn count(&self) -> usize {
        self.events.read().len()
    }

    /// Verify chain integrity
    pub fn verify_integrity(&self) -> IntegrityResult {
        let events = self.events.read();
        let mut prev_hash = "genesis".to_string();
        let mut valid_count = 0;

        for event in events.iter() {
            if event.prev_hash != prev_hash {
                return IntegrityResult {
                    valid: false,
                    checked_count: valid_count,
                    error: Some(format!("Hash chain broken at event {}", event.id)),
                };
            }

            let computed = event.compute_hash(&prev_hash);
            if computed != event.hash {
                return IntegrityResult {
                    valid: false,
                    checked_count: valid_count,
                    error: Some(format!("Event {} hash mismatch", event.id)),
                };
            }

            prev_hash = event.hash.clone();
            valid_count += 1;
        }

        IntegrityResult {
            valid: true,
            checked_count: valid_count,
            error: None,
        }
    }

    #[cfg(test)]
    fn tamper_with(&self, index: usize, details: &str) {
        self.events.write()[index].details = details.to_string();
    }
}

impl Default for AuditTrail {
    fn default() -> Self {
        Self::new()
    }
}

/// Audit event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: AuditEventType,
    pub actor: String,
    pub target: String,
    pub details: String,
    pub prev_hash: String,
    pub hash: String,
}

impl AuditEvent {
    fn new(
        event_type: AuditEventType,
        actor: &str,
        target: &str,
        details: &str,
        prev_hash: &str,
    ) -> Self {
        let mut event = Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type,
            actor: actor.to_string(),
            target: target.to_string(),
            details: details.to_string(),
            prev_hash: prev_hash.to_string(),
            hash: String::new(),
        };

        event.hash = event.compute_hash(prev_hash);
        event
    }

    fn compute_hash(&self, prev_hash: &str) -> String {
        let data = format!(
            "{}|{}|{:?}|{}|{}|{}|{}",
            self.id, self.timestamp, self.event_type, self.actor, self.target, self.details,
            prev_hash
        );
        hex::encode(Sha256::digest(data.as_bytes()))
    }
}

/// Kind of register mutation recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditEventType {
    RecordCreated = 1,
    RecordUpdated = 2,
    RecordDeleted = 3,
    RecordRestored = 4,
    RecordPurged = 5,
    ApplicabilityChanged = 6,
    ExportGenerated = 7,
}

/// Audit filter
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub event_type: Option<AuditEventType>,
    pub actor: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl AuditFilter {
    fn matches(&self, event: &AuditEvent) -> bool {
        if let Some(t) = self.event_type {
            if event.event_type != t {
                return false;
            }
        }
        if let Some(a) = &self.actor {
            if !event.actor.contains(a.as_str()) {
                return false;
            }
        }
        if let Some(s) = &self.start_time {
            if event.timestamp < *s {
                return false;
            }
        }
        if let Some(e) = &self.end_time {
            if event.timestamp > *e {
                return false;
            }
        }
        true
    }
}

/// Integrity check result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrityResult {
    pub valid: bool,
    pub checked_count: usize,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_valid_after_logging() {
        let trail = AuditTrail::new();
        trail.log(AuditEventType::RecordCreated, "alice", "asset:1", "created");
        trail.log(AuditEventType::RecordUpdated, "bob", "asset:1", "renamed");
        trail.log(AuditEventType::RecordDeleted, "alice", "asset:1", "trashed");

        assert_eq!(trail.count(), 3);
        let result = trail.verify_integrity();
        assert!(result.valid);
        assert_eq!(result.checked_count, 3);
    }

    #[test]
    fn test_tampering_breaks_chain() {
        let trail = AuditTrail::new();
        trail.log(AuditEventType::RecordCreated, "alice", "risk:1", "created");
        trail.log(AuditEventType::RecordUpdated, "alice", "risk:1", "rescored");

        trail.tamper_with(0, "nothing happened here");

        let result = trail.verify_integrity();
        assert!(!result.valid);
        assert_eq!(result.checked_count, 0);
        assert!(result.error.is_some());
    }

    #[test]
    fn test_filter_by_actor_and_type() {
        let trail = AuditTrail::new();
        trail.log(AuditEventType::RecordCreated, "alice", "asset:1", "created");
        trail.log(AuditEventType::RecordCreated, "bob", "asset:2", "created");
        trail.log(AuditEventType::RecordDeleted, "alice", "asset:1", "trashed");

        let by_actor = trail.get_events(Some(AuditFilter {
            actor: Some("alice".into()),
            ..Default::default()
        }));
        assert_eq!(by_actor.len(), 2);

        let by_type = trail.get_events(Some(AuditFilter {
            event_type: Some(AuditEventType::RecordDeleted),
            ..Default::default()
        }));
        assert_eq!(by_type.len(), 1);
        assert_eq!(by_type[0].target, "asset:1");
    }
}
