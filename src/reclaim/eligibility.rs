use std::collections::HashSet;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;
use crate::program::Program;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReclaimKind {
    UnusedProgram,
    UnpaidMilestone,
}

impl std::fmt::Display for ReclaimKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReclaimKind::UnusedProgram => write!(f, "unused_program"),
            ReclaimKind::UnpaidMilestone => write!(f, "unpaid_milestone"),
        }
    }
}

/// What a reclaim acts on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReclaimTarget {
    UnusedProgram {
        program_id: String,
    },
    UnpaidMilestone {
        program_id: String,
        application_id: String,
        milestone_id: String,
    },
}

/// Identity of a reclaimable item: its kind plus the id the reclaim call takes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReclaimKey {
    pub kind: ReclaimKind,
    pub id: String,
}

impl ReclaimKey {
    pub fn program(id: &str) -> Self {
        Self {
            kind: ReclaimKind::UnusedProgram,
            id: id.to_string(),
        }
    }

    pub fn milestone(id: &str) -> Self {
        Self {
            kind: ReclaimKind::UnpaidMilestone,
            id: id.to_string(),
        }
    }
}

impl std::fmt::Display for ReclaimKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Derived, never persisted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReclaimableItem {
    pub target: ReclaimTarget,
    pub program_name: String,
    pub reason: String,
    pub amount: Decimal,
    pub currency: String,
}

impl ReclaimableItem {
    pub fn kind(&self) -> ReclaimKind {
        match self.target {
            ReclaimTarget::UnusedProgram { .. } => ReclaimKind::UnusedProgram,
            ReclaimTarget::UnpaidMilestone { .. } => ReclaimKind::UnpaidMilestone,
        }
    }

    pub fn key(&self) -> ReclaimKey {
        match &self.target {
            ReclaimTarget::UnusedProgram { program_id } => ReclaimKey::program(program_id),
            ReclaimTarget::UnpaidMilestone { milestone_id, .. } => ReclaimKey::milestone(milestone_id),
        }
    }
}

pub struct EligibilityChecker;

impl EligibilityChecker {
    /// Merge the sponsor and builder datasets into the list of reclaimable items
    /// for `user_id`.
    ///
    /// A sponsor program is an `unused_program` when its deadline has passed, no
    /// application was accepted and it has not been reclaimed. A milestone of one
    /// of the user's applications is an `unpaid_milestone` when the server marks
    /// it reclaimable and not yet reclaimed. Input order is preserved; repeated
    /// keys keep their first occurrence.
    pub fn evaluate(
        sponsor_programs: &[Program],
        builder_programs: &[Program],
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Vec<ReclaimableItem> {
        let mut items = Vec::new();
        let mut seen = HashSet::new();

        for program in sponsor_programs.iter().filter(|p| p.creator_id == user_id) {
            if !Self::is_unused_program(program, now) {
                continue;
            }
            let item = ReclaimableItem {
                target: ReclaimTarget::UnusedProgram {
                    program_id: program.id.clone(),
                },
                program_name: program.name.clone(),
                reason: "Deadline passed without an accepted application".to_string(),
                amount: program.price,
                currency: program.currency.clone(),
            };
            Self::push_unique(&mut items, &mut seen, item);
        }

        for program in builder_programs {
            for application in program.applications.iter().filter(|a| a.applicant_id == user_id) {
                for milestone in application
                    .milestones
                    .iter()
                    .filter(|m| m.can_reclaim && !m.reclaimed)
                {
                    let item = ReclaimableItem {
                        target: ReclaimTarget::UnpaidMilestone {
                            program_id: program.id.clone(),
                            application_id: application.id.clone(),
                            milestone_id: milestone.id.clone(),
                        },
                        program_name: program.name.clone(),
                        reason: format!("Milestone '{}' is unpaid and reclaimable", milestone.title),
                        amount: milestone.price,
                        currency: milestone
                            .currency
                            .clone()
                            .filter(|c| !c.is_empty())
                            .unwrap_or_else(|| program.currency.clone()),
                    };
                    Self::push_unique(&mut items, &mut seen, item);
                }
            }
        }

        debug!("{} reclaimable items for {}", items.len(), user_id);
        items
    }

    pub fn is_unused_program(program: &Program, now: DateTime<Utc>) -> bool {
        program.is_past_deadline(now) && !program.has_accepted_application() && !program.reclaimed
    }

    /// Why a sponsor program is or is not reclaimable
    pub fn program_reason(program: &Program, now: DateTime<Utc>) -> String {
        if program.reclaimed {
            return "Funds already reclaimed".to_string();
        }
        if program.has_accepted_application() {
            return "Program has an accepted application".to_string();
        }
        match program.deadline {
            None => "Program has no deadline".to_string(),
            Some(deadline) if deadline >= now => {
                let days = (deadline - now).num_days();
                format!("Deadline not reached ({} days remaining)", days)
            }
            Some(_) => "Eligible for reclaim (deadline passed, no accepted application)".to_string(),
        }
    }

    fn push_unique(items: &mut Vec<ReclaimableItem>, seen: &mut HashSet<ReclaimKey>, item: ReclaimableItem) {
        let key = item.key();
        if seen.insert(key.clone()) {
            items.push(item);
        } else {
            debug!("Skipping duplicate reclaimable item {}", key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn program(value: serde_json::Value) -> Program {
        serde_json::from_value(value).unwrap()
    }

    fn now() -> DateTime<Utc> {
        "2026-10-18T12:00:00Z".parse().unwrap()
    }

    fn past() -> String {
        (now() - Duration::days(3)).to_rfc3339()
    }

    fn future() -> String {
        (now() + Duration::days(3)).to_rfc3339()
    }

    #[test]
    fn test_unused_program_appears_with_program_amount() {
        let p = program(serde_json::json!({
            "id": "P", "name": "Idle", "status": "published", "creatorId": "alice",
            "deadline": past(), "price": "750.25", "currency": "USDC"
        }));

        let items = EligibilityChecker::evaluate(&[p], &[], "alice", now());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind(), ReclaimKind::UnusedProgram);
        assert_eq!(items[0].amount, dec!(750.25));
        assert_eq!(items[0].currency, "USDC");
    }

    #[test]
    fn test_accepted_application_blocks_unused_program() {
        let q = program(serde_json::json!({
            "id": "Q", "name": "Busy", "status": "published", "creatorId": "alice",
            "deadline": past(), "price": "100", "currency": "USDC",
            "applications": [{"id": "a", "applicantId": "bob", "status": "accepted"}]
        }));
        assert!(EligibilityChecker::evaluate(&[q], &[], "alice", now()).is_empty());
    }

    #[test]
    fn test_future_deadline_reclaimed_or_foreign_programs_excluded() {
        let programs = vec![
            program(serde_json::json!({
                "id": "f", "name": "Future", "status": "published", "creatorId": "alice",
                "deadline": future(), "price": "1", "currency": "USDC"
            })),
            program(serde_json::json!({
                "id": "r", "name": "Done", "status": "published", "creatorId": "alice",
                "deadline": past(), "price": "1", "currency": "USDC", "reclaimed": true
            })),
            program(serde_json::json!({
                "id": "o", "name": "Other", "status": "published", "creatorId": "carol",
                "deadline": past(), "price": "1", "currency": "USDC"
            })),
            program(serde_json::json!({
                "id": "rej", "name": "Rejected only", "status": "published", "creatorId": "alice",
                "deadline": past(), "price": "2", "currency": "USDC",
                "applications": [{"id": "a", "applicantId": "bob", "status": "rejected"}]
            })),
        ];

        let items = EligibilityChecker::evaluate(&programs, &[], "alice", now());
        let keys: Vec<ReclaimKey> = items.iter().map(ReclaimableItem::key).collect();
        assert_eq!(keys, vec![ReclaimKey::program("rej")]);
    }

    #[test]
    fn test_unpaid_milestones_for_own_applications() {
        let p = program(serde_json::json!({
            "id": "B", "name": "Builder program", "status": "published", "creatorId": "carol",
            "price": "1000", "currency": "ETH",
            "applications": [
                {"id": "a1", "applicantId": "bob", "status": "accepted", "milestones": [
                    {"id": "M", "title": "Alpha", "price": "200", "canReclaim": true, "reclaimed": false},
                    {"id": "M2", "title": "Beta", "price": "300", "currency": "USDC", "canReclaim": true},
                    {"id": "M3", "title": "Paid", "price": "50", "canReclaim": true, "reclaimed": true},
                    {"id": "M4", "title": "Locked", "price": "50", "canReclaim": false}
                ]},
                {"id": "a2", "applicantId": "dave", "status": "accepted", "milestones": [
                    {"id": "X", "title": "Not mine", "price": "10", "canReclaim": true}
                ]}
            ]
        }));

        let items = EligibilityChecker::evaluate(&[], &[p], "bob", now());
        let keys: Vec<ReclaimKey> = items.iter().map(ReclaimableItem::key).collect();
        assert_eq!(keys, vec![ReclaimKey::milestone("M"), ReclaimKey::milestone("M2")]);
        assert_eq!(items[0].currency, "ETH", "falls back to program currency");
        assert_eq!(items[1].currency, "USDC");
        assert_eq!(items[0].amount, dec!(200));
    }

    #[test]
    fn test_order_and_dedup() {
        let sponsor = program(serde_json::json!({
            "id": "S", "name": "Mine", "status": "published", "creatorId": "bob",
            "deadline": past(), "price": "5", "currency": "USDC",
            "applications": [{"id": "a", "applicantId": "bob", "status": "pending", "milestones": [
                {"id": "SM", "title": "Self", "price": "1", "canReclaim": true}
            ]}]
        }));

        // the same program reaches both lists, and the builder list twice
        let items = EligibilityChecker::evaluate(
            &[sponsor.clone()],
            &[sponsor.clone(), sponsor],
            "bob",
            now(),
        );
        let keys: Vec<ReclaimKey> = items.iter().map(ReclaimableItem::key).collect();
        assert_eq!(keys, vec![ReclaimKey::program("S"), ReclaimKey::milestone("SM")]);
    }

    #[test]
    fn test_program_reason() {
        let mut p = program(serde_json::json!({
            "id": "P", "name": "n", "status": "published", "creatorId": "alice",
            "deadline": future(), "price": "1", "currency": "USDC"
        }));
        assert!(EligibilityChecker::program_reason(&p, now()).starts_with("Deadline not reached"));

        p.deadline = Some(now() - Duration::days(1));
        assert!(EligibilityChecker::program_reason(&p, now()).starts_with("Eligible"));

        p.reclaimed = true;
        assert_eq!(EligibilityChecker::program_reason(&p, now()), "Funds already reclaimed");
    }
}
