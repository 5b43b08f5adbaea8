//! Decision domain model.
//!
//! # Responsibility
//! - Define the persisted shape of a project decision.
//! - Own the field normalization rules shared by propose and edit.
//!
//! # Invariants
//! - `decision` and `reason` are trimmed and hold at most
//!   `MAX_DECISION_CHARS` characters.
//! - `owner` is trimmed but not truncated.
//! - `id`, `status` transitions and `created_at` are controlled by the store.

use crate::model::record::{trim_and_truncate, unix_seconds_now, Record, RecordId};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Maximum number of decisions held at once.
pub const MAX_DECISIONS: usize = 30;
/// Maximum characters kept in `decision` and `reason`.
pub const MAX_DECISION_CHARS: usize = 80;

/// Review state of a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    /// Waiting for human review.
    Proposed,
    /// Accepted as authoritative guidance.
    Approved,
}

impl DecisionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Proposed => "proposed",
            Self::Approved => "approved",
        }
    }
}

/// Persisted project decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub id: RecordId,
    /// Short actionable statement.
    pub decision: String,
    /// Agent or human that proposed the decision.
    pub owner: String,
    /// Optional rationale, empty when not given.
    pub reason: String,
    pub status: DecisionStatus,
    /// Unix seconds with sub-second precision.
    pub created_at: f64,
}

impl Decision {
    /// Builds a freshly proposed decision with normalized fields.
    ///
    /// Does not validate blank input; see `validate_proposal`.
    pub fn proposed(id: RecordId, decision: &str, owner: &str, reason: &str) -> Self {
        Self {
            id,
            decision: normalize_decision_text(decision),
            owner: owner.trim().to_string(),
            reason: normalize_decision_text(reason),
            status: DecisionStatus::Proposed,
            created_at: unix_seconds_now(),
        }
    }

    pub fn is_proposed(&self) -> bool {
        self.status == DecisionStatus::Proposed
    }

    pub fn is_approved(&self) -> bool {
        self.status == DecisionStatus::Approved
    }
}

impl Record for Decision {
    fn id(&self) -> RecordId {
        self.id
    }
}

/// Applies the trim/truncate rule used for `decision` and `reason`.
pub fn normalize_decision_text(value: &str) -> String {
    trim_and_truncate(value, MAX_DECISION_CHARS)
}

/// Rejected proposal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionValidationError {
    /// Decision text is empty after trimming.
    EmptyDecision,
    /// Owner is empty after trimming.
    EmptyOwner,
}

impl Display for DecisionValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyDecision => write!(f, "decision text is required"),
            Self::EmptyOwner => write!(f, "decision owner is required"),
        }
    }
}

impl Error for DecisionValidationError {}

/// Checks proposal input before it reaches the store.
pub fn validate_proposal(decision: &str, owner: &str) -> Result<(), DecisionValidationError> {
    if decision.trim().is_empty() {
        return Err(DecisionValidationError::EmptyDecision);
    }
    if owner.trim().is_empty() {
        return Err(DecisionValidationError::EmptyOwner);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate_proposal, Decision, DecisionStatus, DecisionValidationError};

    #[test]
    fn proposed_normalizes_fields() {
        let decision = Decision::proposed(7, "  use serde  ", "  codex ", &"r".repeat(120));
        assert_eq!(decision.id, 7);
        assert_eq!(decision.decision, "use serde");
        assert_eq!(decision.owner, "codex");
        assert_eq!(decision.reason.chars().count(), 80);
        assert_eq!(decision.status, DecisionStatus::Proposed);
    }

    #[test]
    fn owner_is_not_truncated() {
        let owner = "o".repeat(100);
        let decision = Decision::proposed(1, "x", &owner, "");
        assert_eq!(decision.owner.len(), 100);
    }

    #[test]
    fn status_serializes_snake_case() {
        let decision = Decision::proposed(1, "x", "y", "");
        let json = serde_json::to_value(&decision).expect("decision should serialize");
        assert_eq!(json["status"], "proposed");
        assert_eq!(DecisionStatus::Approved.as_str(), "approved");
    }

    #[test]
    fn validate_proposal_rejects_blank_fields() {
        assert_eq!(
            validate_proposal("   ", "codex"),
            Err(DecisionValidationError::EmptyDecision)
        );
        assert_eq!(
            validate_proposal("pick tokio", " "),
            Err(DecisionValidationError::EmptyOwner)
        );
        assert!(validate_proposal("pick tokio", "codex").is_ok());
    }
}
