//! Decision lifecycle service.
//!
//! # Responsibility
//! - Apply decision rules on top of the generic record store: capacity cap,
//!   field normalization, status transitions.
//! - Map each lifecycle step to its change-notification action.
//!
//! # Invariants
//! - At most `MAX_DECISIONS` decisions exist at once; the check and the
//!   insert share one store lock acquisition.
//! - `edit` and `propose` apply the same trim/truncate rule.
//! - `unapprove` notifies observers with `ChangeAction::Edit`, not a
//!   dedicated action.
//! - Unknown ids yield `Ok(None)` and leave the collection untouched.

use crate::model::decision::{
    normalize_decision_text, validate_proposal, Decision, DecisionStatus,
    DecisionValidationError, MAX_DECISIONS,
};
use crate::model::record::RecordId;
use crate::repo::{ChangeAction, LoadError, RecordStore, StoreError, StoreResult, SubscriptionId};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Rejected or failed proposal.
#[derive(Debug)]
pub enum DecisionError {
    /// The store already holds `limit` decisions.
    CapacityExceeded { limit: usize },
    Validation(DecisionValidationError),
    Store(StoreError),
}

impl Display for DecisionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CapacityExceeded { limit } => write!(f, "max {limit} decisions reached"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DecisionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CapacityExceeded { .. } => None,
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<DecisionValidationError> for DecisionError {
    fn from(value: DecisionValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for DecisionError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Bounded, file-backed decision log.
pub struct DecisionStore {
    store: RecordStore<Decision>,
    capacity: usize,
}

impl DecisionStore {
    /// Opens the decision log at `path` with the default cap.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        Self::open_with_capacity(path, MAX_DECISIONS)
    }

    /// Opens the decision log with a custom cap.
    pub fn open_with_capacity(path: impl Into<PathBuf>, capacity: usize) -> StoreResult<Self> {
        Ok(Self {
            store: RecordStore::open(path)?,
            capacity,
        })
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Load failure that forced this log to start empty, if any.
    pub fn load_error(&self) -> Option<&LoadError> {
        self.store.load_error()
    }

    /// Registers an observer called with `(action, decision)` after every
    /// committed change.
    pub fn on_change<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(ChangeAction, &Decision) + Send + Sync + 'static,
    {
        self.store.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    /// Proposes a new decision with status `proposed`.
    ///
    /// Besides the capacity cap, blank decision text or a blank owner is
    /// refused here rather than left to callers.
    ///
    /// # Errors
    /// - `CapacityExceeded` when the log is full; nothing is written.
    /// - `Validation` when decision text or owner is blank.
    /// - `Store` when the file write fails.
    pub fn propose(&self, decision: &str, owner: &str, reason: &str) -> Result<Decision, DecisionError> {
        validate_proposal(decision, owner)?;

        let proposed = self.store.insert_bounded(self.capacity, ChangeAction::Propose, |id| {
            Decision::proposed(id, decision, owner, reason)
        })?;

        match proposed {
            Some(created) => {
                info!(
                    "event=decision_propose module=service status=ok id={}",
                    created.id
                );
                Ok(created)
            }
            None => {
                info!(
                    "event=decision_propose module=service status=rejected limit={}",
                    self.capacity
                );
                Err(DecisionError::CapacityExceeded {
                    limit: self.capacity,
                })
            }
        }
    }

    /// Marks a decision approved.
    pub fn approve(&self, id: RecordId) -> StoreResult<Option<Decision>> {
        self.set_status(id, DecisionStatus::Approved, ChangeAction::Approve)
    }

    /// Returns a decision to `proposed`.
    ///
    /// Observers receive `ChangeAction::Edit` for this transition.
    pub fn unapprove(&self, id: RecordId) -> StoreResult<Option<Decision>> {
        self.set_status(id, DecisionStatus::Proposed, ChangeAction::Edit)
    }

    /// Replaces the given fields; `None` keeps the current value.
    pub fn edit(
        &self,
        id: RecordId,
        decision: Option<&str>,
        reason: Option<&str>,
    ) -> StoreResult<Option<Decision>> {
        self.store.update(id, ChangeAction::Edit, |current| {
            if let Some(text) = decision {
                current.decision = normalize_decision_text(text);
            }
            if let Some(text) = reason {
                current.reason = normalize_decision_text(text);
            }
        })
    }

    /// Removes a decision and returns it.
    pub fn delete(&self, id: RecordId) -> StoreResult<Option<Decision>> {
        let removed = self.store.delete(id)?;
        if removed.is_some() {
            info!("event=decision_delete module=service status=ok id={id}");
        }
        Ok(removed)
    }

    pub fn get(&self, id: RecordId) -> Option<Decision> {
        self.store.get(id)
    }

    /// All decisions in proposal order.
    pub fn list_all(&self) -> Vec<Decision> {
        self.store.list()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Number of decisions waiting for review.
    pub fn count_proposed(&self) -> usize {
        self.store.count_where(Decision::is_proposed)
    }

    fn set_status(
        &self,
        id: RecordId,
        status: DecisionStatus,
        action: ChangeAction,
    ) -> StoreResult<Option<Decision>> {
        let updated = self
            .store
            .update(id, action, |current| current.status = status)?;
        if updated.is_some() {
            info!(
                "event=decision_status module=service status=ok id={} to={}",
                id,
                status.as_str()
            );
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::{DecisionError, DecisionStore};
    use crate::model::decision::DecisionValidationError;

    fn open_store(capacity: usize) -> (tempfile::TempDir, DecisionStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DecisionStore::open_with_capacity(dir.path().join("decisions.json"), capacity)
            .expect("open decision store");
        (dir, store)
    }

    #[test]
    fn custom_capacity_is_enforced() {
        let (_dir, store) = open_store(2);
        store.propose("a", "codex", "").expect("first");
        store.propose("b", "codex", "").expect("second");
        let err = store.propose("c", "codex", "").expect_err("third must be rejected");
        assert!(matches!(err, DecisionError::CapacityExceeded { limit: 2 }));
        assert_eq!(err.to_string(), "max 2 decisions reached");
    }

    #[test]
    fn blank_input_is_rejected_before_touching_store() {
        let (_dir, store) = open_store(30);
        let err = store.propose("   ", "codex", "").expect_err("blank text");
        assert!(matches!(
            err,
            DecisionError::Validation(DecisionValidationError::EmptyDecision)
        ));
        assert!(store.is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn edit_with_no_fields_keeps_values() {
        let (_dir, store) = open_store(30);
        let created = store.propose("use tokio", "claude", "async").expect("propose");
        let edited = store
            .edit(created.id, None, None)
            .expect("edit write")
            .expect("decision exists");
        assert_eq!(edited, created);
    }
}
