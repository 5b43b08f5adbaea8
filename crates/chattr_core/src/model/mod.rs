//! Typed records shared by the decision log and the chat feed.
//!
//! # Responsibility
//! - Define the fixed-schema entities persisted by the record stores.
//! - Define the `Record` contract the generic store is parameterized over.
//!
//! # Invariants
//! - Every record carries a store-assigned `RecordId` that is never reused.
//! - Field normalization (trim/truncate) happens before a record is stored.

pub mod decision;
pub mod message;
pub mod record;
