//! Consumer-side bookkeeping layered over the stores.
//!
//! # Responsibility
//! - Track incremental-read cursors per consumer.
//! - Track participant presence.
//!
//! # Invariants
//! - Neither tracker is persisted; both live for the process lifetime.
//! - Each tracker owns its own lock and never takes a store lock while
//!   holding it.

pub mod cursor;
pub mod presence;
