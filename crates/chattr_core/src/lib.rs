//! Shared-state core for agent chat coordination.
//! Thread-safe, file-backed stores for the decision log and the chat feed,
//! with change notification and per-consumer read cursors.

pub mod config;
pub mod context;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod sync;

pub use config::{ConfigError, CoreConfig};
pub use context::{AppContext, ContextError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::decision::{
    Decision, DecisionStatus, DecisionValidationError, MAX_DECISIONS, MAX_DECISION_CHARS,
};
pub use model::message::{Attachment, Message, MessageKind, NewMessage, Reactions};
pub use model::record::{Record, RecordId};
pub use repo::{
    ChangeAction, ChangeNotifier, DispatchReport, LoadError, RecordStore, StoreError,
    StoreResult, SubscriptionId,
};
pub use service::chat_service::{ChatError, ChatResult, ChatService};
pub use service::decision_service::{DecisionError, DecisionStore};
pub use service::message_service::MessageStore;
pub use sync::cursor::{CursorError, CursorTracker, RecordFeed};
pub use sync::presence::PresenceTracker;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
