//! Application context.
//!
//! # Responsibility
//! - Open every store once at startup from a `CoreConfig`.
//! - Hand shared handles to collaborators instead of process-wide globals.
//! - Wire the default logging observers on both stores.
//!
//! # Invariants
//! - One context owns one decision log and one message feed; dropping the
//!   context releases them.

use crate::config::{ConfigError, CoreConfig};
use crate::model::message::Message;
use crate::repo::{StoreError, SubscriptionId};
use crate::service::chat_service::{ChatResult, ChatService};
use crate::service::decision_service::DecisionStore;
use crate::service::message_service::MessageStore;
use crate::sync::cursor::CursorTracker;
use crate::sync::presence::PresenceTracker;
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

#[derive(Debug)]
pub enum ContextError {
    Config(ConfigError),
    Store(StoreError),
}

impl Display for ContextError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ContextError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<ConfigError> for ContextError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<StoreError> for ContextError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Shared state for one running application.
pub struct AppContext {
    config: CoreConfig,
    decisions: Arc<DecisionStore>,
    messages: Arc<MessageStore>,
    cursors: Arc<CursorTracker>,
    presence: Arc<PresenceTracker>,
    chat: ChatService,
    log_subscriptions: (SubscriptionId, SubscriptionId),
}

impl AppContext {
    /// Validates `config`, opens both stores and wires logging observers.
    pub fn open(config: CoreConfig) -> Result<Self, ContextError> {
        config.validate()?;

        let decisions = Arc::new(DecisionStore::open(config.decisions_path())?);
        let messages = Arc::new(MessageStore::open(config.messages_path())?);
        let cursors = Arc::new(CursorTracker::new());
        let presence = Arc::new(PresenceTracker::new(config.presence_timeout()));
        let chat = ChatService::new(
            Arc::clone(&messages),
            Arc::clone(&cursors),
            Arc::clone(&presence),
        );

        let decision_log = decisions.on_change(|action, decision| {
            debug!(
                "event=decision_change module=context status=ok action={} id={} state={}",
                action,
                decision.id,
                decision.status.as_str()
            );
        });
        let message_log = messages.on_change(|action, message| {
            debug!(
                "event=message_change module=context status=ok action={} id={}",
                action, message.id
            );
        });

        info!(
            "event=context_open module=context status=ok data_dir={} decisions={} messages={}",
            config.data_dir.display(),
            decisions.len(),
            messages.len()
        );

        Ok(Self {
            config,
            decisions,
            messages,
            cursors,
            presence,
            chat,
            log_subscriptions: (decision_log, message_log),
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn decisions(&self) -> &Arc<DecisionStore> {
        &self.decisions
    }

    pub fn messages(&self) -> &Arc<MessageStore> {
        &self.messages
    }

    pub fn cursors(&self) -> &Arc<CursorTracker> {
        &self.cursors
    }

    pub fn presence(&self) -> &Arc<PresenceTracker> {
        &self.presence
    }

    pub fn chat(&self) -> &ChatService {
        &self.chat
    }

    /// Cursor read using the configured default page size.
    pub fn read_default(&self, consumer: &str) -> Vec<Message> {
        self.chat.read(consumer, 0, self.config.default_read_limit)
    }

    /// Resync using the configured page size.
    pub fn resync_default(&self, consumer: &str) -> ChatResult<Vec<Message>> {
        self.chat.resync(consumer, self.config.resync_limit)
    }
}

impl Drop for AppContext {
    fn drop(&mut self) {
        let (decision_log, message_log) = self.log_subscriptions;
        self.decisions.unsubscribe(decision_log);
        self.messages.unsubscribe(message_log);
        info!("event=context_close module=context status=ok");
    }
}
