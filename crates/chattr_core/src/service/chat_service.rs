//! Chat use-cases consumed by the transport layer.
//!
//! # Responsibility
//! - Validate outgoing messages before they reach the feed.
//! - Combine the message feed, read cursors and presence into the send /
//!   join / read / resync / who operations.
//!
//! # Invariants
//! - `reply_to` always references an existing message.
//! - Sending or joining refreshes the sender's presence.

use crate::model::message::{Attachment, Message, MessageKind, NewMessage};
use crate::model::record::RecordId;
use crate::repo::StoreError;
use crate::service::message_service::MessageStore;
use crate::sync::cursor::{CursorError, CursorTracker};
use crate::sync::presence::PresenceTracker;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type ChatResult<T> = Result<T, ChatError>;

/// Chat use-case failure.
#[derive(Debug)]
pub enum ChatError {
    /// Sender or consumer name is blank.
    MissingSender,
    /// Text is blank and there is nothing attached.
    EmptyMessage,
    /// `reply_to` does not reference an existing message.
    ReplyTargetNotFound(RecordId),
    Cursor(CursorError),
    Store(StoreError),
}

impl Display for ChatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingSender => write!(f, "sender is required"),
            Self::EmptyMessage => write!(f, "empty message, not sent"),
            Self::ReplyTargetNotFound(id) => write!(f, "message #{id} not found"),
            Self::Cursor(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ChatError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Cursor(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for ChatError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<CursorError> for ChatError {
    fn from(value: CursorError) -> Self {
        match value {
            CursorError::MissingConsumer => Self::MissingSender,
        }
    }
}

/// Chat facade over shared feed, cursor and presence state.
#[derive(Clone)]
pub struct ChatService {
    messages: Arc<MessageStore>,
    cursors: Arc<CursorTracker>,
    presence: Arc<PresenceTracker>,
}

impl ChatService {
    pub fn new(
        messages: Arc<MessageStore>,
        cursors: Arc<CursorTracker>,
        presence: Arc<PresenceTracker>,
    ) -> Self {
        Self {
            messages,
            cursors,
            presence,
        }
    }

    /// Posts a message from `sender`.
    ///
    /// # Errors
    /// - `MissingSender` for a blank sender.
    /// - `EmptyMessage` when text is blank and no attachment is given.
    /// - `ReplyTargetNotFound` when `reply_to` is unknown.
    pub fn send(
        &self,
        sender: &str,
        text: &str,
        attachments: Vec<Attachment>,
        reply_to: Option<RecordId>,
    ) -> ChatResult<Message> {
        let sender = sender.trim();
        if sender.is_empty() {
            return Err(ChatError::MissingSender);
        }
        let text = text.trim();
        if text.is_empty() && attachments.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if let Some(target) = reply_to {
            if self.messages.get_by_id(target).is_none() {
                return Err(ChatError::ReplyTargetNotFound(target));
            }
        }

        let message = self.messages.add(sender, text, attachments, reply_to)?;
        self.presence.mark_seen(sender);
        Ok(message)
    }

    /// Announces `name`, posts a join entry and returns who is online.
    pub fn join(&self, name: &str) -> ChatResult<Vec<String>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ChatError::MissingSender);
        }
        self.presence.mark_seen(name);
        let announcement = self.messages.append(
            NewMessage::chat(name, format!("{name} connected")).with_kind(MessageKind::Join),
        )?;
        info!(
            "event=chat_join module=service status=ok id={}",
            announcement.id
        );
        Ok(self.presence.online())
    }

    /// Incremental read for `consumer`; see `CursorTracker::read`.
    pub fn read(&self, consumer: &str, since_id: RecordId, limit: usize) -> Vec<Message> {
        self.cursors
            .read(self.messages.as_ref(), consumer, since_id, limit)
    }

    /// Full-context re-fetch that resets `consumer`'s cursor.
    pub fn resync(&self, consumer: &str, limit: usize) -> ChatResult<Vec<Message>> {
        Ok(self
            .cursors
            .resync(self.messages.as_ref(), consumer, limit)?)
    }

    /// Sorted names currently online.
    pub fn who(&self) -> Vec<String> {
        self.presence.online()
    }

    pub fn is_online(&self, name: &str) -> bool {
        self.presence.is_online(name)
    }
}
