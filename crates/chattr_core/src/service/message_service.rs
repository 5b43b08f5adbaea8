//! Chat message store.
//!
//! # Responsibility
//! - Append chat entries with store-assigned ids and timestamps.
//! - Serve id-ordered reads used by cursors (`get_since`, `get_recent`).
//! - Toggle reactions, the only mutation an existing message accepts.
//!
//! # Invariants
//! - Messages are never edited or deleted through this API.
//! - Appends notify observers with `ChangeAction::Add`; reaction toggles
//!   notify with `ChangeAction::Edit`.

use crate::model::message::{Attachment, Message, MessageKind, NewMessage, Reactions};
use crate::model::record::RecordId;
use crate::repo::{ChangeAction, LoadError, RecordStore, StoreResult, SubscriptionId};
use crate::sync::cursor::RecordFeed;
use std::path::{Path, PathBuf};

/// Append-mostly, file-backed chat feed.
pub struct MessageStore {
    store: RecordStore<Message>,
}

impl MessageStore {
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        Ok(Self {
            store: RecordStore::open(path)?,
        })
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Load failure that forced this feed to start empty, if any.
    pub fn load_error(&self) -> Option<&LoadError> {
        self.store.load_error()
    }

    pub fn on_change<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(ChangeAction, &Message) + Send + Sync + 'static,
    {
        self.store.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    /// Appends a regular chat message.
    pub fn add(
        &self,
        sender: &str,
        text: &str,
        attachments: Vec<Attachment>,
        reply_to: Option<RecordId>,
    ) -> StoreResult<Message> {
        self.append(
            NewMessage::chat(sender, text)
                .with_attachments(attachments)
                .with_reply_to(reply_to),
        )
    }

    /// Appends a message of any kind.
    pub fn append(&self, message: NewMessage) -> StoreResult<Message> {
        self.store
            .insert(ChangeAction::Add, |id| message.into_message(id))
    }

    /// Appends a `system` message authored by the application.
    pub fn add_system(&self, text: &str) -> StoreResult<Message> {
        self.append(NewMessage::chat("system", text).with_kind(MessageKind::System))
    }

    pub fn get_by_id(&self, id: RecordId) -> Option<Message> {
        self.store.get(id)
    }

    /// Messages newer than `id`, oldest first.
    pub fn get_since(&self, id: RecordId) -> Vec<Message> {
        self.store.list_after(id)
    }

    /// The newest `limit` messages, oldest first.
    pub fn get_recent(&self, limit: usize) -> Vec<Message> {
        self.store.list_recent(limit)
    }

    pub fn list_all(&self) -> Vec<Message> {
        self.store.list()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Adds or removes `sender`'s `emoji` reaction on message `id`.
    ///
    /// Returns the message's reactions after the toggle, or `Ok(None)` for
    /// an unknown id.
    pub fn toggle_reaction(
        &self,
        id: RecordId,
        emoji: &str,
        sender: &str,
    ) -> StoreResult<Option<Reactions>> {
        let updated = self.store.update(id, ChangeAction::Edit, |message| {
            message.toggle_reaction(emoji, sender);
        })?;
        Ok(updated.map(|message| message.reactions))
    }
}

impl RecordFeed<Message> for MessageStore {
    fn records_after(&self, id: RecordId) -> Vec<Message> {
        self.get_since(id)
    }

    fn recent(&self, limit: usize) -> Vec<Message> {
        self.get_recent(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::MessageStore;
    use crate::model::message::MessageKind;

    #[test]
    fn add_system_uses_system_kind() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = MessageStore::open(dir.path().join("messages.json")).expect("open");
        let message = store.add_system("server restarted").expect("append");
        assert_eq!(message.kind, MessageKind::System);
        assert_eq!(message.sender, "system");
    }

    #[test]
    fn toggle_reaction_on_unknown_id_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = MessageStore::open(dir.path().join("messages.json")).expect("open");
        assert_eq!(store.toggle_reaction(99, "👍", "alice").expect("no io"), None);
    }
}
