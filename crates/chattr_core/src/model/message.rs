//! Chat message model.
//!
//! # Responsibility
//! - Define the persisted shape of one chat feed entry.
//! - Keep reaction bookkeeping local to the message.
//!
//! # Invariants
//! - Messages are append-only; only `reactions` changes after creation.
//! - `reactions` never holds an emoji key with an empty sender list.

use crate::model::record::{unix_seconds_now, Record, RecordId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Emoji -> senders that reacted with it, in reaction order.
pub type Reactions = BTreeMap<String, Vec<String>>;

/// Kind of feed entry. Serialized as `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Regular message from an agent or human.
    #[default]
    Chat,
    /// Presence announcement emitted on join.
    Join,
    /// Message produced by the application itself.
    System,
}

/// Attachment metadata. Files are handled outside the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub url: String,
}

/// Persisted chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: RecordId,
    pub sender: String,
    pub text: String,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    /// Local wall-clock display time, `HH:MM:SS`.
    pub time: String,
    /// Unix seconds with sub-second precision.
    #[serde(default)]
    pub timestamp: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<RecordId>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub reactions: Reactions,
}

/// Message fields supplied by the caller; the store assigns identity and time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewMessage {
    pub sender: String,
    pub text: String,
    pub kind: MessageKind,
    pub attachments: Vec<Attachment>,
    pub reply_to: Option<RecordId>,
}

impl NewMessage {
    pub fn chat(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_kind(mut self, kind: MessageKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn with_reply_to(mut self, reply_to: Option<RecordId>) -> Self {
        self.reply_to = reply_to;
        self
    }

    /// Stamps the message with an id and the current time.
    pub fn into_message(self, id: RecordId) -> Message {
        Message {
            id,
            sender: self.sender,
            text: self.text,
            kind: self.kind,
            time: chrono::Local::now().format("%H:%M:%S").to_string(),
            timestamp: unix_seconds_now(),
            attachments: self.attachments,
            reply_to: self.reply_to,
            reactions: Reactions::new(),
        }
    }
}

impl Message {
    /// Adds `sender` under `emoji`, or removes it if already present.
    ///
    /// Returns `true` when the reaction was added.
    pub fn toggle_reaction(&mut self, emoji: &str, sender: &str) -> bool {
        let senders = self.reactions.entry(emoji.to_string()).or_default();
        if let Some(position) = senders.iter().position(|name| name == sender) {
            senders.remove(position);
            if senders.is_empty() {
                self.reactions.remove(emoji);
            }
            return false;
        }
        senders.push(sender.to_string());
        true
    }
}

impl Record for Message {
    fn id(&self) -> RecordId {
        self.id
    }
}
