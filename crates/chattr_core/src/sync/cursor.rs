//! Per-consumer incremental read cursors.
//!
//! # Responsibility
//! - Remember the last record id delivered to each named consumer.
//! - Resolve "what is new for this consumer" over any id-ordered feed.
//!
//! # Invariants
//! - A cursor is 0 (never read) or an id that was delivered to that consumer.
//! - An empty read never moves a cursor.
//! - Blank consumer names read anonymously and never own a cursor.
//! - The cursor map has its own lock, independent of any store lock. A read
//!   followed by an advance is therefore not atomic: two callers sharing one
//!   consumer name can both receive the same new records.

use crate::model::record::{Record, RecordId};
use crate::repo::RecordStore;
use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Id-ordered source of records a cursor can walk.
pub trait RecordFeed<T> {
    /// Records with an id strictly greater than `id`, oldest first.
    fn records_after(&self, id: RecordId) -> Vec<T>;
    /// The newest `limit` records, oldest first.
    fn recent(&self, limit: usize) -> Vec<T>;
}

impl<T: Record> RecordFeed<T> for RecordStore<T> {
    fn records_after(&self, id: RecordId) -> Vec<T> {
        self.list_after(id)
    }

    fn recent(&self, limit: usize) -> Vec<T> {
        self.list_recent(limit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorError {
    /// Resync needs a consumer whose cursor can be reset.
    MissingConsumer,
}

impl Display for CursorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingConsumer => write!(f, "consumer name is required for resync"),
        }
    }
}

impl Error for CursorError {}

/// Consumer name -> last delivered id.
#[derive(Debug, Default)]
pub struct CursorTracker {
    cursors: Mutex<HashMap<String, RecordId>>,
}

impl CursorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last delivered id for `consumer`; 0 when it never read.
    pub fn cursor(&self, consumer: &str) -> RecordId {
        self.cursors
            .lock()
            .get(consumer.trim())
            .copied()
            .unwrap_or(0)
    }

    /// Reads new records for `consumer` and advances its cursor.
    ///
    /// Resolution order:
    /// 1. `since_id != 0`: records after `since_id`.
    /// 2. Stored cursor: records after the cursor.
    /// 3. First contact: the newest `limit` records.
    ///
    /// The result always keeps only the newest `limit` records. `limit` is
    /// clamped to at least 1.
    pub fn read<T, F>(&self, feed: &F, consumer: &str, since_id: RecordId, limit: usize) -> Vec<T>
    where
        T: Record,
        F: RecordFeed<T> + ?Sized,
    {
        let limit = limit.max(1);
        let cursor = self.cursor(consumer);
        let mut records = if since_id != 0 {
            feed.records_after(since_id)
        } else if cursor != 0 {
            feed.records_after(cursor)
        } else {
            feed.recent(limit)
        };

        keep_newest(&mut records, limit);
        self.advance(consumer, &records);
        records
    }

    /// Moves the cursor to the last record in `records`.
    ///
    /// Returns `false` and leaves the cursor alone for an empty slice or a
    /// blank consumer.
    pub fn advance<T: Record>(&self, consumer: &str, records: &[T]) -> bool {
        let consumer = consumer.trim();
        let Some(last) = records.last() else {
            return false;
        };
        if consumer.is_empty() {
            return false;
        }
        self.set(consumer, last.id());
        true
    }

    /// Returns the newest `limit` records and force-sets the cursor to the
    /// last one, even if that moves the cursor backwards.
    pub fn resync<T, F>(&self, feed: &F, consumer: &str, limit: usize) -> Result<Vec<T>, CursorError>
    where
        T: Record,
        F: RecordFeed<T> + ?Sized,
    {
        let consumer = consumer.trim();
        if consumer.is_empty() {
            return Err(CursorError::MissingConsumer);
        }
        let records = feed.recent(limit.max(1));
        if let Some(last) = records.last() {
            self.set(consumer, last.id());
        }
        debug!(
            "event=cursor_resync module=sync status=ok consumer={} returned={}",
            consumer,
            records.len()
        );
        Ok(records)
    }

    /// Drops the cursor so the next read bootstraps again.
    pub fn forget(&self, consumer: &str) -> Option<RecordId> {
        self.cursors.lock().remove(consumer.trim())
    }

    /// Number of consumers holding a cursor.
    pub fn len(&self) -> usize {
        self.cursors.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.lock().is_empty()
    }

    fn set(&self, consumer: &str, id: RecordId) {
        let previous = self.cursors.lock().insert(consumer.to_string(), id);
        debug!(
            "event=cursor_advance module=sync status=ok consumer={} from={} to={}",
            consumer,
            previous.unwrap_or(0),
            id
        );
    }
}

fn keep_newest<T>(records: &mut Vec<T>, limit: usize) {
    if records.len() > limit {
        records.drain(..records.len() - limit);
    }
}
