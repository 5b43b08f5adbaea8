//! Generic JSON-file record store.
//!
//! # Responsibility
//! - Assign monotonic ids and keep records in insertion order.
//! - Serialize the whole collection to one pretty-printed JSON file on every
//!   mutation.
//! - Notify observers after each committed mutation.
//!
//! # Invariants
//! - `next_id` only grows; ids are never reused, including after deletes.
//! - After reload, `next_id` continues from `max(existing id) + 1`.
//! - The counter never wraps; an exhausted counter rejects inserts.
//! - One mutex guards the collection, the counter and the disk write.
//! - Observers run after the mutex is released.
//! - Read APIs return copies; callers never hold references into the store.

use crate::model::record::{Record, RecordId};
use crate::repo::notify::{ChangeAction, ChangeNotifier, SubscriptionId};
use crate::repo::{LoadError, StoreError, StoreResult};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

struct StoreState<T> {
    records: Vec<T>,
    next_id: RecordId,
}

/// Thread-safe, file-backed collection of `T`.
pub struct RecordStore<T: Record> {
    path: PathBuf,
    state: Mutex<StoreState<T>>,
    notifier: ChangeNotifier<T>,
    load_error: Option<LoadError>,
}

impl<T: Record> RecordStore<T> {
    /// Opens (or creates) the store backed by `path`.
    ///
    /// # Errors
    /// - Returns `StoreError::Io` only when the parent directory cannot be
    ///   created. Unreadable or malformed content is discarded with a warning
    ///   and reported through `load_error()`.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let (records, next_id, load_error) = match load_state::<T>(&path) {
            Ok((records, next_id)) => {
                info!(
                    "event=store_open module=repo status=ok path={} records={}",
                    path.display(),
                    records.len()
                );
                (records, next_id, None)
            }
            Err(err) => {
                warn!(
                    "event=store_open module=repo status=degraded path={} error={}",
                    path.display(),
                    err
                );
                (Vec::new(), 1, Some(err))
            }
        };

        Ok(Self {
            path,
            state: Mutex::new(StoreState { records, next_id }),
            notifier: ChangeNotifier::new(),
            load_error,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load failure that forced this store to start empty, if any.
    pub fn load_error(&self) -> Option<&LoadError> {
        self.load_error.as_ref()
    }

    /// Id the next inserted record will receive.
    pub fn next_id(&self) -> RecordId {
        self.state.lock().next_id
    }

    /// Registers a change observer; see `ChangeNotifier`.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(ChangeAction, &T) + Send + Sync + 'static,
    {
        self.notifier.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// Appends a record built from the next id.
    ///
    /// `build` must return a record carrying the id it was given.
    pub fn insert<F>(&self, action: ChangeAction, build: F) -> StoreResult<T>
    where
        F: FnOnce(RecordId) -> T,
    {
        let record = {
            let mut state = self.state.lock();
            self.insert_locked(&mut state, build)?
        };
        self.notifier.notify_best_effort(action, &record);
        Ok(record)
    }

    /// Appends a record unless the store already holds `capacity` records.
    ///
    /// Returns `Ok(None)` without side effects when full. The capacity check
    /// and the insert happen under one lock acquisition.
    pub fn insert_bounded<F>(
        &self,
        capacity: usize,
        action: ChangeAction,
        build: F,
    ) -> StoreResult<Option<T>>
    where
        F: FnOnce(RecordId) -> T,
    {
        let record = {
            let mut state = self.state.lock();
            if state.records.len() >= capacity {
                debug!(
                    "event=record_insert module=repo status=rejected path={} capacity={}",
                    self.path.display(),
                    capacity
                );
                return Ok(None);
            }
            self.insert_locked(&mut state, build)?
        };
        self.notifier.notify_best_effort(action, &record);
        Ok(Some(record))
    }

    pub fn get(&self, id: RecordId) -> Option<T> {
        let state = self.state.lock();
        state.records.iter().find(|record| record.id() == id).cloned()
    }

    /// Snapshot of all records in insertion order.
    pub fn list(&self) -> Vec<T> {
        self.state.lock().records.clone()
    }

    /// Records with an id strictly greater than `id`.
    pub fn list_after(&self, id: RecordId) -> Vec<T> {
        let state = self.state.lock();
        state
            .records
            .iter()
            .filter(|record| record.id() > id)
            .cloned()
            .collect()
    }

    /// The last `limit` records, oldest first.
    pub fn list_recent(&self, limit: usize) -> Vec<T> {
        let state = self.state.lock();
        let start = state.records.len().saturating_sub(limit);
        state.records[start..].to_vec()
    }

    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().records.is_empty()
    }

    pub fn count_where<P>(&self, predicate: P) -> usize
    where
        P: Fn(&T) -> bool,
    {
        let state = self.state.lock();
        state.records.iter().filter(|record| predicate(record)).count()
    }

    /// Applies `mutate` to the record with `id` and persists.
    ///
    /// Returns `Ok(None)` for an unknown id; nothing is written or notified.
    /// `mutate` must not change the record id.
    pub fn update<F>(&self, id: RecordId, action: ChangeAction, mutate: F) -> StoreResult<Option<T>>
    where
        F: FnOnce(&mut T),
    {
        let updated = {
            let mut state = self.state.lock();
            let Some(index) = position_of(&state.records, id) else {
                return Ok(None);
            };

            let previous = state.records[index].clone();
            mutate(&mut state.records[index]);
            debug_assert_eq!(state.records[index].id(), id);

            if let Err(err) = self.persist(&state.records) {
                state.records[index] = previous;
                return Err(err);
            }
            debug!(
                "event=record_update module=repo status=ok path={} id={} action={}",
                self.path.display(),
                id,
                action
            );
            state.records[index].clone()
        };
        self.notifier.notify_best_effort(action, &updated);
        Ok(Some(updated))
    }

    /// Removes the record with `id` and returns it.
    pub fn delete(&self, id: RecordId) -> StoreResult<Option<T>> {
        let removed = {
            let mut state = self.state.lock();
            let Some(index) = position_of(&state.records, id) else {
                return Ok(None);
            };

            let removed = state.records.remove(index);
            if let Err(err) = self.persist(&state.records) {
                state.records.insert(index, removed);
                return Err(err);
            }
            debug!(
                "event=record_delete module=repo status=ok path={} id={}",
                self.path.display(),
                id
            );
            removed
        };
        self.notifier
            .notify_best_effort(ChangeAction::Delete, &removed);
        Ok(Some(removed))
    }

    fn insert_locked<F>(&self, state: &mut StoreState<T>, build: F) -> StoreResult<T>
    where
        F: FnOnce(RecordId) -> T,
    {
        let id = state.next_id;
        let following = id
            .checked_add(1)
            .ok_or(StoreError::IdsExhausted { last: id - 1 })?;
        let record = build(id);
        debug_assert_eq!(record.id(), id);

        state.records.push(record.clone());
        if let Err(err) = self.persist(&state.records) {
            state.records.pop();
            return Err(err);
        }
        state.next_id = following;
        debug!(
            "event=record_insert module=repo status=ok path={} id={}",
            self.path.display(),
            id
        );
        Ok(record)
    }

    fn persist(&self, records: &[T]) -> StoreResult<()> {
        write_records(&self.path, records).map_err(|err| {
            error!(
                "event=store_write module=repo status=error path={} error={}",
                self.path.display(),
                err
            );
            err
        })
    }
}

fn position_of<T: Record>(records: &[T], id: RecordId) -> Option<usize> {
    records.iter().position(|record| record.id() == id)
}

/// Reads a persisted collection. A missing file is an empty collection.
pub fn load_records<T: Record>(path: &Path) -> Result<Vec<T>, LoadError> {
    load_state(path).map(|(records, _)| records)
}

/// Reads a persisted collection and the id that follows its highest id.
fn load_state<T: Record>(path: &Path) -> Result<(Vec<T>, RecordId), LoadError> {
    if !path.exists() {
        return Ok((Vec::new(), 1));
    }
    let content = fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let records: Vec<T> = serde_json::from_str(&content).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let next_id = check_ids(path, &records)?;
    Ok((records, next_id))
}

fn check_ids<T: Record>(path: &Path, records: &[T]) -> Result<RecordId, LoadError> {
    let mut seen = HashSet::with_capacity(records.len());
    let mut max_id = 0;
    for record in records {
        let id = record.id();
        if id == 0 {
            return Err(LoadError::InvalidId {
                path: path.to_path_buf(),
                id,
            });
        }
        if !seen.insert(id) {
            return Err(LoadError::DuplicateId {
                path: path.to_path_buf(),
                id,
            });
        }
        max_id = max_id.max(id);
    }
    max_id.checked_add(1).ok_or_else(|| LoadError::InvalidId {
        path: path.to_path_buf(),
        id: max_id,
    })
}

/// Replaces the file content with the pretty-printed collection.
///
/// Writes a sibling temp file first and renames it over `path`.
pub fn write_records<T: Record>(path: &Path, records: &[T]) -> StoreResult<()> {
    let mut content = serde_json::to_string_pretty(records)?;
    content.push('\n');

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "records".to_string());
    let tmp_path = path.with_file_name(format!(".{file_name}.tmp"));

    fs::write(&tmp_path, content).map_err(|source| StoreError::Io {
        path: tmp_path.clone(),
        source,
    })?;
    fs::rename(&tmp_path, path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}
