//! File-backed persistence for typed records.
//!
//! # Responsibility
//! - Provide the generic `RecordStore` used by both the decision log and the
//!   chat feed.
//! - Define persistence errors and the change-notification sink.
//!
//! # Invariants
//! - Every committed mutation rewrites the whole backing file.
//! - A failed write leaves the in-memory collection unchanged.
//! - Persisted ids are unique and in `1..u64::MAX`; anything else is a load
//!   failure.
//! - Load failures degrade to an empty collection; they are never returned
//!   from `RecordStore::open`.

use crate::model::record::RecordId;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;

pub mod notify;
pub mod record_store;

pub use notify::{ChangeAction, ChangeNotifier, DispatchReport, SubscriptionId};
pub use record_store::RecordStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Write-path failure for a record store.
#[derive(Debug)]
pub enum StoreError {
    Io { path: PathBuf, source: io::Error },
    Serialize(serde_json::Error),
    /// The id counter cannot advance past `last`.
    IdsExhausted { last: RecordId },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "store file `{}` is not writable: {source}", path.display())
            }
            Self::Serialize(err) => write!(f, "failed to serialize records: {err}"),
            Self::IdsExhausted { last } => write!(f, "record ids exhausted after {last}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Serialize(err) => Some(err),
            Self::IdsExhausted { .. } => None,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

/// Reason a persisted collection was discarded at open time.
#[derive(Debug)]
pub enum LoadError {
    /// Backing file exists but could not be read.
    Read { path: PathBuf, source: io::Error },
    /// Content is not a JSON array of well-formed records.
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// A record carries id 0 or an id the counter cannot continue from.
    InvalidId { path: PathBuf, id: RecordId },
    /// Two records share one id.
    DuplicateId { path: PathBuf, id: RecordId },
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "malformed records in `{}`: {source}", path.display())
            }
            Self::InvalidId { path, id } => {
                write!(f, "invalid record id {id} in `{}`", path.display())
            }
            Self::DuplicateId { path, id } => {
                write!(f, "duplicate record id {id} in `{}`", path.display())
            }
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::InvalidId { .. } | Self::DuplicateId { .. } => None,
        }
    }
}
