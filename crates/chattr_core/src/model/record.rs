//! Generic record contract.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// Store-assigned identifier. Starts at 1; 0 means "no record".
pub type RecordId = u64;

/// Entity persisted by `RecordStore`.
///
/// Implementors are plain data: the store owns identity assignment, so the
/// only requirement is exposing the id the record was built with.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    fn id(&self) -> RecordId;
}

/// Current wall-clock time as fractional unix seconds.
///
/// Falls back to `0.0` if the system clock is before the epoch.
pub fn unix_seconds_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or(0.0)
}

/// Trims surrounding whitespace and keeps at most `max_chars` characters.
///
/// Counts Unicode scalar values so multi-byte text is never split.
pub fn trim_and_truncate(value: &str, max_chars: usize) -> String {
    value.trim().chars().take(max_chars).collect()
}
