//src/session_store.rs
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::history::HistoryRecord;
use crate::model::WorkoutSession;
use crate::store::{self, KeyValueStore};

pub const CURRENT_SESSION_KEY: &str = "gym_active_session";
pub const HISTORY_KEY: &str = "gym_history";

#[derive(Error, Debug)]
pub enum Error {
    #[error("Storage error: {0}")]
    Store(#[from] store::Error),
    #[error("Failed to serialize '{key}': {source}")]
    Serialize {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Stored '{key}' entry is corrupt: {source}")]
    Corrupt {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// True when the underlying store refused the write for lack of space.
    #[must_use]
    pub const fn is_capacity_exceeded(&self) -> bool {
        matches!(self, Self::Store(store::Error::CapacityExceeded { .. }))
    }
}

/// Where the live session stands. Persisted next to the session so a later
/// process resumes at the same step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "camelCase")]
pub enum Phase {
    Warmup,
    Active { index: usize },
    Summary,
}

/// The value stored under [`CURRENT_SESSION_KEY`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveWorkout {
    pub phase: Phase,
    pub body_weight: f64,
    pub session: WorkoutSession,
}

/// Typed access to the two persisted entries: the active session and the history list.
pub struct SessionStore<S: KeyValueStore> {
    kv: S,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub const fn new(kv: S) -> Self {
        Self { kv }
    }

    pub const fn kv(&self) -> &S {
        &self.kv
    }

    /// Reads the active session, if one is in progress.
    /// # Errors
    /// Returns `Error` if the store cannot be read or the entry does not parse.
    pub fn load_current(&self) -> Result<Option<ActiveWorkout>, Error> {
        let Some(raw) = self.kv.get(CURRENT_SESSION_KEY)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| Error::Corrupt {
                key: CURRENT_SESSION_KEY,
                source,
            })
    }

    /// Overwrites the active session entry.
    /// # Errors
    /// Returns `Error` on serialization or store failure (including capacity exceeded).
    pub fn save_current(&mut self, active: &ActiveWorkout) -> Result<(), Error> {
        let raw = serde_json::to_string(active).map_err(|source| Error::Serialize {
            key: CURRENT_SESSION_KEY,
            source,
        })?;
        self.kv.set(CURRENT_SESSION_KEY, &raw)?;
        debug!(phase = ?active.phase, "saved active session");
        Ok(())
    }

    /// # Errors
    /// Returns `Error` if the store cannot be written.
    pub fn clear_current(&mut self) -> Result<(), Error> {
        self.kv.remove(CURRENT_SESSION_KEY)?;
        debug!("cleared active session");
        Ok(())
    }

    /// Full history, most recent first. A missing entry is an empty history.
    /// # Errors
    /// Returns `Error` if the store cannot be read or the entry does not parse.
    pub fn load_history(&self) -> Result<Vec<HistoryRecord>, Error> {
        let Some(raw) = self.kv.get(HISTORY_KEY)? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw).map_err(|source| {
            warn!("history entry failed to parse: {source}");
            Error::Corrupt {
                key: HISTORY_KEY,
                source,
            }
        })
    }

    /// # Errors
    /// Returns `Error` on serialization or store failure.
    pub fn save_history(&mut self, records: &[HistoryRecord]) -> Result<(), Error> {
        let raw = serde_json::to_string(records).map_err(|source| Error::Serialize {
            key: HISTORY_KEY,
            source,
        })?;
        self.kv.set(HISTORY_KEY, &raw)?;
        Ok(())
    }

    /// Read-modify-write: puts `record` at the front of the history list.
    /// Not safe against a second writer touching the store between the read and the write.
    /// # Errors
    /// Returns `Error` if reading or writing the history fails.
    pub fn append_history(&mut self, record: HistoryRecord) -> Result<(), Error> {
        let mut records = self.load_history()?;
        debug!(id = record.id(), kind = %record.kind(), "appending history record");
        records.insert(0, record);
        self.save_history(&records)
    }

    /// Removes the record with `id`. Returns whether a record was removed.
    /// # Errors
    /// Returns `Error` if reading or writing the history fails.
    pub fn delete_history(&mut self, id: &str) -> Result<bool, Error> {
        let mut records = self.load_history()?;
        let before = records.len();
        records.retain(|r| r.id() != id);
        if records.len() == before {
            return Ok(false);
        }
        self.save_history(&records)?;
        Ok(true)
    }

    /// # Errors
    /// Returns `Error` if the history cannot be read.
    pub fn find_history(&self, id: &str) -> Result<Option<HistoryRecord>, Error> {
        Ok(self.load_history()?.into_iter().find(|r| r.id() == id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ExerciseTarget;
    use crate::store::MemoryStore;

    #[test]
    fn test_append_is_most_recent_first_and_delete_by_id() {
        let mut store = SessionStore::new(MemoryStore::new());
        let first = HistoryRecord::diet("Diet A", "a");
        let second = HistoryRecord::workout("Workout B", "b");
        let first_id = first.id().to_string();
        store.append_history(first).unwrap();
        store.append_history(second).unwrap();

        let titles: Vec<String> = store
            .load_history()
            .unwrap()
            .iter()
            .map(|r| r.title().to_string())
            .collect();
        assert_eq!(titles, vec!["Workout B", "Diet A"]);

        assert!(store.delete_history(&first_id).unwrap());
        assert!(!store.delete_history(&first_id).unwrap());
        assert_eq!(store.load_history().unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_current_entry_is_reported() {
        let mut kv = MemoryStore::new();
        kv.set(CURRENT_SESSION_KEY, "{not json").unwrap();
        let store = SessionStore::new(kv);
        assert!(matches!(
            store.load_current(),
            Err(Error::Corrupt {
                key: CURRENT_SESSION_KEY,
                ..
            })
        ));
    }

    #[test]
    fn test_active_workout_round_trip() {
        let mut store = SessionStore::new(MemoryStore::new());
        let active = ActiveWorkout {
            phase: Phase::Active { index: 1 },
            body_weight: 82.5,
            session: WorkoutSession::new(
                "Back",
                vec![
                    ExerciseTarget::new("Row", 3, "8-12", "90s"),
                    ExerciseTarget::new("Pulldown", 3, "10", "60s"),
                ],
                vec!["Band pull-aparts".to_string()],
            ),
        };
        store.save_current(&active).unwrap();
        assert_eq!(store.load_current().unwrap(), Some(active));
        store.clear_current().unwrap();
        assert_eq!(store.load_current().unwrap(), None);
    }
}
