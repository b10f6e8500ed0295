//! Key-value state store used for session recovery and the active target.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{CoreError, DatabaseError, Result};
use crate::session::PersistedSession;

/// kv key holding the JSON-encoded [`PersistedSession`].
pub const SESSION_KEY: &str = "session_state";
/// kv key holding the URL of the page currently being worked on.
pub const ACTIVE_TARGET_KEY: &str = "active_target";

/// Minimal key-value persistence.
///
/// Only the three primitive operations are required; the session and target
/// helpers are built on top of them.
pub trait StateStore: Send + Sync {
    fn kv_get(&self, key: &str) -> Result<Option<String>>;

    fn kv_set(&self, key: &str, value: &str) -> Result<()>;

    fn kv_delete(&self, key: &str) -> Result<()>;

    /// Load the persisted session record (inactive if none was ever written).
    fn load_session(&self) -> Result<PersistedSession> {
        match self.kv_get(SESSION_KEY)? {
            Some(json) => serde_json::from_str(&json).map_err(|e| {
                CoreError::Database(DatabaseError::CorruptValue {
                    key: SESSION_KEY.into(),
                    message: e.to_string(),
                })
            }),
            None => Ok(PersistedSession::inactive()),
        }
    }

    fn save_session(&self, record: &PersistedSession) -> Result<()> {
        let json = serde_json::to_string(record)?;
        self.kv_set(SESSION_KEY, &json)
    }

    fn active_target(&self) -> Result<Option<String>> {
        Ok(self
            .kv_get(ACTIVE_TARGET_KEY)?
            .filter(|url| !url.trim().is_empty()))
    }

    fn set_active_target(&self, url: &str) -> Result<()> {
        self.kv_set(ACTIVE_TARGET_KEY, url)
    }

    fn clear_active_target(&self) -> Result<()> {
        self.kv_delete(ACTIVE_TARGET_KEY)
    }
}

/// In-process store, for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.values
            .lock()
            .map_err(|e| CoreError::Database(DatabaseError::QueryFailed(e.to_string())))
    }
}

impl StateStore for MemoryStore {
    fn kv_get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn kv_delete(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Goal;

    #[test]
    fn empty_store_loads_inactive_session() {
        let store = MemoryStore::default();
        assert_eq!(store.load_session().unwrap(), PersistedSession::inactive());
    }

    #[test]
    fn session_round_trips_through_kv() {
        let store = MemoryStore::default();
        let goal = Goal::new("Write the thesis").unwrap();
        store.save_session(&PersistedSession::active(&goal)).unwrap();

        let raw = store.kv_get(SESSION_KEY).unwrap().unwrap();
        assert!(raw.contains("\"isSessionActive\":true"));
        assert_eq!(
            store.load_session().unwrap().recoverable_goal(),
            Some(goal)
        );
    }

    #[test]
    fn corrupt_session_record_is_reported() {
        let store = MemoryStore::default();
        store.kv_set(SESSION_KEY, "{not json").unwrap();
        assert!(matches!(
            store.load_session(),
            Err(CoreError::Database(DatabaseError::CorruptValue { .. }))
        ));
    }

    #[test]
    fn blank_target_counts_as_none() {
        let store = MemoryStore::default();
        store.set_active_target("  ").unwrap();
        assert_eq!(store.active_target().unwrap(), None);
        store.set_active_target("https://example.com").unwrap();
        assert_eq!(store.active_target().unwrap().as_deref(), Some("https://example.com"));
        store.clear_active_target().unwrap();
        assert_eq!(store.active_target().unwrap(), None);
    }
}
