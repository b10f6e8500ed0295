//! SQLite-backed key-value store.
//!
//! Holds the persisted session record and the active target. Check results
//! are ephemeral and are never written here.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection};

use super::data_dir;
use super::store::StateStore;
use crate::error::{DatabaseError, Result};

/// SQLite database handle. The connection is serialised behind a mutex so the
/// handle can be shared between the control surface and the ticker task.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open the database at `~/.config/focusguard/focusguard.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("focusguard.db");
        Self::open_at(&path)
    }

    /// Open (or create) a database at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic mid-statement leaves SQLite consistent; keep using the connection.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn migrate(&self) -> Result<()> {
        self.conn()
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(())
    }
}

impl StateStore for Database {
    fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn().execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn kv_delete(&self, key: &str) -> Result<()> {
        self.conn()
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Goal, PersistedSession};

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        db.kv_set("test", "again").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "again");
        db.kv_delete("test").unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
    }

    #[test]
    fn poisoned_connection_lock_is_recovered() {
        let db = Database::open_memory().unwrap();
        db.kv_set("test", "before").unwrap();
        std::thread::scope(|s| {
            let _ = s
                .spawn(|| {
                    let _guard = db.conn.lock().unwrap();
                    panic!("statement panicked");
                })
                .join();
        });
        assert!(db.conn.is_poisoned());

        assert_eq!(db.kv_get("test").unwrap().as_deref(), Some("before"));
        db.kv_set("test", "after").unwrap();
        assert_eq!(db.kv_get("test").unwrap().as_deref(), Some("after"));
    }

    #[test]
    fn session_record_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("focusguard.db");
        let goal = Goal::new("X").unwrap();

        {
            let db = Database::open_at(&path).unwrap();
            db.save_session(&PersistedSession::active(&goal)).unwrap();
        }

        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.load_session().unwrap().recoverable_goal(), Some(goal));
    }
}
