//! SQLite-backed key-value store

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;

use crate::migrations::run_migrations;
use crate::store::KeyValueStore;
use crate::Result;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for better concurrent performance
        let _: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    /// Number of stored keys
    pub fn len(&self) -> Result<usize> {
        self.with_connection(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))?;
            Ok(count as usize)
        })
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_connection(|conn| {
            let value = conn
                .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
                .optional()?;
            Ok(value)
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let updated_at = Utc::now().to_rfc3339();
        self.with_connection(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![key, value, updated_at],
            )?;
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
            Ok(())
        })
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.is_empty().unwrap());
    }

    #[test]
    fn test_set_get_remove() {
        let db = Database::open_in_memory().unwrap();

        db.set("suspended_7", r#"{"url":"https://example.com"}"#)
            .unwrap();
        assert_eq!(
            db.get("suspended_7").unwrap().as_deref(),
            Some(r#"{"url":"https://example.com"}"#)
        );

        // Overwrite keeps a single row
        db.set("suspended_7", "{}").unwrap();
        assert_eq!(db.len().unwrap(), 1);

        db.remove("suspended_7").unwrap();
        assert!(db.get("suspended_7").unwrap().is_none());

        // Removing a missing key is fine
        db.remove("suspended_7").unwrap();
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tabmind.db");

        {
            let db = Database::open(&path).unwrap();
            db.set("search_history", r#"["rust"]"#).unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert_eq!(
            db.get("search_history").unwrap().as_deref(),
            Some(r#"["rust"]"#)
        );
    }
}
