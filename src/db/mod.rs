pub mod models;
pub mod queries;

use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Migration failed: {0}")]
    Migration(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Current schema version, stored in `PRAGMA user_version`.
const SCHEMA_VERSION: i32 = 1;

pub struct Database {
    pub conn: Connection,
}

impl Database {
    /// Open (or create) a read-write database and bring the schema up to date.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Open an existing database without write access and without migrating.
    /// A missing file is an error, not an empty database.
    pub fn open_read_only(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    fn init(&self) -> Result<()> {
        self.conn.pragma_update(None, "journal_mode", "WAL")?;
        self.conn.pragma_update(None, "synchronous", "NORMAL")?;
        self.conn.pragma_update(None, "foreign_keys", "ON")?;
        self.migrate()?;
        Ok(())
    }

    fn migrate(&self) -> Result<()> {
        let version: i32 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap_or(0);

        if version > SCHEMA_VERSION {
            return Err(DbError::Migration(format!(
                "database schema v{version} is newer than supported v{SCHEMA_VERSION}"
            )));
        }
        if version < 1 {
            self.migrate_v1()?;
        }

        self.conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        Ok(())
    }

    /// V1: moods, listening history, and per-track audio features.
    fn migrate_v1(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS moods (
                mood_id         INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id         INTEGER NOT NULL,
                mood_score      REAL NOT NULL,
                arousal_score   REAL NOT NULL,
                recorded_at     TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_moods_user ON moods(user_id);
            CREATE INDEX IF NOT EXISTS idx_moods_recorded ON moods(recorded_at);

            -- mood_id is nullable: plays logged outside a mood check-in stay unlinked
            CREATE TABLE IF NOT EXISTS listening_history (
                history_id      INTEGER PRIMARY KEY AUTOINCREMENT,
                mood_id         INTEGER REFERENCES moods(mood_id) ON DELETE SET NULL,
                user_id         INTEGER NOT NULL,
                track_id        TEXT NOT NULL,
                track_name      TEXT NOT NULL,
                artist_name     TEXT NOT NULL,
                listened_at     TEXT NOT NULL,
                UNIQUE(user_id, track_id, listened_at)
            );

            CREATE INDEX IF NOT EXISTS idx_history_mood ON listening_history(mood_id, user_id);
            CREATE INDEX IF NOT EXISTS idx_history_track ON listening_history(track_id);

            CREATE TABLE IF NOT EXISTS tracks (
                track_id        TEXT PRIMARY KEY,
                name            TEXT,
                artist          TEXT,
                danceability    REAL,
                energy          REAL,
                valence         REAL,
                tempo           REAL
            );
            ",
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrate_sets_user_version() {
        let db = Database::open_in_memory().unwrap();
        let version: i32 = db
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db.migrate().unwrap();
    }

    #[test]
    fn test_rejects_newer_schema() {
        let db = Database::open_in_memory().unwrap();
        db.conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1).unwrap();
        assert!(matches!(db.migrate(), Err(DbError::Migration(_))));
    }

    #[test]
    fn test_open_read_only_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.db");
        assert!(Database::open_read_only(&path).is_err());
        assert!(!path.exists());
    }
}
