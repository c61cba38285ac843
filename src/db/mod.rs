//! SQLite store for companies, contacts, missions and their comment log.
//!
//! The database lives at `~/.pipecrm/pipecrm.db` by default. The schema is
//! applied idempotently on every open; WAL mode keeps concurrent readers
//! cheap. Query methods are grouped per table in the submodules.

use std::path::PathBuf;

use rusqlite::{params, Connection};
use thiserror::Error;

mod companies;
mod comments;
mod contacts;
mod missions;
pub mod types;

pub use comments::NewComment;
pub use types::*;

/// Errors specific to database operations.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Failed to encode CC list: {0}")]
    CcEncoding(#[from] serde_json::Error),
}

/// SQLite connection wrapper. Intentionally not `Clone` or `Sync`; callers
/// own one handle per thread of work.
pub struct CrmDb {
    conn: Connection,
}

impl CrmDb {
    /// Open (or create) the database at the default path.
    pub fn open() -> Result<Self, DbError> {
        let path = Self::default_path()?;
        Self::open_at(path)
    }

    /// Open a database at an explicit path. Useful for testing and for the
    /// `db_path` config override.
    pub fn open_at(path: PathBuf) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(DbError::CreateDir)?;
            }
        }

        let conn = Connection::open(&path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        // Off by default per connection; the schema declares REFERENCES
        // clauses and relies on them being enforced.
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(include_str!("../schema.sql"))?;

        Ok(Self { conn })
    }

    /// Resolve the default database path: `~/.pipecrm/pipecrm.db`.
    fn default_path() -> Result<PathBuf, DbError> {
        let home = dirs::home_dir().ok_or(DbError::HomeDirNotFound)?;
        Ok(home.join(".pipecrm").join("pipecrm.db"))
    }

    /// Execute a closure within a SQLite transaction.
    /// Commits on Ok, rolls back on Err.
    pub fn with_transaction<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<DbError>,
    {
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| E::from(DbError::Sqlite(e)))?;
        match f(self) {
            Ok(val) => {
                self.conn
                    .execute_batch("COMMIT")
                    .map_err(|e| E::from(DbError::Sqlite(e)))?;
                Ok(val)
            }
            Err(e) => {
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Insert or replace a user directory entry.
    pub fn upsert_user(&self, user: &DbUser) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO users (id, name, email) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET name = ?2, email = ?3",
            params![user.id, user.name, user.email],
        )?;
        Ok(())
    }

    /// Look up a single user by id.
    pub fn get_user(&self, id: &str) -> Result<Option<DbUser>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, email FROM users WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], |row| {
            Ok(DbUser {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
            })
        })?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// List all users, ordered by name.
    pub fn list_users(&self) -> Result<Vec<DbUser>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, email FROM users ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok(DbUser {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
            })
        })?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }
}

// =============================================================================
// Tests
// =============================================================================
