//! Queries for the append-only `comments` table.
//!
//! Comments carry the optional alert/attachment/next-action payload. They
//! are never deleted; an alert is cancelled by clearing `alert_at` on the
//! row it was set on.

use rusqlite::{params, Row};

use super::{CrmDb, DbComment, DbError};
use crate::types::EntityKind;

const COMMENT_COLUMNS: &str = "id, entity_kind, entity_code, author, body, attachment,
     alert_at, next_action, created_at";

fn map_comment(row: &Row<'_>) -> rusqlite::Result<DbComment> {
    Ok(DbComment {
        id: row.get(0)?,
        entity_kind: row.get(1)?,
        entity_code: row.get(2)?,
        author: row.get(3)?,
        body: row.get(4)?,
        attachment: row.get(5)?,
        alert_at: row.get(6)?,
        next_action: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// Payload for a new comment row.
pub struct NewComment<'a> {
    pub entity_kind: EntityKind,
    pub entity_code: &'a str,
    pub author: &'a str,
    pub body: &'a str,
    pub attachment: Option<&'a str>,
    pub alert_at: Option<&'a str>,
    pub next_action: Option<&'a str>,
}

impl CrmDb {
    /// Append a comment. Returns the new row id.
    pub fn add_comment(&self, comment: &NewComment<'_>) -> Result<i64, DbError> {
        self.conn.execute(
            "INSERT INTO comments (entity_kind, entity_code, author, body,
                attachment, alert_at, next_action, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                comment.entity_kind,
                comment.entity_code,
                comment.author,
                comment.body,
                comment.attachment,
                comment.alert_at,
                comment.next_action,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All comments of an entity, oldest first.
    pub fn comments_for(
        &self,
        kind: EntityKind,
        code: &str,
    ) -> Result<Vec<DbComment>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments
             WHERE entity_kind = ?1 AND entity_code = ?2
             ORDER BY id"
        ))?;
        let rows = stmt.query_map(params![kind, code], map_comment)?;

        let mut comments = Vec::new();
        for row in rows {
            comments.push(row?);
        }
        Ok(comments)
    }

    /// The most recent comment of an entity, if any.
    pub fn last_comment(
        &self,
        kind: EntityKind,
        code: &str,
    ) -> Result<Option<DbComment>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments
             WHERE entity_kind = ?1 AND entity_code = ?2
             ORDER BY id DESC LIMIT 1"
        ))?;
        let mut rows = stmt.query_map(params![kind, code], map_comment)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Look up one comment by row id.
    pub fn get_comment(&self, id: i64) -> Result<Option<DbComment>, DbError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?1"))?;
        let mut rows = stmt.query_map(params![id], map_comment)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Update alert/attachment/next-action on the most recent comment of an
    /// entity. Used when an edit carries no new comment text: the payload
    /// attaches to the last snapshot instead of creating an empty comment.
    pub fn amend_last_comment(
        &self,
        kind: EntityKind,
        code: &str,
        attachment: Option<&str>,
        alert_at: Option<&str>,
        next_action: Option<&str>,
    ) -> Result<bool, DbError> {
        let updated = self.conn.execute(
            "UPDATE comments SET
                attachment = COALESCE(?3, attachment),
                alert_at = COALESCE(?4, alert_at),
                next_action = COALESCE(?5, next_action)
             WHERE id = (SELECT MAX(id) FROM comments
                         WHERE entity_kind = ?1 AND entity_code = ?2)",
            params![kind, code, attachment, alert_at, next_action],
        )?;
        Ok(updated > 0)
    }

    /// Clear the alert of a comment, keeping the comment itself.
    /// Returns false when the comment does not exist.
    pub fn clear_alert(&self, comment_id: i64) -> Result<bool, DbError> {
        let updated = self.conn.execute(
            "UPDATE comments SET alert_at = NULL WHERE id = ?1",
            params![comment_id],
        )?;
        Ok(updated > 0)
    }

    /// All comments carrying an alert, oldest alert first.
    pub fn comments_with_alerts(&self) -> Result<Vec<DbComment>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments
             WHERE alert_at IS NOT NULL
             ORDER BY alert_at"
        ))?;
        let rows = stmt.query_map([], map_comment)?;

        let mut comments = Vec::new();
        for row in rows {
            comments.push(row?);
        }
        Ok(comments)
    }
}
