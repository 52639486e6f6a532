//! Bookmark record store for Linkvault.
//!
//! Implements `BookmarkStoreTrait` — the interface the deduplication passes
//! consume and the merge resolver writes back through. Backed by SQLite via
//! `rusqlite`.

use rusqlite::{params, Connection};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::services::url_normalizer::UrlNormalizer;
use crate::types::bookmark::{BookmarkRecord, BookmarkStatus, NewBookmark};
use crate::types::errors::StoreError;

/// Aggregate row counts for the store.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct StoreStats {
    pub total_bookmarks: i64,
    pub active_bookmarks: i64,
    pub archived_bookmarks: i64,
    pub total_tags: i64,
}

/// Trait defining record store operations used by the dedup engine.
///
/// Listing methods return rows ordered by `(domain, created_at, id)` so that
/// dedup passes are deterministic over unchanged data.
pub trait BookmarkStoreTrait {
    /// Inserts a bookmark, deriving `url_key` and `domain` from its URL.
    ///
    /// If an active record already holds the derived key, no row is inserted
    /// and the existing record's id is returned.
    fn insert_bookmark(&mut self, bookmark: &NewBookmark) -> Result<i64, StoreError>;
    fn list_active(&self) -> Result<Vec<BookmarkRecord>, StoreError>;
    fn list_active_by_domain(&self, domain: &str, limit: i64)
        -> Result<Vec<BookmarkRecord>, StoreError>;
    /// Fetches the given records in `(created_at, id)` order. Missing ids
    /// are silently absent from the result.
    fn fetch_bookmarks(&self, ids: &[i64]) -> Result<Vec<BookmarkRecord>, StoreError>;
    fn tags_for_bookmark(&self, id: i64) -> Result<Vec<String>, StoreError>;
    /// Replaces a bookmark's tag set. Usage counts of removed associations
    /// are decremented, added ones incremented; the association table stays
    /// deduplicated by (bookmark, tag).
    fn replace_tags(&mut self, id: i64, tags: &[String]) -> Result<(), StoreError>;
    /// Attaches tags without removing existing ones.
    fn add_tags(&mut self, id: i64, tags: &[String]) -> Result<(), StoreError>;
    fn update_description(&mut self, id: i64, description: &str) -> Result<(), StoreError>;
    fn set_status(&mut self, id: i64, status: BookmarkStatus) -> Result<(), StoreError>;
    fn stats(&self) -> Result<StoreStats, StoreError>;
}

/// SQLite-backed bookmark store.
pub struct BookmarkStore<'a> {
    conn: &'a Connection,
    normalizer: UrlNormalizer,
}

impl<'a> BookmarkStore<'a> {
    /// Creates a store using the provided connection and the default
    /// tracking-parameter list for key derivation.
    pub fn new(conn: &'a Connection) -> Self {
        Self {
            conn,
            normalizer: UrlNormalizer::default(),
        }
    }

    /// Creates a store deriving keys with a specific normalizer.
    ///
    /// The normalizer must match the one used by the dedup passes, or the
    /// exact pass will not see the keys it expects.
    pub fn with_normalizer(conn: &'a Connection, normalizer: UrlNormalizer) -> Self {
        Self { conn, normalizer }
    }

    /// Returns the underlying connection, for callers that need to scope a
    /// transaction around several store operations.
    pub fn connection(&self) -> &Connection {
        self.conn
    }

    /// Returns the current UNIX timestamp in seconds.
    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }

    /// Looks up a tag id by name, creating the tag row if absent.
    fn get_or_create_tag(&self, name: &str) -> Result<i64, StoreError> {
        let existing: Option<i64> = self
            .conn
            .query_row("SELECT id FROM tags WHERE name = ?1", params![name], |row| {
                row.get(0)
            })
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(StoreError::DatabaseError(other.to_string())),
            })?;

        if let Some(id) = existing {
            return Ok(id);
        }

        self.conn
            .execute("INSERT INTO tags (name) VALUES (?1)", params![name])
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Attaches one tag to a bookmark, maintaining its usage count.
    fn attach_tag(&self, bookmark_id: i64, name: &str) -> Result<(), StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(());
        }
        let tag_id = self.get_or_create_tag(name)?;
        let inserted = self
            .conn
            .execute(
                "INSERT OR IGNORE INTO bookmark_tags (bookmark_id, tag_id) VALUES (?1, ?2)",
                params![bookmark_id, tag_id],
            )
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        if inserted > 0 {
            self.conn
                .execute(
                    "UPDATE tags SET usage_count = usage_count + 1 WHERE id = ?1",
                    params![tag_id],
                )
                .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        }
        Ok(())
    }

    /// Reads a single bookmark row into a struct.
    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<BookmarkRecord> {
        let status: String = row.get(8)?;
        Ok(BookmarkRecord {
            id: row.get(0)?,
            url: row.get(1)?,
            url_key: row.get(2)?,
            title: row.get(3)?,
            description: row.get(4)?,
            domain: row.get(5)?,
            source: row.get(6)?,
            created_at: row.get(7)?,
            status: BookmarkStatus::parse(&status),
        })
    }

    const RECORD_COLUMNS: &'static str =
        "id, url, url_key, title, description, domain, source, created_at, status";
}

impl<'a> BookmarkStoreTrait for BookmarkStore<'a> {
    fn insert_bookmark(&mut self, bookmark: &NewBookmark) -> Result<i64, StoreError> {
        let url_key = self.normalizer.url_key(&bookmark.url);
        let domain = self.normalizer.domain_of(&bookmark.url);

        // One active record per url_key: collisions resolve to the
        // existing record instead of inserting.
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM bookmarks WHERE url_key = ?1 AND status = 'active'",
                params![url_key],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(StoreError::DatabaseError(other.to_string())),
            })?;

        if let Some(id) = existing {
            return Ok(id);
        }

        let now = Self::now();
        self.conn
            .execute(
                "INSERT INTO bookmarks (url, url_key, title, description, domain, source, created_at, updated_at, status) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'active')",
                params![
                    bookmark.url,
                    url_key,
                    bookmark.title,
                    bookmark.description,
                    domain,
                    bookmark.source,
                    bookmark.created_at,
                    now,
                ],
            )
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        Ok(self.conn.last_insert_rowid())
    }

    fn list_active(&self) -> Result<Vec<BookmarkRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM bookmarks WHERE status = 'active' \
                 ORDER BY domain, created_at ASC, id ASC",
                Self::RECORD_COLUMNS
            ))
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::row_to_record)
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| StoreError::DatabaseError(e.to_string()))?);
        }
        Ok(results)
    }

    fn list_active_by_domain(
        &self,
        domain: &str,
        limit: i64,
    ) -> Result<Vec<BookmarkRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM bookmarks WHERE status = 'active' AND domain = ?1 \
                 ORDER BY created_at ASC, id ASC LIMIT ?2",
                Self::RECORD_COLUMNS
            ))
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        let rows = stmt
            .query_map(params![domain, limit], Self::row_to_record)
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| StoreError::DatabaseError(e.to_string()))?);
        }
        Ok(results)
    }

    fn fetch_bookmarks(&self, ids: &[i64]) -> Result<Vec<BookmarkRecord>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM bookmarks WHERE id IN ({}) ORDER BY created_at ASC, id ASC",
                Self::RECORD_COLUMNS,
                placeholders
            ))
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        let rows = stmt
            .query_map(rusqlite::params_from_iter(ids.iter()), Self::row_to_record)
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| StoreError::DatabaseError(e.to_string()))?);
        }
        Ok(results)
    }

    fn tags_for_bookmark(&self, id: i64) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT t.name FROM tags t \
                 JOIN bookmark_tags bt ON t.id = bt.tag_id \
                 WHERE bt.bookmark_id = ?1 ORDER BY t.name",
            )
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        let rows = stmt
            .query_map(params![id], |row| row.get::<_, String>(0))
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| StoreError::DatabaseError(e.to_string()))?);
        }
        Ok(results)
    }

    fn replace_tags(&mut self, id: i64, tags: &[String]) -> Result<(), StoreError> {
        // Merge cleanup: removed associations give their counts back.
        self.conn
            .execute(
                "UPDATE tags SET usage_count = usage_count - 1 \
                 WHERE id IN (SELECT tag_id FROM bookmark_tags WHERE bookmark_id = ?1)",
                params![id],
            )
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        self.conn
            .execute(
                "DELETE FROM bookmark_tags WHERE bookmark_id = ?1",
                params![id],
            )
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        for tag in tags {
            self.attach_tag(id, tag)?;
        }
        Ok(())
    }

    fn add_tags(&mut self, id: i64, tags: &[String]) -> Result<(), StoreError> {
        for tag in tags {
            self.attach_tag(id, tag)?;
        }
        Ok(())
    }

    fn update_description(&mut self, id: i64, description: &str) -> Result<(), StoreError> {
        let affected = self
            .conn
            .execute(
                "UPDATE bookmarks SET description = ?1, updated_at = ?2 WHERE id = ?3",
                params![description, Self::now(), id],
            )
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        if affected == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    fn set_status(&mut self, id: i64, status: BookmarkStatus) -> Result<(), StoreError> {
        let affected = self
            .conn
            .execute(
                "UPDATE bookmarks SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status.as_str(), Self::now(), id],
            )
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        if affected == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    fn stats(&self) -> Result<StoreStats, StoreError> {
        let count = |sql: &str| -> Result<i64, StoreError> {
            self.conn
                .query_row(sql, [], |row| row.get(0))
                .map_err(|e| StoreError::DatabaseError(e.to_string()))
        };

        Ok(StoreStats {
            total_bookmarks: count("SELECT COUNT(*) FROM bookmarks")?,
            active_bookmarks: count("SELECT COUNT(*) FROM bookmarks WHERE status = 'active'")?,
            archived_bookmarks: count("SELECT COUNT(*) FROM bookmarks WHERE status = 'archived'")?,
            total_tags: count("SELECT COUNT(*) FROM tags")?,
        })
    }
}
