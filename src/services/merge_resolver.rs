//! Merge resolution for duplicate bookmark groups.
//!
//! Picks a surviving record, attaches the union of the group's tags and
//! descriptions to it, and demotes the rest to `archived`. All mutations for
//! one merge happen inside a single SQLite transaction: either everything
//! commits or nothing does. Merges are never run concurrently — callers
//! serialize them against the store.

use rusqlite::Connection;

use crate::managers::bookmark_store::{BookmarkStore, BookmarkStoreTrait};
use crate::types::bookmark::{BookmarkRecord, BookmarkStatus};
use crate::types::errors::{MergeError, StoreError};

/// Resolves duplicate groups into a single surviving record.
pub struct MergeResolver<'a> {
    conn: &'a Connection,
}

impl<'a> MergeResolver<'a> {
    /// Creates a resolver writing through the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Merges the given group, returning the surviving record's id.
    ///
    /// If `keep_id` names a member of the group it survives; otherwise the
    /// survivor is the record with, in priority order, the longest title,
    /// the longest description, any tags, and the greatest recency
    /// (`created_at`, then `id`). Ties cannot outlast the id comparison, and
    /// the fold keeps the earliest maximal record, so selection is a stable
    /// total order.
    ///
    /// # Errors
    /// Returns `MergeError::GroupNotFound` when none of the ids resolve to a
    /// stored record; no mutation is made in that case.
    pub fn merge(&mut self, ids: &[i64], keep_id: Option<i64>) -> Result<i64, MergeError> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| MergeError::DatabaseError(e.to_string()))?;

        let mut store = BookmarkStore::new(self.conn);

        let records = store.fetch_bookmarks(ids).map_err(store_err)?;
        if records.is_empty() {
            return Err(MergeError::GroupNotFound);
        }

        let mut tag_sets: Vec<Vec<String>> = Vec::with_capacity(records.len());
        for record in &records {
            tag_sets.push(store.tags_for_bookmark(record.id).map_err(store_err)?);
        }

        let survivor = match keep_id.filter(|k| records.iter().any(|r| r.id == *k)) {
            Some(id) => id,
            None => select_survivor(&records, &tag_sets),
        };

        // Union of all tags, first-seen order, no duplicates.
        let mut merged_tags: Vec<String> = Vec::new();
        for tags in &tag_sets {
            for tag in tags {
                let tag = tag.trim();
                if !tag.is_empty() && !merged_tags.iter().any(|t| t == tag) {
                    merged_tags.push(tag.to_string());
                }
            }
        }

        // Set union of non-empty descriptions, joined in first-seen order.
        let mut merged_descriptions: Vec<String> = Vec::new();
        for record in &records {
            let desc = record.description.trim();
            if !desc.is_empty() && !merged_descriptions.iter().any(|d| d == desc) {
                merged_descriptions.push(desc.to_string());
            }
        }
        let merged_description = merged_descriptions.join(" | ");

        store
            .update_description(survivor, &merged_description)
            .map_err(store_err)?;
        store.replace_tags(survivor, &merged_tags).map_err(store_err)?;

        let mut archived = 0usize;
        for record in &records {
            if record.id != survivor {
                store
                    .set_status(record.id, BookmarkStatus::Archived)
                    .map_err(store_err)?;
                archived += 1;
            }
        }

        tx.commit()
            .map_err(|e| MergeError::DatabaseError(e.to_string()))?;

        tracing::info!(
            survivor,
            group_size = records.len(),
            archived,
            "merged duplicate group"
        );
        Ok(survivor)
    }
}

fn store_err(err: StoreError) -> MergeError {
    MergeError::DatabaseError(err.to_string())
}

/// Picks the record with the most complete data.
///
/// Strictly-greater comparison keeps the first maximal record, so the
/// outcome follows the group's enumeration order on full ties.
fn select_survivor(records: &[BookmarkRecord], tag_sets: &[Vec<String>]) -> i64 {
    let mut best = 0usize;
    for i in 1..records.len() {
        if survivor_rank(&records[i], &tag_sets[i]) > survivor_rank(&records[best], &tag_sets[best])
        {
            best = i;
        }
    }
    records[best].id
}

fn survivor_rank(record: &BookmarkRecord, tags: &[String]) -> (usize, usize, bool, i64, i64) {
    (
        record.title.len(),
        record.description.len(),
        !tags.is_empty(),
        record.created_at,
        record.id,
    )
}
