//! Automatic deduplication orchestration.
//!
//! Runs the exact pass, merges its groups, then runs the approximate pass
//! over the now-cleaned records and merges those groups too. Merges are
//! executed one at a time — each is its own transaction, and serializing
//! them keeps overlapping groups from racing each other.

use rusqlite::Connection;

use crate::managers::bookmark_store::BookmarkStore;
use crate::services::duplicate_finder::DuplicateFinder;
use crate::services::merge_resolver::MergeResolver;
use crate::types::dedup::{DedupConfig, DedupSummary, DuplicateGroup};
use crate::types::errors::DedupError;

/// Drives a full deduplication run: find, merge, repeat for both passes.
pub struct DedupCoordinator<'a> {
    conn: &'a Connection,
    config: DedupConfig,
}

impl<'a> DedupCoordinator<'a> {
    pub fn new(conn: &'a Connection, config: DedupConfig) -> Self {
        Self { conn, config }
    }

    /// Runs both passes and merges every discovered group.
    ///
    /// A failed merge is counted and logged but does not abort the run;
    /// only a store failure during a pass does.
    pub fn auto_deduplicate(&self) -> Result<DedupSummary, DedupError> {
        let mut summary = DedupSummary::default();

        tracing::info!("starting automatic deduplication");

        let exact = {
            let store = BookmarkStore::new(self.conn);
            let mut finder = DuplicateFinder::new(&store, self.config.clone());
            finder.find_exact_duplicates()?
        };
        summary.exact_groups = exact.len();
        self.merge_groups(&exact, &mut summary);

        // The approximate pass re-reads the store, so it sees the exact
        // pass's archivals.
        let report = {
            let store = BookmarkStore::new(self.conn);
            let mut finder = DuplicateFinder::new(&store, self.config.clone());
            finder.find_similar_duplicates()?
        };
        summary.similar_groups = report.groups.len();
        self.merge_groups(&report.groups, &mut summary);

        tracing::info!(
            exact_groups = summary.exact_groups,
            similar_groups = summary.similar_groups,
            merged = summary.bookmarks_merged,
            archived = summary.bookmarks_archived,
            failures = summary.merge_failures,
            "automatic deduplication complete"
        );
        Ok(summary)
    }

    fn merge_groups(&self, groups: &[DuplicateGroup], summary: &mut DedupSummary) {
        let mut resolver = MergeResolver::new(self.conn);
        for group in groups {
            if group.ids.len() < 2 {
                continue;
            }
            match resolver.merge(&group.ids, None) {
                Ok(_) => {
                    summary.bookmarks_merged += 1;
                    summary.bookmarks_archived += group.ids.len() - 1;
                }
                Err(err) => {
                    tracing::warn!(ids = ?group.ids, error = %err, "merge failed");
                    summary.merge_failures += 1;
                }
            }
        }
    }
}
