//! End-to-end tests for the automatic deduplication run.

use linkvault::database::Database;
use linkvault::managers::bookmark_store::{BookmarkStore, BookmarkStoreTrait};
use linkvault::services::dedup_coordinator::DedupCoordinator;
use linkvault::services::url_normalizer::UrlNormalizer;
use linkvault::types::dedup::DedupConfig;
use rusqlite::{params, Connection};

fn setup() -> Database {
    Database::open_in_memory().expect("Failed to open in-memory database")
}

fn raw_insert(conn: &Connection, url: &str, title: &str, created_at: i64) -> i64 {
    let n = UrlNormalizer::default();
    conn.execute(
        "INSERT INTO bookmarks (url, url_key, title, description, domain, source, created_at, updated_at, status) \
         VALUES (?1, ?2, ?3, '', ?4, 'import', ?5, ?5, 'active')",
        params![url, n.url_key(url), title, n.domain_of(url), created_at],
    )
    .unwrap();
    conn.last_insert_rowid()
}

#[test]
fn test_auto_deduplicate_runs_both_passes() {
    let db = setup();
    // Exact trio: same canonical URL.
    raw_insert(db.connection(), "https://a.com/x", "X", 1);
    raw_insert(db.connection(), "https://a.com/x/", "X", 2);
    raw_insert(db.connection(), "https://a.com/x#frag", "X", 3);
    // Approximate pair: near-identical paths, same title.
    raw_insert(
        db.connection(),
        "https://blog.example.com/posts/rust-errors",
        "Error Handling in Rust",
        4,
    );
    raw_insert(
        db.connection(),
        "https://blog.example.com/posts/rust-error",
        "Error Handling in Rust",
        5,
    );
    // Unrelated record that must survive untouched.
    let lone = raw_insert(db.connection(), "https://other.org/about", "About Us", 6);

    let coordinator = DedupCoordinator::new(db.connection(), DedupConfig::default());
    let summary = coordinator.auto_deduplicate().unwrap();

    assert_eq!(summary.exact_groups, 1);
    assert_eq!(summary.similar_groups, 1);
    assert_eq!(summary.bookmarks_merged, 2);
    assert_eq!(summary.bookmarks_archived, 3);
    assert_eq!(summary.merge_failures, 0);

    let store = BookmarkStore::new(db.connection());
    let active = store.list_active().unwrap();
    assert_eq!(active.len(), 3);
    assert!(active.iter().any(|r| r.id == lone));
    // One active record per canonical key.
    let keys: std::collections::HashSet<&str> =
        active.iter().map(|r| r.url_key.as_str()).collect();
    assert_eq!(keys.len(), active.len());
}

#[test]
fn test_auto_deduplicate_on_clean_store_changes_nothing() {
    let db = setup();
    raw_insert(db.connection(), "https://a.com/one", "One", 1);
    raw_insert(db.connection(), "https://b.com/two", "Two", 2);

    let coordinator = DedupCoordinator::new(db.connection(), DedupConfig::default());
    let summary = coordinator.auto_deduplicate().unwrap();

    assert_eq!(summary.exact_groups, 0);
    assert_eq!(summary.similar_groups, 0);
    assert_eq!(summary.bookmarks_merged, 0);
    assert_eq!(summary.bookmarks_archived, 0);

    let store = BookmarkStore::new(db.connection());
    assert_eq!(store.list_active().unwrap().len(), 2);
}

#[test]
fn test_second_run_finds_nothing_left_to_merge() {
    let db = setup();
    raw_insert(db.connection(), "https://a.com/x", "X", 1);
    raw_insert(db.connection(), "https://a.com/x/", "X", 2);

    let coordinator = DedupCoordinator::new(db.connection(), DedupConfig::default());
    let first = coordinator.auto_deduplicate().unwrap();
    assert_eq!(first.bookmarks_merged, 1);

    let second = coordinator.auto_deduplicate().unwrap();
    assert_eq!(second.exact_groups, 0);
    assert_eq!(second.similar_groups, 0);
    assert_eq!(second.bookmarks_merged, 0);
}
