//! Unit tests for the SQLite bookmark store.

use linkvault::database::Database;
use linkvault::managers::bookmark_store::{BookmarkStore, BookmarkStoreTrait};
use linkvault::types::bookmark::{BookmarkStatus, NewBookmark};

fn setup() -> Database {
    Database::open_in_memory().expect("Failed to open in-memory database")
}

fn new_bookmark(url: &str, title: &str) -> NewBookmark {
    NewBookmark {
        url: url.to_string(),
        title: title.to_string(),
        description: String::new(),
        source: "test".to_string(),
        created_at: 1_700_000_000,
    }
}

#[test]
fn test_insert_and_list_active() {
    let db = setup();
    let mut store = BookmarkStore::new(db.connection());

    let id = store
        .insert_bookmark(&new_bookmark("https://Example.com/Article", "Article"))
        .unwrap();

    let records = store.list_active().unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.id, id);
    // Original URL is stored unmodified; derived fields are normalized.
    assert_eq!(record.url, "https://Example.com/Article");
    assert_eq!(record.domain, "example.com");
    assert_eq!(record.url_key.len(), 64);
    assert_eq!(record.status, BookmarkStatus::Active);
}

#[test]
fn test_insert_collapses_key_collisions_to_existing_record() {
    let db = setup();
    let mut store = BookmarkStore::new(db.connection());

    let first = store
        .insert_bookmark(&new_bookmark("https://a.com/x", "One"))
        .unwrap();
    // Same resource in different surface forms: no second row.
    let second = store
        .insert_bookmark(&new_bookmark("https://a.com/x/?utm_source=tw", "Two"))
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(store.list_active().unwrap().len(), 1);
}

#[test]
fn test_list_active_excludes_archived() {
    let db = setup();
    let mut store = BookmarkStore::new(db.connection());

    let keep = store
        .insert_bookmark(&new_bookmark("https://a.com/x", "Keep"))
        .unwrap();
    let archive = store
        .insert_bookmark(&new_bookmark("https://a.com/y", "Archive"))
        .unwrap();

    store.set_status(archive, BookmarkStatus::Archived).unwrap();

    let records = store.list_active().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, keep);
}

#[test]
fn test_list_active_by_domain_respects_limit() {
    let db = setup();
    let mut store = BookmarkStore::new(db.connection());

    for i in 0..5 {
        store
            .insert_bookmark(&new_bookmark(
                &format!("https://a.com/page-{}", i),
                "Page",
            ))
            .unwrap();
    }
    store
        .insert_bookmark(&new_bookmark("https://other.com/x", "Other"))
        .unwrap();

    let records = store.list_active_by_domain("a.com", 3).unwrap();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.domain == "a.com"));
}

#[test]
fn test_fetch_bookmarks_skips_missing_ids() {
    let db = setup();
    let mut store = BookmarkStore::new(db.connection());

    let id = store
        .insert_bookmark(&new_bookmark("https://a.com/x", "X"))
        .unwrap();

    let records = store.fetch_bookmarks(&[id, 9999]).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, id);

    assert!(store.fetch_bookmarks(&[]).unwrap().is_empty());
}

#[test]
fn test_add_tags_deduplicates_and_counts_usage() {
    let db = setup();
    let mut store = BookmarkStore::new(db.connection());

    let id = store
        .insert_bookmark(&new_bookmark("https://a.com/x", "X"))
        .unwrap();

    store
        .add_tags(id, &["rust".to_string(), "rust".to_string(), "wasm".to_string()])
        .unwrap();

    let tags = store.tags_for_bookmark(id).unwrap();
    assert_eq!(tags, vec!["rust".to_string(), "wasm".to_string()]);

    // The duplicate association must not double-count.
    let count: i64 = db
        .connection()
        .query_row(
            "SELECT usage_count FROM tags WHERE name = 'rust'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn test_replace_tags_swaps_set_and_adjusts_counts() {
    let db = setup();
    let mut store = BookmarkStore::new(db.connection());

    let id = store
        .insert_bookmark(&new_bookmark("https://a.com/x", "X"))
        .unwrap();
    store
        .add_tags(id, &["old".to_string(), "shared".to_string()])
        .unwrap();

    store
        .replace_tags(id, &["shared".to_string(), "new".to_string()])
        .unwrap();

    let tags = store.tags_for_bookmark(id).unwrap();
    assert_eq!(tags, vec!["new".to_string(), "shared".to_string()]);

    let usage = |name: &str| -> i64 {
        db.connection()
            .query_row(
                "SELECT usage_count FROM tags WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .unwrap()
    };
    assert_eq!(usage("old"), 0);
    assert_eq!(usage("shared"), 1);
    assert_eq!(usage("new"), 1);
}

#[test]
fn test_update_description_and_not_found() {
    let db = setup();
    let mut store = BookmarkStore::new(db.connection());

    let id = store
        .insert_bookmark(&new_bookmark("https://a.com/x", "X"))
        .unwrap();

    store.update_description(id, "a summary").unwrap();
    let records = store.fetch_bookmarks(&[id]).unwrap();
    assert_eq!(records[0].description, "a summary");

    assert!(store.update_description(9999, "nope").is_err());
    assert!(store.set_status(9999, BookmarkStatus::Broken).is_err());
}

#[test]
fn test_stats_reflect_row_counts() {
    let db = setup();
    let mut store = BookmarkStore::new(db.connection());

    let a = store
        .insert_bookmark(&new_bookmark("https://a.com/x", "X"))
        .unwrap();
    let b = store
        .insert_bookmark(&new_bookmark("https://a.com/y", "Y"))
        .unwrap();
    store.add_tags(a, &["rust".to_string()]).unwrap();
    store.set_status(b, BookmarkStatus::Archived).unwrap();

    let stats = store.stats().unwrap();
    assert_eq!(stats.total_bookmarks, 2);
    assert_eq!(stats.active_bookmarks, 1);
    assert_eq!(stats.archived_bookmarks, 1);
    assert_eq!(stats.total_tags, 1);
}
