use linkvault::types::errors::*;

// === StoreError Tests ===

#[test]
fn test_store_error_not_found_display() {
    let err = StoreError::NotFound(42);
    assert_eq!(err.to_string(), "Bookmark not found: 42");
}

#[test]
fn test_store_error_database_display() {
    let err = StoreError::DatabaseError("disk I/O error".to_string());
    assert_eq!(err.to_string(), "Bookmark store error: disk I/O error");
}

#[test]
fn test_store_error_implements_error_trait() {
    let err: Box<dyn std::error::Error> = Box::new(StoreError::NotFound(1));
    assert!(err.source().is_none());
}

// === DedupError Tests ===

#[test]
fn test_dedup_error_store_unavailable_display() {
    let err = DedupError::StoreUnavailable("connection closed".to_string());
    assert_eq!(
        err.to_string(),
        "Record store unavailable: connection closed"
    );
}

#[test]
fn test_dedup_error_from_store_error() {
    let err: DedupError = StoreError::DatabaseError("locked".to_string()).into();
    assert_eq!(
        err.to_string(),
        "Record store unavailable: Bookmark store error: locked"
    );
}

// === MergeError Tests ===

#[test]
fn test_merge_error_display_variants() {
    assert_eq!(
        MergeError::GroupNotFound.to_string(),
        "Merge group has no remaining records"
    );
    assert_eq!(
        MergeError::DatabaseError("constraint failed".to_string()).to_string(),
        "Merge database error: constraint failed"
    );
}

#[test]
fn test_merge_error_implements_error_trait() {
    let err: Box<dyn std::error::Error> = Box::new(MergeError::GroupNotFound);
    assert!(err.source().is_none());
}

// === ConfigError Tests ===

#[test]
fn test_config_error_display_variants() {
    assert_eq!(
        ConfigError::SerializationError("bad json".to_string()).to_string(),
        "Config serialization error: bad json"
    );
    assert_eq!(
        ConfigError::InvalidValue("threshold out of range".to_string()).to_string(),
        "Invalid config value: threshold out of range"
    );
}
