use std::fmt;

// === StoreError ===

/// Errors raised by the bookmark record store.
#[derive(Debug)]
pub enum StoreError {
    /// Bookmark with the given id was not found.
    NotFound(i64),
    /// Database operation failed.
    DatabaseError(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(id) => write!(f, "Bookmark not found: {}", id),
            StoreError::DatabaseError(msg) => write!(f, "Bookmark store error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

// === DedupError ===

/// Errors that abort a deduplication pass.
///
/// Per-record conditions (malformed URLs, empty titles) are recovered
/// locally and never surface here; only a store-level failure stops a pass.
#[derive(Debug)]
pub enum DedupError {
    /// The record store failed to respond; the pass aborts.
    StoreUnavailable(String),
}

impl fmt::Display for DedupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DedupError::StoreUnavailable(msg) => {
                write!(f, "Record store unavailable: {}", msg)
            }
        }
    }
}

impl std::error::Error for DedupError {}

impl From<StoreError> for DedupError {
    fn from(err: StoreError) -> Self {
        DedupError::StoreUnavailable(err.to_string())
    }
}

// === MergeError ===

/// Errors raised by the merge resolver.
#[derive(Debug)]
pub enum MergeError {
    /// The group resolved to zero fetched records; no mutation was made.
    GroupNotFound,
    /// Database operation failed; the merge transaction rolled back.
    DatabaseError(String),
}

impl fmt::Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeError::GroupNotFound => write!(f, "Merge group has no remaining records"),
            MergeError::DatabaseError(msg) => write!(f, "Merge database error: {}", msg),
        }
    }
}

impl std::error::Error for MergeError {}

// === ConfigError ===

/// Errors related to loading or serializing dedup configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to serialize or deserialize the configuration.
    SerializationError(String),
    /// A configured value is outside its valid range.
    InvalidValue(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::SerializationError(msg) => {
                write!(f, "Config serialization error: {}", msg)
            }
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
