use serde::{Deserialize, Serialize};

/// Lifecycle status of a bookmark record.
///
/// Records demoted during a merge become `Archived` — a logical tombstone,
/// never a physical delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookmarkStatus {
    Active,
    Archived,
    Broken,
}

impl BookmarkStatus {
    /// Returns the status as stored in the `status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookmarkStatus::Active => "active",
            BookmarkStatus::Archived => "archived",
            BookmarkStatus::Broken => "broken",
        }
    }

    /// Parses a `status` column value. Unknown values map to `Broken`.
    pub fn parse(s: &str) -> Self {
        match s {
            "active" => BookmarkStatus::Active,
            "archived" => BookmarkStatus::Archived,
            _ => BookmarkStatus::Broken,
        }
    }
}

/// Represents a stored bookmark row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookmarkRecord {
    pub id: i64,
    /// Original URL, exactly as ingested.
    pub url: String,
    /// Hex digest of the canonical URL form. Unique among active records.
    pub url_key: String,
    pub title: String,
    pub description: String,
    /// Lowercase registrable host, used to partition comparison work.
    pub domain: String,
    pub source: String,
    pub created_at: i64,
    pub status: BookmarkStatus,
}

/// Fields supplied by the ingestion boundary when inserting a bookmark.
///
/// `url_key` and `domain` are derived at insert time, not supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBookmark {
    pub url: String,
    pub title: String,
    pub description: String,
    pub source: String,
    pub created_at: i64,
}

/// A tag row with its usage counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub usage_count: i64,
}
