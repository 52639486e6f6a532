// Linkvault deduplication services
// Services implement the core computation: URL canonicalization, similarity
// scoring, duplicate discovery, merge resolution, and run orchestration.

pub mod dedup_coordinator;
pub mod duplicate_finder;
pub mod merge_resolver;
pub mod similarity;
pub mod url_normalizer;
