use serde::{Deserialize, Serialize};

use crate::types::errors::ConfigError;

/// Query parameters stripped during URL canonicalization.
///
/// Analytics/campaign/referral keys carried by shared links. This is the
/// default for [`DedupConfig::tracking_params`]; callers extend the list
/// through configuration rather than by editing the normalizer.
pub const DEFAULT_TRACKING_PARAMS: &[&str] = &[
    // UTM campaign family
    "utm_source", "utm_medium", "utm_campaign", "utm_content", "utm_term",
    // Facebook
    "fb_source", "fb_ref", "fbclid",
    // Google Ads / Analytics
    "gclid", "gclsrc", "_ga", "_gac", "_gid",
    // Generic referral
    "ref", "source", "campaign",
    // Mailchimp
    "mc_cid", "mc_eid",
    // HubSpot
    "hsctatracking", "hsa_acc", "hsa_cam", "hsa_grp", "hsa_ad",
    // Misc share/click identifiers
    "igshid", "feature", "ncid", "cmpid", "sr_share",
];

/// Tuning parameters for a deduplication pass.
///
/// Always passed explicitly into pass constructors — never read from a
/// hidden global — so runs stay independently testable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Combined-similarity floor for the approximate pass, in (0, 1].
    pub similarity_threshold: f64,
    /// Cap on records compared within one domain partition.
    pub batch_size: usize,
    /// Domains with more active records than this are skipped by the
    /// approximate pass. An accepted recall limitation: very large domains
    /// are too noisy for quadratic comparison in a single pass.
    pub domain_ceiling: usize,
    /// Query keys removed during canonicalization.
    pub tracking_params: Vec<String>,
    /// Path/title length at which scoring switches from edit distance to
    /// the cheaper bigram measure.
    pub bigram_cutover: usize,
    /// Number of leading characters inspected by the URL prefix
    /// short-circuit check.
    pub prefix_check_len: usize,
}

impl DedupConfig {
    /// Parses a configuration from JSON and validates it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: DedupConfig = serde_json::from_str(json)
            .map_err(|e| ConfigError::SerializationError(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| {
            ConfigError::SerializationError(format!("Failed to serialize config: {}", e))
        })
    }

    /// Checks that all values are inside their valid ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.similarity_threshold > 0.0 && self.similarity_threshold <= 1.0) {
            return Err(ConfigError::InvalidValue(format!(
                "similarity_threshold must be in (0, 1], got {}",
                self.similarity_threshold
            )));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidValue(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.domain_ceiling == 0 {
            return Err(ConfigError::InvalidValue(
                "domain_ceiling must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.9,
            batch_size: 1000,
            domain_ceiling: 500,
            tracking_params: DEFAULT_TRACKING_PARAMS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            bigram_cutover: 100,
            prefix_check_len: 50,
        }
    }
}

/// A set of bookmark records believed to denote the same resource.
///
/// Ephemeral: exists only during a dedup pass and collapses into a merge
/// operation. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Member record ids, in partition discovery order.
    pub ids: Vec<i64>,
    /// Highest combined similarity observed among member pairs.
    /// 1.0 for exact-pass groups.
    pub confidence: f64,
}

/// Why a candidate pair was discarded before full scoring.
///
/// Every pair the approximate pass drops is attributed to exactly one of
/// these counters, so a run can account for all its work.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCounts {
    /// Normalized-URL lengths differed by more than half the longer one.
    pub length_ratio: usize,
    /// Paths shared no common prefix and titles shared fewer than 2 words.
    pub path_prefix: usize,
    /// Title word overlap below floor without a close URL prefix match.
    pub word_overlap: usize,
    /// URL similarity fell under the relaxed early-exit floor.
    pub url_floor: usize,
    /// Fully scored but under the similarity threshold.
    pub below_threshold: usize,
}

impl FilterCounts {
    /// Total pairs discarded across all filters.
    pub fn total(&self) -> usize {
        self.length_ratio
            + self.path_prefix
            + self.word_overlap
            + self.url_floor
            + self.below_threshold
    }
}

/// Outcome of one approximate-pass invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarReport {
    /// Groups in domain-partition discovery order.
    pub groups: Vec<DuplicateGroup>,
    /// Domains skipped for exceeding the ceiling, with their record counts.
    pub skipped_domains: Vec<(String, usize)>,
    /// Unordered pairs that reached scoring (each evaluated at most once).
    pub pairs_compared: usize,
    /// Attribution of every discarded pair.
    pub filtered: FilterCounts,
}

/// Counters returned by a full automatic deduplication run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DedupSummary {
    pub exact_groups: usize,
    pub similar_groups: usize,
    pub bookmarks_merged: usize,
    pub bookmarks_archived: usize,
    /// Groups whose merge failed; recorded, not fatal to the run.
    pub merge_failures: usize,
}
