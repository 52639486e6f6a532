//! Similarity scoring for bookmark deduplication.
//!
//! Scores URL pairs and title pairs on a bounded [0, 1] scale. Both measures
//! are symmetric, and results are memoized by unordered pair for the lifetime
//! of the scorer — one scorer instance per dedup run, so a configuration
//! change always starts from an empty cache.

use std::collections::{BTreeSet, HashMap};

use strsim::{normalized_levenshtein, sorensen_dice};
use url::Url;

use crate::services::url_normalizer::UrlNormalizer;
use crate::types::bookmark::BookmarkRecord;
use crate::types::dedup::DedupConfig;

/// Weight of URL similarity in the combined bookmark score.
const URL_WEIGHT: f64 = 0.8;
/// Weight of title similarity in the combined bookmark score.
const TITLE_WEIGHT: f64 = 0.2;
/// Weight of path similarity within the URL score.
const PATH_WEIGHT: f64 = 0.8;
/// Weight of query-key-set similarity within the URL score.
const QUERY_WEIGHT: f64 = 0.2;
/// Word-overlap ratio under which titles skip character-level scoring.
const TITLE_WORD_JACCARD_FLOOR: f64 = 0.2;
/// Prefix characters-equal ratio under which long URLs short-circuit.
const PREFIX_DIVERGENCE_FLOOR: f64 = 0.5;

/// Memoizing similarity scorer, scoped to a single dedup run.
pub struct SimilarityScorer {
    normalizer: UrlNormalizer,
    bigram_cutover: usize,
    prefix_check_len: usize,
    canonical_cache: HashMap<String, String>,
    url_cache: HashMap<(String, String), f64>,
    title_cache: HashMap<(String, String), f64>,
}

impl SimilarityScorer {
    /// Builds a scorer (and its normalizer) from the run's configuration.
    pub fn new(config: &DedupConfig) -> Self {
        Self {
            normalizer: UrlNormalizer::from_config(config),
            bigram_cutover: config.bigram_cutover,
            prefix_check_len: config.prefix_check_len,
            canonical_cache: HashMap::new(),
            url_cache: HashMap::new(),
            title_cache: HashMap::new(),
        }
    }

    /// Returns the canonical form of `url`, memoized for this run.
    pub fn canonical(&mut self, url: &str) -> String {
        if let Some(c) = self.canonical_cache.get(url) {
            return c.clone();
        }
        let c = self.normalizer.normalize(url);
        self.canonical_cache.insert(url.to_string(), c.clone());
        c
    }

    /// Similarity of two URLs in [0, 1]. Symmetric.
    ///
    /// Identical canonical forms score 1.0. Different hosts score 0.0 — an
    /// explicit policy that bounds comparison cost at the price of never
    /// matching resources mirrored across hosts. Otherwise the score is a
    /// weighted blend of path similarity (0.8) and query-key-set Jaccard
    /// similarity (0.2), with a prefix short-circuit for long, clearly
    /// divergent URLs.
    pub fn url_similarity(&mut self, a: &str, b: &str) -> f64 {
        let ca = self.canonical(a);
        let cb = self.canonical(b);

        if ca == cb {
            return 1.0;
        }

        let key = pair_key(&ca, &cb);
        if let Some(score) = self.url_cache.get(&key) {
            return *score;
        }

        let score = self.url_similarity_uncached(&ca, &cb);
        self.url_cache.insert(key, score);
        score
    }

    fn url_similarity_uncached(&self, ca: &str, cb: &str) -> f64 {
        let (pa, pb) = match (Url::parse(ca), Url::parse(cb)) {
            (Ok(pa), Ok(pb)) => (pa, pb),
            // Fallback canonical forms are plain strings; compare directly.
            _ => return self.string_similarity(ca, cb),
        };

        if pa.host_str() != pb.host_str() {
            return 0.0;
        }

        // Long URLs that diverge within the first characters are not worth
        // a full edit-distance computation.
        if ca.len().min(cb.len()) >= self.prefix_check_len {
            let ratio = prefix_equal_ratio(ca, cb, self.prefix_check_len);
            if ratio < PREFIX_DIVERGENCE_FLOOR {
                return ratio * 0.4;
            }
        }

        let path_sim = self.string_similarity(pa.path(), pb.path());

        let keys_a: BTreeSet<String> = pa.query_pairs().map(|(k, _)| k.into_owned()).collect();
        let keys_b: BTreeSet<String> = pb.query_pairs().map(|(k, _)| k.into_owned()).collect();
        let query_sim = if keys_a.is_empty() && keys_b.is_empty() {
            1.0
        } else {
            jaccard(&keys_a, &keys_b)
        };

        (path_sim * PATH_WEIGHT + query_sim * QUERY_WEIGHT).clamp(0.0, 1.0)
    }

    /// Similarity of two titles in [0, 1]. Symmetric.
    ///
    /// Empty input scores 0.0. Titles are compared punctuation-stripped,
    /// lower-cased, and whitespace-collapsed; a cheap word-overlap pre-check
    /// skips the character-level measure for clearly unrelated titles.
    pub fn title_similarity(&mut self, a: &str, b: &str) -> f64 {
        if a.trim().is_empty() || b.trim().is_empty() {
            return 0.0;
        }

        let na = normalize_title(a);
        let nb = normalize_title(b);
        if na.is_empty() || nb.is_empty() {
            return 0.0;
        }
        if na == nb {
            return 1.0;
        }

        let key = pair_key(&na, &nb);
        if let Some(score) = self.title_cache.get(&key) {
            return *score;
        }

        let words_a = word_set(&na);
        let words_b = word_set(&nb);
        let overlap = jaccard(&words_a, &words_b);
        let score = if overlap < TITLE_WORD_JACCARD_FLOOR {
            overlap * 0.5
        } else {
            self.string_similarity(&na, &nb)
        };

        self.title_cache.insert(key, score);
        score
    }

    /// Combined bookmark similarity: `0.8 * url + 0.2 * title`.
    pub fn combined_similarity(&mut self, a: &BookmarkRecord, b: &BookmarkRecord) -> f64 {
        let url_sim = self.url_similarity(&a.url, &b.url);
        let title_sim = self.title_similarity(&a.title, &b.title);
        url_sim * URL_WEIGHT + title_sim * TITLE_WEIGHT
    }

    /// Bounded string similarity with a length cutover: edit distance for
    /// short strings, the cheaper bigram measure beyond the cutover.
    fn string_similarity(&self, a: &str, b: &str) -> f64 {
        if a.is_empty() && b.is_empty() {
            return 1.0;
        }
        if a.len().max(b.len()) > self.bigram_cutover {
            sorensen_dice(a, b)
        } else {
            normalized_levenshtein(a, b)
        }
    }
}

/// Orders two strings into an unordered-pair cache key.
fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Ratio of equal characters over the first `n` positions of both strings.
pub fn prefix_equal_ratio(a: &str, b: &str, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let equal = a
        .chars()
        .zip(b.chars())
        .take(n)
        .filter(|(x, y)| x == y)
        .count();
    equal as f64 / n as f64
}

/// Normalizes a title for comparison: lowercase, punctuation replaced with
/// spaces, whitespace collapsed.
pub fn normalize_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for ch in title.chars() {
        if ch.is_alphanumeric() {
            for lower in ch.to_lowercase() {
                out.push(lower);
            }
        } else {
            out.push(' ');
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits a normalized title into its word set.
pub fn word_set(normalized: &str) -> BTreeSet<String> {
    normalized.split_whitespace().map(|w| w.to_string()).collect()
}

/// Jaccard similarity of two sets: |intersection| / |union|.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    if union == 0.0 {
        0.0
    } else {
        intersection / union
    }
}
