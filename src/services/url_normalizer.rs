//! URL canonicalization for Linkvault.
//!
//! Produces the canonical string form used for exact-duplicate detection and
//! as the base of similarity comparison. Canonicalization is pure and
//! deterministic: the same input always yields the same canonical string,
//! and malformed input degrades to a lower-cased, trimmed fallback instead
//! of failing.

use std::collections::HashSet;

use ring::digest;
use url::{form_urlencoded, Url};

use crate::types::dedup::{DedupConfig, DEFAULT_TRACKING_PARAMS};

/// Canonicalizes URLs for equality and similarity comparison.
///
/// The set of tracking query parameters to strip is configuration, supplied
/// at construction; extending it never requires touching the algorithm.
#[derive(Debug, Clone)]
pub struct UrlNormalizer {
    tracking_params: HashSet<String>,
}

impl UrlNormalizer {
    /// Creates a normalizer stripping the given query parameter names.
    pub fn new(tracking_params: &[String]) -> Self {
        Self {
            tracking_params: tracking_params.iter().map(|p| p.to_lowercase()).collect(),
        }
    }

    /// Creates a normalizer from a dedup configuration.
    pub fn from_config(config: &DedupConfig) -> Self {
        Self::new(&config.tracking_params)
    }

    /// Returns the canonical form of `url`.
    ///
    /// Lower-cases and trims, drops the fragment, strips tracking query
    /// parameters, sorts the surviving query pairs, and removes a trailing
    /// slash except on the root path. Never fails: input that cannot be
    /// parsed is returned lower-cased and trimmed.
    pub fn normalize(&self, url: &str) -> String {
        let lowered = url.trim().to_lowercase();
        if lowered.is_empty() {
            return lowered;
        }

        // Bare host-and-path inputs are common in exports; assume https.
        let with_scheme = if lowered.contains("://") {
            lowered.clone()
        } else {
            format!("https://{}", lowered)
        };

        let parsed = match Url::parse(&with_scheme) {
            Ok(p) if p.host_str().is_some() => p,
            _ => {
                tracing::debug!(url, "normalization fell back to raw input");
                return lowered;
            }
        };

        let host = parsed.host_str().unwrap_or_default();
        let port = match parsed.port() {
            Some(p) => format!(":{}", p),
            None => String::new(),
        };

        // Trailing slash is not significant except on the root path.
        let path = if parsed.path() == "/" {
            "/".to_string()
        } else {
            parsed.path().trim_end_matches('/').to_string()
        };

        let query = self.filtered_query(&parsed);

        let assembled = match query {
            Some(q) => format!("{}://{}{}{}?{}", parsed.scheme(), host, port, path, q),
            None => format!("{}://{}{}{}", parsed.scheme(), host, port, path),
        };
        // Percent-escapes are emitted with uppercase hex; the canonical
        // form is fully lower-cased so normalize(normalize(u)) == normalize(u).
        assembled.to_lowercase()
    }

    /// Returns the hex SHA-256 digest of the canonical form.
    ///
    /// This is the `url_key` stored on every bookmark row; exactly one
    /// active record may hold a given key.
    pub fn url_key(&self, url: &str) -> String {
        let canonical = self.normalize(url);
        let hash = digest::digest(&digest::SHA256, canonical.as_bytes());
        hash.as_ref().iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Extracts the lowercase host used for domain partitioning.
    ///
    /// Returns an empty string when the URL has no parseable host. Hosts are
    /// kept verbatim: `www.example.com` and `example.com` partition
    /// separately, which matches the different-host policy of the scorer.
    pub fn domain_of(&self, url: &str) -> String {
        let lowered = url.trim().to_lowercase();
        let with_scheme = if lowered.contains("://") {
            lowered
        } else {
            format!("https://{}", lowered)
        };
        match Url::parse(&with_scheme) {
            Ok(p) => p.host_str().unwrap_or_default().to_string(),
            Err(_) => String::new(),
        }
    }

    /// Drops tracking parameters and rebuilds the query deterministically.
    ///
    /// Surviving pairs are sorted by key (then value) so the output is
    /// stable regardless of the original parameter order. Returns `None`
    /// when nothing survives.
    fn filtered_query(&self, parsed: &Url) -> Option<String> {
        let mut pairs: Vec<(String, String)> = parsed
            .query_pairs()
            .filter(|(k, _)| !self.tracking_params.contains(&k.to_lowercase()))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        if pairs.is_empty() {
            return None;
        }

        pairs.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (k, v) in &pairs {
            serializer.append_pair(k, v);
        }
        Some(serializer.finish())
    }
}

impl Default for UrlNormalizer {
    fn default() -> Self {
        let params: Vec<String> = DEFAULT_TRACKING_PARAMS
            .iter()
            .map(|p| p.to_string())
            .collect();
        Self::new(&params)
    }
}
