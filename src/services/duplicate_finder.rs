//! Duplicate discovery for Linkvault.
//!
//! Two independent, idempotent passes over the active records:
//!
//! - the **exact pass** groups records sharing a `url_key` — cheap and
//!   always correct, run first;
//! - the **approximate pass** partitions records by domain and scores pairs
//!   within each partition, guarded by cheap pre-filters, joining matches
//!   into groups through a disjoint-set keyed by record id.
//!
//! Both passes read the store exactly once per invocation and perform no
//! other I/O.

use std::collections::{BTreeSet, HashMap, HashSet};

use url::Url;

use crate::managers::bookmark_store::BookmarkStoreTrait;
use crate::services::similarity::{
    jaccard, normalize_title, prefix_equal_ratio, word_set, SimilarityScorer,
};
use crate::types::bookmark::BookmarkRecord;
use crate::types::dedup::{DedupConfig, DuplicateGroup, FilterCounts, SimilarReport};
use crate::types::errors::DedupError;

/// URL-similarity floor relative to the threshold below which a pair is
/// dropped before title scoring.
const URL_FLOOR_FACTOR: f64 = 0.6;
/// Title word-Jaccard floor for the pre-filter.
const PAIR_WORD_OVERLAP_FLOOR: f64 = 0.3;
/// Prefix characters-equal ratio treated as a close URL prefix match.
const CLOSE_PREFIX_RATIO: f64 = 0.8;

/// Disjoint-set (union-find) over record ids, with path compression and
/// union by rank.
struct DisjointSet {
    parent: HashMap<i64, i64>,
    rank: HashMap<i64, u32>,
}

impl DisjointSet {
    fn new() -> Self {
        Self {
            parent: HashMap::new(),
            rank: HashMap::new(),
        }
    }

    fn find(&mut self, id: i64) -> i64 {
        let mut root = id;
        while let Some(&p) = self.parent.get(&root) {
            if p == root {
                break;
            }
            root = p;
        }
        // Path compression
        let mut current = id;
        while let Some(&p) = self.parent.get(&current) {
            if p == current {
                break;
            }
            self.parent.insert(current, root);
            current = p;
        }
        self.parent.entry(id).or_insert(id);
        root
    }

    fn union(&mut self, a: i64, b: i64) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        let rank_a = *self.rank.get(&ra).unwrap_or(&0);
        let rank_b = *self.rank.get(&rb).unwrap_or(&0);
        if rank_a < rank_b {
            self.parent.insert(ra, rb);
        } else if rank_a > rank_b {
            self.parent.insert(rb, ra);
        } else {
            self.parent.insert(rb, ra);
            self.rank.insert(ra, rank_a + 1);
        }
    }
}

/// Per-record comparison data computed once per partition.
struct Candidate {
    id: i64,
    canonical: String,
    path: String,
    title_words: BTreeSet<String>,
}

/// Discovers duplicate groups among active bookmarks.
pub struct DuplicateFinder<'a, S: BookmarkStoreTrait> {
    store: &'a S,
    config: DedupConfig,
    scorer: SimilarityScorer,
}

impl<'a, S: BookmarkStoreTrait> DuplicateFinder<'a, S> {
    /// Creates a finder for one dedup run. The similarity cache lives and
    /// dies with this finder.
    pub fn new(store: &'a S, config: DedupConfig) -> Self {
        let scorer = SimilarityScorer::new(&config);
        Self {
            store,
            config,
            scorer,
        }
    }

    /// Groups active records sharing a `url_key`.
    ///
    /// Any key held by two or more active records forms a group with
    /// confidence 1.0. Groups appear in the order their keys are first seen
    /// in store order, so repeated runs over unchanged data are identical.
    pub fn find_exact_duplicates(&mut self) -> Result<Vec<DuplicateGroup>, DedupError> {
        let records = self.store.list_active()?;

        let mut order: Vec<String> = Vec::new();
        let mut by_key: HashMap<String, Vec<i64>> = HashMap::new();
        for record in &records {
            let members = by_key.entry(record.url_key.clone()).or_insert_with(|| {
                order.push(record.url_key.clone());
                Vec::new()
            });
            members.push(record.id);
        }

        let groups: Vec<DuplicateGroup> = order
            .into_iter()
            .filter_map(|key| {
                let ids = by_key.remove(&key)?;
                if ids.len() >= 2 {
                    Some(DuplicateGroup {
                        ids,
                        confidence: 1.0,
                    })
                } else {
                    None
                }
            })
            .collect();

        tracing::debug!(groups = groups.len(), "exact pass complete");
        Ok(groups)
    }

    /// Scores record pairs within each domain partition and groups pairs
    /// whose combined similarity reaches the configured threshold.
    ///
    /// Domains above the ceiling are skipped and reported; partitions are
    /// truncated to `batch_size` records. Every discarded pair is counted
    /// against the filter that dropped it.
    pub fn find_similar_duplicates(&mut self) -> Result<SimilarReport, DedupError> {
        let records = self.store.list_active()?;
        let partitions = partition_by_domain(records);

        let mut sets = DisjointSet::new();
        let mut matched_order: Vec<i64> = Vec::new();
        let mut matched_seen: HashSet<i64> = HashSet::new();
        let mut matched_pairs: Vec<(i64, i64, f64)> = Vec::new();
        let mut seen_pairs: HashSet<(i64, i64)> = HashSet::new();

        let mut skipped_domains: Vec<(String, usize)> = Vec::new();
        let mut pairs_compared = 0usize;
        let mut filtered = FilterCounts::default();

        for (domain, members) in partitions {
            if members.len() < 2 {
                continue;
            }
            if members.len() > self.config.domain_ceiling {
                tracing::debug!(
                    domain = %domain,
                    records = members.len(),
                    ceiling = self.config.domain_ceiling,
                    "domain exceeds ceiling, skipping"
                );
                skipped_domains.push((domain, members.len()));
                continue;
            }

            let batch: Vec<&BookmarkRecord> =
                members.iter().take(self.config.batch_size).collect();
            let candidates: Vec<Candidate> =
                batch.iter().map(|r| self.candidate(r)).collect();

            for i in 0..candidates.len() {
                for j in (i + 1)..candidates.len() {
                    let (a, b) = (&candidates[i], &candidates[j]);
                    let pair = ordered_pair(a.id, b.id);
                    if !seen_pairs.insert(pair) {
                        continue;
                    }

                    if !self.survives_filters(a, b, &mut filtered) {
                        continue;
                    }

                    let url_sim = self.scorer.url_similarity(&batch[i].url, &batch[j].url);
                    if url_sim < self.config.similarity_threshold * URL_FLOOR_FACTOR {
                        filtered.url_floor += 1;
                        continue;
                    }

                    pairs_compared += 1;
                    let combined = self
                        .scorer
                        .combined_similarity(batch[i], batch[j]);
                    if combined >= self.config.similarity_threshold {
                        sets.union(a.id, b.id);
                        matched_pairs.push((a.id, b.id, combined));
                        for id in [a.id, b.id] {
                            if matched_seen.insert(id) {
                                matched_order.push(id);
                            }
                        }
                    } else {
                        filtered.below_threshold += 1;
                    }
                }
            }
        }

        let groups = collect_groups(&mut sets, &matched_order, &matched_pairs);

        tracing::debug!(
            groups = groups.len(),
            pairs_compared,
            pairs_filtered = filtered.total(),
            skipped_domains = skipped_domains.len(),
            "approximate pass complete"
        );

        Ok(SimilarReport {
            groups,
            skipped_domains,
            pairs_compared,
            filtered,
        })
    }

    /// Precomputes comparison data for one record.
    fn candidate(&mut self, record: &BookmarkRecord) -> Candidate {
        let canonical = self.scorer.canonical(&record.url);
        let path = Url::parse(&canonical)
            .map(|u| u.path().to_string())
            .unwrap_or_default();
        let title_words = word_set(&normalize_title(&record.title));
        Candidate {
            id: record.id,
            canonical,
            path,
            title_words,
        }
    }

    /// Cheap pre-filters, applied before the expensive scorer. Returns
    /// `false` (and counts the reason) when the pair should be skipped.
    fn survives_filters(&self, a: &Candidate, b: &Candidate, filtered: &mut FilterCounts) -> bool {
        // Pairs whose normalized URLs differ in length by more than half
        // the longer one cannot reach the threshold.
        let (la, lb) = (a.canonical.len(), b.canonical.len());
        let longer = la.max(lb);
        if longer > 0 && (la.abs_diff(lb) as f64) / (longer as f64) > 0.5 {
            filtered.length_ratio += 1;
            return false;
        }

        let shared_words = a.title_words.intersection(&b.title_words).count();

        // Unrelated paths need title support to stay in play.
        if !paths_share_prefix(&a.path, &b.path) && shared_words < 2 {
            filtered.path_prefix += 1;
            return false;
        }

        // Weak title overlap is only forgiven when the URLs already agree
        // closely at the front.
        let overlap = jaccard(&a.title_words, &b.title_words);
        if overlap < PAIR_WORD_OVERLAP_FLOOR {
            let prefix_ratio = prefix_equal_ratio(
                &a.canonical,
                &b.canonical,
                self.config.prefix_check_len,
            );
            if prefix_ratio < CLOSE_PREFIX_RATIO {
                filtered.word_overlap += 1;
                return false;
            }
        }

        true
    }
}

/// Partitions records by domain, preserving first-seen domain order.
///
/// Store order is `(domain, created_at, id)`, so partitions and their
/// members are deterministic for identical input data.
fn partition_by_domain(records: Vec<BookmarkRecord>) -> Vec<(String, Vec<BookmarkRecord>)> {
    let mut order: Vec<String> = Vec::new();
    let mut by_domain: HashMap<String, Vec<BookmarkRecord>> = HashMap::new();
    for record in records {
        let members = by_domain.entry(record.domain.clone()).or_insert_with(|| {
            order.push(record.domain.clone());
            Vec::new()
        });
        members.push(record);
    }
    order
        .into_iter()
        .filter_map(|domain| by_domain.remove(&domain).map(|m| (domain, m)))
        .collect()
}

fn ordered_pair(a: i64, b: i64) -> (i64, i64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// True when the paths share a non-empty common prefix beyond the leading
/// slash.
fn paths_share_prefix(a: &str, b: &str) -> bool {
    let a = a.trim_start_matches('/');
    let b = b.trim_start_matches('/');
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.chars().next() == b.chars().next()
        && a.chars()
            .zip(b.chars())
            .take_while(|(x, y)| x == y)
            .count()
            > 0
}

/// Resolves the disjoint-set into groups, ordered by first-matched member,
/// with each group's confidence set to its best pair score.
fn collect_groups(
    sets: &mut DisjointSet,
    matched_order: &[i64],
    matched_pairs: &[(i64, i64, f64)],
) -> Vec<DuplicateGroup> {
    let mut confidence: HashMap<i64, f64> = HashMap::new();
    for &(a, _, score) in matched_pairs {
        let root = sets.find(a);
        let entry = confidence.entry(root).or_insert(0.0);
        if score > *entry {
            *entry = score;
        }
    }

    let mut group_index: HashMap<i64, usize> = HashMap::new();
    let mut groups: Vec<DuplicateGroup> = Vec::new();
    for &id in matched_order {
        let root = sets.find(id);
        match group_index.get(&root) {
            Some(&idx) => groups[idx].ids.push(id),
            None => {
                group_index.insert(root, groups.len());
                groups.push(DuplicateGroup {
                    ids: vec![id],
                    confidence: confidence.get(&root).copied().unwrap_or(0.0),
                });
            }
        }
    }
    groups
}
