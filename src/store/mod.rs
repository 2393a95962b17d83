//! Extracted records keyed by site, then language.

use dashmap::DashMap;

use crate::config::OrderedMap;
use crate::extractor::ReviewRecord;

/// Language code to records, in extraction order.
pub type SiteComments = OrderedMap<Vec<ReviewRecord>>;

/// Site key to its language buckets.
pub type AllComments = OrderedMap<SiteComments>;

/// Append-only record store behind a harvester.
///
/// Buckets appear on the first non-empty append for a (site, language) pair,
/// so the order of appends decides the order of languages within a site.
/// Reads and appends take `&self` and lock only the site's shard.
#[derive(Debug, Default)]
pub struct ResultStore {
    sites: DashMap<String, SiteComments>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, site: &str, language: &str, record: ReviewRecord) {
        self.append(site, language, vec![record]);
    }

    /// Append a batch to the end of the bucket. An empty batch creates nothing.
    pub fn append(&self, site: &str, language: &str, records: Vec<ReviewRecord>) {
        if records.is_empty() {
            return;
        }
        let mut buckets = self.sites.entry(site.to_string()).or_default();
        match buckets.get_mut(language) {
            Some(bucket) => bucket.extend(records),
            None => {
                buckets.insert(language, records);
            }
        }
    }

    /// Copy of one site's buckets.
    pub fn get(&self, site: &str) -> Option<SiteComments> {
        self.sites.get(site).map(|entry| entry.value().clone())
    }

    /// Copy of the stored sites named in `order`, in that order. Sites
    /// without records are left out.
    pub fn snapshot<'a, I>(&self, order: I) -> AllComments
    where
        I: IntoIterator<Item = &'a str>,
    {
        order
            .into_iter()
            .filter_map(|site| Some((site, self.get(site)?)))
            .collect()
    }

    /// With a site: whether that site has no records. Without: whether the
    /// whole store has none.
    pub fn is_empty(&self, site: Option<&str>) -> bool {
        match site {
            Some(site) => self
                .sites
                .get(site)
                .is_none_or(|buckets| buckets.values().all(Vec::is_empty)),
            None => self
                .sites
                .iter()
                .all(|entry| entry.value().values().all(Vec::is_empty)),
        }
    }

    pub fn record_count(&self, site: &str) -> usize {
        self.sites
            .get(site)
            .map(|buckets| buckets.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    /// Drop all buckets of one site.
    pub fn reset(&self, site: &str) {
        self.sites.remove(site);
    }

    pub fn clear(&self) {
        self.sites.clear();
    }
}
