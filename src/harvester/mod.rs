//! Fetch orchestration and the top-level `get_comments` entry point.

use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{Instrument, debug, error, info, info_span, instrument, warn};

use crate::config::{
    OrderedMap, RefreshMode, Settings, SiteOverride, builtin_sites, merge,
};
use crate::error::{ScrapeError, TaskError};
use crate::extractor::{FieldParser, ParserRegistry, ReviewRecord, SiteRules, extract_page};
use crate::fetcher::{HeaderSet, HttpPageSource, PageSource};
use crate::store::{AllComments, ResultStore, SiteComments};

/// Records returned by a harvest request plus the pages that failed.
#[derive(Debug)]
pub struct Harvest<T> {
    pub comments: T,
    pub errors: Vec<TaskError>,
}

impl<T> Harvest<T> {
    fn cached(comments: T) -> Self {
        Self {
            comments,
            errors: Vec::new(),
        }
    }

    /// Every page fetched without error.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Result of [`Harvester::get_comments`]: one site's buckets or all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comments {
    Site(SiteComments),
    All(AllComments),
}

/// One (site, language) unit of work: its pages are fetched in order.
struct FetchTask {
    rules: Arc<SiteRules>,
    language: String,
    pages: Vec<String>,
}

/// Walks each site's language URIs, extracts review records and keeps them
/// for later calls.
pub struct Harvester {
    sites: OrderedMap<Arc<SiteRules>>,
    languages: OrderedMap<OrderedMap<Vec<String>>>,
    parsers: Arc<ParserRegistry>,
    source: Arc<dyn PageSource>,
    headers: HeaderSet,
    store: ResultStore,
    concurrency: usize,
    refresh_mode: RefreshMode,
}

impl Harvester {
    /// Merge `overrides` into the built-in sites and compile every site's
    /// selectors. A selector that doesn't parse is a configuration error.
    pub fn new(
        source: Arc<dyn PageSource>,
        overrides: OrderedMap<SiteOverride>,
        settings: &Settings,
    ) -> Result<Self, ScrapeError> {
        let merged = merge(builtin_sites(), overrides);

        let mut sites = OrderedMap::new();
        let mut languages = OrderedMap::new();
        for (key, config) in merged.iter() {
            sites.insert(key, Arc::new(SiteRules::compile(key, config)?));
            let pages: OrderedMap<Vec<String>> = config
                .language_uris
                .iter()
                .map(|(language, uris)| (language, uris.pages()))
                .collect();
            languages.insert(key, pages);
        }

        Ok(Self {
            sites,
            languages,
            parsers: Arc::new(ParserRegistry::builtin()),
            source,
            headers: HeaderSet::default(),
            store: ResultStore::new(),
            concurrency: settings.concurrency.max(1),
            refresh_mode: settings.refresh_mode,
        })
    }

    /// Harvester over HTTP using `settings` for timeouts and the overrides file.
    pub fn from_settings(settings: &Settings) -> Result<Self, ScrapeError> {
        let source = HttpPageSource::new(settings.timeout)?;
        let overrides = settings.site_overrides()?;
        Self::new(Arc::new(source), overrides, settings)
    }

    /// Register a parser that takes precedence over the built-in and
    /// configured ones for `site`.
    pub fn register_parser(&mut self, site: impl Into<String>, parser: Arc<dyn FieldParser>) {
        Arc::make_mut(&mut self.parsers).register(site, parser);
    }

    /// Set one request header. Ignored when the key or value is empty.
    pub fn set_header(&mut self, key: &str, value: &str) -> bool {
        self.headers.set_header(key, value)
    }

    /// Replace all request headers. Ignored when `headers` is empty.
    pub fn set_headers<K, V, I>(&mut self, headers: I) -> bool
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.headers.set_headers(headers)
    }

    pub fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Forget stored records for one site, or for every site, so the next
    /// request fetches again.
    pub fn reset(&self, site: Option<&str>) {
        match site {
            Some(site) => self.store.reset(site),
            None => self.store.clear(),
        }
    }

    /// With a site key: that site's records. Without: every site's.
    ///
    /// Cached records are returned as they are unless the cache is empty or
    /// `force_refresh` is set.
    pub async fn get_comments(
        &self,
        site: Option<&str>,
        force_refresh: bool,
    ) -> Result<Harvest<Comments>, ScrapeError> {
        match site.filter(|s| !s.is_empty()) {
            Some(site) => {
                let harvest = self.site_comments(site, force_refresh).await?;
                Ok(Harvest {
                    comments: Comments::Site(harvest.comments),
                    errors: harvest.errors,
                })
            }
            None => {
                let harvest = self.all_comments(force_refresh).await;
                Ok(Harvest {
                    comments: Comments::All(harvest.comments),
                    errors: harvest.errors,
                })
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn site_comments(
        &self,
        site: &str,
        force_refresh: bool,
    ) -> Result<Harvest<SiteComments>, ScrapeError> {
        if !self.sites.contains_key(site) {
            return Err(ScrapeError::UnknownSite {
                site: site.to_string(),
            });
        }

        if !force_refresh && !self.store.is_empty(Some(site)) {
            debug!("returning cached records");
            return Ok(Harvest::cached(self.store.get(site).unwrap_or_default()));
        }

        if self.languages.get(site).is_none_or(OrderedMap::is_empty) {
            return Err(ScrapeError::NoLanguageUris {
                site: site.to_string(),
            });
        }

        let errors = self.refetch(&[site], force_refresh).await;
        Ok(Harvest {
            comments: self.store.get(site).unwrap_or_default(),
            errors,
        })
    }

    #[instrument(skip(self))]
    pub async fn all_comments(&self, force_refresh: bool) -> Harvest<AllComments> {
        if !force_refresh && !self.store.is_empty(None) {
            debug!("returning cached records");
            return Harvest::cached(self.store.snapshot(self.sites.keys()));
        }

        let sites: Vec<&str> = self.sites.keys().collect();
        let errors = self.refetch(&sites, force_refresh).await;
        Harvest {
            comments: self.store.snapshot(self.sites.keys()),
            errors,
        }
    }

    async fn refetch(&self, sites: &[&str], force_refresh: bool) -> Vec<TaskError> {
        if force_refresh && self.refresh_mode == RefreshMode::Replace {
            for site in sites {
                self.store.reset(site);
            }
        }
        self.fetch_sites(sites).await
    }

    /// Fetch the given sites into the store, one task per (site, language).
    ///
    /// At most `concurrency` tasks run at once. A task keeps the records of
    /// the pages it fetched before a failure and skips its remaining pages.
    /// Results are stored once every task is done, in declared site and
    /// language order, whatever order the tasks finished in.
    pub async fn fetch_sites(&self, sites: &[&str]) -> Vec<TaskError> {
        let tasks = self.plan(sites);
        info!(tasks = tasks.len(), sites = sites.len(), "starting fetch");

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::with_capacity(tasks.len());

        for task in tasks {
            let semaphore = semaphore.clone();
            let source = self.source.clone();
            let parsers = self.parsers.clone();
            let headers = self.headers.clone();
            let span = info_span!("fetch_task", site = %task.rules.site, language = %task.language);

            handles.push(tokio::spawn(
                async move {
                    let _permit = semaphore.acquire_owned().await.ok()?;
                    Some(run_task(task, source.as_ref(), &parsers, &headers).await)
                }
                .instrument(span),
            ));
        }

        let mut errors = Vec::new();
        for handle in handles {
            match handle.await {
                Ok(Some(outcome)) => {
                    self.store
                        .append(&outcome.site, &outcome.language, outcome.records);
                    errors.extend(outcome.failure);
                }
                Ok(None) => {}
                Err(e) => error!("fetch task panicked: {}", e),
            }
        }

        if !errors.is_empty() {
            warn!(failed = errors.len(), "fetch finished with errors");
        }
        errors
    }

    fn plan(&self, sites: &[&str]) -> Vec<FetchTask> {
        let mut tasks = Vec::new();
        for site in sites {
            let (Some(rules), Some(languages)) = (self.sites.get(site), self.languages.get(site))
            else {
                continue;
            };
            if languages.is_empty() {
                warn!(site = %site, "site has no language URIs, skipping");
                continue;
            }
            for (language, pages) in languages.iter() {
                tasks.push(FetchTask {
                    rules: rules.clone(),
                    language: language.to_string(),
                    pages: pages.clone(),
                });
            }
        }
        tasks
    }
}

/// What one (site, language) task produced.
struct TaskOutcome {
    site: String,
    language: String,
    records: Vec<ReviewRecord>,
    failure: Option<TaskError>,
}

/// Fetch a task's pages in order, stopping at the first failing page.
async fn run_task(
    task: FetchTask,
    source: &dyn PageSource,
    parsers: &ParserRegistry,
    headers: &HeaderSet,
) -> TaskOutcome {
    let mut records: Vec<ReviewRecord> = Vec::new();
    let mut failure = None;

    for uri in &task.pages {
        match source.fetch(uri, headers).await {
            Ok(body) => {
                let page = extract_page(&body, &task.rules, parsers);
                debug!(uri = %uri, records = page.len(), "extracted page");
                records.extend(page);
            }
            Err(e) => {
                warn!(uri = %uri, retryable = e.should_retry(), "fetch failed: {}", e);
                failure = Some(TaskError {
                    site: task.rules.site.clone(),
                    language: task.language.clone(),
                    uri: uri.clone(),
                    source: e,
                });
                break;
            }
        }
    }

    info!(records = records.len(), "task finished");
    TaskOutcome {
        site: task.rules.site.clone(),
        language: task.language,
        records,
        failure,
    }
}
