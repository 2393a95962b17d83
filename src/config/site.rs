use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::config::OrderedMap;
use crate::extractor::FieldParser;
use crate::extractor::parsers::{BOOKING, TRIPADVISOR};

/// One page URI, or an ordered list of continuation pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UriSpec {
    Single(String),
    Pages(Vec<String>),
}

impl UriSpec {
    /// Page URIs in fetch order.
    pub fn pages(&self) -> Vec<String> {
        match self {
            Self::Single(uri) => vec![uri.clone()],
            Self::Pages(uris) => uris.clone(),
        }
    }
}

impl From<&str> for UriSpec {
    fn from(uri: &str) -> Self {
        Self::Single(uri.to_string())
    }
}

impl From<Vec<&str>> for UriSpec {
    fn from(uris: Vec<&str>) -> Self {
        Self::Pages(uris.into_iter().map(str::to_string).collect())
    }
}

/// How to find and read reviews on one site.
#[derive(Clone, Default)]
pub struct SiteConfig {
    pub comment_selector: String,
    /// Field name to selector, applied in this order.
    pub field_selectors: OrderedMap<String>,
    pub max_records_per_page: usize,
    pub language_uris: OrderedMap<UriSpec>,
    /// Used when no registered parser exists for the site.
    pub parser: Option<Arc<dyn FieldParser>>,
}

impl fmt::Debug for SiteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiteConfig")
            .field("comment_selector", &self.comment_selector)
            .field("field_selectors", &self.field_selectors)
            .field("max_records_per_page", &self.max_records_per_page)
            .field("language_uris", &self.language_uris)
            .field("parser", &self.parser.as_ref().map(|_| "custom"))
            .finish()
    }
}

/// Caller-supplied changes to a site. Every part is optional.
///
/// Accepts both the camelCase keys and the older `n_comments` /
/// `elemSelectors` / `languageURI` spellings.
#[derive(Clone, Default, Deserialize)]
pub struct SiteOverride {
    #[serde(default, rename = "maxRecordsPerPage", alias = "n_comments")]
    pub max_records_per_page: Option<usize>,
    #[serde(default, rename = "commentSelector")]
    pub comment_selector: Option<String>,
    #[serde(default, rename = "fieldSelectors", alias = "elemSelectors")]
    pub field_selectors: Option<OrderedMap<String>>,
    #[serde(default, rename = "languageURIs", alias = "languageURI")]
    pub language_uris: Option<OrderedMap<UriSpec>>,
    #[serde(skip)]
    pub parser: Option<Arc<dyn FieldParser>>,
}

impl SiteOverride {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_records_per_page(mut self, max: usize) -> Self {
        self.max_records_per_page = Some(max);
        self
    }

    pub fn comment_selector(mut self, selector: impl Into<String>) -> Self {
        self.comment_selector = Some(selector.into());
        self
    }

    pub fn field_selector(mut self, field: impl Into<String>, selector: impl Into<String>) -> Self {
        self.field_selectors
            .get_or_insert_with(OrderedMap::new)
            .insert(field, selector.into());
        self
    }

    pub fn language_uri(mut self, language: impl Into<String>, uris: impl Into<UriSpec>) -> Self {
        self.language_uris
            .get_or_insert_with(OrderedMap::new)
            .insert(language, uris.into());
        self
    }

    pub fn parser(mut self, parser: Arc<dyn FieldParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Apply onto `base`: scalars replace, selector and language maps merge
    /// key by key, a language's URI list replaces the old one as a whole.
    pub fn apply_to(self, base: &mut SiteConfig) {
        if let Some(max) = self.max_records_per_page {
            base.max_records_per_page = max;
        }
        if let Some(selector) = self.comment_selector {
            base.comment_selector = selector;
        }
        if let Some(fields) = self.field_selectors {
            for (field, selector) in fields {
                base.field_selectors.insert(field, selector);
            }
        }
        if let Some(languages) = self.language_uris {
            for (language, uris) in languages {
                base.language_uris.insert(language, uris);
            }
        }
        if let Some(parser) = self.parser {
            base.parser = Some(parser);
        }
    }
}

impl fmt::Debug for SiteOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiteOverride")
            .field("max_records_per_page", &self.max_records_per_page)
            .field("comment_selector", &self.comment_selector)
            .field("field_selectors", &self.field_selectors)
            .field("language_uris", &self.language_uris)
            .field("parser", &self.parser.as_ref().map(|_| "custom"))
            .finish()
    }
}

/// Merge overrides into defaults. Sites only in the defaults are untouched;
/// sites only in the overrides start from an empty config.
pub fn merge(
    mut defaults: OrderedMap<SiteConfig>,
    overrides: OrderedMap<SiteOverride>,
) -> OrderedMap<SiteConfig> {
    for (site, site_override) in overrides {
        match defaults.get_mut(&site) {
            Some(existing) => site_override.apply_to(existing),
            None => {
                let mut fresh = SiteConfig::default();
                site_override.apply_to(&mut fresh);
                defaults.insert(site, fresh);
            }
        }
    }
    defaults
}

/// Booking.com and TripAdvisor, without URIs.
pub fn builtin_sites() -> OrderedMap<SiteConfig> {
    let booking = SiteConfig {
        comment_selector: ".review_item".to_string(),
        field_selectors: [
            ("author", ".review_item_reviewer h4"),
            ("country", ".review_item_reviewer .reviewer_country"),
            ("score", ".review_item_header_score_container"),
            ("header", ".review_item_header_content"),
            ("content", ".review_item_review_content"),
            ("date", ".review_item_date"),
        ]
        .into_iter()
        .map(|(k, v)| (k, v.to_string()))
        .collect(),
        max_records_per_page: 5,
        ..Default::default()
    };

    let tripadvisor = SiteConfig {
        comment_selector: ".review".to_string(),
        field_selectors: [
            ("author", ".member_info .username"),
            ("country", ".member_info .location"),
            ("score", ".rate"),
            ("header", ".quote"),
            ("content", ".partial_entry"),
            ("date", ".ratingDate"),
        ]
        .into_iter()
        .map(|(k, v)| (k, v.to_string()))
        .collect(),
        max_records_per_page: 10,
        ..Default::default()
    };

    [(BOOKING, booking), (TRIPADVISOR, tripadvisor)]
        .into_iter()
        .collect()
}
