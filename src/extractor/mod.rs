pub mod cleaner;
pub mod fingerprint;
pub mod model;
pub mod parsers;

#[cfg(test)]
mod tests;

pub use fingerprint::fingerprint;
pub use model::ReviewRecord;
pub use parsers::{
    BookingParser, FieldParser, GenericParser, ParserRegistry, TripadvisorParser,
};

use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;

use crate::config::SiteConfig;
use crate::error::ScrapeError;
use crate::extractor::cleaner::strip_tags;

/// A site's selectors, parsed once and shared by every page of that site.
#[derive(Clone)]
pub struct SiteRules {
    pub site: String,
    comment_selector: Selector,
    fields: Vec<(String, Selector)>,
    max_records_per_page: usize,
    parser: Option<Arc<dyn FieldParser>>,
}

impl SiteRules {
    pub fn compile(site: &str, config: &SiteConfig) -> Result<Self, ScrapeError> {
        let parse = |css: &str| {
            Selector::parse(css).map_err(|e| ScrapeError::InvalidSelector {
                site: site.to_string(),
                selector: css.to_string(),
                reason: e.to_string(),
            })
        };

        let comment_selector = parse(&config.comment_selector)?;
        let fields = config
            .field_selectors
            .iter()
            .map(|(field, css)| Ok((field.to_string(), parse(css)?)))
            .collect::<Result<Vec<_>, ScrapeError>>()?;

        Ok(Self {
            site: site.to_string(),
            comment_selector,
            fields,
            max_records_per_page: config.max_records_per_page,
            parser: config.parser.clone(),
        })
    }
}

/// Build one record from a matched review block.
///
/// Fields whose selector matches nothing are left out. `id` is the
/// fingerprint of the stored (tag-stripped) content and stays empty when the
/// block has no content or the content parses to nothing.
pub fn extract_record(
    node: ElementRef<'_>,
    rules: &SiteRules,
    registry: &ParserRegistry,
) -> ReviewRecord {
    let mut record = ReviewRecord::new(rules.site.as_str());

    for (field, selector) in &rules.fields {
        let Some(matched) = node.select(selector).next() else {
            continue;
        };

        let raw = registry.resolve_and_parse(&rules.site, rules.parser.as_ref(), field, matched);
        let value = strip_tags(&raw);

        if field == "content" {
            record.id = if value.is_empty() {
                String::new()
            } else {
                fingerprint(&value)
            };
        }
        record.fields.insert(field.as_str(), value);
    }

    record
}

/// Extract up to `max_records_per_page` records from a page, in document
/// order. Review blocks past the cap are dropped.
pub fn extract_page(html: &str, rules: &SiteRules, registry: &ParserRegistry) -> Vec<ReviewRecord> {
    let document = Html::parse_document(html);
    document
        .select(&rules.comment_selector)
        .take(rules.max_records_per_page)
        .map(|node| extract_record(node, rules, registry))
        .collect()
}
