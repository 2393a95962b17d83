//! Per-site field parsers.
//!
//! A [`FieldParser`] turns the element matched by a field selector into the
//! string stored on the record. Resolution for a given site:
//!
//! 1. a parser registered in the [`ParserRegistry`] under the site key
//!    (the built-in Booking and TripAdvisor routines live here),
//! 2. the parser attached to the site's configuration,
//! 3. [`GenericParser`], the element's trimmed text.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::extractor::cleaner::element_text;

pub const BOOKING: &str = "booking";
pub const TRIPADVISOR: &str = "tripadvisor";

/// Normalizes one matched field element into its stored string.
pub trait FieldParser: Send + Sync {
    fn parse(&self, node: ElementRef<'_>, field: &str) -> String;
}

/// Plain closures work as parsers.
impl<F> FieldParser for F
where
    F: Fn(ElementRef<'_>, &str) -> String + Send + Sync,
{
    fn parse(&self, node: ElementRef<'_>, field: &str) -> String {
        self(node, field)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GenericParser;

impl FieldParser for GenericParser {
    fn parse(&self, node: ElementRef<'_>, _field: &str) -> String {
        element_text(node)
    }
}

static BOOKING_CONTENT_RULES: Lazy<[(Regex, &'static str); 5]> = Lazy::new(|| {
    [
        (Regex::new(r"\A(?:\n+|[\t\s]*\n+)").unwrap(), ""),
        (Regex::new(r#"<p class="review_neg">\n*"#).unwrap(), "--- "),
        (Regex::new(r#"<p class="review_pos">\n*"#).unwrap(), "+++ "),
        (Regex::new(r"</p>").unwrap(), ""),
        (Regex::new(r"\n\z").unwrap(), ""),
    ]
});

/// Booking.com review blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct BookingParser;

impl BookingParser {
    /// Turn the inner markup of a review body into `+++ liked` / `--- disliked`
    /// lines.
    pub fn parse_content(markup: &str) -> String {
        BOOKING_CONTENT_RULES
            .iter()
            .fold(markup.trim().to_string(), |acc, (regex, replacement)| {
                regex.replace_all(&acc, *replacement).into_owned()
            })
    }
}

impl FieldParser for BookingParser {
    fn parse(&self, node: ElementRef<'_>, field: &str) -> String {
        match field {
            "content" => Self::parse_content(&node.inner_html()),
            "score" => format!("{}/10", element_text(node)),
            _ => element_text(node),
        }
    }
}

static TRIPADVISOR_MORE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)(?:^\n+|^[\t\s]*\n+)More\s*").unwrap());

static TRIPADVISOR_SCORE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"alt="([1-5])"#).unwrap());

/// TripAdvisor review blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct TripadvisorParser;

impl TripadvisorParser {
    pub fn parse_content(text: &str) -> String {
        TRIPADVISOR_MORE_REGEX
            .replace_all(text.trim(), "")
            .trim()
            .to_string()
    }

    /// `N/5` from the rating image's `alt` text, empty when there is none.
    pub fn parse_score(markup: &str) -> String {
        TRIPADVISOR_SCORE_REGEX
            .captures(markup)
            .and_then(|caps| caps.get(1))
            .map(|rating| format!("{}/5", rating.as_str()))
            .unwrap_or_default()
    }

    pub fn parse_date(text: &str) -> String {
        text.trim().replace("Reviewed ", "")
    }
}

impl FieldParser for TripadvisorParser {
    fn parse(&self, node: ElementRef<'_>, field: &str) -> String {
        match field {
            "content" => Self::parse_content(&element_text(node)),
            "score" => Self::parse_score(&node.inner_html()),
            "date" => Self::parse_date(&element_text(node)),
            _ => element_text(node),
        }
    }
}

/// Site key to parser. Registered parsers win over the one attached to a
/// site's configuration.
#[derive(Clone, Default)]
pub struct ParserRegistry {
    parsers: HashMap<String, Arc<dyn FieldParser>>,
}

impl ParserRegistry {
    /// An empty registry: every site falls through to its configured parser
    /// or the generic one.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the Booking and TripAdvisor routines.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(BOOKING, Arc::new(BookingParser));
        registry.register(TRIPADVISOR, Arc::new(TripadvisorParser));
        registry
    }

    pub fn register(&mut self, site: impl Into<String>, parser: Arc<dyn FieldParser>) {
        self.parsers.insert(site.into(), parser);
    }

    pub fn get(&self, site: &str) -> Option<&Arc<dyn FieldParser>> {
        self.parsers.get(site)
    }

    pub fn contains(&self, site: &str) -> bool {
        self.parsers.contains_key(site)
    }

    pub fn sites(&self) -> Vec<&str> {
        let mut sites: Vec<_> = self.parsers.keys().map(String::as_str).collect();
        sites.sort_unstable();
        sites
    }

    /// Pick the parser for `site` and run it on `node`.
    pub fn resolve_and_parse(
        &self,
        site: &str,
        configured: Option<&Arc<dyn FieldParser>>,
        field: &str,
        node: ElementRef<'_>,
    ) -> String {
        match self.get(site).or(configured) {
            Some(parser) => parser.parse(node, field),
            None => GenericParser.parse(node, field),
        }
    }
}

impl fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("sites", &self.sites())
            .finish()
    }
}
