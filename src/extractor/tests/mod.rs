use std::fs;
use std::sync::Arc;

use crate::config::{OrderedMap, SiteOverride, builtin_sites, merge};
use crate::extractor::parsers::{BOOKING, TRIPADVISOR};
use crate::extractor::{FieldParser, ParserRegistry, SiteRules, extract_page, fingerprint};

fn rules_for(site: &str) -> SiteRules {
    let sites = builtin_sites();
    SiteRules::compile(site, sites.get(site).unwrap()).unwrap()
}

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("src/extractor/tests/fixtures/{}", name))
        .expect("Failed to read test fixture")
}

#[test]
fn test_extract_booking_page() {
    let records = extract_page(
        &fixture("booking.html"),
        &rules_for(BOOKING),
        &ParserRegistry::builtin(),
    );
    assert_eq!(records.len(), 3);

    let first = &records[0];
    assert_eq!(first.site, "booking");
    assert_eq!(first.field("author"), Some("Marko"));
    assert_eq!(first.field("country"), Some("Croatia"));
    assert_eq!(first.field("score"), Some("9.6/10"));
    assert_eq!(first.field("header"), Some("Exceptional"));
    assert_eq!(
        first.content(),
        Some("--- Parking is a bit tight.\n+++ Friendly staff and a great breakfast.")
    );
    assert_eq!(first.field("date"), Some("12 May 2015"));
    assert_eq!(first.id, fingerprint(first.content().unwrap()));

    // Field order follows the selector map
    let keys: Vec<_> = first.fields.keys().collect();
    assert_eq!(
        keys,
        vec!["author", "country", "score", "header", "content", "date"]
    );

    // Inline markup inside the review body is stripped
    assert_eq!(records[1].content(), Some("+++ Quiet room, very clean."));
}

#[test]
fn test_review_without_content_has_empty_id() {
    let records = extract_page(
        &fixture("booking.html"),
        &rules_for(BOOKING),
        &ParserRegistry::builtin(),
    );
    let anonymous = &records[2];

    assert_eq!(anonymous.field("author"), Some("Anonymous"));
    assert_eq!(anonymous.content(), None);
    assert_eq!(anonymous.field("country"), None);
    assert_eq!(anonymous.id, "");
}

#[test]
fn test_blank_content_leaves_id_empty() {
    let html = r#"<div class="review"><div class="member_info"><div class="username">Lea</div></div>
        <p class="partial_entry">
        </p></div>"#;
    let records = extract_page(html, &rules_for(TRIPADVISOR), &ParserRegistry::builtin());

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].content(), Some(""));
    assert_eq!(records[0].id, "");
}

#[test]
fn test_markup_only_content_leaves_id_empty() {
    let html = r#"<li class="review_item"><div class="review_item_review_content"><br><img src="x.png"></div></li>"#;

    // Generic text is empty, and so is the tag-stripped raw markup
    let records = extract_page(html, &rules_for(BOOKING), &ParserRegistry::new());
    assert_eq!(records[0].content(), Some(""));
    assert_eq!(records[0].id, "");

    fn raw_markup(node: scraper::ElementRef<'_>, _field: &str) -> String {
        node.inner_html()
    }
    let mut registry = ParserRegistry::new();
    registry.register(BOOKING, Arc::new(raw_markup));
    let records = extract_page(html, &rules_for(BOOKING), &registry);
    assert_eq!(records[0].content(), Some(""));
    assert_eq!(records[0].id, "");
}

#[test]
fn test_empty_booking_paragraph_keeps_prefix() {
    let html = r#"<li class="review_item"><div class="review_item_review_content"><p class="review_pos"></p></div></li>"#;
    let records = extract_page(html, &rules_for(BOOKING), &ParserRegistry::builtin());

    // The marker survives, so the stored value is not empty and gets an id
    assert_eq!(records[0].content(), Some("+++ "));
    assert_eq!(records[0].id, fingerprint("+++ "));
}

#[test]
fn test_extract_tripadvisor_page() {
    let records = extract_page(
        &fixture("tripadvisor.html"),
        &rules_for(TRIPADVISOR),
        &ParserRegistry::builtin(),
    );
    assert_eq!(records.len(), 3);

    let first = &records[0];
    assert_eq!(first.field("author"), Some("TravellerJoe"));
    assert_eq!(first.field("country"), Some("London, United Kingdom"));
    assert_eq!(first.field("score"), Some("5/5"));
    assert_eq!(first.field("header"), Some("Best hotel in Osijek"));
    assert_eq!(first.content(), Some("Spotless rooms and a lovely garden."));
    assert_eq!(first.field("date"), Some("14 May 2015"));

    assert_eq!(records[1].field("score"), Some("4/5"));
    assert_eq!(records[1].field("country"), None);
    assert_eq!(records[1].field("date"), Some("2 May 2015"));

    // Rating without an alt text yields an empty score, not an error
    assert_eq!(records[2].field("score"), Some(""));
    assert_eq!(records[2].content(), Some("It was fine."));
}

#[test]
fn test_record_cap_takes_first_blocks() {
    let overrides: OrderedMap<SiteOverride> =
        [(TRIPADVISOR, SiteOverride::new().max_records_per_page(2))]
            .into_iter()
            .collect();
    let merged = merge(builtin_sites(), overrides);
    let rules = SiteRules::compile(TRIPADVISOR, merged.get(TRIPADVISOR).unwrap()).unwrap();

    let records = extract_page(
        &fixture("tripadvisor.html"),
        &rules,
        &ParserRegistry::builtin(),
    );
    let authors: Vec<_> = records.iter().map(|r| r.field("author").unwrap()).collect();
    assert_eq!(authors, vec!["TravellerJoe", "Petra_Z"]);
}

#[test]
fn test_zero_cap_extracts_nothing() {
    let overrides: OrderedMap<SiteOverride> =
        [(BOOKING, SiteOverride::new().max_records_per_page(0))]
            .into_iter()
            .collect();
    let merged = merge(builtin_sites(), overrides);
    let rules = SiteRules::compile(BOOKING, merged.get(BOOKING).unwrap()).unwrap();

    let records = extract_page(&fixture("booking.html"), &rules, &ParserRegistry::builtin());
    assert!(records.is_empty());
}

#[test]
fn test_generic_parsing_without_builtin() {
    let records = extract_page(
        &fixture("booking.html"),
        &rules_for(BOOKING),
        &ParserRegistry::new(),
    );

    // Plain trimmed text: no score suffix, no +++/--- markers
    assert_eq!(records[0].field("score"), Some("9.6"));
    let content = records[0].content().unwrap();
    assert!(content.starts_with("Parking is a bit tight."));
    assert!(!content.contains("+++"));
}

#[test]
fn test_registered_parser_wins_over_builtin() {
    struct Redacted;
    impl FieldParser for Redacted {
        fn parse(&self, _node: scraper::ElementRef<'_>, field: &str) -> String {
            format!("<i>{}</i>", field)
        }
    }

    let mut registry = ParserRegistry::builtin();
    registry.register(BOOKING, Arc::new(Redacted));

    let records = extract_page(&fixture("booking.html"), &rules_for(BOOKING), &registry);
    assert_eq!(records[0].field("author"), Some("author"));
    assert_eq!(records[0].content(), Some("content"));
    assert_eq!(records[0].id, fingerprint("content"));
}

#[test]
fn test_malformed_html() {
    let html = r#"<div class="review_item"><div class="review_item_reviewer"><h4>Broken"#;
    let records = extract_page(html, &rules_for(BOOKING), &ParserRegistry::builtin());

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].field("author"), Some("Broken"));
    assert_eq!(records[0].id, "");
}

#[cfg(feature = "fuzz")]
mod fuzz {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_extract_never_panics(html in ".*") {
            let _ = extract_page(&html, &rules_for(BOOKING), &ParserRegistry::builtin());
            let _ = extract_page(&html, &rules_for(TRIPADVISOR), &ParserRegistry::builtin());
        }

        #[test]
        fn test_fingerprint_is_stable(text in ".*") {
            prop_assert_eq!(fingerprint(&text), fingerprint(&text));
        }

        #[test]
        fn test_ids_match_stored_content(body in "[a-zA-Z ]{1,40}") {
            let html = format!(
                r#"<div class="review"><p class="partial_entry">{}</p></div>"#,
                body
            );
            let records = extract_page(&html, &rules_for(TRIPADVISOR), &ParserRegistry::builtin());
            for record in records {
                match record.content() {
                    Some(content) if !content.is_empty() => {
                        prop_assert_eq!(&record.id, &fingerprint(content))
                    }
                    _ => prop_assert!(record.id.is_empty()),
                }
            }
        }
    }
}
