#![no_main]

use libfuzzer_sys::fuzz_target;
use reqwest::StatusCode;
use url::Url;

use harvest::config::builtin_sites;
use harvest::extractor::{ParserRegistry, SiteRules, extract_page};
use harvest::fetcher::pipeline::process_response;

fuzz_target!(|data: &[u8]| {
    let url = Url::parse("https://example.com/reviews").unwrap();

    // Decoding arbitrary bytes must not panic, whatever the charset guess
    let Ok(page) = process_response(url, StatusCode::OK, data, "text/html") else {
        return;
    };

    let registry = ParserRegistry::builtin();
    for (site, config) in builtin_sites().iter() {
        let rules = SiteRules::compile(site, config).unwrap();
        for record in extract_page(&page.body, &rules, &registry) {
            assert!(record.id.is_empty() || record.content().is_some());
        }
    }
});
