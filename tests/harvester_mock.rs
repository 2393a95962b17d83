use async_trait::async_trait;
use harvest::config::{OrderedMap, RefreshMode, Settings, SiteOverride};
use harvest::fetcher::{FetchError, HeaderSet, PageSource};
use harvest::{Harvester, ScrapeError};
use mockall::mock;
use std::sync::Arc;

mock! {
    pub Source {}

    #[async_trait]
    impl PageSource for Source {
        async fn fetch(&self, uri: &str, headers: &HeaderSet) -> Result<String, FetchError>;
    }
}

const PAGE: &str = r#"<div class="review"><div class="member_info"><div class="username">Lea</div></div>
<p class="partial_entry">Lovely garden.</p></div>"#;

fn tripadvisor(uris: &[(&str, &str)]) -> OrderedMap<SiteOverride> {
    let site = uris
        .iter()
        .fold(SiteOverride::new(), |site, (language, uri)| {
            site.language_uri(*language, *uri)
        });
    [("tripadvisor", site)].into_iter().collect()
}

#[tokio::test]
async fn test_cache_hit_skips_source() {
    let mut source = MockSource::new();
    source
        .expect_fetch()
        .withf(|uri, _| uri == "http://t/en")
        .times(1)
        .returning(|_, _| Ok(PAGE.to_string()));

    let h = Harvester::new(
        Arc::new(source),
        tripadvisor(&[("en", "http://t/en")]),
        &Settings::default(),
    )
    .unwrap();

    let first = h.site_comments("tripadvisor", false).await.unwrap();
    let second = h.site_comments("tripadvisor", false).await.unwrap();
    assert_eq!(first.comments, second.comments);

    let en = second.comments.get("en").unwrap();
    assert_eq!(en.len(), 1);
    assert_eq!(en[0].field("author"), Some("Lea"));
    assert_eq!(en[0].content(), Some("Lovely garden."));
}

#[tokio::test]
async fn test_forced_refresh_fetches_every_language_again() {
    let mut source = MockSource::new();
    source
        .expect_fetch()
        .times(4)
        .returning(|_, _| Ok(PAGE.to_string()));

    let settings = Settings {
        refresh_mode: RefreshMode::Replace,
        ..Settings::default()
    };
    let h = Harvester::new(
        Arc::new(source),
        tripadvisor(&[("en", "http://t/en"), ("de", "http://t/de")]),
        &settings,
    )
    .unwrap();

    h.site_comments("tripadvisor", false).await.unwrap();
    let refreshed = h.site_comments("tripadvisor", true).await.unwrap();

    assert_eq!(refreshed.comments.len(), 2);
    assert_eq!(h.store().record_count("tripadvisor"), 2);
}

#[tokio::test]
async fn test_headers_reach_the_source() {
    let mut source = MockSource::new();
    source
        .expect_fetch()
        .withf(|_, headers| headers.get("Accept-Language") == Some("de-DE"))
        .times(1)
        .returning(|_, _| Ok(PAGE.to_string()));

    let mut h = Harvester::new(
        Arc::new(source),
        tripadvisor(&[("de", "http://t/de")]),
        &Settings::default(),
    )
    .unwrap();
    assert!(h.set_header("Accept-Language", "de-DE"));

    let harvest = h.site_comments("tripadvisor", false).await.unwrap();
    assert!(harvest.is_complete());
}

#[tokio::test]
async fn test_unknown_site_never_touches_source() {
    let mut source = MockSource::new();
    source.expect_fetch().never();

    let h = Harvester::new(Arc::new(source), OrderedMap::new(), &Settings::default()).unwrap();
    let err = h.site_comments("trivago", false).await.unwrap_err();
    assert!(matches!(err, ScrapeError::UnknownSite { .. }));
}
