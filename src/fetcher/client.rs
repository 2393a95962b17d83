use crate::fetcher::{
    errors::FetchError, headers::HeaderSet, pipeline::process_response, source::PageSource,
    types::PageResponse,
};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::{debug, instrument};

const MAX_BODY_SIZE: u64 = 5 * 1024 * 1024; // 5MB
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Review page fetcher over HTTP.
///
/// One `reqwest::Client` is shared by every fetch, so connections to the same
/// site are pooled across pages and languages.
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: Client,
}

impl HttpPageSource {
    /// `timeout` bounds each request end to end.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = ClientBuilder::new()
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self { client })
    }

    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch_page(&self, url: &str, headers: &HeaderSet) -> Result<PageResponse, FetchError> {
        let parsed_url = url::Url::parse(url)?;
        if parsed_url.host_str().is_none() {
            return Err(FetchError::MissingHost(url.to_string()));
        }
        // Host is filled in by the connection layer for every hop
        let header_map = headers.to_header_map()?;

        let response = self
            .client
            .get(parsed_url)
            .headers(header_map)
            .send()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        if let Some(content_length) = response.content_length()
            && content_length > MAX_BODY_SIZE
        {
            return Err(FetchError::BodyTooLarge(content_length));
        }

        let final_url = response.url().clone();
        let status = response.status();

        if !status.is_success() {
            return Err(FetchError::Http {
                status,
                retriable: status.is_server_error(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .unwrap_or("text/html")
            .to_string();

        if !content_type.contains("text/html") && !content_type.contains("application/xhtml") {
            return Err(FetchError::UnsupportedContentType(content_type));
        }

        let body_bytes = response
            .bytes()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        // Content-Length may be missing or wrong for compressed bodies
        if body_bytes.len() as u64 > MAX_BODY_SIZE {
            return Err(FetchError::BodyTooLarge(body_bytes.len() as u64));
        }

        let page = process_response(final_url, status, &body_bytes, &content_type)?;
        debug!(
            status = %page.status,
            charset = ?page.charset,
            bytes = page.body.len(),
            "fetched page"
        );
        Ok(page)
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch(&self, uri: &str, headers: &HeaderSet) -> Result<String, FetchError> {
        self.fetch_page(uri, headers).await.map(|page| page.body)
    }
}
