use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::config::OrderedMap;
use crate::fetcher::errors::FetchError;

const DEFAULT_HEADERS: [(&str, &str); 5] = [
    (
        "User-Agent",
        "Mozilla/5.0 (Windows NT 6.1; Win64; x64; rv:38.0) Gecko/20100101 Firefox/38.0",
    ),
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
    ),
    ("Accept-Encoding", "gzip, deflate"),
    ("Accept-Language", "en-US,en;q=0.5"),
    ("Connection", "keep-alive"),
];

/// Outbound request headers sent with every page fetch.
///
/// `Host` is never stored here. The HTTP client writes it from the URI of each
/// request it sends, so a redirect to another site carries that site's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderSet {
    headers: OrderedMap<String>,
}

impl HeaderSet {
    /// An empty set, no headers at all.
    pub fn empty() -> Self {
        Self {
            headers: OrderedMap::new(),
        }
    }

    /// Set a single header. Ignored (returns `false`) when the key or the
    /// value is empty.
    pub fn set_header(&mut self, key: &str, value: &str) -> bool {
        if key.is_empty() || value.is_empty() {
            return false;
        }
        self.headers.insert(key, value.to_string());
        true
    }

    /// Replace the whole set. Ignored (returns `false`) when `headers` is empty.
    pub fn set_headers<K, V, I>(&mut self, headers: I) -> bool
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let replacement: OrderedMap<String> = headers
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        if replacement.is_empty() {
            return false;
        }
        self.headers = replacement;
        true
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Validate and convert into a reqwest header map. A `Host` entry set by
    /// the caller is dropped.
    pub fn to_header_map(&self) -> Result<HeaderMap, FetchError> {
        let mut map = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in self.headers.iter() {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| FetchError::InvalidHeader {
                    name: name.to_string(),
                    reason: e.to_string(),
                })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|e| FetchError::InvalidHeader {
                    name: name.to_string(),
                    reason: e.to_string(),
                })?;
            if header_name != reqwest::header::HOST {
                map.insert(header_name, header_value);
            }
        }
        Ok(map)
    }
}

impl Default for HeaderSet {
    fn default() -> Self {
        Self {
            headers: DEFAULT_HEADERS
                .iter()
                .map(|(k, v)| (*k, v.to_string()))
                .collect(),
        }
    }
}
