use async_trait::async_trait;

use crate::fetcher::{errors::FetchError, headers::HeaderSet};

/// Anything that can turn a URI into an HTML document body.
///
/// The harvester issues exactly one `fetch` per page URI. Selector matching
/// happens on the returned markup, so implementations only deal with
/// transport.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, uri: &str, headers: &HeaderSet) -> Result<String, FetchError>;
}
