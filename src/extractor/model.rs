use serde::{Deserialize, Serialize};

use crate::config::OrderedMap;

/// One extracted review.
///
/// Serializes flat: `{"id": .., "site": .., "author": .., "content": ..}` with
/// fields in extraction order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Fingerprint of `content`; empty when no content was extracted.
    pub id: String,
    pub site: String,
    #[serde(flatten)]
    pub fields: OrderedMap<String>,
}

impl ReviewRecord {
    pub fn new(site: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            site: site.into(),
            fields: OrderedMap::new(),
        }
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn content(&self) -> Option<&str> {
        self.field("content")
    }
}
