use serde::{Deserialize, Serialize};

/// Snapshot of a published content item at the time a purge was triggered.
///
/// Supplied by the host (webhook payload, WordPress REST lookup, or a JSON
/// file on the CLI); the purge pipeline only ever reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: u64,
    /// Post name as used in permalinks (`%slug%`).
    pub slug: String,
    /// Absolute URL under the internal site origin.
    pub permalink: String,
    #[serde(default)]
    pub author_nicename: String,
    /// Category slugs.
    #[serde(default)]
    pub categories: Vec<String>,
    /// Tag slugs.
    #[serde(default)]
    pub tags: Vec<String>,
}
