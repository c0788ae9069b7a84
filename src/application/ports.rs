//! Port traits describing the collaborators of the purge service.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::content::ContentItem;
use crate::domain::error::PurgeError;
use crate::domain::purge::{PurgeConfig, PurgeOutcome, PurgeRequest};

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content item `{id}` not found")]
    NotFound { id: u64 },
    #[error("no published content available")]
    NoPublished,
    #[error("content source error: {0}")]
    Source(String),
}

impl ContentError {
    pub fn from_source(err: impl std::fmt::Display) -> Self {
        Self::Source(err.to_string())
    }
}

/// Read access to the host's content items.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn find_item(&self, id: u64) -> Result<ContentItem, ContentError>;

    async fn latest_published(&self) -> Result<ContentItem, ContentError>;
}

/// Sends a purge request to the remote cache.
#[async_trait]
pub trait PurgeExecutor: Send + Sync {
    async fn execute(
        &self,
        request: &PurgeRequest,
        config: &PurgeConfig,
    ) -> Result<PurgeOutcome, PurgeError>;
}
