//! Purge orchestration shared by every trigger.

use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use tracing::{info, warn};

use crate::application::planner;
use crate::application::ports::{ContentError, ContentSource, PurgeExecutor};
use crate::domain::content::ContentItem;
use crate::domain::error::PurgeError;
use crate::domain::purge::{PurgeConfig, PurgeOutcome, PurgeRequest};

#[derive(Debug, Error)]
pub enum PurgeServiceError {
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Purge(#[from] PurgeError),
}

pub struct PurgeService {
    config: Arc<PurgeConfig>,
    content: Arc<dyn ContentSource>,
    executor: Arc<dyn PurgeExecutor>,
}

impl PurgeService {
    pub fn new(
        config: Arc<PurgeConfig>,
        content: Arc<dyn ContentSource>,
        executor: Arc<dyn PurgeExecutor>,
    ) -> Self {
        Self {
            config,
            content,
            executor,
        }
    }

    pub fn config(&self) -> &PurgeConfig {
        &self.config
    }

    /// Request that would be sent for `trigger`, without sending it.
    pub fn plan(&self, trigger: Option<&ContentItem>) -> PurgeRequest {
        planner::build(trigger, &self.config)
    }

    /// Build and execute a purge for `trigger`; `None` purges the whole zone.
    pub async fn purge(&self, trigger: Option<&ContentItem>) -> Result<PurgeOutcome, PurgeError> {
        let request = self.plan(trigger);
        let result = self.executor.execute(&request, &self.config).await;

        // Configuration errors are raised before anything leaves the process.
        if !matches!(result, Err(PurgeError::Configuration { .. })) {
            counter!("purge_cache_requests_total", "mode" => request.mode()).increment(1);
        }

        match result {
            Ok(outcome) => {
                info!(
                    target: "purge_cache::purge",
                    post_id = trigger.map(|item| item.id),
                    mode = request.mode(),
                    purged = %outcome.purged_description,
                    "cache purged"
                );
                Ok(outcome)
            }
            Err(err) => {
                counter!("purge_cache_failures_total", "kind" => err.kind()).increment(1);
                warn!(
                    target: "purge_cache::purge",
                    post_id = trigger.map(|item| item.id),
                    mode = request.mode(),
                    status = err.status(),
                    error = %err,
                    "cache purge failed"
                );
                Err(err)
            }
        }
    }

    pub async fn purge_everything(&self) -> Result<PurgeOutcome, PurgeError> {
        self.purge(None).await
    }

    pub async fn purge_item(&self, id: u64) -> Result<PurgeOutcome, PurgeServiceError> {
        let item = self.content.find_item(id).await?;
        Ok(self.purge(Some(&item)).await?)
    }

    pub async fn purge_latest(&self) -> Result<PurgeOutcome, PurgeServiceError> {
        let item = self.content.latest_published().await?;
        Ok(self.purge(Some(&item)).await?)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;

    pub(crate) struct StaticContent {
        pub items: Vec<ContentItem>,
    }

    #[async_trait]
    impl ContentSource for StaticContent {
        async fn find_item(&self, id: u64) -> Result<ContentItem, ContentError> {
            self.items
                .iter()
                .find(|item| item.id == id)
                .cloned()
                .ok_or(ContentError::NotFound { id })
        }

        async fn latest_published(&self) -> Result<ContentItem, ContentError> {
            self.items.last().cloned().ok_or(ContentError::NoPublished)
        }
    }

    #[derive(Default)]
    pub(crate) struct RecordingExecutor {
        pub calls: AtomicUsize,
        pub requests: Mutex<Vec<PurgeRequest>>,
    }

    impl RecordingExecutor {
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PurgeExecutor for RecordingExecutor {
        async fn execute(
            &self,
            request: &PurgeRequest,
            _config: &PurgeConfig,
        ) -> Result<PurgeOutcome, PurgeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests
                .lock()
                .expect("requests lock")
                .push(request.clone());
            Ok(PurgeOutcome::succeeded(request))
        }
    }

    pub(crate) fn sample_item(id: u64) -> ContentItem {
        ContentItem {
            id,
            slug: format!("post-{id}"),
            permalink: format!("https://internal.site/post-{id}/"),
            author_nicename: "jane".to_string(),
            categories: vec!["news".to_string()],
            tags: Vec::new(),
        }
    }

    pub(crate) fn sample_config() -> PurgeConfig {
        PurgeConfig {
            zone_id: "zone".to_string(),
            api_token: "token".to_string(),
            site_url: "https://internal.site".to_string(),
            frontend_url: "https://public.site".to_string(),
            ..Default::default()
        }
    }
}
