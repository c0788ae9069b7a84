//! Debounced content-change trigger.
//!
//! A single save in the host fires several lifecycle events for the same
//! item. Each event schedules a purge after a short delay; while one is
//! pending for an id, further events for that id are absorbed. Scheduled
//! purges are tracked so shutdown can run them instead of dropping them.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use dashmap::DashSet;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::purge::PurgeService;

pub struct PurgeScheduler {
    service: Arc<PurgeService>,
    delay: Duration,
    pending: Arc<DashSet<u64>>,
    tasks: Mutex<JoinSet<()>>,
    flush: watch::Sender<bool>,
}

impl PurgeScheduler {
    pub fn new(service: Arc<PurgeService>, delay: Duration) -> Self {
        Self {
            service,
            delay,
            pending: Arc::new(DashSet::new()),
            tasks: Mutex::new(JoinSet::new()),
            flush: watch::Sender::new(false),
        }
    }

    /// Schedule a purge for content item `id`.
    ///
    /// Returns `false` when a purge for `id` is already pending.
    pub fn schedule(&self, id: u64) -> bool {
        if !self.pending.insert(id) {
            debug!(
                target: "purge_cache::trigger",
                post_id = id,
                "purge already pending"
            );
            return false;
        }

        let service = self.service.clone();
        let pending = self.pending.clone();
        let delay = self.delay;
        let mut flush = self.flush.subscribe();

        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        while tasks.try_join_next().is_some() {}
        tasks.spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = flush.wait_for(|flushed| *flushed) => {}
            }
            pending.remove(&id);

            match service.purge_item(id).await {
                Ok(outcome) => info!(
                    target: "purge_cache::trigger",
                    post_id = id,
                    purged = %outcome.purged_description,
                    "scheduled purge finished"
                ),
                Err(err) => error!(
                    target: "purge_cache::trigger",
                    post_id = id,
                    error = %err,
                    "scheduled purge failed"
                ),
            }
        });
        true
    }

    pub fn is_pending(&self, id: u64) -> bool {
        self.pending.contains(&id)
    }

    /// Run every pending purge now, skipping the rest of its delay, and wait
    /// for all scheduled purges to finish. Returns how many were awaited.
    pub async fn drain(&self) -> usize {
        self.flush.send_replace(true);
        let mut tasks = {
            let mut guard = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *guard)
        };

        let mut drained = 0;
        while let Some(result) = tasks.join_next().await {
            drained += 1;
            if let Err(err) = result {
                warn!(
                    target: "purge_cache::trigger",
                    error = %err,
                    "scheduled purge task aborted"
                );
            }
        }

        self.flush.send_replace(false);
        drained
    }
}
