use std::sync::Arc;

use crate::application::purge::PurgeService;
use crate::application::trigger::PurgeScheduler;
use crate::domain::purge::PurgeConfig;

#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<PurgeService>,
    pub scheduler: Arc<PurgeScheduler>,
    /// Bearer token guarding the admin and hook routes.
    pub admin_token: Arc<str>,
}

impl ApiState {
    pub fn new(
        service: Arc<PurgeService>,
        scheduler: Arc<PurgeScheduler>,
        admin_token: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            service,
            scheduler,
            admin_token: admin_token.into(),
        }
    }

    pub fn config(&self) -> &PurgeConfig {
        self.service.config()
    }
}
