use serde::{Deserialize, Serialize};

use crate::domain::purge::PurgeOutcome;

#[derive(Debug, Deserialize, Serialize)]
pub struct PurgeOutcomeBody {
    pub success: bool,
    pub purged: String,
    pub message: String,
}

impl From<PurgeOutcome> for PurgeOutcomeBody {
    fn from(outcome: PurgeOutcome) -> Self {
        let message = outcome.message();
        Self {
            success: outcome.success,
            purged: outcome.purged_description,
            message,
        }
    }
}

/// Content lifecycle event forwarded by the host.
#[derive(Debug, Deserialize, Serialize)]
pub struct ContentEventRequest {
    pub id: u64,
    #[serde(default)]
    pub revision: bool,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ContentEventResponse {
    pub id: u64,
    /// False when a purge for the item was already pending.
    pub scheduled: bool,
}
