use serde::Serialize;

pub const EVERYTHING: &str = "everything";

/// Purge behaviour resolved from deployment settings.
///
/// Built once at startup and handed to the planner and executor explicitly.
#[derive(Debug, Clone, Default)]
pub struct PurgeConfig {
    pub zone_id: String,
    pub api_token: String,
    /// Internal WordPress origin that permalinks are generated under.
    pub site_url: String,
    /// Public origin; differs from `site_url` on headless deployments.
    pub frontend_url: String,
    pub purge_home_on_update: bool,
    /// Force a whole-zone purge on every content update.
    pub purge_everything_on_update: bool,
    pub additional_url_templates: Vec<String>,
    pub endpoint_enabled: bool,
    pub endpoint_secret: String,
    pub admin_button_enabled: bool,
}

impl PurgeConfig {
    pub fn has_credentials(&self) -> bool {
        !self.zone_id.trim().is_empty() && !self.api_token.trim().is_empty()
    }
}

/// What the remote API is asked to drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurgeRequest {
    Everything,
    FileList(Vec<String>),
}

impl PurgeRequest {
    pub fn mode(&self) -> &'static str {
        match self {
            PurgeRequest::Everything => "everything",
            PurgeRequest::FileList(_) => "files",
        }
    }

    /// Human-readable summary of the purge targets.
    pub fn describe(&self) -> String {
        match self {
            PurgeRequest::FileList(files) if !files.is_empty() => files.join(", "),
            _ => EVERYTHING.to_string(),
        }
    }
}

/// JSON body accepted by the purge endpoint.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PurgePayload<'a> {
    Everything { purge_everything: bool },
    Files { files: &'a [String] },
}

impl<'a> From<&'a PurgeRequest> for PurgePayload<'a> {
    fn from(request: &'a PurgeRequest) -> Self {
        match request {
            PurgeRequest::Everything => PurgePayload::Everything {
                purge_everything: true,
            },
            PurgeRequest::FileList(files) => PurgePayload::Files { files },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeOutcome {
    pub success: bool,
    pub purged_description: String,
}

impl PurgeOutcome {
    pub fn succeeded(request: &PurgeRequest) -> Self {
        Self {
            success: true,
            purged_description: request.describe(),
        }
    }

    pub fn message(&self) -> String {
        format!(
            "Cloudflare Cache purged {} successfully. Please allow up to 30 seconds for changes to take effect.",
            self.purged_description
        )
    }
}
