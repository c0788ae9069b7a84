//! Cloudflare cache-purge API client.
//!
//! One `POST /zones/{zone_id}/purge_cache` per invocation: no retries, no
//! backoff. The request timeout is only set when configured.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::histogram;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::application::ports::PurgeExecutor;
use crate::domain::error::PurgeError;
use crate::domain::purge::{PurgeConfig, PurgeOutcome, PurgePayload, PurgeRequest};
use crate::infra::error::{InfraError, Upstream};

pub const DEFAULT_API_BASE_URL: &str = "https://api.cloudflare.com/client/v4";

const TRANSPORT_FAILURE: &str = "Could not reach the Cloudflare API.";
const UNEXPECTED_RESPONSE: &str = "Unexpected response from the Cloudflare API.";
const UNKNOWN_REMOTE_ERROR: &str = "Cloudflare reported an unknown error.";
const GENERIC_STATUS: i64 = 500;

#[derive(Debug, Deserialize)]
struct PurgeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Clone)]
pub struct CloudflareClient {
    http: Client,
    api_base: Url,
}

impl CloudflareClient {
    pub fn new(api_base_url: &str, timeout: Option<Duration>) -> Result<Self, InfraError> {
        let api_base = Url::parse(api_base_url.trim())
            .map_err(|err| InfraError::invalid_url(Upstream::Cloudflare, api_base_url, err))?;
        if api_base.cannot_be_a_base() {
            return Err(InfraError::invalid_url(
                Upstream::Cloudflare,
                api_base_url,
                "url cannot carry a path",
            ));
        }

        let mut builder = Client::builder().user_agent(Self::user_agent());
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|source| InfraError::HttpClient {
            upstream: Upstream::Cloudflare,
            source,
        })?;

        Ok(Self { http, api_base })
    }

    pub fn user_agent() -> &'static str {
        concat!("purge-cache/", env!("CARGO_PKG_VERSION"))
    }

    /// `{base}/zones/{zone_id}/purge_cache`, with the zone id escaped as a
    /// single path segment.
    fn purge_url(&self, zone_id: &str) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["zones", zone_id.trim(), "purge_cache"]);
        }
        url
    }
}

#[async_trait]
impl PurgeExecutor for CloudflareClient {
    async fn execute(
        &self,
        request: &PurgeRequest,
        config: &PurgeConfig,
    ) -> Result<PurgeOutcome, PurgeError> {
        if !config.has_credentials() {
            return Err(PurgeError::missing_credentials());
        }

        let url = self.purge_url(&config.zone_id);
        debug!(
            target: "purge_cache::cloudflare",
            url = %url,
            mode = request.mode(),
            "sending purge request"
        );

        let started = Instant::now();
        let sent = self
            .http
            .post(url)
            .bearer_auth(config.api_token.trim())
            .json(&PurgePayload::from(request))
            .send()
            .await;
        histogram!("purge_cache_remote_ms").record(started.elapsed().as_secs_f64() * 1000.0);

        let response = match sent {
            Ok(response) => response,
            Err(err) => {
                warn!(
                    target: "purge_cache::cloudflare",
                    error = %err,
                    "purge request transport failure"
                );
                return Err(PurgeError::remote(TRANSPORT_FAILURE, GENERIC_STATUS));
            }
        };

        let http_status = i64::from(response.status().as_u16());
        let body: PurgeResponse = match response.json().await {
            Ok(body) => body,
            Err(err) => {
                warn!(
                    target: "purge_cache::cloudflare",
                    status = http_status,
                    error = %err,
                    "purge response was not valid JSON"
                );
                return Err(PurgeError::remote(UNEXPECTED_RESPONSE, http_status));
            }
        };

        if !body.success {
            return Err(match body.errors.into_iter().next() {
                Some(error) => PurgeError::remote(error.message, error.code),
                None => PurgeError::remote(UNKNOWN_REMOTE_ERROR, http_status),
            });
        }

        Ok(PurgeOutcome::succeeded(request))
    }
}
