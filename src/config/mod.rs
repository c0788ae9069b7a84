//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{net::SocketAddr, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::application::planner::split_templates;
use crate::domain::purge::PurgeConfig;
use crate::infra::cloudflare::DEFAULT_API_BASE_URL;

pub use cli::{
    CliArgs, CloudflareOverrides, Command, ExpandArgs, PurgeArgs, PurgeTarget, ServeArgs,
    ServeOverrides,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "purge-cache";
const ENV_PREFIX: &str = "PURGE_CACHE";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3100;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_DEBOUNCE_MS: u64 = 1000;
const WORDPRESS_API_SUFFIX: &str = "/wp-json";

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub cloudflare: CloudflareSettings,
    pub site: SiteSettings,
    pub purge: PurgeSettings,
    pub endpoint: EndpointSettings,
    pub admin: AdminSettings,
    pub trigger: TriggerSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct CloudflareSettings {
    pub zone_id: String,
    pub api_token: String,
    pub api_base_url: String,
    /// Unset means the HTTP client never times out a purge call.
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub site_url: String,
    pub frontend_url: String,
    pub wordpress_api_url: String,
}

#[derive(Debug, Clone)]
pub struct PurgeSettings {
    pub home_on_update: bool,
    pub everything_on_update: bool,
    pub additional_url_templates: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct EndpointSettings {
    pub enabled: bool,
    pub secret: String,
}

#[derive(Debug, Clone)]
pub struct AdminSettings {
    pub button_enabled: bool,
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct TriggerSettings {
    pub debounce: Duration,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Purge(args)) => raw.apply_cloudflare_overrides(&args.cloudflare),
        Some(Command::Expand(_)) => {}
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            cloudflare,
            site,
            purge,
            endpoint,
            admin,
            trigger,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            cloudflare: build_cloudflare_settings(cloudflare)?,
            site: build_site_settings(site)?,
            purge: build_purge_settings(purge),
            endpoint: build_endpoint_settings(endpoint)?,
            admin: build_admin_settings(admin),
            trigger: build_trigger_settings(trigger),
        })
    }

    /// Purge behaviour handed to the planner and executor.
    pub fn purge_config(&self) -> PurgeConfig {
        PurgeConfig {
            zone_id: self.cloudflare.zone_id.clone(),
            api_token: self.cloudflare.api_token.clone(),
            site_url: self.site.site_url.clone(),
            frontend_url: self.site.frontend_url.clone(),
            purge_home_on_update: self.purge.home_on_update,
            purge_everything_on_update: self.purge.everything_on_update,
            additional_url_templates: self.purge.additional_url_templates.clone(),
            endpoint_enabled: self.endpoint.enabled,
            endpoint_secret: self.endpoint.secret.clone(),
            admin_button_enabled: self.admin.button_enabled,
        }
    }
}

impl From<&Settings> for PurgeConfig {
    fn from(settings: &Settings) -> Self {
        settings.purge_config()
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    cloudflare: RawCloudflareSettings,
    site: RawSiteSettings,
    purge: RawPurgeSettings,
    endpoint: RawEndpointSettings,
    admin: RawAdminSettings,
    trigger: RawTriggerSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(enabled) = overrides.endpoint_enabled {
            self.endpoint.enabled = Some(enabled);
        }
        if let Some(millis) = overrides.trigger_debounce_ms {
            self.trigger.debounce_ms = Some(millis);
        }

        self.apply_cloudflare_overrides(&overrides.cloudflare);
    }

    fn apply_cloudflare_overrides(&mut self, overrides: &CloudflareOverrides) {
        if let Some(zone_id) = overrides.zone_id.as_ref() {
            self.cloudflare.zone_id = Some(zone_id.clone());
        }
        if let Some(url) = overrides.api_base_url.as_ref() {
            self.cloudflare.api_base_url = Some(url.clone());
        }
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_cloudflare_settings(
    cloudflare: RawCloudflareSettings,
) -> Result<CloudflareSettings, LoadError> {
    let api_base_url = non_empty(cloudflare.api_base_url)
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
    parse_absolute_url(&api_base_url, "cloudflare.api_base_url")?;

    let timeout = match cloudflare.timeout_seconds {
        Some(0) => {
            return Err(LoadError::invalid(
                "cloudflare.timeout_seconds",
                "must be greater than zero",
            ));
        }
        Some(seconds) => Some(Duration::from_secs(seconds)),
        None => None,
    };

    Ok(CloudflareSettings {
        zone_id: trimmed(cloudflare.zone_id),
        api_token: trimmed(cloudflare.api_token),
        api_base_url,
        timeout,
    })
}

fn build_site_settings(site: RawSiteSettings) -> Result<SiteSettings, LoadError> {
    let site_url = non_empty(site.site_url)
        .map(without_trailing_slash)
        .ok_or_else(|| LoadError::invalid("site.site_url", "must be set"))?;
    parse_absolute_url(&site_url, "site.site_url")?;

    let frontend_url = non_empty(site.frontend_url)
        .map(without_trailing_slash)
        .unwrap_or_else(|| site_url.clone());
    parse_absolute_url(&frontend_url, "site.frontend_url")?;

    let wordpress_api_url = non_empty(site.wordpress_api_url)
        .unwrap_or_else(|| format!("{site_url}{WORDPRESS_API_SUFFIX}"));
    parse_absolute_url(&wordpress_api_url, "site.wordpress_api_url")?;

    Ok(SiteSettings {
        site_url,
        frontend_url,
        wordpress_api_url,
    })
}

fn build_purge_settings(purge: RawPurgeSettings) -> PurgeSettings {
    let additional_url_templates = match purge.additional_urls {
        Some(RawTemplates::Text(text)) => split_templates(&text),
        Some(RawTemplates::Lines(lines)) => lines
            .iter()
            .flat_map(|line| split_templates(line))
            .collect(),
        None => Vec::new(),
    };

    PurgeSettings {
        home_on_update: purge.home_on_update.unwrap_or(false),
        everything_on_update: purge.everything_on_update.unwrap_or(false),
        additional_url_templates,
    }
}

fn build_endpoint_settings(endpoint: RawEndpointSettings) -> Result<EndpointSettings, LoadError> {
    let enabled = endpoint.enabled.unwrap_or(false);
    let secret = endpoint.secret.unwrap_or_default();
    if enabled && secret.is_empty() {
        return Err(LoadError::invalid(
            "endpoint.secret",
            "must be set when the endpoint is enabled",
        ));
    }

    Ok(EndpointSettings { enabled, secret })
}

fn build_admin_settings(admin: RawAdminSettings) -> AdminSettings {
    AdminSettings {
        button_enabled: admin.button_enabled.unwrap_or(false),
        token: trimmed(admin.token),
    }
}

fn build_trigger_settings(trigger: RawTriggerSettings) -> TriggerSettings {
    TriggerSettings {
        debounce: Duration::from_millis(trigger.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS)),
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCloudflareSettings {
    zone_id: Option<String>,
    api_token: Option<String>,
    api_base_url: Option<String>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSiteSettings {
    site_url: Option<String>,
    frontend_url: Option<String>,
    wordpress_api_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawPurgeSettings {
    home_on_update: Option<bool>,
    everything_on_update: Option<bool>,
    additional_urls: Option<RawTemplates>,
}

/// `purge.additional_urls` as a multi-line string or a list of lines.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawTemplates {
    Text(String),
    Lines(Vec<String>),
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawEndpointSettings {
    enabled: Option<bool>,
    secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawAdminSettings {
    button_enabled: Option<bool>,
    token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawTriggerSettings {
    debounce_ms: Option<u64>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn parse_absolute_url(value: &str, key: &'static str) -> Result<(), LoadError> {
    let url = Url::parse(value)
        .map_err(|err| LoadError::invalid(key, format!("invalid url `{value}`: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(LoadError::invalid(key, "url must use http or https"));
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn without_trailing_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

fn trimmed(value: Option<String>) -> String {
    non_empty(value).unwrap_or_default()
}
