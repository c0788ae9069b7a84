use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the purge-cache binary.
#[derive(Debug, Parser)]
#[command(
    name = "purge-cache",
    version,
    about = "Cloudflare cache purging for WordPress sites"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "PURGE_CACHE_CONFIG_FILE",
        value_name = "PATH"
    )]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP service (purge endpoint, manual triggers, content hook).
    Serve(Box<ServeArgs>),
    /// Purge once and exit.
    Purge(PurgeArgs),
    /// Print the URLs a content update would purge, without calling Cloudflare.
    Expand(ExpandArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct CloudflareOverrides {
    /// Override the Cloudflare zone id.
    #[arg(long = "zone-id", value_name = "ZONE")]
    pub zone_id: Option<String>,

    /// Override the Cloudflare API base URL.
    #[arg(long = "cloudflare-api-base-url", value_name = "URL")]
    pub api_base_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub cloudflare: CloudflareOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Toggle the authenticated purge endpoint.
    #[arg(
        long = "endpoint-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub endpoint_enabled: Option<bool>,

    /// Override the content-event debounce delay.
    #[arg(long = "trigger-debounce-ms", value_name = "MILLIS")]
    pub trigger_debounce_ms: Option<u64>,
}

#[derive(Debug, Args, Clone)]
pub struct PurgeArgs {
    #[command(flatten)]
    pub cloudflare: CloudflareOverrides,

    #[command(subcommand)]
    pub target: PurgeTarget,
}

#[derive(Debug, Subcommand, Clone, PartialEq, Eq)]
pub enum PurgeTarget {
    /// Purge the whole zone.
    Everything,
    /// Purge the URLs affected by one post.
    Post {
        #[arg(value_name = "ID")]
        id: u64,
    },
    /// Purge the URLs affected by the latest published post.
    Latest,
}

#[derive(Debug, Args, Clone)]
pub struct ExpandArgs {
    /// JSON snapshot of a content item.
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub item: PathBuf,
}
