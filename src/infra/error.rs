//! Failures raised while wiring adapters at startup or touching the local
//! machine. Request-time upstream failures are `PurgeError`/`ContentError`.

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;
use tracing_subscriber::util::TryInitError;

/// Remote service an adapter talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    Cloudflare,
    WordPress,
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cloudflare => "Cloudflare API",
            Self::WordPress => "WordPress API",
        })
    }
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("invalid {upstream} url `{url}`: {reason}")]
    InvalidUrl {
        upstream: Upstream,
        url: String,
        reason: String,
    },
    #[error("failed to build {upstream} client: {source}")]
    HttpClient {
        upstream: Upstream,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("failed to read `{}`: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] TryInitError),
}

impl InfraError {
    pub fn invalid_url(upstream: Upstream, url: &str, reason: impl fmt::Display) -> Self {
        Self::InvalidUrl {
            upstream,
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn invalid_url_names_the_upstream() {
        let err = InfraError::invalid_url(Upstream::WordPress, "not a url", "relative URL without a base");
        assert_eq!(
            err.to_string(),
            "invalid WordPress API url `not a url`: relative URL without a base"
        );
    }

    #[test]
    fn bind_failure_keeps_io_source() {
        let err = InfraError::Bind {
            addr: SocketAddr::from(([127, 0, 0, 1], 3100)),
            source: io::Error::new(io::ErrorKind::AddrInUse, "address in use"),
        };

        assert_eq!(err.to_string(), "failed to bind 127.0.0.1:3100: address in use");
        assert!(err.source().is_some());
    }
}
