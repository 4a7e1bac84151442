//! Client configuration
//!
//! [`HttpClientConfig`] carries the construction parameters for an
//! [`HttpClient`](crate::HttpClient). No defaults are applied: the `Default`
//! value is all zeros, and a zero duration means "no limit" for that setting.
//!
//! The config can be nested in application config files. Durations are
//! written as integer milliseconds:
//!
//! ```
//! use networking::HttpClientConfig;
//! use std::time::Duration;
//!
//! let config: HttpClientConfig = serde_json::from_str(
//!     r#"{ "max_idle_conns_per_host": 32, "timeout_ms": 2000 }"#,
//! ).unwrap();
//! assert_eq!(config.timeout, Duration::from_secs(2));
//! assert_eq!(config.connect_timeout, Duration::ZERO);
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the client reports 5xx responses and payload encode failures
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// 5xx responses return an empty payload and JSON encode failures send
    /// no body. Both are logged.
    #[default]
    Compatible,
    /// 5xx responses fail with `Error::ServerStatus` and JSON encode
    /// failures fail with `Error::Encode`.
    Strict,
}

/// Configuration for [`HttpClient`](crate::HttpClient)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    /// Maximum idle connections kept per host. Passed to the pool unchanged.
    pub max_idle_conns_per_host: usize,
    /// Connection establishment timeout
    #[serde(rename = "connect_timeout_ms", with = "duration_ms")]
    pub connect_timeout: Duration,
    /// Overall request timeout, applied to every call
    #[serde(rename = "timeout_ms", with = "duration_ms")]
    pub timeout: Duration,
    /// TCP keep-alive interval
    #[serde(rename = "keep_alive_ms", with = "duration_ms")]
    pub keep_alive: Duration,
    /// How long an idle pooled connection is kept
    #[serde(rename = "idle_conn_timeout_ms", with = "duration_ms")]
    pub idle_conn_timeout: Duration,
    /// Accept invalid, self-signed or untrusted TLS certificates.
    ///
    /// Turning this on removes server authentication: any peer able to
    /// intercept the connection can impersonate the target host.
    pub accept_invalid_certs: bool,
    /// Cap on the materialized response payload, after decompression
    pub max_response_bytes: Option<usize>,
    /// Reporting policy for 5xx responses and payload encode failures
    pub error_policy: ErrorPolicy,
}

impl HttpClientConfig {
    /// Create an all-zero config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-host idle connection cap
    pub fn with_max_idle_conns_per_host(mut self, max: usize) -> Self {
        self.max_idle_conns_per_host = max;
        self
    }

    /// Set the connect timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the overall request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the TCP keep-alive interval
    pub fn with_keep_alive(mut self, interval: Duration) -> Self {
        self.keep_alive = interval;
        self
    }

    /// Set the idle connection expiry
    pub fn with_idle_conn_timeout(mut self, timeout: Duration) -> Self {
        self.idle_conn_timeout = timeout;
        self
    }

    /// Accept invalid TLS certificates. See [`HttpClientConfig::accept_invalid_certs`].
    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Cap response payloads at `limit` bytes
    pub fn with_max_response_bytes(mut self, limit: usize) -> Self {
        self.max_response_bytes = Some(limit);
        self
    }

    /// Set the error reporting policy
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }
}

/// `Some(duration)` unless it is zero
pub(crate) fn non_zero(duration: Duration) -> Option<Duration> {
    (!duration.is_zero()).then_some(duration)
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
