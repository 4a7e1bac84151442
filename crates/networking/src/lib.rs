//! Networking utilities
//!
//! This crate provides a pooled HTTP client with verb helpers, context-scoped
//! timeouts and transparent gzip response decompression.
//!
//! ```no_run
//! use networking::{mime, Context, HttpClient, HttpClientConfig};
//! use std::time::Duration;
//!
//! async fn example() -> networking::Result<()> {
//!     let config = HttpClientConfig::new()
//!         .with_timeout(Duration::from_secs(2))
//!         .with_max_idle_conns_per_host(16);
//!     let client = HttpClient::new(config)?;
//!
//!     let ctx = Context::background();
//!     let payload = serde_json::json!({"a": 1});
//!     let body = client
//!         .post(&ctx, "http://localhost:8080/items", mime::JSON, None, &payload)
//!         .await?;
//!     println!("{} bytes", body.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod body;
pub mod client;
pub mod config;
pub mod context;
pub mod mime;
pub mod response;

pub use client::HttpClient;
pub use config::{ErrorPolicy, HttpClientConfig};
pub use context::Context;

use reqwest::{Method, StatusCode};

/// Result type for HTTP client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Reason a [`Context`] finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    /// The context was cancelled
    #[error("context canceled")]
    Cancelled,

    /// The context deadline passed
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Error types for HTTP client operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request could not be built (malformed URL, bad header value)
    #[error("{method} - request creation failed: {source}")]
    Build {
        /// Verb of the request that failed
        method: Method,
        /// Underlying cause
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Network or transport failure
    #[error("Network error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The execution context was cancelled or ran past its deadline
    #[error(transparent)]
    Context(#[from] ContextError),

    /// Server answered with a 5xx status (strict policy only)
    #[error("Server error: {status}")]
    ServerStatus {
        /// Status returned by the server
        status: StatusCode,
    },

    /// Payload could not be encoded for its content type (strict policy only)
    #[error("Failed to encode {content_type} payload: {source}")]
    Encode {
        /// Content type the payload was encoded for
        content_type: String,
        /// Serializer error
        #[source]
        source: serde_json::Error,
    },

    /// Reading the response body failed
    #[error("Failed to read response body: {0}")]
    Body(#[source] reqwest::Error),

    /// Decompressing a gzip response failed
    #[error("Failed to decompress response body: {0}")]
    Decompress(#[source] std::io::Error),

    /// Response payload is larger than the configured cap
    #[error("Response body exceeds {limit} bytes")]
    TooLarge {
        /// Configured cap in bytes
        limit: usize,
    },
}

impl Error {
    /// Whether the call ended because its deadline passed
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Context(ContextError::DeadlineExceeded))
    }

    /// Whether the call ended because its context was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Context(ContextError::Cancelled))
    }
}
