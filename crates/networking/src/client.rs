//! Pooled HTTP client
//!
//! [`HttpClient`] wraps one pooled transport and funnels the verb helpers
//! into a single execution routine that applies the configured timeout,
//! reads the whole body and decompresses gzip responses.

use crate::config::{non_zero, ErrorPolicy, HttpClientConfig};
use crate::{body, response, Context, Error, Result};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client as ReqwestClient, Method, Request};
use serde::Serialize;
use std::future::Future;
use tracing::instrument::WithSubscriber;
use tracing::Dispatch;

/// HTTP client with per-verb helpers
///
/// Cheap to clone; clones share the connection pool. Safe to use from many
/// tasks at once.
///
/// # Examples
/// ```no_run
/// use networking::{Context, HttpClient, HttpClientConfig};
/// use std::time::Duration;
///
/// async fn example() -> Result<(), Box<dyn std::error::Error>> {
///     let config = HttpClientConfig::new()
///         .with_timeout(Duration::from_secs(2))
///         .with_max_idle_conns_per_host(16)
///         .with_idle_conn_timeout(Duration::from_secs(90));
///     let client = HttpClient::new(config)?;
///
///     let ctx = Context::background();
///     let body = client.get(&ctx, "https://example.com/status", None).await?;
///     println!("{}", String::from_utf8_lossy(&body));
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    config: HttpClientConfig,
    logger: Option<Dispatch>,
}

impl HttpClient {
    /// Create a client from `config`
    ///
    /// # Errors
    /// Returns [`Error::Transport`] if the TLS backend cannot be initialised.
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        Self::from_parts(config, None)
    }

    /// Create a client whose log events, including those emitted while it is
    /// constructed, go to `logger` instead of the global default subscriber
    ///
    /// # Errors
    /// Returns [`Error::Transport`] if the TLS backend cannot be initialised.
    pub fn new_with_logger(config: HttpClientConfig, logger: impl Into<Dispatch>) -> Result<Self> {
        Self::from_parts(config, Some(logger.into()))
    }

    fn from_parts(config: HttpClientConfig, logger: Option<Dispatch>) -> Result<Self> {
        let mut builder = ReqwestClient::builder()
            .pool_max_idle_per_host(config.max_idle_conns_per_host)
            .pool_idle_timeout(non_zero(config.idle_conn_timeout))
            .tcp_keepalive(non_zero(config.keep_alive))
            .danger_accept_invalid_certs(config.accept_invalid_certs);

        if let Some(timeout) = non_zero(config.connect_timeout) {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = non_zero(config.timeout) {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(Error::Transport)?;

        if config.accept_invalid_certs {
            let warn = || {
                tracing::warn!("TLS certificate verification is disabled for this client");
            };
            match &logger {
                Some(logger) => tracing::dispatcher::with_default(logger, warn),
                None => warn(),
            }
        }

        Ok(Self {
            client,
            config,
            logger,
        })
    }

    /// Get the client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// GET `url`
    ///
    /// `headers` are sent as given.
    pub async fn get(
        &self,
        ctx: &Context,
        url: &str,
        headers: Option<HeaderMap>,
    ) -> Result<Vec<u8>> {
        self.logged(async {
            let request = self.build(Method::GET, url, headers.unwrap_or_default(), None)?;
            self.run(ctx, request).await
        })
        .await
    }

    /// POST `payload` to `url`, encoded for `content_type`
    pub async fn post<P>(
        &self,
        ctx: &Context,
        url: &str,
        content_type: &str,
        headers: Option<HeaderMap>,
        payload: &P,
    ) -> Result<Vec<u8>>
    where
        P: Serialize + ?Sized,
    {
        self.write(Method::POST, ctx, url, content_type, headers, payload).await
    }

    /// PUT `payload` to `url`, encoded for `content_type`
    pub async fn put<P>(
        &self,
        ctx: &Context,
        url: &str,
        content_type: &str,
        headers: Option<HeaderMap>,
        payload: &P,
    ) -> Result<Vec<u8>>
    where
        P: Serialize + ?Sized,
    {
        self.write(Method::PUT, ctx, url, content_type, headers, payload).await
    }

    /// PATCH `url` with `payload`, encoded for `content_type`
    pub async fn patch<P>(
        &self,
        ctx: &Context,
        url: &str,
        content_type: &str,
        headers: Option<HeaderMap>,
        payload: &P,
    ) -> Result<Vec<u8>>
    where
        P: Serialize + ?Sized,
    {
        self.write(Method::PATCH, ctx, url, content_type, headers, payload).await
    }

    /// DELETE `url`
    ///
    /// `content_type` is sent as the `Content-Type` header; the request never
    /// carries a body.
    pub async fn delete(
        &self,
        ctx: &Context,
        url: &str,
        content_type: &str,
        headers: Option<HeaderMap>,
    ) -> Result<Vec<u8>> {
        self.logged(async {
            let headers = with_content_type(Method::DELETE, headers, content_type)?;
            let request = self.build(Method::DELETE, url, headers, None)?;
            self.run(ctx, request).await
        })
        .await
    }

    /// Execute a prepared request under `ctx` and the configured timeout
    ///
    /// # Errors
    /// - [`Error::Context`] when `ctx` is cancelled or the deadline passes
    /// - [`Error::Transport`] on network failure
    /// - [`Error::ServerStatus`] on 5xx under [`ErrorPolicy::Strict`]
    /// - [`Error::Body`], [`Error::Decompress`] or [`Error::TooLarge`] while
    ///   reading the body
    pub async fn execute(&self, ctx: &Context, request: Request) -> Result<Vec<u8>> {
        self.logged(self.run(ctx, request)).await
    }

    async fn write<P>(
        &self,
        method: Method,
        ctx: &Context,
        url: &str,
        content_type: &str,
        headers: Option<HeaderMap>,
        payload: &P,
    ) -> Result<Vec<u8>>
    where
        P: Serialize + ?Sized,
    {
        self.logged(async {
            let body = self.encode(content_type, payload)?;
            let headers = with_content_type(method.clone(), headers, content_type)?;
            let request = self.build(method, url, headers, body)?;
            self.run(ctx, request).await
        })
        .await
    }

    fn encode<P>(&self, content_type: &str, payload: &P) -> Result<Option<Vec<u8>>>
    where
        P: Serialize + ?Sized,
    {
        match body::encode(content_type, payload) {
            Ok(body) => Ok(body),
            Err(source) => match self.config.error_policy {
                ErrorPolicy::Strict => Err(Error::Encode {
                    content_type: content_type.to_string(),
                    source,
                }),
                ErrorPolicy::Compatible => {
                    tracing::warn!(
                        content_type,
                        error = %source,
                        "failed to encode request payload; sending no body"
                    );
                    Ok(None)
                }
            },
        }
    }

    fn build(
        &self,
        method: Method,
        url: &str,
        headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<Request> {
        let mut builder = self.client.request(method.clone(), url).headers(headers);
        if let Some(body) = body {
            builder = builder.body(body);
        }
        builder.build().map_err(|source| Error::Build {
            method,
            source: Box::new(source),
        })
    }

    async fn run(&self, ctx: &Context, request: Request) -> Result<Vec<u8>> {
        let scoped = match non_zero(self.config.timeout) {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx.child(),
        };

        let method = request.method().clone();
        let url = request.url().clone();
        tracing::debug!(%method, %url, "sending request");

        let result = scoped.run(self.round_trip(request)).await;
        match &result {
            Ok(body) => tracing::debug!(%method, %url, bytes = body.len(), "request complete"),
            Err(err) => tracing::debug!(%method, %url, error = %err, "request failed"),
        }
        result
    }

    async fn round_trip(&self, request: Request) -> Result<Vec<u8>> {
        let url = request.url().clone();
        let response = self.client.execute(request).await.map_err(Error::Transport)?;

        let status = response.status();
        if status.as_u16() >= 500 {
            return match self.config.error_policy {
                ErrorPolicy::Strict => Err(Error::ServerStatus { status }),
                ErrorPolicy::Compatible => {
                    tracing::warn!(%status, %url, "server error response; discarding body");
                    Ok(Vec::new())
                }
            };
        }

        response::read_body(response, self.config.max_response_bytes).await
    }

    async fn logged<F: Future>(&self, work: F) -> F::Output {
        match &self.logger {
            Some(logger) => work.with_subscriber(logger.clone()).await,
            None => work.await,
        }
    }
}

fn with_content_type(
    method: Method,
    headers: Option<HeaderMap>,
    content_type: &str,
) -> Result<HeaderMap> {
    let value = HeaderValue::from_str(content_type).map_err(|source| Error::Build {
        method,
        source: Box::new(source),
    })?;
    let mut headers = headers.unwrap_or_default();
    headers.insert(CONTENT_TYPE, value);
    Ok(headers)
}
