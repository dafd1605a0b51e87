//! gRPC client transport configuration and connection utilities.
//!
//! Responsible only for the channel: connect/RPC timeouts, HTTP/2 keepalive
//! and retrying the initial connection. Retrying individual calls lives in
//! [`crate::rpc_retry`].

use std::time::Duration;

use anyhow::Context;
use tonic::transport::{Channel, Endpoint};
use tracing::Instrument;

use crate::duration_to_u64_ms;

/// Transport settings for a gRPC client.
///
/// `max_retries`, `base_backoff` and `max_backoff` drive both
/// [`connect_with_retry`] and, through [`crate::RpcRetryConfig`], unary call retries.
#[derive(Debug, Clone)]
pub struct GrpcClientConfig {
    /// Timeout for establishing the connection.
    pub connect_timeout: Duration,

    /// Deadline for a single unary call, set per request with [`crate::unary_request`].
    ///
    /// Not applied to the channel: a channel-wide timeout runs until response
    /// headers, which a client-streaming call only receives after all its input.
    pub rpc_timeout: Duration,

    /// Retry attempts after the first failure.
    pub max_retries: u32,

    /// Backoff unit; attempt `n` waits `base_backoff * n`.
    pub base_backoff: Duration,

    /// Upper bound for a single backoff.
    pub max_backoff: Duration,

    /// Service name used in spans and log fields.
    pub service_name: &'static str,

    /// Emit an `info` event once the channel is up.
    pub enable_tracing: bool,
}

impl Default for GrpcClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            rpc_timeout: Duration::from_secs(30),
            max_retries: 3,
            base_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
            service_name: "grpc_client",
            enable_tracing: true,
        }
    }
}

impl GrpcClientConfig {
    /// Create a configuration with defaults for the given service.
    #[must_use]
    pub fn new(service_name: &'static str) -> Self {
        Self {
            service_name,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_rpc_timeout(mut self, timeout: Duration) -> Self {
        self.rpc_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    #[must_use]
    pub fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.base_backoff = base;
        self.max_backoff = max;
        self
    }

    #[must_use]
    pub fn without_tracing(mut self) -> Self {
        self.enable_tracing = false;
        self
    }

    /// Backoff before retry number `attempt` (1-based), capped at `max_backoff`.
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        (self.base_backoff * attempt).min(self.max_backoff)
    }
}

fn build_endpoint(uri: String, cfg: &GrpcClientConfig) -> Result<Endpoint, tonic::transport::Error> {
    let endpoint = Endpoint::from_shared(uri)?
        .connect_timeout(cfg.connect_timeout)
        .tcp_keepalive(Some(Duration::from_secs(30)))
        .http2_keep_alive_interval(Duration::from_secs(30))
        .keep_alive_timeout(Duration::from_secs(10))
        .keep_alive_while_idle(true);

    Ok(endpoint)
}

/// Connect once, without retries.
///
/// # Errors
/// Returns an error if the URI is invalid or the connection cannot be established.
pub async fn connect_with_stack<TClient>(
    uri: impl Into<String>,
    cfg: &GrpcClientConfig,
) -> anyhow::Result<TClient>
where
    TClient: From<Channel>,
{
    let uri = uri.into();
    let span = tracing::debug_span!("grpc_connect", service = cfg.service_name, uri = %uri);

    async move {
        let channel = build_endpoint(uri, cfg)?.connect().await?;

        if cfg.enable_tracing {
            tracing::info!(
                service = cfg.service_name,
                connect_timeout_ms = duration_to_u64_ms(cfg.connect_timeout),
                unary_timeout_ms = duration_to_u64_ms(cfg.rpc_timeout),
                "gRPC client connected"
            );
        }

        Ok(TClient::from(channel))
    }
    .instrument(span)
    .await
}

/// Connect, retrying up to `cfg.max_retries` times with capped linear backoff.
///
/// # Errors
/// Returns the last connection error once all attempts are exhausted.
pub async fn connect_with_retry<TClient>(
    uri: impl Into<String>,
    cfg: &GrpcClientConfig,
) -> anyhow::Result<TClient>
where
    TClient: From<Channel>,
{
    let uri = uri.into();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        match connect_with_stack::<TClient>(uri.as_str(), cfg).await {
            Ok(client) => {
                if attempt > 1 {
                    tracing::info!(
                        service = cfg.service_name,
                        attempt,
                        "gRPC connection established after retries"
                    );
                }
                return Ok(client);
            }
            Err(e) if attempt <= cfg.max_retries => {
                let backoff = cfg.backoff_for(attempt);
                tracing::warn!(
                    service = cfg.service_name,
                    attempt,
                    max_retries = cfg.max_retries,
                    error = %e,
                    backoff_ms = duration_to_u64_ms(backoff),
                    "gRPC connection failed, retrying"
                );
                tokio::time::sleep(backoff).await;
            }
            Err(e) => {
                tracing::error!(
                    service = cfg.service_name,
                    attempt,
                    error = %e,
                    "gRPC connection failed after all retries"
                );
                return Err(e).context(format!(
                    "failed to connect to {} at {uri} after {attempt} attempts",
                    cfg.service_name
                ));
            }
        }
    }
}
