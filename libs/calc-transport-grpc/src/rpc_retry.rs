//! Retries for unary gRPC calls.
//!
//! Only `UNAVAILABLE` and `DEADLINE_EXCEEDED` are retried; every other code is
//! returned on the first failure. The wrapped call must be idempotent, so this
//! helper is never used for streaming calls whose accumulators reset per call.

use std::future::Future;
use std::time::Duration;

use tonic::{Code, Request, Status};
use tracing::Instrument;

use crate::client::GrpcClientConfig;
use crate::duration_to_u64_ms;

/// Retry policy for [`call_with_retry`].
#[derive(Debug, Clone, Copy)]
#[must_use]
pub struct RpcRetryConfig {
    /// Retries after the initial attempt.
    pub max_retries: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl From<&GrpcClientConfig> for RpcRetryConfig {
    fn from(cfg: &GrpcClientConfig) -> Self {
        Self {
            max_retries: cfg.max_retries,
            base_backoff: cfg.base_backoff,
            max_backoff: cfg.max_backoff,
        }
    }
}

impl RpcRetryConfig {
    fn backoff_for(self, attempt: u32) -> Duration {
        (self.base_backoff * attempt).min(self.max_backoff)
    }
}

/// Wrap `message` in a request carrying a `grpc-timeout` deadline.
///
/// Meant for unary calls only; streaming calls run as long as their input does.
#[must_use]
pub fn unary_request<T>(message: T, timeout: Duration) -> Request<T> {
    let mut request = Request::new(message);
    request.set_timeout(timeout);
    request
}

/// Whether a failed call may be attempted again.
#[must_use]
pub fn is_retryable(code: Code) -> bool {
    matches!(code, Code::Unavailable | Code::DeadlineExceeded)
}

/// Run a unary call, retrying transient failures with capped backoff.
///
/// `op_name` names the operation in spans and log events, e.g. `"calculator.sum"`.
///
/// # Errors
/// Returns the `Status` of the first non-retryable failure, or of the last
/// attempt once retries are exhausted.
pub async fn call_with_retry<TClient, F, Fut, Req, Res>(
    client: &mut TClient,
    cfg: RpcRetryConfig,
    req: Req,
    call: F,
    op_name: &'static str,
) -> Result<Res, Status>
where
    F: Fn(&mut TClient, Req) -> Fut,
    Fut: Future<Output = Result<Res, Status>>,
    Req: Clone,
{
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        let span = tracing::debug_span!("grpc_call", op = op_name, attempt);
        let status = match call(client, req.clone()).instrument(span).await {
            Ok(res) => {
                if attempt > 1 {
                    tracing::info!(op = op_name, attempt, "gRPC call succeeded after retries");
                }
                return Ok(res);
            }
            Err(status) => status,
        };

        if !is_retryable(status.code()) || attempt > cfg.max_retries {
            tracing::debug!(
                op = op_name,
                attempt,
                code = ?status.code(),
                message = %status.message(),
                "gRPC call failed, not retrying"
            );
            return Err(status);
        }

        let backoff = cfg.backoff_for(attempt);
        tracing::warn!(
            op = op_name,
            attempt,
            code = ?status.code(),
            backoff_ms = duration_to_u64_ms(backoff),
            "gRPC call failed, retrying"
        );
        tokio::time::sleep(backoff).await;
    }
}
