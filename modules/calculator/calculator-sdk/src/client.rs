//! gRPC implementation of `CalculatorClientV1`
//!
//! Each method is the client-side driver of one call shape. Unary calls go
//! through `call_with_retry` because both operations are pure, and each attempt
//! carries the `rpc_timeout` deadline. Streaming calls are never retried (each
//! call starts a fresh accumulator on the server) and have no deadline.

use std::time::Duration;

use async_trait::async_trait;
use calc_transport_grpc::{
    GrpcClientConfig, RpcRetryConfig, call_with_retry, connect_with_retry, unary_request,
};
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tonic::Response;
use tonic::transport::Channel;
use tracing::{debug, info};

use crate::api::{CalculatorClientV1, CalculatorError};
use crate::proto::calculator_service_client::CalculatorServiceClient;
use crate::proto::{
    AverageRequest, FactorizeRequest, MaxRequest, MaxResponse, SquareRootRequest, SumRequest,
};

const DEFAULT_STREAM_PACING: Duration = Duration::from_secs(1);

/// Requests buffered ahead of the wire in a bidirectional call.
const REQUEST_BUFFER: usize = 16;

/// gRPC client for `CalculatorService`.
///
/// Cheap to clone; clones share the underlying channel.
#[derive(Clone)]
pub struct CalculatorGrpcClient {
    inner: CalculatorServiceClient<Channel>,
    retry: RpcRetryConfig,
    rpc_timeout: Duration,
    stream_pacing: Duration,
}

impl CalculatorGrpcClient {
    /// Connect using `cfg` for timeouts and connection retries.
    ///
    /// # Errors
    /// Returns an error if no connection could be established.
    pub async fn connect(uri: impl Into<String>, cfg: &GrpcClientConfig) -> anyhow::Result<Self> {
        let channel: Channel = connect_with_retry(uri, cfg).await?;
        Ok(Self::from_channel(channel, cfg))
    }

    #[must_use]
    pub fn from_channel(channel: Channel, cfg: &GrpcClientConfig) -> Self {
        Self {
            inner: CalculatorServiceClient::new(channel),
            retry: RpcRetryConfig::from(cfg),
            rpc_timeout: cfg.rpc_timeout,
            stream_pacing: DEFAULT_STREAM_PACING,
        }
    }

    /// Delay between two requests of a streamed call. `Duration::ZERO` sends back to back.
    #[must_use]
    pub fn with_stream_pacing(mut self, pacing: Duration) -> Self {
        self.stream_pacing = pacing;
        self
    }
}

#[async_trait]
impl CalculatorClientV1 for CalculatorGrpcClient {
    async fn sum(&self, values: Vec<i32>) -> Result<i32, CalculatorError> {
        let mut client = self.inner.clone();
        let timeout = self.rpc_timeout;
        let response = call_with_retry(
            &mut client,
            self.retry,
            SumRequest { values },
            |c: &mut CalculatorServiceClient<Channel>, req: SumRequest| {
                let mut c = c.clone();
                let request = unary_request(req, timeout);
                async move { c.sum(request).await.map(Response::into_inner) }
            },
            "calculator.sum",
        )
        .await?;

        Ok(response.sum)
    }

    async fn square_root(&self, number: i32) -> Result<f64, CalculatorError> {
        let mut client = self.inner.clone();
        let timeout = self.rpc_timeout;
        let response = call_with_retry(
            &mut client,
            self.retry,
            SquareRootRequest { number },
            |c: &mut CalculatorServiceClient<Channel>, req: SquareRootRequest| {
                let mut c = c.clone();
                let request = unary_request(req, timeout);
                async move { c.square_root(request).await.map(Response::into_inner) }
            },
            "calculator.square_root",
        )
        .await?;

        Ok(response.root)
    }

    async fn factorize(&self, number: i32) -> Result<Vec<i32>, CalculatorError> {
        let mut responses = self
            .inner
            .clone()
            .factorize(FactorizeRequest { number })
            .await?
            .into_inner();

        let mut factors = Vec::new();
        while let Some(response) = responses.message().await? {
            debug!(number, factor = response.factor, "received factor");
            factors.push(response.factor);
        }
        debug!(number, count = factors.len(), "factor stream ended");

        Ok(factors)
    }

    async fn compute_average(&self, values: Vec<i32>) -> Result<i32, CalculatorError> {
        let requests = tokio_stream::iter(values)
            .map(|value| {
                debug!(value, "sending average input");
                AverageRequest { value }
            })
            .throttle(self.stream_pacing);

        let response = self.inner.clone().compute_average(requests).await?;
        Ok(response.into_inner().average)
    }

    async fn find_maximum(&self, values: Vec<i32>) -> Result<Vec<i32>, CalculatorError> {
        let (tx, rx) = mpsc::channel(REQUEST_BUFFER);
        let pacing = self.stream_pacing;
        let mut client = self.inner.clone();

        // Dropping `tx` at the end of this flow is the close-send signal.
        let send_flow = async move {
            for (index, value) in values.into_iter().enumerate() {
                if index > 0 {
                    tokio::time::sleep(pacing).await;
                }
                if tx.send(MaxRequest { value }).await.is_err() {
                    // The call is over; the receive flow reports why.
                    debug!(value, "request stream closed by the call, stopping send flow");
                    break;
                }
                debug!(value, "sent maximum input");
            }
            Ok::<(), CalculatorError>(())
        };

        let receive_flow = async move {
            let mut responses = client
                .find_maximum(ReceiverStream::new(rx))
                .await?
                .into_inner();

            let mut maxima = Vec::new();
            while let Some(MaxResponse { max }) = responses.message().await? {
                info!(max, "current maximum");
                maxima.push(max);
            }
            debug!(count = maxima.len(), "maximum stream ended");
            Ok::<_, CalculatorError>(maxima)
        };

        // Completes once both flows have, or as soon as either fails.
        let ((), maxima) = tokio::try_join!(send_flow, receive_flow)?;
        Ok(maxima)
    }
}
