//! gRPC Server implementation for calculator
//!
//! Handlers decode requests, delegate to the domain `Service` and map
//! `DomainError` to `InvalidArgument`. Streaming handlers own their
//! accumulator for the lifetime of the call.

use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::Stream;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Request, Response, Status, Streaming};
use tracing::{debug, info, warn};

use calculator_sdk::{
    AverageRequest, AverageResponse, CalculatorService, FactorizeRequest, FactorizeResponse,
    MaxRequest, MaxResponse, SquareRootRequest, SquareRootResponse, SumRequest, SumResponse,
};

use crate::domain::{DomainError, Service};

/// Responses buffered per `FindMaximum` call before the reader waits on the writer.
const RESPONSE_BUFFER: usize = 16;

pub type FactorStream = Pin<Box<dyn Stream<Item = Result<FactorizeResponse, Status>> + Send>>;
pub type MaximumStream = ReceiverStream<Result<MaxResponse, Status>>;

impl From<DomainError> for Status {
    fn from(err: DomainError) -> Self {
        Status::invalid_argument(err.to_string())
    }
}

/// gRPC service implementation that wraps the domain Service.
#[derive(Clone)]
pub struct CalculatorServiceImpl {
    service: Arc<Service>,
}

impl CalculatorServiceImpl {
    #[must_use]
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

fn log_read_failure(operation: &'static str, status: &Status) {
    warn!(
        operation,
        code = ?status.code(),
        message = status.message(),
        "failed to read from request stream"
    );
}

#[tonic::async_trait]
impl CalculatorService for CalculatorServiceImpl {
    async fn sum(&self, request: Request<SumRequest>) -> Result<Response<SumResponse>, Status> {
        let SumRequest { values } = request.into_inner();
        info!(count = values.len(), "sum invoked");

        let sum = self.service.sum(&values);
        Ok(Response::new(SumResponse { sum }))
    }

    async fn square_root(
        &self,
        request: Request<SquareRootRequest>,
    ) -> Result<Response<SquareRootResponse>, Status> {
        let number = request.into_inner().number;
        info!(number, "square_root invoked");

        let root = self.service.square_root(number).inspect_err(|err| {
            debug!(number, error = %err, "rejecting square root input");
        })?;
        Ok(Response::new(SquareRootResponse { root }))
    }

    type FactorizeStream = FactorStream;

    async fn factorize(
        &self,
        request: Request<FactorizeRequest>,
    ) -> Result<Response<Self::FactorizeStream>, Status> {
        let number = request.into_inner().number;
        info!(number, "factorize invoked");

        let factors = self.service.factorize(number).map(move |factor| {
            debug!(number, factor, "sending factor");
            Ok(FactorizeResponse { factor })
        });
        Ok(Response::new(Box::pin(tokio_stream::iter(factors))))
    }

    async fn compute_average(
        &self,
        request: Request<Streaming<AverageRequest>>,
    ) -> Result<Response<AverageResponse>, Status> {
        let mut inbound = request.into_inner();
        let mut running = self.service.average_accumulator();
        info!("compute_average invoked");

        while let Some(AverageRequest { value }) = inbound
            .message()
            .await
            .inspect_err(|status| log_read_failure("compute_average", status))?
        {
            running.push(value);
            debug!(value, average = ?running.current(), "average updated");
        }

        let average = running.finish()?;
        info!(average, "sending average");
        Ok(Response::new(AverageResponse { average }))
    }

    type FindMaximumStream = MaximumStream;

    async fn find_maximum(
        &self,
        request: Request<Streaming<MaxRequest>>,
    ) -> Result<Response<Self::FindMaximumStream>, Status> {
        let mut inbound = request.into_inner();
        let mut running = self.service.maximum_accumulator();
        let (tx, rx) = mpsc::channel(RESPONSE_BUFFER);
        info!("find_maximum invoked");

        tokio::spawn(async move {
            loop {
                match inbound.message().await {
                    Ok(Some(MaxRequest { value })) => {
                        let Some(max) = running.observe(value) else {
                            continue;
                        };
                        debug!(value, max, "new maximum");
                        if tx.send(Ok(MaxResponse { max })).await.is_err() {
                            debug!("response stream dropped by client");
                            return;
                        }
                    }
                    Ok(None) => {
                        debug!("request stream ended");
                        return;
                    }
                    Err(status) => {
                        log_read_failure("find_maximum", &status);
                        // Best effort: the client may already be gone.
                        let _ = tx.send(Err(status)).await;
                        return;
                    }
                }
            }
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use tokio_stream::StreamExt;
    use tonic::Code;

    use super::*;

    fn svc() -> CalculatorServiceImpl {
        CalculatorServiceImpl::new(Arc::new(Service::default()))
    }

    #[tokio::test]
    async fn test_sum_handler() {
        let resp = svc()
            .sum(Request::new(SumRequest {
                values: vec![12, 10, 20],
            }))
            .await
            .unwrap();
        assert_eq!(resp.into_inner().sum, 42);
    }

    #[tokio::test]
    async fn test_negative_square_root_maps_to_invalid_argument() {
        let status = svc()
            .square_root(Request::new(SquareRootRequest { number: -1 }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);
        assert_eq!(status.message(), "Received a negative number: -1");
    }

    #[tokio::test]
    async fn test_factorize_handler_streams_factors() {
        let stream = svc()
            .factorize(Request::new(FactorizeRequest { number: 120 }))
            .await
            .unwrap()
            .into_inner();
        let factors: Vec<i32> = stream.map(|r| r.unwrap().factor).collect().await;
        assert_eq!(factors, vec![2, 2, 2, 3, 5]);
    }

    #[test]
    fn test_domain_error_status_mapping() {
        let status = Status::from(DomainError::EmptyInput);
        assert_eq!(status.code(), Code::InvalidArgument);
        assert_eq!(status.message(), "no values received");
    }
}
