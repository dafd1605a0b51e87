//! End-to-end calls against a real tonic server on an ephemeral port.

use std::time::{Duration, Instant};

use calc_transport_grpc::{GrpcClientConfig, bind_tcp};
use calculator::{CalculatorConfig, MaxSeed};
use calculator_sdk::proto::calculator_service_server::CalculatorService;
use calculator_sdk::{
    AverageRequest, AverageResponse, CalculatorClientV1, CalculatorError, CalculatorGrpcClient,
    CalculatorServiceServer, FactorizeRequest, FactorizeResponse, MaxRequest, MaxResponse,
    SERVICE_NAME, SquareRootRequest, SquareRootResponse, SumRequest, SumResponse,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tonic::service::{Routes, RoutesBuilder};
use tonic::{Request, Response, Status, Streaming};

const MAX_INPUT: [i32; 13] = [1, 15, 2, 4, 17, 2, 15, 17, 20, 21, 23, 50, 10];

struct TestServer {
    endpoint: String,
    cancel: CancellationToken,
    handle: JoinHandle<anyhow::Result<()>>,
}

impl TestServer {
    async fn start(routes: Routes) -> Self {
        let listener = bind_tcp("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let endpoint = listener.endpoint();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(listener.serve(routes, cancel.clone()));
        Self {
            endpoint,
            cancel,
            handle,
        }
    }

    async fn client(&self) -> CalculatorGrpcClient {
        self.client_with(GrpcClientConfig::new(SERVICE_NAME).with_max_retries(5))
            .await
    }

    async fn client_with(&self, cfg: GrpcClientConfig) -> CalculatorGrpcClient {
        let cfg = cfg
            .with_backoff(Duration::from_millis(10), Duration::from_millis(50))
            .without_tracing();
        CalculatorGrpcClient::connect(self.endpoint.clone(), &cfg)
            .await
            .unwrap()
            .with_stream_pacing(Duration::ZERO)
    }

    async fn stop(self) {
        self.cancel.cancel();
        self.handle.await.unwrap().unwrap();
    }
}

async fn calculator(config: CalculatorConfig) -> TestServer {
    TestServer::start(calculator::routes(&config)).await
}

#[tokio::test]
async fn sum_adds_all_values() {
    let server = calculator(CalculatorConfig::default()).await;
    let client = server.client().await;

    assert_eq!(client.sum(vec![12, 10, 20]).await.unwrap(), 42);
    assert_eq!(client.sum(vec![-3, 3, -7]).await.unwrap(), -7);
    assert_eq!(client.sum(Vec::new()).await.unwrap(), 0);

    server.stop().await;
}

#[tokio::test]
async fn square_root_and_negative_rejection() {
    let server = calculator(CalculatorConfig::default()).await;
    let client = server.client().await;

    for n in [0, 1, 2, 10, 144, i32::MAX] {
        let root = client.square_root(n).await.unwrap();
        assert!(root >= 0.0);
        assert!((root * root - f64::from(n)).abs() <= f64::from(n) * 1e-12 + 1e-12, "n = {n}");
    }

    let err = client.square_root(-1).await.unwrap_err();
    assert!(err.is_invalid_argument());
    assert_eq!(
        err,
        CalculatorError::InvalidArgument("Received a negative number: -1".to_owned())
    );

    server.stop().await;
}

#[tokio::test]
async fn factorize_streams_prime_factors() {
    let server = calculator(CalculatorConfig::default()).await;
    let client = server.client().await;

    assert_eq!(client.factorize(120).await.unwrap(), vec![2, 2, 2, 3, 5]);
    assert_eq!(client.factorize(97).await.unwrap(), vec![97]);
    assert!(client.factorize(1).await.unwrap().is_empty());
    assert!(client.factorize(-12).await.unwrap().is_empty());

    server.stop().await;
}

#[tokio::test]
async fn compute_average_truncates() {
    let server = calculator(CalculatorConfig::default()).await;
    let client = server.client().await;

    assert_eq!(client.compute_average(vec![10, 20, 30]).await.unwrap(), 20);
    assert_eq!(client.compute_average(vec![10, 21]).await.unwrap(), 15);

    server.stop().await;
}

#[tokio::test]
async fn compute_average_of_nothing_is_invalid() {
    let server = calculator(CalculatorConfig::default()).await;
    let client = server.client().await;

    let err = client.compute_average(Vec::new()).await.unwrap_err();
    assert_eq!(
        err,
        CalculatorError::InvalidArgument("no values received".to_owned())
    );

    server.stop().await;
}

#[tokio::test]
async fn accumulators_reset_between_calls() {
    let server = calculator(CalculatorConfig::default()).await;
    let client = server.client().await;

    assert_eq!(client.compute_average(vec![100]).await.unwrap(), 100);
    assert_eq!(client.compute_average(vec![2, 4]).await.unwrap(), 3);

    assert_eq!(client.find_maximum(vec![50]).await.unwrap(), vec![50]);
    assert_eq!(client.find_maximum(vec![3, 1, 4]).await.unwrap(), vec![3, 4]);

    server.stop().await;
}

#[tokio::test]
async fn find_maximum_reports_each_new_maximum() {
    let server = calculator(CalculatorConfig::default()).await;
    let client = server.client().await;

    let maxima = client.find_maximum(MAX_INPUT.to_vec()).await.unwrap();
    assert_eq!(maxima, vec![1, 15, 17, 20, 21, 23, 50]);

    // Zero seed: nothing is reported for non-positive input.
    assert!(client.find_maximum(vec![-4, 0, -1]).await.unwrap().is_empty());
    assert!(client.find_maximum(Vec::new()).await.unwrap().is_empty());

    server.stop().await;
}

#[tokio::test]
async fn find_maximum_with_unset_seed_reports_first_value() {
    let server = calculator(CalculatorConfig {
        find_maximum_seed: MaxSeed::Unset,
    })
    .await;
    let client = server.client().await;

    assert_eq!(
        client.find_maximum(vec![-4, -9, -1]).await.unwrap(),
        vec![-4, -1]
    );

    server.stop().await;
}

#[tokio::test]
async fn concurrent_streams_do_not_share_state() {
    let server = calculator(CalculatorConfig::default()).await;
    let client = server.client().await;
    let paced = client.clone().with_stream_pacing(Duration::from_millis(5));

    let (a, b, avg) = tokio::join!(
        paced.find_maximum(vec![1, 2, 3]),
        paced.find_maximum(vec![30, 20, 10]),
        paced.compute_average(vec![7, 8, 9]),
    );
    assert_eq!(a.unwrap(), vec![1, 2, 3]);
    assert_eq!(b.unwrap(), vec![30]);
    assert_eq!(avg.unwrap(), 8);

    server.stop().await;
}

#[tokio::test]
async fn streamed_requests_are_paced() {
    let server = calculator(CalculatorConfig::default()).await;
    let pacing = Duration::from_millis(40);
    let client = server.client().await.with_stream_pacing(pacing);

    let started = Instant::now();
    assert_eq!(client.find_maximum(vec![1, 2, 3]).await.unwrap(), vec![1, 2, 3]);
    assert!(started.elapsed() >= pacing * 2);

    let started = Instant::now();
    assert_eq!(client.compute_average(vec![1, 2, 3]).await.unwrap(), 2);
    assert!(started.elapsed() >= pacing * 2);

    server.stop().await;
}

#[tokio::test]
async fn streams_may_outlast_the_unary_deadline() {
    let server = calculator(CalculatorConfig::default()).await;
    let client = server
        .client_with(
            GrpcClientConfig::new(SERVICE_NAME).with_rpc_timeout(Duration::from_millis(300)),
        )
        .await
        .with_stream_pacing(Duration::from_millis(100));
    let values: Vec<i32> = (1..=8).collect();

    // Each call takes ~700ms, more than twice the deadline.
    assert_eq!(client.compute_average(values.clone()).await.unwrap(), 4);
    assert_eq!(client.find_maximum(values.clone()).await.unwrap(), values);
    assert_eq!(client.sum(values).await.unwrap(), 36);

    server.stop().await;
}

/// Never answers `Sum` in time and fails every `FindMaximum` call after its
/// first request.
struct FaultyCalculator;

#[tonic::async_trait]
impl CalculatorService for FaultyCalculator {
    async fn sum(&self, _: Request<SumRequest>) -> Result<Response<SumResponse>, Status> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(Response::new(SumResponse { sum: 0 }))
    }

    async fn square_root(
        &self,
        _: Request<SquareRootRequest>,
    ) -> Result<Response<SquareRootResponse>, Status> {
        Err(Status::unimplemented("square_root"))
    }

    type FactorizeStream = ReceiverStream<Result<FactorizeResponse, Status>>;

    async fn factorize(
        &self,
        _: Request<FactorizeRequest>,
    ) -> Result<Response<Self::FactorizeStream>, Status> {
        Err(Status::unimplemented("factorize"))
    }

    async fn compute_average(
        &self,
        _: Request<Streaming<AverageRequest>>,
    ) -> Result<Response<AverageResponse>, Status> {
        Err(Status::unimplemented("compute_average"))
    }

    type FindMaximumStream = ReceiverStream<Result<MaxResponse, Status>>;

    async fn find_maximum(
        &self,
        request: Request<Streaming<MaxRequest>>,
    ) -> Result<Response<Self::FindMaximumStream>, Status> {
        let mut inbound = request.into_inner();
        let (tx, rx) = mpsc::channel(4);
        tokio::spawn(async move {
            let _ = inbound.message().await;
            let _ = tx.send(Err(Status::internal("accumulator lost"))).await;
        });
        Ok(Response::new(ReceiverStream::new(rx)))
    }
}

#[tokio::test]
async fn find_maximum_failure_unblocks_the_send_flow() {
    let mut builder = RoutesBuilder::default();
    builder.add_service(CalculatorServiceServer::new(FaultyCalculator));
    let server = TestServer::start(builder.routes()).await;

    // Sending everything would take ~10s at this pacing.
    let client = server
        .client()
        .await
        .with_stream_pacing(Duration::from_millis(100));

    let result = tokio::time::timeout(
        Duration::from_secs(3),
        client.find_maximum((0..100).collect()),
    )
    .await
    .expect("driver must not wait for the send flow after a failure");

    let err = result.unwrap_err();
    assert!(!err.is_invalid_argument());
    assert!(matches!(&err, CalculatorError::Transport(m) if m.contains("accumulator lost")));

    server.stop().await;
}

#[tokio::test]
async fn unary_calls_are_bounded_by_the_deadline() {
    let mut builder = RoutesBuilder::default();
    builder.add_service(CalculatorServiceServer::new(FaultyCalculator));
    let server = TestServer::start(builder.routes()).await;

    let client = server
        .client_with(
            GrpcClientConfig::new(SERVICE_NAME)
                .with_rpc_timeout(Duration::from_millis(200))
                .with_max_retries(0),
        )
        .await;

    let result = tokio::time::timeout(Duration::from_secs(3), client.sum(vec![1, 2]))
        .await
        .expect("sum must give up once its deadline passes");
    let err = result.unwrap_err();
    assert!(matches!(err, CalculatorError::Transport(_)), "unexpected error: {err}");

    server.stop().await;
}
