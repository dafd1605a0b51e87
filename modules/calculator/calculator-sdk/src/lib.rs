//! Calculator SDK
//!
//! Everything needed to consume or host the calculator service:
//! - API trait (`CalculatorClientV1`) and error type (`CalculatorError`)
//! - gRPC client implementing the call drivers (`CalculatorGrpcClient`)
//! - Proto stubs for the server implementation
//!
//! ## Usage
//!
//! ```ignore
//! use calculator_sdk::{CalculatorClientV1, CalculatorGrpcClient};
//! use calc_transport_grpc::GrpcClientConfig;
//!
//! let cfg = GrpcClientConfig::new(calculator_sdk::SERVICE_NAME);
//! let client = CalculatorGrpcClient::connect("http://127.0.0.1:50051", &cfg).await?;
//! let maxima = client.find_maximum(vec![1, 15, 2, 17]).await?;
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

// === API TRAIT AND TYPES ===
mod api;
pub use api::{CalculatorClientV1, CalculatorError};

// === GRPC CLIENT ===
mod client;
pub use client::CalculatorGrpcClient;

// === GRPC PROTO STUBS (for server implementation) ===
/// Generated protobuf types for `CalculatorService`
#[allow(clippy::pedantic)]
pub mod proto {
    tonic::include_proto!("calculator.v1");
}

pub use proto::calculator_service_server::{CalculatorService, CalculatorServiceServer};
pub use proto::{
    AverageRequest, AverageResponse, FactorizeRequest, FactorizeResponse, MaxRequest,
    MaxResponse, SquareRootRequest, SquareRootResponse, SumRequest, SumResponse,
};

/// Fully qualified gRPC service name
pub const SERVICE_NAME: &str = "calculator.v1.CalculatorService";
