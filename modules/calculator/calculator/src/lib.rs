//! Calculator Module
//!
//! gRPC service covering the four call shapes: unary (`Sum`, `SquareRoot`),
//! server streaming (`Factorize`), client streaming (`ComputeAverage`) and
//! bidirectional streaming (`FindMaximum`).
//!
//! ## Architecture
//!
//! - `domain/` - arithmetic and per-call accumulators
//! - `api/grpc/server.rs` - tonic handlers
//! - `config.rs` - `modules.calculator.config` section
//!
//! External consumers should use the `calculator-sdk` crate, which provides
//! the gRPC client drivers.

use std::sync::Arc;

use calculator_sdk::CalculatorServiceServer;
use tonic::service::{Routes, RoutesBuilder};

pub mod config;
pub use config::{CalculatorConfig, MaxSeed};

// === INTERNAL MODULES ===
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod domain;

pub use api::grpc::CalculatorServiceImpl;

/// Key of this module's section under `modules:` in the configuration.
pub const MODULE_NAME: &str = "calculator";

/// Build the tonic routes serving `CalculatorService` with `config`.
#[must_use]
pub fn routes(config: &CalculatorConfig) -> Routes {
    let service = Arc::new(domain::Service::new(config));
    let mut builder = RoutesBuilder::default();
    builder.add_service(CalculatorServiceServer::new(CalculatorServiceImpl::new(
        service,
    )));
    builder.routes()
}
