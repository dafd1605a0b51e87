//! gRPC transport helpers shared by the calculator server and its clients.
//!
//! - [`client`]: endpoint configuration and connection establishment
//! - [`rpc_retry`]: retry helper for idempotent unary calls
//! - [`server`]: TCP listener binding and graceful serving

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod client;
pub mod rpc_retry;
pub mod server;

pub use client::{GrpcClientConfig, connect_with_retry, connect_with_stack};
pub use rpc_retry::{RpcRetryConfig, call_with_retry, unary_request};
pub use server::{BoundListener, bind_tcp};

use std::time::Duration;

pub(crate) fn duration_to_u64_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
