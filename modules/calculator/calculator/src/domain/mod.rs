//! Domain layer for calculator module
//!
//! Pure arithmetic plus the per-call accumulators used by the streaming handlers.

pub mod accumulators;
pub mod error;
pub mod service;

pub use accumulators::{PrimeFactors, RunningAverage, RunningMaximum};
pub use error::DomainError;
pub use service::Service;
