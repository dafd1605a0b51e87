//! Calculator API trait and types

use async_trait::async_trait;
use tonic::{Code, Status};

/// Calculator API trait
///
/// One method per operation. Streaming methods take the whole request
/// sequence up front; how it is paced on the wire is up to the implementation.
#[async_trait]
pub trait CalculatorClientV1: Send + Sync {
    /// Sum of `values`; an empty list sums to 0.
    async fn sum(&self, values: Vec<i32>) -> Result<i32, CalculatorError>;

    /// Square root of `number`. Negative input yields [`CalculatorError::InvalidArgument`].
    async fn square_root(&self, number: i32) -> Result<f64, CalculatorError>;

    /// Prime factors of `number` in ascending order, with multiplicity.
    async fn factorize(&self, number: i32) -> Result<Vec<i32>, CalculatorError>;

    /// Truncated running average after the last value.
    async fn compute_average(&self, values: Vec<i32>) -> Result<i32, CalculatorError>;

    /// Every new maximum the server reported, in arrival order.
    async fn find_maximum(&self, values: Vec<i32>) -> Result<Vec<i32>, CalculatorError>;
}

/// Error type for calculator operations
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CalculatorError {
    /// Rejected by the service; retrying the same input fails again.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("gRPC transport error: {0}")]
    Transport(String),
}

impl CalculatorError {
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

impl From<Status> for CalculatorError {
    fn from(status: Status) -> Self {
        match status.code() {
            Code::InvalidArgument => Self::InvalidArgument(status.message().to_owned()),
            code => Self::Transport(format!("{code:?}: {}", status.message())),
        }
    }
}
