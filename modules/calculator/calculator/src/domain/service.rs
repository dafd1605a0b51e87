//! Domain service for calculator

use tracing::debug;

use crate::config::{CalculatorConfig, MaxSeed};
use crate::domain::{DomainError, PrimeFactors, RunningAverage, RunningMaximum};

/// Domain service behind every handler.
///
/// Holds only configuration. The unary operations are pure, and each
/// streaming call gets its own accumulator from the `*_accumulator` methods.
#[derive(Debug, Clone, Default)]
pub struct Service {
    max_seed: MaxSeed,
}

#[allow(clippy::unused_self)]
impl Service {
    #[must_use]
    pub fn new(config: &CalculatorConfig) -> Self {
        Self {
            max_seed: config.find_maximum_seed,
        }
    }

    /// Sum of `values`, wrapping on overflow.
    #[must_use]
    pub fn sum(&self, values: &[i32]) -> i32 {
        debug!(count = values.len(), "performing summation");
        values.iter().fold(0_i32, |acc, &v| acc.wrapping_add(v))
    }

    /// # Errors
    /// Returns [`DomainError::NegativeNumber`] for `number < 0`.
    pub fn square_root(&self, number: i32) -> Result<f64, DomainError> {
        if number < 0 {
            return Err(DomainError::NegativeNumber(number));
        }
        Ok(f64::from(number).sqrt())
    }

    #[must_use]
    pub fn factorize(&self, number: i32) -> PrimeFactors {
        PrimeFactors::new(number)
    }

    #[must_use]
    pub fn average_accumulator(&self) -> RunningAverage {
        RunningAverage::default()
    }

    #[must_use]
    pub fn maximum_accumulator(&self) -> RunningMaximum {
        RunningMaximum::new(self.max_seed)
    }
}
