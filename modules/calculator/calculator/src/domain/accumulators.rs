//! Per-call state for the streaming operations.
//!
//! A value of each type is created when a call starts and dropped with it;
//! none of them is shared between calls.

use crate::config::MaxSeed;
use crate::domain::DomainError;

/// Lazy trial-division factorization, ascending with multiplicity.
#[derive(Debug, Clone)]
pub struct PrimeFactors {
    remaining: i32,
    divisor: i32,
}

impl PrimeFactors {
    #[must_use]
    pub fn new(number: i32) -> Self {
        Self {
            remaining: number,
            divisor: 2,
        }
    }
}

impl Iterator for PrimeFactors {
    type Item = i32;

    #[allow(clippy::integer_division)]
    fn next(&mut self) -> Option<i32> {
        while self.remaining >= 2 {
            // No divisor left below sqrt(remaining): remaining is prime.
            if self.divisor > self.remaining / self.divisor {
                let prime = self.remaining;
                self.remaining = 1;
                return Some(prime);
            }
            if self.remaining % self.divisor == 0 {
                self.remaining /= self.divisor;
                return Some(self.divisor);
            }
            self.divisor += 1;
        }
        None
    }
}

/// Running truncated mean of the values received so far.
#[derive(Debug, Clone, Default)]
pub struct RunningAverage {
    sum: i64,
    count: i64,
}

impl RunningAverage {
    pub fn push(&mut self, value: i32) {
        self.sum += i64::from(value);
        self.count += 1;
    }

    /// `sum / count`, truncated toward zero. `None` before the first value.
    #[must_use]
    #[allow(clippy::integer_division)]
    pub fn current(&self) -> Option<i32> {
        if self.count == 0 {
            return None;
        }
        // The mean of i32 values always fits in i32.
        i32::try_from(self.sum / self.count).ok()
    }

    /// Average to report once input has ended.
    ///
    /// # Errors
    /// Returns [`DomainError::EmptyInput`] if no value was pushed.
    pub fn finish(&self) -> Result<i32, DomainError> {
        self.current().ok_or(DomainError::EmptyInput)
    }
}

/// Largest value seen so far in one `FindMaximum` call.
#[derive(Debug, Clone)]
pub struct RunningMaximum {
    current: Option<i32>,
}

impl RunningMaximum {
    #[must_use]
    pub fn new(seed: MaxSeed) -> Self {
        let current = match seed {
            MaxSeed::Zero => Some(0),
            MaxSeed::Unset => None,
        };
        Self { current }
    }

    /// Record `value`; returns the new maximum only if it strictly increased.
    pub fn observe(&mut self, value: i32) -> Option<i32> {
        if self.current.is_none_or(|max| value > max) {
            self.current = Some(value);
            return Some(value);
        }
        None
    }
}
