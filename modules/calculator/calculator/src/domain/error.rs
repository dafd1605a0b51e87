use thiserror::Error;

/// Input the calculator refuses to compute on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Received a negative number: {0}")]
    NegativeNumber(i32),

    #[error("no values received")]
    EmptyInput,
}
