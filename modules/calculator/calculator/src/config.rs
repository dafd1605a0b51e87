//! Module configuration, read from `modules.calculator.config`.

use serde::{Deserialize, Serialize};

/// Starting value of the running maximum in `FindMaximum`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxSeed {
    /// Start at 0: a call whose values are all <= 0 emits nothing.
    #[default]
    Zero,
    /// No seed: the first value is always emitted.
    Unset,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalculatorConfig {
    pub find_maximum_seed: MaxSeed,
}
