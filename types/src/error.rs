//! Error categories shared by every crate's error type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse classification of a rejected operation.
///
/// Every rejection, whatever its category, leaves balances, slot counts and
/// commitment state unchanged. The core never retries on its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// The caller or actor violates an eligibility precondition.
    Authorization,
    /// Attempted outside the window in which it is legal.
    Timing,
    /// The data contradicts recorded state.
    Integrity,
    /// Not enough economic resources (actors, balance, stake).
    Capacity,
    /// The request itself is malformed (zero slots, threshold above quorum, ...).
    InvalidArgument,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authorization => "authorization",
            Self::Timing => "timing",
            Self::Integrity => "integrity",
            Self::Capacity => "capacity",
            Self::InvalidArgument => "invalid_argument",
        }
    }

    /// Whether retrying the same call later can succeed without changing it.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timing)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
