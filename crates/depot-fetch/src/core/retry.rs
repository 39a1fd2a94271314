use std::time::Duration;

use crate::data::RetryPolicy;

/// HTTP statuses worth asking again for.
pub const TRANSIENT_STATUSES: [u16; 7] = [408, 425, 429, 500, 502, 503, 504];

/// Retry eligibility of a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryClass {
    /// Expected to clear up on its own; retried while attempts remain.
    Transient,
    /// A non-2xx status that asking again will not change.
    FatalHttp,
    /// Anything else.
    Fatal,
}

/// Implemented by error types the retry loop can drive.
pub trait Classify {
    fn retry_class(&self) -> RetryClass;
}

/// `None` for 2xx, otherwise the retry class of the status.
pub fn classify_status(status: u16) -> Option<RetryClass> {
    if (200..300).contains(&status) {
        None
    } else if TRANSIENT_STATUSES.contains(&status) {
        Some(RetryClass::Transient)
    } else {
        Some(RetryClass::FatalHttp)
    }
}

/// One pass through a retried operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attempt {
    /// 1-based.
    pub number:     u32,
    /// Message of the failure that caused this attempt.
    pub last_error: Option<String>,
}

impl Attempt {
    pub fn first() -> Self {
        Self {
            number:     1,
            last_error: None,
        }
    }

    pub fn next(&self, error: impl Into<String>) -> Self {
        Self {
            number:     self.number.saturating_add(1),
            last_error: Some(error.into()),
        }
    }

    pub fn is_retry(&self) -> bool { self.number > 1 }
}

impl RetryPolicy {
    /// Delay before `attempt` (1-based): zero for the first, then
    /// `base_delay * backoff_factor^(attempt - 2)`, saturating at `Duration::MAX`.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 || self.base_delay().is_zero() {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(attempt - 2).unwrap_or(i32::MAX);
        let nanos = self.base_delay().as_nanos() as f64 * self.backoff_factor().powi(exponent);
        if !nanos.is_finite() || nanos >= u64::MAX as f64 {
            return Duration::MAX;
        }
        Duration::from_nanos(nanos.round() as u64)
    }
}
