//! Pure computation shared by the effectful layer.

mod properties;
mod retry;

pub use properties::parse_properties;
pub use retry::{Attempt, Classify, RetryClass, TRANSIENT_STATUSES, classify_status};
