//! I/O operations with trait abstraction.

mod credentials;
mod fetcher;
mod http;
mod inflight;
mod retry;

pub use fetcher::Fetcher;
pub use http::{BoxStream, HttpClient, HttpResponse};
pub use inflight::{InFlightRegistry, LeaderGuard, Role, Settled, WaitError, Waiter};

#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
