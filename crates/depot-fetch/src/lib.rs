//! Deduplicated, retrying, digest-verified artifact fetching.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable configuration and value types
//! - [`core`] - Pure computation: backoff delays, failure classification, parsing
//! - [`effects`] - I/O behind trait seams: HTTP, credentials, in-flight registry, fetcher
//!
//! # Guarantees
//!
//! - **Single flight**: concurrent [`Fetcher::fetch`] calls for one URL share a
//!   single transfer; later callers wait for the first one's outcome.
//! - **Verified placement**: a file appears under its cache path only after its
//!   SHA-256 matched and it was renamed into place whole.
//! - **Classified retry**: only transient failures (transport errors, 408, 425,
//!   429, 500, 502, 503, 504) are retried, with exponential backoff.

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use crate::core::{Attempt, Classify, RetryClass, classify_status};
pub use data::{Credential, CredentialSource, FetchConfig, RetryPolicy};
pub use effects::{
    BoxStream, Fetcher, HttpClient, HttpResponse, InFlightRegistry, LeaderGuard, Role, Settled,
    WaitError, Waiter,
};
pub use error::{FailureKind, FetchError, Result};

#[cfg(feature = "reqwest")]
pub use effects::ReqwestClient;

pub use depot_store::{Artifact, CacheStore};
