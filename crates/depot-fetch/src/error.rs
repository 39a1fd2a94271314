//! Error types for depot-fetch.

use std::io;
use std::path::PathBuf;

use depot_store::StoreError;
use thiserror::Error;

use crate::core::{Classify, RetryClass, classify_status};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },

    /// The client refused or could not complete the request for a reason
    /// retrying will not change (bad URL scheme, redirect loop, undecodable body).
    #[error("request for {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("HTTP {status} {message} for {url}")]
    Http {
        url:     String,
        status:  u16,
        message: String,
    },

    #[error("checksum mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        url:      String,
        expected: String,
        actual:   String,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read credentials from {path}: {source}")]
    Credentials {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("background task failed: {0}")]
    Task(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<depot_fs::Error> for FetchError {
    fn from(e: depot_fs::Error) -> Self { FetchError::Store(StoreError::Fs(e)) }
}

/// How the fetcher treats a failure once retrying is over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// Transport failure or retryable status; propagated once attempts run out.
    Transient,
    /// Non-retryable HTTP status; resolved to absence.
    FatalHttp,
    /// Downloaded bytes did not match the expected digest; resolved to absence.
    Verification,
    /// Cache directory, staging or commit trouble; resolved to absence.
    LocalIo,
    /// Anything else; propagated without retry.
    Unclassified,
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::Network { .. } => FailureKind::Transient,
            FetchError::Http { status, .. } => match classify_status(*status) {
                Some(RetryClass::Transient) => FailureKind::Transient,
                _ => FailureKind::FatalHttp,
            },
            FetchError::ChecksumMismatch { .. } => FailureKind::Verification,
            FetchError::Write { .. } => FailureKind::LocalIo,
            FetchError::Store(StoreError::Fs(_) | StoreError::Verify(_)) => FailureKind::LocalIo,
            FetchError::Store(StoreError::InvalidUrl { .. })
            | FetchError::Request { .. }
            | FetchError::Task(_)
            | FetchError::InvalidConfig(_)
            | FetchError::Client(_)
            | FetchError::Credentials { .. } => FailureKind::Unclassified,
        }
    }
}

impl Classify for FetchError {
    fn retry_class(&self) -> RetryClass {
        match self.kind() {
            FailureKind::Transient => RetryClass::Transient,
            FailureKind::FatalHttp => RetryClass::FatalHttp,
            _ => RetryClass::Fatal,
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
