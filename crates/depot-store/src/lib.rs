//! Content-addressed on-disk cache for fetched artifacts.
//!
//! Layout: `<root>/<sha256(url)>/<last path segment of url, or "artifact">`.
//! No index is kept beside the files; an entry is valid when the file exists
//! and its digest matches what the caller expects.

mod artifact;
mod error;
mod store;

pub use artifact::Artifact;
pub use error::{Result, StoreError};
pub use store::{CacheLocation, CacheStore, DEFAULT_FILE_NAME};

pub use depot_fs::StagedFile;
