//! SHA-256 digests for cached artifacts.
//!
//! Every digest in depot is the lowercase hex encoding of a SHA-256 hash, whether
//! it was computed over an in-memory buffer, a file on disk, or a byte stream as
//! it was being written. The three sources are therefore directly comparable.
//!
//! # Example
//!
//! ```
//! use depot_verify::{digest_bytes, digests_match};
//!
//! let digest = digest_bytes(b"hello world");
//! assert!(digests_match(
//!     "B94D27B9934D3E08A52E52D7DA7DABFAC484EFE37A5380EE9088F7ACE2EFCDE9",
//!     &digest,
//! ));
//! ```

pub use self::digest::{digest_bytes, digest_file, digest_reader, digests_match, verify_file};
pub use self::error::{Result, VerifyError};
pub use self::hasher::{Hasher, Sha256Hasher};

mod digest;
mod error;
mod hasher;
