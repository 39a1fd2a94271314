//! Immutable configuration and value types.

mod credential;
mod options;

pub use credential::{Credential, CredentialSource};
pub use options::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_FOLLOWER_TIMEOUT, DEFAULT_READ_TIMEOUT, DEFAULT_USER_AGENT,
    ENV_CACHE_DIR, ENV_CREDENTIALS, ENV_PASSWORD, ENV_ROOT, ENV_USER, FetchConfig, RetryPolicy,
};
