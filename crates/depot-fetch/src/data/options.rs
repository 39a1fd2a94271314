use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::data::CredentialSource;
use crate::error::{FetchError, Result};

/// Root of all depot state; defaults to `$HOME/.depot`.
pub const ENV_ROOT: &str = "DEPOT_ROOT";
/// Overrides the cache root (default `<root>/cache`).
pub const ENV_CACHE_DIR: &str = "DEPOT_CACHE_DIR";
/// Overrides the credentials file (default `<root>/credentials.properties`).
pub const ENV_CREDENTIALS: &str = "DEPOT_CREDENTIALS";
pub const ENV_USER: &str = "DEPOT_USER";
pub const ENV_PASSWORD: &str = "DEPOT_PASSWORD";

pub const DEFAULT_FOLLOWER_TIMEOUT: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
/// Longest silence tolerated while waiting for response bytes.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_USER_AGENT: &str = concat!("depot/", env!("CARGO_PKG_VERSION"));

const ROOT_DIR_NAME: &str = ".depot";
const CACHE_DIR_NAME: &str = "cache";
const CREDENTIALS_FILE_NAME: &str = "credentials.properties";

/// Attempt budget and exponential backoff for transient failures.
///
/// Attempt 1 starts immediately; attempt `k >= 2` waits
/// `base_delay * backoff_factor^(k - 2)` first.
///
/// # Examples
///
/// ```
/// use depot_fetch::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new(3, Duration::from_millis(100), 2.0).unwrap();
/// assert_eq!(policy.delay_before(1), Duration::ZERO);
/// assert_eq!(policy.delay_before(2), Duration::from_millis(100));
/// assert_eq!(policy.delay_before(3), Duration::from_millis(200));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    max_attempts:   u32,
    base_delay:     Duration,
    backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts:   3,
            base_delay:     Duration::from_millis(500),
            backoff_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, backoff_factor: f64) -> Result<Self> {
        if max_attempts == 0 {
            return Err(FetchError::InvalidConfig(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if !backoff_factor.is_finite() || backoff_factor < 1.0 {
            return Err(FetchError::InvalidConfig(format!(
                "backoff_factor must be a finite number >= 1.0, got {backoff_factor}"
            )));
        }
        Ok(Self {
            max_attempts,
            base_delay,
            backoff_factor,
        })
    }

    /// Exactly one attempt, never retried.
    pub fn once() -> Self {
        Self {
            max_attempts:   1,
            base_delay:     Duration::ZERO,
            backoff_factor: 1.0,
        }
    }

    pub fn max_attempts(&self) -> u32 { self.max_attempts }

    pub fn base_delay(&self) -> Duration { self.base_delay }

    pub fn backoff_factor(&self) -> f64 { self.backoff_factor }
}

/// Everything a [`Fetcher`](crate::Fetcher) needs, threaded explicitly.
///
/// ```
/// use depot_fetch::{FetchConfig, RetryPolicy};
/// use std::time::Duration;
///
/// let config = FetchConfig::new("/var/cache/depot")
///     .retry(RetryPolicy::once())
///     .follower_timeout(Duration::from_secs(30));
/// assert_eq!(config.retry.max_attempts(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct FetchConfig {
    pub cache_root:       PathBuf,
    pub credentials:      CredentialSource,
    pub retry:            RetryPolicy,
    /// Upper bound on how long a caller waits for another caller's fetch of the same URL.
    pub follower_timeout: Duration,
    pub connect_timeout:  Duration,
    /// Idle limit between reads; a long download that keeps making progress never hits it.
    pub read_timeout:     Duration,
    pub user_agent:       String,
}

impl FetchConfig {
    /// Defaults around an explicit cache root; credentials come only from the
    /// environment pair until a file is configured.
    pub fn new(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            cache_root:       cache_root.into(),
            credentials:      CredentialSource::new(ENV_USER, ENV_PASSWORD),
            retry:            RetryPolicy::default(),
            follower_timeout: DEFAULT_FOLLOWER_TIMEOUT,
            connect_timeout:  DEFAULT_CONNECT_TIMEOUT,
            read_timeout:     DEFAULT_READ_TIMEOUT,
            user_agent:       DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Resolve paths from `DEPOT_*` variables and the home directory.
    pub fn from_env() -> Result<Self> { Self::from_env_with(None) }

    /// [`FetchConfig::from_env`], with `cache_root` taking precedence over the
    /// environment when given.
    pub fn from_env_with(cache_root: Option<PathBuf>) -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), home::home_dir(), cache_root)
    }

    /// [`FetchConfig::from_env_with`] with the environment and home directory supplied.
    ///
    /// The depot root (`DEPOT_ROOT`, else `<home>/.depot`) is only required
    /// for the paths nobody set explicitly. Without a root the credentials
    /// file is disabled; without a cache root resolution fails.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        home: Option<PathBuf>,
        cache_root: Option<PathBuf>,
    ) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.is_empty()).map(PathBuf::from);

        let root = var(ENV_ROOT).or_else(|| home.map(|home| home.join(ROOT_DIR_NAME)));
        let cache_root = cache_root
            .or_else(|| var(ENV_CACHE_DIR))
            .or_else(|| root.as_ref().map(|root| root.join(CACHE_DIR_NAME)))
            .ok_or_else(|| {
                FetchError::InvalidConfig(format!(
                    "cannot determine home directory; set {ENV_ROOT} or {ENV_CACHE_DIR}"
                ))
            })?;
        let credentials_path = var(ENV_CREDENTIALS)
            .or_else(|| root.as_ref().map(|root| root.join(CREDENTIALS_FILE_NAME)));

        let mut config = Self::new(cache_root);
        config.credentials.path = credentials_path;
        Ok(config)
    }

    pub fn cache_root(mut self, cache_root: impl Into<PathBuf>) -> Self {
        self.cache_root = cache_root.into();
        self
    }

    pub fn credentials(mut self, credentials: CredentialSource) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn credentials_path(mut self, path: impl AsRef<Path>) -> Self {
        self.credentials.path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn follower_timeout(mut self, timeout: Duration) -> Self {
        self.follower_timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}
