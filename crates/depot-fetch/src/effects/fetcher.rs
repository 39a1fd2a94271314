use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use depot_store::{Artifact, CacheStore, StagedFile};
use depot_verify::{Hasher, Sha256Hasher, digests_match};
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

use crate::core::Attempt;
use crate::data::{Credential, DEFAULT_FOLLOWER_TIMEOUT, RetryPolicy};
use crate::effects::http::HttpClient;
use crate::effects::inflight::{InFlightRegistry, Role, Settled, WaitError, Waiter};
use crate::error::{FailureKind, FetchError, Result};

const AUTHORIZATION: &str = "Authorization";

/// Fetches artifacts into a [`CacheStore`], one transfer per URL at a time.
pub struct Fetcher<C: HttpClient> {
    client:           C,
    store:            CacheStore,
    retry:            RetryPolicy,
    follower_timeout: Duration,
    credential:       Option<Credential>,
    in_flight:        Arc<InFlightRegistry>,
}

impl<C: HttpClient> Fetcher<C> {
    /// A fetcher with default retry policy, no credential and its own registry.
    pub fn new(client: C, store: CacheStore) -> Self {
        Self {
            client,
            store,
            retry: RetryPolicy::default(),
            follower_timeout: DEFAULT_FOLLOWER_TIMEOUT,
            credential: None,
            in_flight: Arc::new(InFlightRegistry::new()),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_follower_timeout(mut self, timeout: Duration) -> Self {
        self.follower_timeout = timeout;
        self
    }

    pub fn with_credential(mut self, credential: Option<Credential>) -> Self {
        self.credential = credential;
        self
    }

    /// Deduplicate against other fetchers sharing `registry`.
    pub fn with_registry(mut self, registry: Arc<InFlightRegistry>) -> Self {
        self.in_flight = registry;
        self
    }

    pub fn store(&self) -> &CacheStore { &self.store }

    pub fn registry(&self) -> &InFlightRegistry { &self.in_flight }

    pub fn client(&self) -> &C { &self.client }

    /// Return a verified local copy of `artifact`, downloading it if needed.
    ///
    /// - `Ok(Some(path))`: the cached file, whose digest matches.
    /// - `Ok(None)`: not available this time. The server refused it, its bytes
    ///   did not match, the local cache could not take it, or (for a caller
    ///   that joined another caller's fetch) that fetch failed or took too long.
    /// - `Err(_)`: transient failures persisted through every attempt, or the
    ///   request could not be formed at all.
    pub async fn fetch(&self, artifact: &Artifact) -> Result<Option<PathBuf>> {
        match self.in_flight.join_or_lead(artifact.url()) {
            Role::Follower(waiter) => Ok(self.follow(artifact, waiter).await),
            Role::Leader(leader) => {
                let outcome = self.lead(artifact).await;
                leader.publish(match &outcome {
                    Ok(Some(path)) => Settled::Ready(path.clone()),
                    _ => Settled::Absent,
                });
                outcome
            }
        }
    }

    async fn follow(&self, artifact: &Artifact, waiter: Waiter) -> Option<PathBuf> {
        debug!("joining in-flight fetch of {}", artifact);
        match waiter.wait(self.follower_timeout).await {
            Ok(Settled::Ready(path)) => Some(path),
            Ok(Settled::Absent) => {
                warn!("in-flight fetch of {} failed; nothing to share", artifact);
                None
            }
            Err(WaitError::TimedOut(timeout)) => {
                warn!(
                    "gave up waiting for in-flight fetch of {} after {:?}",
                    artifact, timeout
                );
                None
            }
            Err(WaitError::LeaderGone) => {
                warn!("in-flight fetch of {} ended without a result", artifact);
                None
            }
        }
    }

    async fn lead(&self, artifact: &Artifact) -> Result<Option<PathBuf>> {
        match self.acquire(artifact).await {
            Ok(path) => Ok(Some(path)),
            Err(err) => self.settle_failure(artifact, err),
        }
    }

    async fn acquire(&self, artifact: &Artifact) -> Result<PathBuf> {
        if let Some(path) = self.lookup(artifact).await? {
            return Ok(path);
        }

        let headers = self.request_headers();
        let headers = headers.as_slice();
        // The cache is not consulted again between attempts; it was a miss.
        let (staged, actual) = self
            .retry
            .run(move |attempt| self.download(artifact, headers, attempt))
            .await?;

        if !digests_match(artifact.expected_digest(), &actual) {
            return Err(FetchError::ChecksumMismatch {
                url: artifact.url().to_string(),
                expected: artifact.expected_digest().trim().to_ascii_lowercase(),
                actual,
            });
        }

        let path = self.commit(staged, artifact).await?;
        info!("fetched {} into {}", artifact, path.display());
        Ok(path)
    }

    /// One GET streamed into a fresh staging file, hashed on the way through.
    async fn download(
        &self,
        artifact: &Artifact,
        headers: &[(String, String)],
        attempt: Attempt,
    ) -> Result<(StagedFile, String)> {
        let url = artifact.url();
        debug!("GET {} (attempt {})", url, attempt.number);
        let network = |e: C::Error| {
            let (url, message) = (url.to_string(), e.to_string());
            if C::is_transient(&e) {
                FetchError::Network { url, message }
            } else {
                FetchError::Request { url, message }
            }
        };

        let response = self.client.get(url, headers).await.map_err(network)?;
        if !response.is_success() {
            return Err(FetchError::Http {
                url:     url.to_string(),
                status:  response.status,
                message: response.reason.unwrap_or_default(),
            });
        }

        let staged = self.store.stage()?;
        let write_err = |source| FetchError::Write {
            path: staged.path().to_path_buf(),
            source,
        };
        let mut file = tokio::fs::File::from_std(staged.writer()?);
        let mut hasher = Sha256Hasher::new();
        let mut received = 0u64;

        let mut body = response.body;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(network)?;
            hasher.update(&chunk);
            file.write_all(&chunk).await.map_err(write_err)?;
            received += chunk.len() as u64;
        }
        file.flush().await.map_err(write_err)?;
        file.sync_all().await.map_err(write_err)?;
        drop(file);

        debug!("received {} bytes for {}", received, url);
        Ok((staged, hasher.finalize_hex()))
    }

    /// Cache lookup on the blocking pool; verifying a hit hashes the whole file.
    async fn lookup(&self, artifact: &Artifact) -> Result<Option<PathBuf>> {
        let (store, artifact) = (self.store.clone(), artifact.clone());
        off_runtime(move || store.lookup(&artifact)).await
    }

    /// Commit on the blocking pool; the rename may sleep between retries.
    async fn commit(&self, staged: StagedFile, artifact: &Artifact) -> Result<PathBuf> {
        let (store, artifact) = (self.store.clone(), artifact.clone());
        off_runtime(move || store.commit(staged, &artifact)).await
    }

    fn request_headers(&self) -> Vec<(String, String)> {
        self.credential
            .iter()
            .map(|credential| (AUTHORIZATION.to_string(), credential.authorization_header()))
            .collect()
    }

    fn settle_failure(&self, artifact: &Artifact, err: FetchError) -> Result<Option<PathBuf>> {
        match err.kind() {
            FailureKind::Transient => {
                error!("fetch of {} failed after retries: {}", artifact, err);
                Err(err)
            }
            FailureKind::FatalHttp => {
                warn!("server refused {}: {}", artifact, err);
                Ok(None)
            }
            FailureKind::Verification => {
                error!("discarding download of {}: {}", artifact, err);
                Ok(None)
            }
            FailureKind::LocalIo => {
                error!("local cache error while fetching {}: {}", artifact, err);
                Ok(None)
            }
            FailureKind::Unclassified => {
                error!("fetch of {} failed: {}", artifact, err);
                Err(err)
            }
        }
    }
}

async fn off_runtime<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> depot_store::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| FetchError::Task(e.to_string()))?
        .map_err(FetchError::from)
}

#[cfg(feature = "reqwest")]
impl Fetcher<crate::effects::http::ReqwestClient> {
    /// Build the reqwest client and cache store, and resolve the credential once.
    pub fn from_config(config: &crate::data::FetchConfig) -> Result<Self> {
        let client = crate::effects::http::ReqwestClient::new(config)?;
        let credential = config.credentials.resolve()?;
        Ok(Self::new(client, CacheStore::new(&config.cache_root))
            .with_retry(config.retry)
            .with_follower_timeout(config.follower_timeout)
            .with_credential(credential))
    }
}
