use std::time::Duration;

use anyhow::{Context, Result};
use depot_fetch::{Artifact, Fetcher, HttpClient, RetryPolicy};
use tracing::info;

#[derive(Debug, clap::Args)]
pub struct FetchArg {
    /// Artifact URL.
    pub url: String,

    /// Expected SHA-256 of the artifact, hex encoded.
    #[arg(long, value_name = "DIGEST")]
    pub sha256: String,

    /// Total attempts for transient failures.
    #[arg(long, default_value_t = 3)]
    pub attempts: u32,

    /// Delay before the second attempt, in milliseconds.
    #[arg(long, value_name = "MS", default_value_t = 500)]
    pub base_delay_ms: u64,

    /// Multiplier applied to the delay for each further attempt.
    #[arg(long, default_value_t = 2.0)]
    pub factor: f64,
}

impl FetchArg {
    pub fn retry_policy(&self) -> Result<RetryPolicy> {
        RetryPolicy::new(
            self.attempts,
            Duration::from_millis(self.base_delay_ms),
            self.factor,
        )
        .context("invalid retry options")
    }

    pub fn artifact(&self) -> Artifact { Artifact::new(&self.url, &self.sha256) }
}

/// Prints the cached path and returns whether the artifact was obtained.
pub async fn run<C: HttpClient>(fetcher: &Fetcher<C>, arg: &FetchArg) -> Result<bool> {
    let artifact = arg.artifact();
    let fetched = fetcher
        .fetch(&artifact)
        .await
        .with_context(|| format!("fetching {}", artifact))?;

    match fetched {
        Some(path) => {
            info!("{} is available at {}", artifact, path.display());
            println!("{}", path.display());
            Ok(true)
        }
        None => {
            eprintln!("{} is not available", artifact);
            Ok(false)
        }
    }
}
