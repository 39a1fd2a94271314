use std::path::PathBuf;

use clap::{Parser, Subcommand};
use depot_fetch::FetchConfig;

pub mod cache;
pub mod digest;
pub mod fetch;

#[derive(Debug, Parser)]
#[command(name = "depot", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct App {
    #[command(subcommand)]
    pub cmd: Commands,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG wins when set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Cache directory, overriding DEPOT_CACHE_DIR and DEPOT_ROOT.
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(alias = "f", name = "fetch", about = "Fetch an artifact into the cache and print its path")]
    Fetch(fetch::FetchArg),
    #[command(alias = "d", name = "digest", about = "Print the SHA-256 of local files")]
    Digest(digest::DigestArg),
    #[command(name = "locate", about = "Print where an artifact is cached")]
    Locate(cache::LocateArg),
    #[command(name = "check", about = "Report whether a verified copy is cached, without network")]
    Check(cache::CheckArg),
    #[command(alias = "rm", name = "evict", about = "Remove an artifact's cache entry")]
    Evict(cache::EvictArg),
}

impl App {
    /// Configuration from the environment, with command-line overrides applied.
    ///
    /// With `--cache-dir` no home directory is needed.
    pub fn config(&self) -> depot_fetch::Result<FetchConfig> {
        FetchConfig::from_env_with(self.cache_dir.clone())
    }
}
