use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use depot_fetch::Fetcher;
use depot_store::CacheStore;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{App, Commands};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let app = App::parse();
    init_logging(app.verbose);

    match &app.cmd {
        Commands::Fetch(arg) => {
            let config = app.config()?.retry(arg.retry_policy()?);
            let fetcher = Fetcher::from_config(&config).context("setting up the fetcher")?;
            cli::fetch::run(&fetcher, arg).await.map(exit_code)
        }
        Commands::Digest(arg) => cli::digest::run(arg).map(|()| ExitCode::SUCCESS),
        Commands::Locate(arg) => cli::cache::locate(&store(&app)?, arg).map(|()| ExitCode::SUCCESS),
        Commands::Check(arg) => cli::cache::check(&store(&app)?, arg).map(exit_code),
        Commands::Evict(arg) => cli::cache::evict(&store(&app)?, arg).map(|()| ExitCode::SUCCESS),
    }
}

fn store(app: &App) -> Result<CacheStore> { Ok(CacheStore::new(app.config()?.cache_root)) }

fn exit_code(ok: bool) -> ExitCode { if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE } }

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();
}
