use anyhow::{Context, Result};
use depot_store::{Artifact, CacheStore};

#[derive(Debug, clap::Args)]
pub struct LocateArg {
    /// Artifact URL.
    pub url: String,
}

#[derive(Debug, clap::Args)]
pub struct CheckArg {
    /// Artifact URL.
    pub url: String,

    /// Expected SHA-256 of the artifact, hex encoded.
    #[arg(long, value_name = "DIGEST")]
    pub sha256: String,
}

#[derive(Debug, clap::Args)]
pub struct EvictArg {
    /// Artifact URL.
    pub url: String,
}

pub fn locate(store: &CacheStore, arg: &LocateArg) -> Result<()> {
    let location = store.location_for_url(&arg.url)?;
    println!("{}", location.file.display());
    Ok(())
}

/// Prints the verdict and returns whether a verified copy is cached.
pub fn check(store: &CacheStore, arg: &CheckArg) -> Result<bool> {
    let artifact = Artifact::new(&arg.url, &arg.sha256);
    match store
        .lookup(&artifact)
        .with_context(|| format!("checking cache for {}", artifact))?
    {
        Some(path) => {
            println!("hit {}", path.display());
            Ok(true)
        }
        None => {
            println!("miss");
            Ok(false)
        }
    }
}

pub fn evict(store: &CacheStore, arg: &EvictArg) -> Result<()> {
    if store.evict(&arg.url)? {
        println!("evicted {}", arg.url);
    } else {
        println!("{} is not cached", arg.url);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use depot_verify::digest_bytes;
    use tempfile::tempdir;

    const URL: &str = "https://example.com/dist/pkg.zip";

    #[test]
    fn test_check_reports_hit_only_for_matching_file() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let arg = CheckArg {
            url:    URL.to_string(),
            sha256: digest_bytes(b"zip"),
        };
        assert!(!check(&store, &arg).unwrap());

        let location = store.location_for_url(URL).unwrap();
        std::fs::create_dir_all(&location.dir).unwrap();
        std::fs::write(&location.file, b"zip").unwrap();
        assert!(check(&store, &arg).unwrap());
    }

    #[test]
    fn test_evict_removes_entry() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let location = store.location_for_url(URL).unwrap();
        std::fs::create_dir_all(&location.dir).unwrap();
        std::fs::write(&location.file, b"zip").unwrap();

        evict(&store, &EvictArg { url: URL.to_string() }).unwrap();
        assert!(!location.dir.exists());
        evict(&store, &EvictArg { url: URL.to_string() }).unwrap();
    }

    #[test]
    fn test_locate_rejects_bad_url() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        assert!(locate(&store, &LocateArg { url: "::".to_string() }).is_err());
    }
}
