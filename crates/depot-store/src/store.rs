use std::path::{Path, PathBuf};

use depot_fs::{ReplaceOptions, StagedFile};
use depot_verify::{VerifyError, digest_bytes, verify_file};
use tracing::{debug, warn};
use url::Url;

use crate::{Artifact, Result, StoreError};

/// File name used when a URL has no usable trailing path segment.
pub const DEFAULT_FILE_NAME: &str = "artifact";

const STAGING_DIR: &str = ".staging";

/// Where an artifact lives in the cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheLocation {
    pub dir:  PathBuf,
    pub file: PathBuf,
}

#[derive(Clone, Debug)]
pub struct CacheStore {
    root:    PathBuf,
    replace: ReplaceOptions,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root:    root.into(),
            replace: ReplaceOptions::new(),
        }
    }

    pub fn with_replace_options(mut self, replace: ReplaceOptions) -> Self {
        self.replace = replace;
        self
    }

    pub fn root(&self) -> &Path { &self.root }

    pub fn staging_dir(&self) -> PathBuf { self.root.join(STAGING_DIR) }

    pub fn location_for(&self, artifact: &Artifact) -> Result<CacheLocation> {
        self.location_for_url(artifact.url())
    }

    /// Deterministic placement: the directory is keyed by the URL digest, the
    /// file keeps the URL's own name so tools inspecting it see a familiar one.
    pub fn location_for_url(&self, url: &str) -> Result<CacheLocation> {
        let parsed = Url::parse(url).map_err(|e| StoreError::InvalidUrl {
            url:    url.to_string(),
            reason: e.to_string(),
        })?;
        let dir = self.root.join(digest_bytes(url.as_bytes()));
        let file = dir.join(file_name(&parsed));
        Ok(CacheLocation { dir, file })
    }

    /// The cached file for `artifact`, if one exists with the expected digest.
    ///
    /// A file whose digest differs is reported as a miss and left where it is;
    /// the next successful commit replaces it.
    pub fn lookup(&self, artifact: &Artifact) -> Result<Option<PathBuf>> {
        let location = self.location_for(artifact)?;
        if !location.file.is_file() {
            debug!("cache miss for {}: {} absent", artifact, location.file.display());
            return Ok(None);
        }

        match verify_file(&location.file, artifact.expected_digest()) {
            Ok(()) => {
                debug!("cache hit for {}: {}", artifact, location.file.display());
                Ok(Some(location.file))
            }
            Err(VerifyError::Mismatch { expected, actual }) => {
                warn!(
                    "cached file {} does not match {}: expected {}, found {}; treating as miss",
                    location.file.display(),
                    artifact,
                    expected,
                    actual
                );
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// A fresh staging file on the same filesystem as the cache entries.
    pub fn stage(&self) -> Result<StagedFile> { Ok(StagedFile::new_in(self.staging_dir())?) }

    /// Atomically install a verified staging file as the entry for `artifact`.
    pub fn commit(&self, staged: StagedFile, artifact: &Artifact) -> Result<PathBuf> {
        let location = self.location_for(artifact)?;
        let path = staged.persist(&location.file, self.replace)?;
        debug!("committed {} to {}", artifact, path.display());
        Ok(path)
    }

    /// Drop the entry for `url`. Returns whether there was one.
    pub fn evict(&self, url: &str) -> Result<bool> {
        let location = self.location_for_url(url)?;
        Ok(depot_fs::remove_dir_if_exists(&location.dir)?)
    }
}

fn file_name(url: &Url) -> &str {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .unwrap_or(DEFAULT_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn staged_with(store: &CacheStore, content: &[u8]) -> StagedFile {
        let staged = store.stage().unwrap();
        staged.writer().unwrap().write_all(content).unwrap();
        staged
    }

    #[test]
    fn test_location_uses_url_digest_and_basename() {
        let store = CacheStore::new("/cache");
        let url = "https://repo.example.com/lib/x-1.0.jar";
        let location = store.location_for_url(url).unwrap();

        let dir = Path::new("/cache").join(digest_bytes(url.as_bytes()));
        assert_eq!(location.dir, dir);
        assert_eq!(location.file, dir.join("x-1.0.jar"));
    }

    #[test]
    fn test_location_ignores_query_and_fragment() {
        let store = CacheStore::new("/cache");
        let location = store
            .location_for_url("https://example.com/dl/tool.tar.gz?token=abc#frag")
            .unwrap();
        assert_eq!(location.file.file_name().unwrap(), "tool.tar.gz");
    }

    #[test]
    fn test_location_falls_back_to_default_name() {
        let store = CacheStore::new("/cache");
        for url in ["https://example.com/dir/", "https://example.com", "https://example.com/"] {
            let location = store.location_for_url(url).unwrap();
            assert_eq!(location.file.file_name().unwrap(), DEFAULT_FILE_NAME, "{url}");
        }
    }

    #[test]
    fn test_distinct_urls_with_same_name_do_not_collide() {
        let store = CacheStore::new("/cache");
        let a = store.location_for_url("https://a.example.com/x.jar").unwrap();
        let b = store.location_for_url("https://b.example.com/x.jar").unwrap();
        assert_ne!(a.dir, b.dir);
        assert_eq!(a.file.file_name(), b.file.file_name());
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let store = CacheStore::new("/cache");
        let err = store.location_for_url("not a url").unwrap_err();
        assert!(matches!(err, StoreError::InvalidUrl { .. }));
    }

    #[test]
    fn test_lookup_miss_when_absent() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let artifact = Artifact::new("https://example.com/a.bin", digest_bytes(b"a"));
        assert_eq!(store.lookup(&artifact).unwrap(), None);
    }

    #[test]
    fn test_commit_then_lookup_hits() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let artifact = Artifact::new("https://example.com/a.bin", digest_bytes(b"payload"));

        let path = store.commit(staged_with(&store, b"payload"), &artifact).unwrap();

        assert_eq!(path, store.location_for(&artifact).unwrap().file);
        assert_eq!(store.lookup(&artifact).unwrap(), Some(path));
    }

    #[test]
    fn test_lookup_mismatch_is_miss_and_file_is_kept() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let url = "https://example.com/a.bin";
        let stale = Artifact::new(url, digest_bytes(b"old"));
        let path = store.commit(staged_with(&store, b"old"), &stale).unwrap();

        let wanted = Artifact::new(url, digest_bytes(b"new"));
        assert_eq!(store.lookup(&wanted).unwrap(), None);
        assert_eq!(std::fs::read(&path).unwrap(), b"old");
    }

    #[test]
    fn test_commit_replaces_existing_entry() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let url = "https://example.com/a.bin";
        store
            .commit(staged_with(&store, b"old"), &Artifact::new(url, digest_bytes(b"old")))
            .unwrap();

        let artifact = Artifact::new(url, digest_bytes(b"new"));
        let path = store.commit(staged_with(&store, b"new"), &artifact).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"new");
        assert_eq!(store.lookup(&artifact).unwrap(), Some(path));
    }

    #[test]
    fn test_dropped_stage_leaves_nothing_behind() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        drop(staged_with(&store, b"abandoned"));

        let leftovers = std::fs::read_dir(store.staging_dir()).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_evict() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let artifact = Artifact::new("https://example.com/a.bin", digest_bytes(b"x"));
        store.commit(staged_with(&store, b"x"), &artifact).unwrap();

        assert!(store.evict(artifact.url()).unwrap());
        assert_eq!(store.lookup(&artifact).unwrap(), None);
        assert!(!store.evict(artifact.url()).unwrap());
    }
}
