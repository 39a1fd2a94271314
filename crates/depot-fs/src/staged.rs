use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::{NamedTempFile, PersistError};

use crate::{Error, ReplaceOptions, Result};

const STAGE_PREFIX: &str = ".stage-";
const STAGE_SUFFIX: &str = ".part";

/// A temporary file owned by exactly one writer.
///
/// Dropping it removes the file, so every early return or error path cleans
/// up after itself. [`StagedFile::persist`] is the only way to keep the content.
#[derive(Debug)]
pub struct StagedFile {
    inner: NamedTempFile,
}

impl StagedFile {
    /// Create a uniquely named staging file inside `dir`, creating `dir` first.
    pub fn new_in(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        ensure_dir(dir)?;
        let inner = tempfile::Builder::new()
            .prefix(STAGE_PREFIX)
            .suffix(STAGE_SUFFIX)
            .tempfile_in(dir)
            .map_err(|source| Error::Stage {
                path: dir.to_path_buf(),
                source,
            })?;
        Ok(Self { inner })
    }

    pub fn path(&self) -> &Path { self.inner.path() }

    /// An independent handle to the staged file, positioned at its start.
    pub fn writer(&self) -> Result<File> {
        self.inner.as_file().try_clone().map_err(|source| Error::Io {
            path: self.path().to_path_buf(),
            source,
        })
    }

    /// Rename the staged file over `dest`, replacing whatever is there.
    ///
    /// The parent of `dest` is created if missing and must live on the same
    /// filesystem as the staging directory.
    pub fn persist(self, dest: impl AsRef<Path>, options: ReplaceOptions) -> Result<PathBuf> {
        let dest = dest.as_ref();
        if let Some(parent) = dest.parent() {
            ensure_dir(parent)?;
        }

        let mut staged = self.inner;
        let mut attempts = 0;
        loop {
            match staged.persist(dest) {
                Ok(_) => return Ok(dest.to_path_buf()),
                Err(PersistError { error, file }) => {
                    // A reader holding the destination open makes the rename fail
                    // on some platforms until it lets go.
                    if error.kind() == io::ErrorKind::PermissionDenied
                        && attempts < options.get_retry_count()
                    {
                        attempts += 1;
                        std::thread::sleep(options.get_retry_delay() * attempts);
                        staged = file;
                        continue;
                    }
                    return Err(Error::Replace {
                        path:   dest.to_path_buf(),
                        source: error,
                    });
                }
            }
        }
    }
}

pub fn ensure_dir(dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir).map_err(|source| Error::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Remove `dir` and its contents. Returns whether anything was removed.
pub fn remove_dir_if_exists(dir: impl AsRef<Path>) -> Result<bool> {
    let dir = dir.as_ref();
    match std::fs::remove_dir_all(dir) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(Error::Remove {
            path: dir.to_path_buf(),
            source,
        }),
    }
}
