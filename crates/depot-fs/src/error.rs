use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create staging file in {path}: {source}")]
    Stage {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to replace {path}: {source}")]
    Replace {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to remove {path}: {source}")]
    Remove {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub fn path(&self) -> &std::path::Path {
        match self {
            Error::CreateDir { path, .. }
            | Error::Stage { path, .. }
            | Error::Replace { path, .. }
            | Error::Remove { path, .. }
            | Error::Io { path, .. } => path,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
