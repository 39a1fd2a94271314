use depot_verify::VerifyError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid artifact URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error(transparent)]
    Fs(#[from] depot_fs::Error),

    #[error(transparent)]
    Verify(#[from] VerifyError),
}

pub type Result<T> = std::result::Result<T, StoreError>;
