use thiserror::Error;

use crate::encoding::EncodingError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error("entropy source unavailable: {0}")]
    Entropy(String),
    #[error("failed to spawn search thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("search worker has shut down")]
    WorkerGone,
}

pub type Result<T> = std::result::Result<T, Error>;
