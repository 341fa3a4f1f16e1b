use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error("Storage lock poisoned")]
    Poisoned,

    #[error("Failed to watch storage directory: {0}")]
    Watch(#[from] notify::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;
