use std::io;

/// Errors raised when constructing a [`BoundedLruCache`](crate::BoundedLruCache).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    #[error("Capacity must be > 0")]
    ZeroCapacity,
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Writer thread panicked")]
    WriterPanicked,
}
