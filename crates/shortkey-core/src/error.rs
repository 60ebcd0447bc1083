use thiserror::Error;

/// Result type for codec and key operations.
pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid key: {0}")]
    InvalidKey(String),
    #[error("key length must be between 1 and {max}, got {length}")]
    InvalidLength { length: usize, max: usize },
    #[error("value {value} is not representable with {length} symbols")]
    OutOfRange { value: u64, length: usize },
}
