use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid image id: {0}")]
    InvalidImageId(String),

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid pixel buffer: {0}")]
    InvalidPixelBuffer(String),

    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("Invalid visibility threshold: {0}")]
    InvalidThreshold(String),

    #[error("Invalid worker state transition: {0}")]
    InvalidWorkerTransition(String),
}

pub type DomainResult<T> = Result<T, DomainError>;
