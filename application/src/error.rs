use std::io;
use thiserror::Error;

use crate::conversion::error::ConversionError;
use domain::error::DomainError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Fetch error: {message}")]
    FetchError { message: String },
}

pub type AppResult<T> = Result<T, AppError>;
