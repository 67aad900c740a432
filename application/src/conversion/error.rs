use thiserror::Error;

use domain::conversion::WorkerExit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionErrorKind {
    Codec,
    Transport,
    Lifecycle,
}

impl ConversionErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ConversionErrorKind::Codec => "codec",
            ConversionErrorKind::Transport => "transport",
            ConversionErrorKind::Lifecycle => "lifecycle",
        }
    }
}

/// Why a conversion call was rejected. Codec messages are the worker's text, unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("{message}")]
    Codec { message: String },

    #[error("Worker transport error: {message}")]
    Transport { message: String },

    #[error("{exit}")]
    Lifecycle { exit: WorkerExit },
}

impl ConversionError {
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn lifecycle(exit: WorkerExit) -> Self {
        Self::Lifecycle { exit }
    }

    #[must_use]
    pub fn kind(&self) -> ConversionErrorKind {
        match self {
            ConversionError::Codec { .. } => ConversionErrorKind::Codec,
            ConversionError::Transport { .. } => ConversionErrorKind::Transport,
            ConversionError::Lifecycle { .. } => ConversionErrorKind::Lifecycle,
        }
    }

    /// Only transport failures may succeed on a second attempt.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind() == ConversionErrorKind::Transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_error_displays_message_verbatim() {
        let error = ConversionError::codec("Input buffer is empty");
        assert_eq!(error.to_string(), "Input buffer is empty");
        assert_eq!(error.kind(), ConversionErrorKind::Codec);
        assert!(!error.is_retryable());
    }

    #[test]
    fn only_transport_errors_are_retryable() {
        assert!(ConversionError::transport("pipe closed").is_retryable());
        assert!(!ConversionError::lifecycle(WorkerExit::with_code(Some(1))).is_retryable());
    }

    #[test]
    fn lifecycle_error_reports_exit_code() {
        let error = ConversionError::lifecycle(WorkerExit::with_code(Some(134)));
        assert_eq!(error.to_string(), "Worker stopped with exit code 134");
    }
}
