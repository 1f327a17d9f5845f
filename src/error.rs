//! Crate error types.
//!
//! The tracing hot path is infallible by design; errors only arise at the
//! control surface (socket I/O, malformed requests, background-thread
//! lifecycle).

use thiserror::Error;

/// All proftree errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Control-endpoint socket I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A client sent a request line the control endpoint cannot parse.
    #[error("malformed request line: {0:?}")]
    MalformedRequest(String),

    /// A control-surface background thread panicked.
    #[error("control thread panicked")]
    ControlThreadPanicked,
}

/// Result type for proftree operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error came from socket I/O.
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io(_))
    }

    /// Check if this error came from an unparseable request.
    pub fn is_malformed_request(&self) -> bool {
        matches!(self, Error::MalformedRequest(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_errors_convert() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "gone").into();
        assert!(err.is_io());
        assert!(!err.is_malformed_request());
    }

    #[test]
    fn test_display_includes_request_line() {
        let err = Error::MalformedRequest("NONSENSE".to_string());
        assert!(err.to_string().contains("NONSENSE"));
    }
}
