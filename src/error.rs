//! Error types for the kelime host.

/// Top-level error type for the explain and digest pipeline.
#[derive(Debug, thiserror::Error)]
pub enum KelimeError {
    /// A required credential or destination is not configured.
    #[error("missing configuration: {0}")]
    ConfigMissing(String),

    /// Non-success response (or transport failure) from an external API.
    #[error("{service} error: {message}")]
    Upstream {
        /// Which upstream service failed (`openai`, `telegram`, `captions`).
        service: &'static str,
        /// Provider-supplied description, or the raw HTTP status.
        message: String,
    },

    /// Malformed or absent structure in an upstream response or persisted file.
    #[error("parse error: {0}")]
    Parse(String),

    /// Malformed user-supplied configuration or command payload.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Configuration file could not be read or written.
    #[error("config error: {0}")]
    Config(String),

    /// Vocabulary store failure (writer task gone, persistence failed).
    #[error("store error: {0}")]
    Store(String),

    /// Alarm scheduler error.
    #[error("scheduler error: {0}")]
    Scheduler(String),

    /// Channel send/receive error.
    #[error("channel error: {0}")]
    Channel(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl KelimeError {
    /// Build an upstream error for the given service.
    pub fn upstream(service: &'static str, message: impl Into<String>) -> Self {
        Self::Upstream {
            service,
            message: message.into(),
        }
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, KelimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_display_names_service() {
        let err = KelimeError::upstream("telegram", "Bad Request: chat not found");
        assert_eq!(
            err.to_string(),
            "telegram error: Bad Request: chat not found"
        );
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: KelimeError = io.into();
        assert!(matches!(err, KelimeError::Io(_)));
    }
}
