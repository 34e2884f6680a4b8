//! Error types for the transport layer.

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for transport operations.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// Returns true if the target URL itself was rejected.
    pub fn is_invalid_target(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidTargetUrl(_))
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// The target URL is malformed or not HTTP/HTTPS.
    #[error("Invalid target URL: {0}")]
    InvalidTargetUrl(String),

    /// The proxy specification could not be used.
    #[error("Invalid proxy: {0}")]
    InvalidProxy(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A record identifier cannot be checksummed or extended.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(ErrorKind::InvalidTargetUrl(err.to_string()), err)
    }
}
