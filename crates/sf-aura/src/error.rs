//! Error types for the Aura protocol client.

/// Result type alias for protocol operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for protocol operations.
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

    /// Returns true if the whole scan should stop.
    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// The target URL is malformed or not HTTP/HTTPS.
    #[error("Invalid target URL: {0}")]
    InvalidTargetUrl(String),

    /// Transport construction failed.
    #[error("Client error: {0}")]
    Client(String),

    /// Static configuration (detection pattern, catalog) is unusable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Login was attempted but an artifact was missing.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The server answered HTTP 401.
    #[error("Unauthenticated: the target requires a valid session")]
    Unauthenticated,

    /// The server answered HTTP 404, usually for malformed action parameters.
    #[error("Invalid action parameters")]
    InvalidParameters,

    /// Retry or correction budget exhausted.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The application name is rejected outright for this target.
    #[error("No access: the application name cannot be used on this target")]
    NoAccess,

    /// The body could not be parsed and no recovery applied.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),
}

impl ErrorKind {
    /// Fatal kinds abort the whole scan rather than one channel.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ErrorKind::BadRequest(_) | ErrorKind::Unauthenticated)
    }
}

impl From<auraprobe_client::Error> for Error {
    fn from(err: auraprobe_client::Error) -> Self {
        let kind = match &err.kind {
            auraprobe_client::ErrorKind::InvalidTargetUrl(url) => {
                ErrorKind::InvalidTargetUrl(url.clone())
            }
            other => ErrorKind::Client(other.to_string()),
        };
        Error::with_source(kind, err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display_messages() {
        let cases: Vec<(ErrorKind, &str)> = vec![
            (
                ErrorKind::InvalidTargetUrl("ftp://x".into()),
                "Invalid target URL: ftp://x",
            ),
            (
                ErrorKind::AuthenticationFailed("no redirect URL".into()),
                "Authentication failed: no redirect URL",
            ),
            (ErrorKind::Unauthenticated, "Unauthenticated"),
            (ErrorKind::InvalidParameters, "Invalid action parameters"),
            (
                ErrorKind::BadRequest("retries exhausted".into()),
                "Bad request: retries exhausted",
            ),
            (ErrorKind::NoAccess, "No access"),
            (
                ErrorKind::InvalidResponse("not JSON".into()),
                "Invalid response: not JSON",
            ),
        ];

        for (kind, expected) in cases {
            let display = kind.to_string();
            assert!(
                display.contains(expected),
                "Expected '{display}' to contain '{expected}'"
            );
        }
    }

    #[test]
    fn test_fatal_kinds() {
        assert!(Error::new(ErrorKind::BadRequest("x".into())).is_fatal());
        assert!(Error::new(ErrorKind::Unauthenticated).is_fatal());
        assert!(!Error::new(ErrorKind::InvalidParameters).is_fatal());
        assert!(!Error::new(ErrorKind::NoAccess).is_fatal());
        assert!(!Error::new(ErrorKind::InvalidResponse(String::new())).is_fatal());
    }

    #[test]
    fn test_from_client_error_keeps_invalid_target() {
        let client_err = auraprobe_client::Error::new(
            auraprobe_client::ErrorKind::InvalidTargetUrl("x".into()),
        );
        let err: Error = client_err.into();
        assert!(matches!(err.kind, ErrorKind::InvalidTargetUrl(_)));

        let client_err =
            auraprobe_client::Error::new(auraprobe_client::ErrorKind::Config("tls".into()));
        let err: Error = client_err.into();
        assert!(matches!(err.kind, ErrorKind::Client(_)));
    }
}
