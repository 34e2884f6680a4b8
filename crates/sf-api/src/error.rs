//! Error types for the REST and SOAP channels.

/// Result type alias for API channel operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for API channel operations.
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
}

/// The kind of error that occurred.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    /// Transport construction failed.
    #[error("Client error: {0}")]
    Client(String),

    /// The SOAP response is not well-formed XML.
    #[error("SOAP parsing failed: {0}")]
    SoapParsingFailed(String),

    /// The object type name cannot be used in a request.
    #[error("Invalid object type: {0}")]
    InvalidType(String),
}

impl From<auraprobe_client::Error> for Error {
    fn from(err: auraprobe_client::Error) -> Self {
        Error::with_source(ErrorKind::Client(err.kind.to_string()), err)
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::with_source(ErrorKind::SoapParsingFailed(err.to_string()), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::new(ErrorKind::SoapParsingFailed("unexpected EOF".into()));
        assert_eq!(err.to_string(), "SOAP parsing failed: unexpected EOF");

        let err = Error::new(ErrorKind::InvalidType("Bad Name".into()));
        assert_eq!(err.to_string(), "Invalid object type: Bad Name");
    }

    #[test]
    fn test_from_client_error() {
        let err: Error =
            auraprobe_client::Error::new(auraprobe_client::ErrorKind::InvalidTargetUrl("x".into()))
                .into();
        assert!(matches!(err.kind, ErrorKind::Client(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
