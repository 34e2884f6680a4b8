//! Error types for record retrieval and write testing.

/// Result type alias for record operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for record operations.
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
        matches!(&self.kind, ErrorKind::Aura(kind) if kind.is_fatal())
    }

    /// Returns true for a rejected action parameter set (HTTP 404).
    pub fn is_invalid_parameters(&self) -> bool {
        matches!(
            &self.kind,
            ErrorKind::Aura(auraprobe_aura::ErrorKind::InvalidParameters)
        )
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// A record id was required but not given.
    #[error("Missing record id")]
    MissingRecordId,

    /// Protocol client error.
    #[error("{0}")]
    Aura(auraprobe_aura::ErrorKind),

    /// REST or SOAP channel error.
    #[error("{0}")]
    Api(auraprobe_api::ErrorKind),

    /// Identifier checksum or generation error.
    #[error("{0}")]
    Client(auraprobe_client::ErrorKind),

    /// Reading a collaborator file or writing a dump failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),
}

impl From<auraprobe_aura::Error> for Error {
    fn from(err: auraprobe_aura::Error) -> Self {
        Self {
            kind: ErrorKind::Aura(err.kind),
            source: err.source,
        }
    }
}

impl From<auraprobe_api::Error> for Error {
    fn from(err: auraprobe_api::Error) -> Self {
        Self {
            kind: ErrorKind::Api(err.kind),
            source: err.source,
        }
    }
}

impl From<auraprobe_client::Error> for Error {
    fn from(err: auraprobe_client::Error) -> Self {
        Self {
            kind: ErrorKind::Client(err.kind),
            source: err.source,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::with_source(ErrorKind::Io(err.to_string()), err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}
