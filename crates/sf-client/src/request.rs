//! Request body content types.

/// Content type of a POST body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    /// `application/x-www-form-urlencoded`, used by Aura envelopes.
    Form,
    /// `text/xml`, used by SOAP envelopes.
    Xml,
    /// `application/json`.
    Json,
}

impl ContentType {
    /// MIME type sent in the `Content-Type` header.
    pub fn mime(&self) -> &'static str {
        match self {
            ContentType::Form => "application/x-www-form-urlencoded",
            ContentType::Xml => "text/xml",
            ContentType::Json => "application/json",
        }
    }
}
