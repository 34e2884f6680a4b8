//! Client for the session-authenticated REST and SOAP channels.
//!
//! These channels only return data when a session id is available, but
//! requests are still sent without one (some sites expose them to guests).

use auraprobe_client::{HttpResponse, HttpTransport, TransportConfig};

use crate::error::Result;

mod rest;
mod soap;

/// REST and SOAP channel client sharing a transport with the protocol client.
///
/// # Example
///
/// ```rust,ignore
/// use auraprobe_api::ApiClient;
///
/// let api = ApiClient::new(transport.clone()).with_sid(sid);
/// let types = api.list_sobjects().await;
/// let ids = api.soap_query_ids("Account").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    transport: HttpTransport,
    sid: Option<String>,
}

impl ApiClient {
    /// Wrap an existing transport (and its cookies).
    pub fn new(transport: HttpTransport) -> Self {
        Self {
            transport,
            sid: None,
        }
    }

    /// Build a standalone client for `base_url`.
    pub fn connect(base_url: &str, config: TransportConfig) -> Result<Self> {
        Ok(Self::new(HttpTransport::new(base_url, config)?))
    }

    /// Session id sent as `Authorization: OAuth <sid>`. Blank values are ignored.
    pub fn with_sid(mut self, sid: impl Into<String>) -> Self {
        self.set_sid(sid);
        self
    }

    /// Replace the session id in place. A blank value clears it.
    pub fn set_sid(&mut self, sid: impl Into<String>) {
        let sid = sid.into();
        self.sid = (!sid.trim().is_empty()).then_some(sid);
    }

    pub fn sid(&self) -> Option<&str> {
        self.sid.as_deref()
    }

    pub fn has_sid(&self) -> bool {
        self.sid.is_some()
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    async fn get(&self, path: &str) -> HttpResponse {
        match &self.sid {
            Some(sid) => {
                let authorization = format!("OAuth {sid}");
                self.transport
                    .get(path, &[("Authorization", authorization.as_str())])
                    .await
            }
            None => self.transport.get(path, &[]).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_sid_ignored() {
        let api = ApiClient::connect("https://x.example.com", TransportConfig::default()).unwrap();
        assert!(!api.clone().with_sid("  ").has_sid());
        assert_eq!(api.with_sid("00D!x").sid(), Some("00D!x"));
    }

    #[test]
    fn test_set_sid_replaces_and_clears() {
        let mut api = ApiClient::connect("https://example.com", TransportConfig::default()).unwrap();
        api.set_sid("00D!first");
        api.set_sid("00D!second");
        assert_eq!(api.sid(), Some("00D!second"));
        api.set_sid("");
        assert!(!api.has_sid());
    }

    #[test]
    fn test_connect_rejects_bad_url() {
        assert!(ApiClient::connect("nope", TransportConfig::default()).is_err());
    }
}
