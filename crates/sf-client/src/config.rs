//! Transport configuration.

use std::time::Duration;

use crate::error::{Error, ErrorKind, Result};

/// Configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// User-Agent header value.
    pub user_agent: String,
    /// Optional HTTP proxy applied to every scheme.
    pub proxy: Option<ProxyConfig>,
    /// Request timeout.
    pub timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Whether invalid or self-signed certificates are accepted.
    pub accept_invalid_certs: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            user_agent: crate::USER_AGENT.to_string(),
            proxy: None,
            timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(120),
            accept_invalid_certs: true,
        }
    }
}

impl TransportConfig {
    /// Create a new transport config builder.
    pub fn builder() -> TransportConfigBuilder {
        TransportConfigBuilder::default()
    }
}

/// Builder for TransportConfig.
#[derive(Debug, Default)]
pub struct TransportConfigBuilder {
    config: TransportConfig,
}

impl TransportConfigBuilder {
    /// Set a custom User-Agent. Blank values keep the default.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        let user_agent = user_agent.into();
        if !user_agent.trim().is_empty() {
            self.config.user_agent = user_agent;
        }
        self
    }

    /// Route every request through the given proxy.
    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.config.proxy = Some(proxy);
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Enable or disable certificate validation bypass.
    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.config.accept_invalid_certs = accept;
        self
    }

    /// Build the transport configuration.
    pub fn build(self) -> TransportConfig {
        self.config
    }
}

/// An HTTP proxy given as host and port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
}

impl ProxyConfig {
    /// Create a proxy from a host and a port in `1..65535`.
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(Error::new(ErrorKind::InvalidProxy("empty host".into())));
        }
        if port == 0 || port == u16::MAX {
            return Err(Error::new(ErrorKind::InvalidProxy(format!(
                "port {port} out of range"
            ))));
        }
        Ok(Self { host, port })
    }

    /// Parse a `host:port` specification.
    pub fn parse(spec: &str) -> Result<Self> {
        let (host, port) = spec
            .rsplit_once(':')
            .ok_or_else(|| Error::new(ErrorKind::InvalidProxy(spec.to_string())))?;
        let port = port
            .parse::<u16>()
            .map_err(|e| Error::with_source(ErrorKind::InvalidProxy(spec.to_string()), e))?;
        Self::new(host, port)
    }

    /// The proxy as an `http://` URL.
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}
