//! Cookie-persisting HTTP transport.

use std::sync::Arc;

use reqwest::cookie::Jar;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::TransportConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::request::ContentType;
use crate::response::HttpResponse;

/// HTTP transport bound to one base URL.
///
/// Redirects are never followed and I/O failures never surface as errors:
/// callers receive an [`HttpResponse`] with status 0 instead. Clones,
/// [`recreate`](Self::recreate) and [`with_base_url`](Self::with_base_url)
/// all share the same cookie jar.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    inner: reqwest::Client,
    jar: Arc<Jar>,
    base_url: Url,
    config: TransportConfig,
}

impl HttpTransport {
    /// Create a transport for `base_url` with a fresh cookie jar.
    pub fn new(base_url: &str, config: TransportConfig) -> Result<Self> {
        let base_url = parse_base_url(base_url)?;
        Self::with_jar(base_url, config, Arc::new(Jar::default()))
    }

    fn with_jar(base_url: Url, config: TransportConfig, jar: Arc<Jar>) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::none())
            .cookie_provider(Arc::clone(&jar))
            .danger_accept_invalid_certs(config.accept_invalid_certs);

        if let Some(ref proxy) = config.proxy {
            let proxy_url = proxy.url();
            let proxy = reqwest::Proxy::all(&proxy_url)
                .map_err(|e| Error::with_source(ErrorKind::InvalidProxy(proxy_url), e))?;
            builder = builder.proxy(proxy);
        }

        let inner = builder
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;

        Ok(Self {
            inner,
            jar,
            base_url,
            config,
        })
    }

    /// Build a new underlying client with the same base URL and cookies.
    ///
    /// Used after a transport failure to drop a possibly poisoned connection pool.
    pub fn recreate(&self) -> Result<Self> {
        debug!(base = %self.base_url, "Recreating transport");
        Self::with_jar(self.base_url.clone(), self.config.clone(), Arc::clone(&self.jar))
    }

    /// A transport for another host that keeps this transport's cookies.
    pub fn with_base_url(&self, base_url: &str) -> Result<Self> {
        let base_url = parse_base_url(base_url)?;
        Self::with_jar(base_url, self.config.clone(), Arc::clone(&self.jar))
    }

    /// Base URL every path is appended to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Transport configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Store a cookie for the base URL, as if the server had set it.
    pub fn set_cookie(&self, name: &str, value: &str) {
        self.jar
            .add_cookie_str(&format!("{name}={value}; Path=/"), &self.base_url);
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// GET `path` relative to the base URL.
    #[instrument(skip(self, headers), fields(base = %self.base_url))]
    pub async fn get(&self, path: &str, headers: &[(&str, &str)]) -> HttpResponse {
        let url = self.url_for(path);
        let mut request = self
            .inner
            .get(&url)
            .header(ACCEPT, "*/*")
            .header(ACCEPT_LANGUAGE, "en");
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        self.dispatch(request, "GET", &url).await
    }

    /// POST `body` to `path` relative to the base URL.
    #[instrument(skip(self, body, headers), fields(base = %self.base_url))]
    pub async fn post(
        &self,
        path: &str,
        body: impl Into<String>,
        content_type: ContentType,
        headers: &[(&str, &str)],
    ) -> HttpResponse {
        let url = self.url_for(path);
        let mut request = self
            .inner
            .post(&url)
            .header(ACCEPT, "*/*")
            .header(ACCEPT_LANGUAGE, "en")
            .header(CONTENT_TYPE, content_type.mime())
            .body(body.into());
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        self.dispatch(request, "POST", &url).await
    }

    async fn dispatch(
        &self,
        request: reqwest::RequestBuilder,
        method: &str,
        url: &str,
    ) -> HttpResponse {
        debug!(method, url, "Sending request");

        match request.send().await {
            Ok(response) => {
                let response = HttpResponse::read(response).await;
                debug!(
                    status = response.status,
                    body_len = response.body.len(),
                    "Response received"
                );
                response
            }
            Err(e) => {
                warn!(method, url, error = %e, "Request failed");
                HttpResponse::transport_failure()
            }
        }
    }
}

fn parse_base_url(base_url: &str) -> Result<Url> {
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(Error::new(ErrorKind::InvalidTargetUrl(format!(
            "{base_url} is not an HTTP/HTTPS URL"
        ))));
    }
    Ok(Url::parse(base_url)?)
}
