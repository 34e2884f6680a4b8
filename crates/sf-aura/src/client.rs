//! Aura protocol client.

use std::sync::LazyLock;

use auraprobe_client::{ContentType, HttpResponse, HttpTransport, RetryBudget, TransportConfig};
use regex_lite::Regex;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::catalog::{ActionCatalog, ActionTemplate, Operation};
use crate::classifier;
use crate::config::AuraConfig;
use crate::credentials::Credentials;
use crate::envelope;
use crate::error::{Error, ErrorKind, Result};
use crate::response::AuraResponse;
use crate::session::SessionContext;

/// Path fetched after login to obtain the anti-forgery cookie.
const TOKEN_PATH: &str = "/s/";
/// Session cookie set by the login redirect.
const SID_COOKIE: &str = "sid";
/// Fragment of the anti-forgery cookie name (`__Host-ERIC_PROD...`).
const TOKEN_COOKIE: &str = "Host-ERIC";

static APP_NAME_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"%40markup%3A%2F%2F([a-zA-Z0-9:%]*)%22%3A%22").expect("static link pattern is valid")
});

/// Result of classifying one response.
enum Outcome {
    Done(AuraResponse),
    /// Session context was corrected; the request must be rebuilt and resent.
    Corrected,
}

/// Client for one Aura endpoint.
///
/// Owns the transport, the credentials and the session context. Every
/// operation takes `&mut self`: the session is corrected in place from
/// server feedback and stays corrected for the rest of the scan.
#[derive(Debug)]
pub struct AuraClient {
    transport: HttpTransport,
    credentials: Credentials,
    session: SessionContext,
    aura_path: String,
    catalog: ActionCatalog,
    paths: Vec<String>,
    detection: Regex,
}

impl AuraClient {
    /// Create a client for `base_url`.
    ///
    /// Fails with `InvalidTargetUrl` for a non-HTTP URL and with `Config` for
    /// an invalid detection pattern.
    pub fn new(base_url: &str, transport: TransportConfig, config: AuraConfig) -> Result<Self> {
        let transport = HttpTransport::new(base_url, transport)?;
        let detection = Regex::new(&config.detection_pattern).map_err(|e| {
            Error::with_source(
                ErrorKind::Config(format!(
                    "invalid detection pattern '{}'",
                    config.detection_pattern
                )),
                e,
            )
        })?;
        let session = SessionContext::new(config.app_candidates, config.app);

        Ok(Self {
            transport,
            credentials: Credentials::default(),
            session,
            aura_path: String::new(),
            catalog: config.catalog,
            paths: config.paths,
            detection,
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    pub fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    /// Endpoint path requests are posted to. Empty until detected or forced.
    pub fn aura_path(&self) -> &str {
        &self.aura_path
    }

    /// Use `path` without probing it.
    pub fn set_aura_path(&mut self, path: impl Into<String>) {
        self.aura_path = path.into();
    }

    /// Replace token, username, password and session id without logging in.
    pub fn update_credentials(&mut self, credentials: Credentials) {
        debug!(credentials = ?credentials, "Credentials updated");
        self.credentials = credentials;
    }

    /// Probe candidate paths (or only `forced`) for an Aura endpoint.
    ///
    /// A path is accepted when it answers 200 or 401 with a body matching
    /// the detection pattern. The accepted path becomes the protocol path.
    #[instrument(skip(self))]
    pub async fn detect(&mut self, forced: Option<&str>) -> Option<String> {
        let candidates = match forced {
            Some(path) => vec![path.to_string()],
            None => self.paths.clone(),
        };

        for path in candidates {
            let response = self.transport.post(&path, "", ContentType::Form, &[]).await;
            if matches!(response.status, 200 | 401)
                && classifier::is_framework_detected(&self.detection, &response.body)
            {
                info!(path = %path, "Aura endpoint detected");
                self.aura_path = path.clone();
                return Some(path);
            }
            debug!(path = %path, status = response.status, "No Aura endpoint");
        }
        None
    }

    /// Send one action and return the parsed response.
    ///
    /// Transport failures (status 0) re-create the transport and retry.
    /// A stale build id or a rejected application name corrects the session
    /// and the request is rebuilt. Both loops are bounded.
    #[instrument(skip(self, action), fields(descriptor = %action.descriptor))]
    pub async fn send(&mut self, action: &ActionTemplate) -> Result<AuraResponse> {
        let mut corrections = RetryBudget::default();
        loop {
            let body = envelope::form_body(action, self.credentials.token(), &self.session)?;
            let response = self.post_with_retries(&body).await?;

            match self.classify(&response)? {
                Outcome::Done(parsed) => return Ok(parsed),
                Outcome::Corrected => {
                    if !corrections.try_acquire() {
                        error!(
                            max = corrections.max_attempts(),
                            "Too many session corrections"
                        );
                        return Err(Error::new(ErrorKind::BadRequest(
                            "session correction budget exhausted".to_string(),
                        )));
                    }
                }
            }
        }
    }

    async fn post_with_retries(&mut self, body: &str) -> Result<HttpResponse> {
        let mut budget = RetryBudget::default();
        while budget.try_acquire() {
            if budget.attempt() > 1 {
                warn!(
                    attempt = budget.attempt(),
                    max = budget.max_attempts(),
                    "Retrying"
                );
            }

            let response = self
                .transport
                .post(&self.aura_path, body, ContentType::Form, &[])
                .await;

            match response.status {
                200 => return Ok(response),
                0 => {
                    self.transport = self.transport.recreate()?;
                }
                401 => return Err(Error::new(ErrorKind::Unauthenticated)),
                404 => return Err(Error::new(ErrorKind::InvalidParameters)),
                status => {
                    warn!(status, "Unexpected HTTP status");
                    debug!(body = %response.body, "Response body");
                    return Ok(response);
                }
            }
        }

        error!("Unable to reach the target (connection lost?)");
        Err(Error::new(ErrorKind::BadRequest(
            "transport retry budget exhausted".to_string(),
        )))
    }

    fn classify(&mut self, response: &HttpResponse) -> Result<Outcome> {
        let body = &response.body;
        match AuraResponse::parse(body) {
            Ok(parsed) => {
                if let Some(fwuid) = classifier::out_of_sync(&parsed) {
                    warn!(fwuid = %fwuid, "Client is out of sync, retrying with new fwuid");
                    self.session.set_fwuid(fwuid);
                    return Ok(Outcome::Corrected);
                }
                Ok(Outcome::Done(parsed))
            }
            Err(e) => {
                debug!(body = %body, "Unparseable response body");

                if let Some(fwuid) = classifier::out_of_sync_legacy(body) {
                    warn!(fwuid = %fwuid, "Client is out of sync, retrying with new fwuid");
                    self.session.set_fwuid(fwuid);
                    return Ok(Outcome::Corrected);
                }

                if classifier::anti_forgery_mismatch(body) {
                    return match self.session.rotate_app() {
                        Some(app) => {
                            warn!(app = %app, "Application name rejected, retrying with next");
                            Ok(Outcome::Corrected)
                        }
                        None => {
                            error!("Application name rejected and no candidate left");
                            Err(Error::new(ErrorKind::InvalidResponse(
                                "anti-forgery token rejected".to_string(),
                            )))
                        }
                    };
                }

                if classifier::no_access(body) {
                    error!(app = %self.session.app(), "Application name cannot be used on this target");
                    return Err(Error::new(ErrorKind::NoAccess));
                }

                Err(Error::with_source(
                    ErrorKind::InvalidResponse("body is not a protocol response".to_string()),
                    e,
                ))
            }
        }
    }

    /// Log in with a username and password.
    ///
    /// Follows the redirect announced by the login action (on another host
    /// if needed), keeps the `sid` cookie when present, then fetches the
    /// anti-forgery cookie. The application name advertised in the `Link`
    /// header is adopted when found.
    #[instrument(skip(self, password))]
    pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let mut action = self.catalog.first(Operation::Login).ok_or_else(|| {
            Error::new(ErrorKind::Config("no login action template".to_string()))
        })?;
        action.fill("username", username);
        action.fill("password", password);

        let response = self.send(&action).await.map_err(|e| match e.kind {
            ErrorKind::BadRequest(_) | ErrorKind::Unauthenticated | ErrorKind::InvalidParameters => {
                error!(error = %e, "Login request rejected");
                Error::with_source(
                    ErrorKind::AuthenticationFailed("login request rejected".to_string()),
                    e,
                )
            }
            _ => e,
        })?;

        let event = response
            .events
            .first()
            .ok_or_else(|| auth_failed("no event in login response"))?;
        let attributes = event
            .attributes
            .as_ref()
            .ok_or_else(|| auth_failed("no event attributes in login response"))?;
        let redirect = attributes
            .values
            .get("url")
            .and_then(|url| url.as_str())
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| auth_failed("no redirect URL in login response"))?;

        let target = self.transport.base_url().join(redirect).map_err(|e| {
            Error::with_source(
                ErrorKind::AuthenticationFailed(format!("invalid redirect URL {redirect}")),
                e,
            )
        })?;
        let redirect_response = self.follow_redirect(&target).await?;

        match redirect_response.find_cookie(SID_COOKIE, true) {
            Some(sid) if !sid.trim().is_empty() => self.credentials.set_sid(sid),
            _ => warn!("No sid cookie received, continuing without it"),
        }

        let token_response = self.transport.get(TOKEN_PATH, &[]).await;
        let token = token_response
            .find_cookie(TOKEN_COOKIE, false)
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| auth_failed("no anti-forgery cookie"))?;

        self.credentials.set_token(token);
        self.credentials.set_account(username, password);

        if let Some(link) = token_response.header("link") {
            match app_name_from_link(link) {
                Some(app) => {
                    info!(app = %app, "Found the application name");
                    self.session.set_app(app);
                }
                None => warn!(
                    app = %self.session.app(),
                    "Application name not found, keeping the current one"
                ),
            }
        }

        info!(credentials = ?self.credentials, "Login succeeded");
        Ok(())
    }

    async fn follow_redirect(&self, target: &Url) -> Result<HttpResponse> {
        let mut path = target.path().to_string();
        if let Some(query) = target.query() {
            path.push('?');
            path.push_str(query);
        }

        let base = self.transport.base_url();
        let same_origin = target.host_str() == base.host_str()
            && target.port_or_known_default() == base.port_or_known_default();

        if same_origin {
            Ok(self.transport.get(&path, &[]).await)
        } else {
            debug!(host = ?target.host_str(), "Following login redirect to another host");
            let origin = target.origin().ascii_serialization();
            let transport = self.transport.with_base_url(&origin)?;
            Ok(transport.get(&path, &[]).await)
        }
    }
}

fn auth_failed(reason: &str) -> Error {
    error!(reason, "Unable to authenticate");
    Error::new(ErrorKind::AuthenticationFailed(reason.to_string()))
}

fn app_name_from_link(link: &str) -> Option<String> {
    let encoded = APP_NAME_LINK.captures(link)?.get(1)?.as_str();
    urlencoding::decode(encoded)
        .ok()
        .map(|app| app.into_owned())
        .filter(|app| !app.is_empty())
}
