//! Session credentials.
//!
//! Debug output redacts the password, the session id and the token.

/// Username/password plus the session material obtained from login.
///
/// Equality only considers username and password: two credential sets for
/// the same account are equal whatever session they currently hold.
#[derive(Clone, Default)]
pub struct Credentials {
    username: String,
    password: String,
    token: String,
    sid: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("token", &redact(&self.token))
            .field("sid", &redact(&self.sid))
            .finish()
    }
}

fn redact(value: &str) -> Option<&'static str> {
    (!value.is_empty()).then_some("[REDACTED]")
}

impl PartialEq for Credentials {
    fn eq(&self, other: &Self) -> bool {
        self.username == other.username && self.password == other.password
    }
}

impl Eq for Credentials {}

impl Credentials {
    /// Credentials for a username/password login.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// Set an already known session id.
    pub fn with_sid(mut self, sid: impl Into<String>) -> Self {
        self.sid = sid.into();
        self
    }

    /// Set an already known anti-forgery token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Anti-forgery token sent as `aura.token`.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Session id usable against the REST and SOAP APIs.
    pub fn sid(&self) -> &str {
        &self.sid
    }

    /// Returns true when a session id is available for REST/SOAP channels.
    pub fn has_sid(&self) -> bool {
        !self.sid.trim().is_empty()
    }

    pub(crate) fn set_sid(&mut self, sid: impl Into<String>) {
        self.sid = sid.into();
    }

    pub(crate) fn set_token(&mut self, token: impl Into<String>) {
        self.token = token.into();
    }

    pub(crate) fn set_account(&mut self, username: &str, password: &str) {
        self.username = username.to_string();
        self.password = password.to_string();
    }
}
