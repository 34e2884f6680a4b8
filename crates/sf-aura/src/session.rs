//! Framework build id and application name tracking.

use std::collections::VecDeque;

/// Build id sent before the server has told us the real one.
pub const INITIAL_FWUID: &str = "random";

/// Context mode sent with every request.
pub const CONTEXT_MODE: &str = "PROD";

/// Mutable per-session context: corrected reactively from server feedback.
#[derive(Debug, Clone)]
pub struct SessionContext {
    fwuid: String,
    app: String,
    app_candidates: VecDeque<String>,
}

impl SessionContext {
    /// Start with the first candidate as the current application.
    ///
    /// An explicit application name goes to the front of the remaining
    /// candidates, so it is the first one tried on an app rotation.
    pub fn new(candidates: impl IntoIterator<Item = String>, explicit_app: Option<String>) -> Self {
        let mut app_candidates: VecDeque<String> = candidates.into_iter().collect();
        let app = app_candidates.pop_front().unwrap_or_default();
        if let Some(explicit) = explicit_app.filter(|a| !a.trim().is_empty()) {
            app_candidates.push_front(explicit);
        }
        Self {
            fwuid: INITIAL_FWUID.to_string(),
            app,
            app_candidates,
        }
    }

    pub fn fwuid(&self) -> &str {
        &self.fwuid
    }

    pub fn app(&self) -> &str {
        &self.app
    }

    pub fn mode(&self) -> &'static str {
        CONTEXT_MODE
    }

    /// Application names not yet tried.
    pub fn remaining_apps(&self) -> impl Iterator<Item = &str> {
        self.app_candidates.iter().map(String::as_str)
    }

    pub(crate) fn set_fwuid(&mut self, fwuid: impl Into<String>) {
        self.fwuid = fwuid.into();
    }

    pub(crate) fn set_app(&mut self, app: impl Into<String>) {
        self.app = app.into();
    }

    /// Switch to the next candidate application. `None` when exhausted.
    pub(crate) fn rotate_app(&mut self) -> Option<&str> {
        let next = self.app_candidates.pop_front()?;
        self.app = next;
        Some(&self.app)
    }
}
