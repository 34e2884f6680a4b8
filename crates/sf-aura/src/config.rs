//! Static protocol configuration.

use crate::catalog::ActionCatalog;

/// Endpoint paths tried during detection, in order.
pub const DEFAULT_PATHS: &[&str] = &["/s/sfsites/aura", "/sfsites/aura", "/aura", "/s/aura"];

/// Application names tried on anti-forgery rotation, in order.
pub const DEFAULT_APP_CANDIDATES: &[&str] = &[
    "siteforce:communityApp",
    "siteforce:loginApp2",
    "one:one",
    "siteforce:napiliApp",
];

/// Body pattern that identifies an Aura endpoint.
pub const DEFAULT_DETECTION_PATTERN: &str =
    r#"aura:invalidSession|aura:clientOutOfSync|markup://aura:|"exceptionEvent":true"#;

/// Configuration for the protocol client.
#[derive(Debug, Clone)]
pub struct AuraConfig {
    /// Candidate endpoint paths.
    pub paths: Vec<String>,
    /// Candidate application names.
    pub app_candidates: Vec<String>,
    /// Detection regex source.
    pub detection_pattern: String,
    /// Action templates per operation.
    pub catalog: ActionCatalog,
    /// Application name supplied by the operator.
    pub app: Option<String>,
}

impl Default for AuraConfig {
    fn default() -> Self {
        Self {
            paths: DEFAULT_PATHS.iter().map(|s| s.to_string()).collect(),
            app_candidates: DEFAULT_APP_CANDIDATES.iter().map(|s| s.to_string()).collect(),
            detection_pattern: DEFAULT_DETECTION_PATTERN.to_string(),
            catalog: ActionCatalog::builtin(),
            app: None,
        }
    }
}

impl AuraConfig {
    /// Create a new config builder.
    pub fn builder() -> AuraConfigBuilder {
        AuraConfigBuilder::default()
    }
}

/// Builder for AuraConfig.
#[derive(Debug, Default)]
pub struct AuraConfigBuilder {
    config: AuraConfig,
}

impl AuraConfigBuilder {
    /// Replace the candidate endpoint paths.
    pub fn with_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.paths = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the candidate application names.
    pub fn with_app_candidates<I, S>(mut self, apps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.app_candidates = apps.into_iter().map(Into::into).collect();
        self
    }

    /// Set the detection regex. It is compiled when the client is built.
    pub fn with_detection_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.detection_pattern = pattern.into();
        self
    }

    /// Use a custom action catalog.
    pub fn with_catalog(mut self, catalog: ActionCatalog) -> Self {
        self.config.catalog = catalog;
        self
    }

    /// Application name to try first after the initial one is rejected.
    pub fn with_app(mut self, app: impl Into<String>) -> Self {
        let app = app.into();
        if !app.trim().is_empty() {
            self.config.app = Some(app);
        }
        self
    }

    /// Build the config.
    pub fn build(self) -> AuraConfig {
        self.config
    }
}
