//! Record reconciliation and write testing on top of the protocol client.
//!
//! The engine owns the [`AuraClient`] and an [`ApiClient`] sharing its
//! transport, plus the per-scan caches. Every operation is sequential and
//! takes `&mut self`.

use std::collections::BTreeSet;

use auraprobe_api::ApiClient;
use auraprobe_aura::AuraClient;
use serde_json::Value;
use tracing::debug;

use crate::cache::{FieldCache, UnsupportedRegistry};
use crate::sources::{SchemaIntrospection, StaticSchema, StaticWordlist, WordlistProvider};

mod discovery;
mod fetch;
mod fields;
mod mutation;

pub use mutation::{CreatedRecord, FieldWriteReport, WriteOutcome};

/// Type name used to resolve list views found while listing.
pub const LIST_VIEW_TYPE: &str = "ListView";

/// Where object types come from when none are given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Types known to the schema collaborator; also adds its fields when
    /// selecting fields of a record.
    pub introspection: bool,
    /// Types from the wordlist collaborator.
    pub wordlist: bool,
    /// Types announced by the target (protocol and REST).
    pub api: bool,
    /// Keep only custom types (`__c`).
    pub custom_only: bool,
}

/// Record reconciliation engine.
///
/// # Example
///
/// ```rust,ignore
/// use auraprobe_records::{DiscoveryOptions, RecordEngine};
///
/// let mut engine = RecordEngine::builder(aura)
///     .with_options(DiscoveryOptions { api: true, ..Default::default() })
///     .build();
/// let record = engine.fetch_one("001000000000001AAA", &["Account"]).await?;
/// ```
#[derive(Debug)]
pub struct RecordEngine {
    aura: AuraClient,
    api: ApiClient,
    schema: Box<dyn SchemaIntrospection>,
    wordlist: Box<dyn WordlistProvider>,
    options: DiscoveryOptions,
    field_cache: FieldCache,
    unsupported: UnsupportedRegistry,
    record_types: Option<BTreeSet<String>>,
}

impl RecordEngine {
    pub fn builder(aura: AuraClient) -> RecordEngineBuilder {
        RecordEngineBuilder {
            aura,
            api: None,
            schema: None,
            wordlist: None,
            options: DiscoveryOptions::default(),
        }
    }

    /// Engine with the built-in collaborators and no discovery source.
    pub fn new(aura: AuraClient) -> Self {
        Self::builder(aura).build()
    }

    pub fn aura(&self) -> &AuraClient {
        &self.aura
    }

    pub fn aura_mut(&mut self) -> &mut AuraClient {
        &mut self.aura
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn options(&self) -> DiscoveryOptions {
        self.options
    }

    pub fn field_cache(&self) -> &FieldCache {
        &self.field_cache
    }

    pub fn unsupported(&self) -> &UnsupportedRegistry {
        &self.unsupported
    }

    /// Give the protocol client back, dropping the caches.
    pub fn into_aura(self) -> AuraClient {
        self.aura
    }

    /// Carry a session id obtained after construction over to the API client.
    fn sync_session(&mut self) {
        let credentials = self.aura.credentials();
        if credentials.has_sid() && self.api.sid() != Some(credentials.sid()) {
            debug!("Session id changed, updating API client");
            let sid = credentials.sid().to_string();
            self.api.set_sid(sid);
        }
    }
}

/// Builder for [`RecordEngine`].
pub struct RecordEngineBuilder {
    aura: AuraClient,
    api: Option<ApiClient>,
    schema: Option<Box<dyn SchemaIntrospection>>,
    wordlist: Option<Box<dyn WordlistProvider>>,
    options: DiscoveryOptions,
}

impl RecordEngineBuilder {
    /// Use a specific REST/SOAP client. By default one is built on the
    /// protocol client's transport with its session id.
    pub fn with_api(mut self, api: ApiClient) -> Self {
        self.api = Some(api);
        self
    }

    pub fn with_schema(mut self, schema: impl SchemaIntrospection + 'static) -> Self {
        self.schema = Some(Box::new(schema));
        self
    }

    pub fn with_wordlist(mut self, wordlist: impl WordlistProvider + 'static) -> Self {
        self.wordlist = Some(Box::new(wordlist));
        self
    }

    pub fn with_options(mut self, options: DiscoveryOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> RecordEngine {
        let api = self.api.unwrap_or_else(|| {
            ApiClient::new(self.aura.transport().clone()).with_sid(self.aura.credentials().sid())
        });
        RecordEngine {
            aura: self.aura,
            api,
            schema: self
                .schema
                .unwrap_or_else(|| Box::new(StaticSchema::builtin())),
            wordlist: self
                .wordlist
                .unwrap_or_else(|| Box::new(StaticWordlist::builtin())),
            options: self.options,
            field_cache: FieldCache::new(),
            unsupported: UnsupportedRegistry::new(),
            record_types: None,
        }
    }
}

/// Errors that end the current operation instead of the current descriptor.
fn propagates(err: &auraprobe_aura::Error, invalid_parameters: bool) -> bool {
    err.is_fatal()
        || (invalid_parameters && matches!(err.kind, auraprobe_aura::ErrorKind::InvalidParameters))
}

/// Text of an id-like JSON member.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
