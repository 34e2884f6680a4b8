//! Object type discovery.

use std::collections::BTreeSet;

use auraprobe_aura::Operation;
use auraprobe_client::security::names;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use super::{propagates, RecordEngine};
use crate::error::Result;

impl RecordEngine {
    /// Object types to scan when none are given, resolved once per engine
    /// from the sources enabled in [`DiscoveryOptions`](super::DiscoveryOptions).
    #[instrument(skip(self))]
    pub async fn record_types(&mut self) -> Result<BTreeSet<String>> {
        self.sync_session();
        if let Some(types) = &self.record_types {
            return Ok(types.clone());
        }

        let mut types = BTreeSet::new();
        if self.options.introspection {
            let known = self.schema.known_types();
            info!(count = known.len(), "Types from the schema");
            types.extend(known);
        }
        if self.options.wordlist {
            let known = self.wordlist.known_type_names();
            info!(count = known.len(), "Types from the wordlist");
            types.extend(known);
        }
        if self.options.api {
            let announced = self.announced_types().await?;
            info!(count = announced.len(), "Types announced by the application");
            types.extend(announced);

            let listed = self.api.list_sobjects().await;
            info!(count = listed.len(), "Types listed through REST");
            types.extend(listed);
        }
        if self.options.custom_only {
            types.retain(|sobject| names::is_custom_type(sobject));
            info!(count = types.len(), "Keeping custom types only");
        }

        self.record_types = Some(types.clone());
        Ok(types)
    }

    async fn announced_types(&mut self) -> Result<BTreeSet<String>> {
        let mut found = BTreeSet::new();
        for action in self.aura.catalog().templates(Operation::GetRecordTypes) {
            let response = match self.aura.send(&action).await {
                Ok(response) => response,
                Err(e) if propagates(&e, false) => return Err(e.into()),
                Err(e) => {
                    debug!(descriptor = %action.descriptor, error = %e, "Configuration request failed");
                    continue;
                }
            };
            match response.return_map() {
                Some(return_value) => found.extend(supported_entities(return_value)),
                None => debug!(descriptor = %action.descriptor, "No configuration returned"),
            }
        }
        Ok(found)
    }
}

/// Type names from a configuration return value: the layout's supported
/// entities, else the keys of the name-to-prefix map.
fn supported_entities(return_value: &Map<String, Value>) -> Vec<String> {
    match return_value.get("rootLayoutConfig") {
        Some(layout) => layout
            .pointer("/attributes/values/appMetadata/supportedEntities")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        None => return_value
            .get("apiNamesToKeyPrefixes")
            .and_then(Value::as_object)
            .map(|prefixes| prefixes.keys().cloned().collect())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::DiscoveryOptions;
    use super::*;
    use crate::sources::{StaticSchema, StaticWordlist};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn engine_with(uri: &str, options: DiscoveryOptions) -> RecordEngine {
        RecordEngine::builder(aura(uri))
            .with_schema(
                StaticSchema::from_json(r#"{"Account": [], "Invoice__c": []}"#).unwrap(),
            )
            .with_wordlist(StaticWordlist::new(["Contact", "Survey__c"]))
            .with_options(options)
            .build()
    }

    #[test]
    fn test_supported_entities_from_layout() {
        let value = json!({"rootLayoutConfig": {"attributes": {"values": {"appMetadata": {
            "supportedEntities": ["Case", "Idea"]
        }}}}});
        assert_eq!(
            supported_entities(value.as_object().unwrap()),
            vec!["Case", "Idea"]
        );
    }

    #[test]
    fn test_supported_entities_from_prefixes() {
        let value = json!({"apiNamesToKeyPrefixes": {"Account": "001", "Contact": "003"}});
        assert_eq!(
            supported_entities(value.as_object().unwrap()),
            vec!["Account", "Contact"]
        );
        assert!(supported_entities(&Map::new()).is_empty());
    }

    #[tokio::test]
    async fn test_no_source_enabled() {
        let server = MockServer::start().await;
        let mut engine = engine_with(&server.uri(), DiscoveryOptions::default());
        assert!(engine.record_types().await.unwrap().is_empty());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_local_sources_and_custom_filter() {
        let server = MockServer::start().await;
        let mut engine = engine_with(
            &server.uri(),
            DiscoveryOptions {
                introspection: true,
                wordlist: true,
                custom_only: true,
                ..Default::default()
            },
        );
        let types = engine.record_types().await.unwrap();
        assert_eq!(
            types,
            BTreeSet::from(["Invoice__c".to_string(), "Survey__c".to_string()])
        );
    }

    #[tokio::test]
    async fn test_api_sources_are_resolved_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(AURA_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(success(json!({
                "apiNamesToKeyPrefixes": {"Account": "001", "Order__c": "a01"}
            }))))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/services/data/v60.0/sobjects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sobjects": [{"name": "Lead"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut engine = engine_with(
            &server.uri(),
            DiscoveryOptions {
                api: true,
                ..Default::default()
            },
        );
        let first = engine.record_types().await.unwrap();
        assert_eq!(
            first,
            BTreeSet::from(["Account", "Lead", "Order__c"].map(String::from))
        );
        assert_eq!(engine.record_types().await.unwrap(), first);
    }
}
