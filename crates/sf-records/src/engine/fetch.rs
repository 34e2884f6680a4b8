//! Record retrieval: by id, and by type across every channel.

use auraprobe_aura::{classifier, Operation};
use serde_json::{Map, Value};
use tracing::{debug, error, info, instrument, trace, warn};

use super::{propagates, value_text, RecordEngine, LIST_VIEW_TYPE};
use crate::error::{Error, ErrorKind, Result};
use crate::item::{ItemBag, ItemKey, QUERY_REST_SOURCE, SOAP_SOURCE, SOBJECTS_REST_SOURCE};
use crate::record::Record;

/// Listing parameters, set when a descriptor declares them.
const SEARCH_TERM: &str = "th$$";
const PAGE_SIZE: u32 = 100;

impl RecordEngine {
    /// Retrieve one record by id and merge what every channel returns.
    ///
    /// With no `types`, a single untyped pass runs; a type learned from the
    /// record provider then triggers a typed pass.
    #[instrument(skip(self))]
    pub async fn fetch_one(&mut self, record_id: &str, types: &[&str]) -> Result<Option<Record>> {
        self.sync_session();
        let mut items = ItemBag::new();
        if types.is_empty() {
            info!(record_id, "Looking for record");
            self.fetch_into(&mut items, record_id, None).await?;
        } else {
            for sobject in types {
                info!(record_id, sobject, "Looking for record");
                self.fetch_into(&mut items, record_id, Some(sobject)).await?;
            }
        }
        Ok(items.into_merged())
    }

    /// Retrieve every record reachable for `types`, one merged record per
    /// id. Types are discovered when none are given.
    #[instrument(skip(self))]
    pub async fn fetch_many(&mut self, types: &[&str]) -> Result<Vec<Record>> {
        self.sync_session();
        let types: Vec<String> = if types.is_empty() {
            self.record_types().await?.into_iter().collect()
        } else {
            types.iter().map(ToString::to_string).collect()
        };
        if types.is_empty() {
            warn!("No object type to look for");
        }

        let mut items = ItemBag::new();
        for sobject in &types {
            self.fetch_listed(&mut items, sobject).await?;
            if self.api.has_sid() {
                self.fetch_from_api_channels(&mut items, sobject).await?;
            } else {
                debug!(sobject, "No session id, skipping REST and SOAP channels");
            }
        }
        Ok(items.into_grouped())
    }

    pub(super) async fn fetch_into(
        &mut self,
        items: &mut ItemBag,
        record_id: &str,
        sobject: Option<&str>,
    ) -> Result<()> {
        if record_id.trim().is_empty() {
            error!("Cannot select a record without its id");
            return Err(Error::new(ErrorKind::MissingRecordId));
        }

        if let Some(sobject) = sobject {
            self.fetch_with_fields_into(items, record_id, sobject, None)
                .await?;
        }

        for mut action in self.aura.catalog().templates(Operation::GetRecord) {
            let descriptor = action.descriptor.clone();
            if let Some(s) = sobject {
                if !self.unsupported.is_supported(&descriptor, s) {
                    trace!(descriptor, sobject = s, "Type unsupported by action");
                    continue;
                }
            }
            let key = ItemKey::new(&descriptor, record_id, sobject);
            if items.contains(&key) {
                trace!(descriptor, "Already retrieved");
                continue;
            }

            action.fill("recordId", record_id);
            action.fill(
                "recordDescriptor",
                format!("{record_id}.undefined.null.null.null.Id.VIEW"),
            );

            let response = match self.aura.send(&action).await {
                Ok(response) => response,
                Err(e) if propagates(&e, true) => return Err(e.into()),
                Err(e) => {
                    debug!(descriptor, error = %e, "Record request failed");
                    continue;
                }
            };
            let Some(first) = response.first_action() else {
                debug!(descriptor, "No action in response");
                continue;
            };

            if !first.is_success() && sobject.is_some() {
                if let Some(unsupported) = classifier::unsupported_type(&response.raw_body) {
                    self.unsupported.mark(&descriptor, unsupported);
                    continue;
                }
            }

            let Some(return_value) = first.return_map() else {
                let learned = match provided_record(response.record_provider(), record_id) {
                    Some((learned, record)) => {
                        info!(record_id, descriptor, "Record found through the record provider");
                        items.insert(key, record);
                        learned
                    }
                    None => continue,
                };
                if sobject.is_none() {
                    Box::pin(self.fetch_into(items, record_id, Some(&learned))).await?;
                }
                continue;
            };

            if return_value.contains_key("onLoadErrorMessage") {
                error!(record_id, descriptor, "Record exists but cannot be loaded");
                continue;
            }
            match return_value.get("record").and_then(Record::from_value) {
                Some(record) => {
                    info!(record_id, descriptor, "Record found");
                    items.insert(key, record);
                }
                None => debug!(descriptor, "No record in return value"),
            }
        }

        if let Some(sobject) = sobject {
            if let Some(rest) = self.api.get_sobject(sobject, record_id).await {
                info!(record_id, sobject, "Record found through REST");
                items.insert(
                    ItemKey::new(SOBJECTS_REST_SOURCE, record_id, Some(sobject)),
                    Record::from_json(&rest),
                );
            }
        }
        Ok(())
    }

    /// List records of `sobject` through every listing descriptor.
    async fn fetch_listed(&mut self, items: &mut ItemBag, sobject: &str) -> Result<()> {
        info!(sobject, "Looking for records");
        for mut action in self.aura.catalog().templates(Operation::GetRecords) {
            let descriptor = action.descriptor.clone();
            if !self.unsupported.is_supported(&descriptor, sobject) {
                continue;
            }

            action.fill("objectApiName", sobject);
            action.fill("scope", sobject);
            action.fill("entityNameOrId", sobject);
            action.fill("term", SEARCH_TERM);
            action.fill("pageSize", PAGE_SIZE);
            action.fill("currentPage", 0);
            action.fill("limit", PAGE_SIZE);

            let response = match self.aura.send(&action).await {
                Ok(response) => response,
                Err(e) if propagates(&e, false) => return Err(e.into()),
                Err(e) => {
                    debug!(descriptor, error = %e, "Listing request failed");
                    continue;
                }
            };
            let Some(first) = response.first_action() else {
                continue;
            };
            if !first.is_success() {
                if let Some(unsupported) = classifier::unsupported_type(&response.raw_body) {
                    self.unsupported.mark(&descriptor, unsupported);
                    continue;
                }
            }
            let Some(return_value) = first.return_map() else {
                debug!(descriptor, sobject, "Empty listing");
                continue;
            };

            let found = self.listed_records(return_value, sobject).await?;
            if found.is_empty() {
                continue;
            }
            info!(count = found.len(), sobject, descriptor, "Records retrieved");
            for record in found {
                let record_id = record.id().unwrap_or_default().to_string();
                let record_type = record.sobject_type().to_string();
                items.insert(
                    ItemKey::new(&descriptor, record_id, Some(&record_type)),
                    record,
                );
            }
        }
        Ok(())
    }

    /// Records of a listing return value, enriched by id.
    ///
    /// Handles `records` (array, or object holding an array), `lists` of
    /// list views, and `result` rows wrapping a `record`.
    async fn listed_records(
        &mut self,
        return_value: &Map<String, Value>,
        sobject: &str,
    ) -> Result<Vec<Record>> {
        let mut found = Vec::new();

        let Some(records) = return_value.get("records") else {
            let list_ids: Vec<String> = return_value
                .get("lists")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter_map(|list| list.get("id"))
                .filter_map(value_text)
                .collect();
            for list_id in list_ids {
                match self.fetch_one(&list_id, &[LIST_VIEW_TYPE]).await {
                    Ok(Some(record)) => found.push(record),
                    Ok(None) => {}
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => error!(list_id, error = %e, "Cannot retrieve list view"),
                }
            }

            let rows = return_value
                .get("result")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter_map(|row| row.get("record"))
                .filter_map(Value::as_object);
            for partial in rows {
                found.extend(self.enrich(partial, sobject, "Id").await?);
            }
            return Ok(found);
        };

        let rows = match records {
            Value::Array(rows) => Some(rows),
            Value::Object(nested) => nested.get("records").and_then(Value::as_array),
            _ => None,
        };
        for partial in rows.into_iter().flatten().filter_map(Value::as_object) {
            found.extend(self.enrich(partial, sobject, "id").await?);
        }
        Ok(found)
    }

    /// Full record for a listing row, or the row itself when enrichment
    /// fails. The row's fields feed the field cache in that case.
    async fn enrich(
        &mut self,
        partial: &Map<String, Value>,
        sobject: &str,
        id_member: &str,
    ) -> Result<Option<Record>> {
        let Some(record_id) = partial.get(id_member).and_then(value_text) else {
            debug!(sobject, "Listing row without id");
            return Ok(None);
        };

        match self.fetch_one(&record_id, &[sobject]).await {
            Ok(Some(record)) => return Ok(Some(record)),
            Ok(None) => debug!(record_id, "Nothing more than the listing row"),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => error!(record_id, error = %e, "Cannot enrich listing row"),
        }

        let mut record = Record::from_json(partial);
        if !record.kind().is_reference() {
            record = Record::merge([Record::with_type(sobject), record]).unwrap_or_default();
        }
        let record_type = record.sobject_type().to_string();
        self.field_cache
            .add_fields(&record_type, record.qualified_field_names());
        Ok(Some(record))
    }

    /// SOAP id query, REST query and recently viewed items.
    async fn fetch_from_api_channels(&mut self, items: &mut ItemBag, sobject: &str) -> Result<()> {
        info!(sobject, "Looking for records through SOAP");
        match self.api.soap_query_ids(sobject).await {
            Ok(ids) => {
                if !ids.is_empty() {
                    info!(count = ids.len(), sobject, "Ids found through SOAP");
                }
                for record_id in ids {
                    if let Some(record) = self.fetch_api_listed(&record_id, sobject).await? {
                        items.insert(ItemKey::new(SOAP_SOURCE, &record_id, Some(sobject)), record);
                    }
                }
            }
            Err(e) => error!(sobject, error = %e, "Cannot read SOAP response"),
        }

        info!(sobject, "Looking for records through REST");
        for row in self.api.query_records(sobject).await {
            let record = Record::from_json(&row);
            let Some(record_id) = record.id().map(str::to_string) else {
                continue;
            };
            items.insert(ItemKey::new(QUERY_REST_SOURCE, record_id, Some(sobject)), record);
        }

        for record_id in self.api.recent_item_ids(sobject).await {
            if let Some(record) = self.fetch_api_listed(&record_id, sobject).await? {
                let key_id = record.id().unwrap_or(&record_id).to_string();
                items.insert(ItemKey::new(SOBJECTS_REST_SOURCE, key_id, Some(sobject)), record);
            }
        }
        Ok(())
    }

    async fn fetch_api_listed(&mut self, record_id: &str, sobject: &str) -> Result<Option<Record>> {
        match self.fetch_one(record_id, &[sobject]).await {
            Ok(record) => Ok(record),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                error!(record_id, error = %e, "Cannot retrieve record");
                Ok(None)
            }
        }
    }
}

/// Record of `record_id` in the `$Record` provider, with its type.
fn provided_record(provider: Option<&Value>, record_id: &str) -> Option<(String, Record)> {
    let records = provider?.get("records").and_then(Value::as_object);
    let Some(entry) = records.and_then(|records| records.get(record_id)) else {
        error!(record_id, "No record in the record provider");
        return None;
    };
    let entry = entry.as_object().filter(|entry| !entry.is_empty());
    let Some(entry) = entry.filter(|entry| !entry.contains_key("inaccessible")) else {
        error!(record_id, "Record exists but is inaccessible");
        return None;
    };
    let (sobject, value) = entry.iter().next()?;
    let record = value.get("record").and_then(Record::from_value)?;
    Some((sobject.clone(), record))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ID: &str = "001000000000001AAA";

    #[tokio::test]
    async fn test_fetch_one_blank_id() {
        let server = MockServer::start().await;
        let mut engine = engine(&server.uri());
        let err = engine.fetch_one(" ", &[]).await.unwrap_err();
        assert!(matches!(err.kind, ErrorKind::MissingRecordId));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_one_untyped_learns_type_from_provider() {
        let server = MockServer::start().await;
        mock_action(
            &server,
            "RecordGvpController",
            json!({
                "actions": [{"id": "1", "state": "SUCCESS", "returnValue": null, "error": []}],
                "context": {"fwuid": "abc", "globalValueProviders": [{
                    "type": "$Record",
                    "values": {"records": {ID: {"Account": {"record": {
                        "apiName": "Account",
                        "fields": {"Id": {"value": ID}, "Name": {"value": "Acme"}}
                    }}}}}
                }]}
            }),
        )
        .await;
        mock_action(
            &server,
            "getRecordWithFields",
            success(json!({"apiName": "Account", "fields": {"Phone": {"value": "555"}}})),
        )
        .await;
        mock_action(
            &server,
            "DetailController",
            success(json!({"record": {"Id": ID, "sobjectType": "Account", "Industry": "Tech"}})),
        )
        .await;
        mock_empty(&server).await;

        let mut engine = engine(&server.uri());
        let record = engine.fetch_one(ID, &[]).await.unwrap().unwrap();

        assert_eq!(record.sobject_type(), "Account");
        assert_eq!(record.id(), Some(ID));
        assert!(record.has_field("Name"));
        assert!(record.has_field("Phone"));
        assert!(record.has_field("Industry"));
    }

    #[tokio::test]
    async fn test_fetch_one_inaccessible_record() {
        let server = MockServer::start().await;
        mock_action(
            &server,
            "RecordGvpController",
            json!({
                "actions": [{"id": "1", "state": "SUCCESS", "returnValue": null, "error": []}],
                "context": {"globalValueProviders": [{
                    "type": "$Record",
                    "values": {"records": {ID: {"inaccessible": true}}}
                }]}
            }),
        )
        .await;
        mock_action(
            &server,
            "DetailController",
            success(json!({"onLoadErrorMessage": "You do not have access"})),
        )
        .await;

        let mut engine = engine(&server.uri());
        assert!(engine.fetch_one(ID, &[]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unsupported_type_is_skipped_afterwards() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(AURA_PATH))
            .and(body_string_contains("getItems"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(failure("Object Secret__c is not supported in UI API")),
            )
            .expect(1)
            .mount(&server)
            .await;
        mock_empty(&server).await;

        let mut engine = engine(&server.uri());
        assert!(engine.fetch_many(&["Secret__c"]).await.unwrap().is_empty());
        assert!(!engine
            .unsupported()
            .is_supported(
                "serviceComponent://ui.force.components.controllers.lists.selectableListDataProvider.SelectableListDataProviderController/ACTION$getItems",
                "Secret__c"
            ));

        // second run: the listing descriptor is not called again
        assert!(engine.fetch_many(&["Secret__c"]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_record_skips_unsupported_type() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(AURA_PATH))
            .and(body_string_contains("DetailController"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(failure("Object Secret__c is not supported in UI API")),
            )
            .expect(1)
            .mount(&server)
            .await;
        mock_empty(&server).await;

        let mut engine = engine(&server.uri());
        assert!(engine.fetch_one(ID, &["Secret__c"]).await.unwrap().is_none());
        assert!(!engine.unsupported().is_supported(
            "serviceComponent://ui.force.components.controllers.detail.DetailController/ACTION$getRecord",
            "Secret__c"
        ));

        // DetailController is not asked for Secret__c again
        assert!(engine.fetch_one(ID, &["Secret__c"]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetch_many_enriches_listed_rows() {
        let server = MockServer::start().await;
        mock_action(
            &server,
            "getItems",
            success(json!({"records": [{"id": ID, "Name": "Acme"}]})),
        )
        .await;
        mock_action(
            &server,
            "DetailController",
            success(json!({"record": {"Id": ID, "sobjectType": "Account", "Name": "Acme", "Phone": "555"}})),
        )
        .await;
        mock_empty(&server).await;

        let mut engine = engine(&server.uri());
        let records = engine.fetch_many(&["Account"]).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id(), Some(ID));
        assert!(records[0].has_field("Phone"));
    }

    #[tokio::test]
    async fn test_fetch_many_keeps_partial_row_when_enrichment_fails() {
        let server = MockServer::start().await;
        mock_action(
            &server,
            "getLookupItems",
            success(json!({"result": [{"record": {"Id": ID, "Name": "Acme"}}]})),
        )
        .await;
        mock_empty(&server).await;

        let mut engine = engine(&server.uri());
        let records = engine.fetch_many(&["Account"]).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sobject_type(), "Account");
        assert!(engine.field_cache().fields("Account").contains("Account.Name"));
        assert!(!engine.field_cache().fields("Account").contains("Account.sobjectType"));
    }

    #[tokio::test]
    async fn test_fetch_many_nested_records_shape() {
        let server = MockServer::start().await;
        mock_action(
            &server,
            "getItems",
            success(json!({"records": {"records": [{"id": ID}], "count": 1}})),
        )
        .await;
        mock_action(
            &server,
            "DetailController",
            success(json!({"record": {"Id": ID, "sobjectType": "Account"}})),
        )
        .await;
        mock_empty(&server).await;

        let mut engine = engine(&server.uri());
        let records = engine.fetch_many(&["Account"]).await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_many_uses_api_channels_with_sid() {
        let server = MockServer::start().await;
        mock_empty(&server).await;
        Mock::given(method("POST"))
            .and(path("/services/Soap/c/60.0/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/"><soapenv:Body><queryResponse><result><records><Id>{ID}</Id></records><size>1</size></result></queryResponse></soapenv:Body></soapenv:Envelope>"#
            )))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex(r"/services/data/v60\.0/sobjects/Account/001000000000001AAA$"))
            .and(header("Authorization", "OAuth 00D!sid"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"Id": ID, "Name": "Acme"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/services/data/v60.0/query/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "records": [{"Id": "001000000000002AAA", "Name": "Other"}]
            })))
            .mount(&server)
            .await;

        let mut engine = engine_with_sid(&server.uri());
        let records = engine.fetch_many(&["Account"]).await.unwrap();

        let ids: Vec<_> = records.iter().filter_map(Record::id).collect();
        assert_eq!(ids, vec![ID, "001000000000002AAA"]);
        assert!(records[0].has_field("Name"));
    }

    #[tokio::test]
    async fn test_fetch_many_without_sid_skips_api_channels() {
        let server = MockServer::start().await;
        mock_empty(&server).await;
        Mock::given(method("POST"))
            .and(path("/services/Soap/c/60.0/"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut engine = engine(&server.uri());
        assert!(engine.fetch_many(&["Account"]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_many_uses_session_obtained_after_build() {
        let server = MockServer::start().await;
        mock_empty(&server).await;
        Mock::given(method("GET"))
            .and(path("/services/data/v60.0/query/"))
            .and(header("Authorization", "OAuth 00D!late"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "records": [{"Id": ID, "Name": "Acme"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut engine = engine(&server.uri());
        engine
            .aura_mut()
            .update_credentials(auraprobe_aura::Credentials::default().with_sid("00D!late"));
        let records = engine.fetch_many(&["Account"]).await.unwrap();

        assert_eq!(engine.api().sid(), Some("00D!late"));
        assert_eq!(records.iter().filter_map(Record::id).collect::<Vec<_>>(), vec![ID]);
    }

    #[tokio::test]
    async fn test_fetch_one_fatal_error_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(AURA_PATH))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let mut engine = engine(&server.uri());
        let err = engine.fetch_one(ID, &[]).await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_provided_record() {
        let provider = json!({"records": {ID: {"Contact": {"record": {"Id": ID, "sobjectType": "Contact"}}}}});
        let (sobject, record) = provided_record(Some(&provider), ID).unwrap();
        assert_eq!(sobject, "Contact");
        assert_eq!(record.id(), Some(ID));

        assert!(provided_record(Some(&json!({"records": {ID: {}}})), ID).is_none());
        assert!(provided_record(None, ID).is_none());
    }
}
