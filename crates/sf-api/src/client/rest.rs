use std::collections::BTreeSet;

use auraprobe_client::security::{names, url as url_security};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, trace};

use crate::types::{textual_record, DescribeResult, RecentItems, RestRecord, SObjectList, API_VERSION};

fn data_path(rest: &str) -> String {
    format!("/services/data/{API_VERSION}/{rest}")
}

fn parse_body<T: DeserializeOwned>(body: &str) -> Option<T> {
    if body.trim().is_empty() {
        return None;
    }
    match serde_json::from_str(body) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            debug!(error = %e, "Unparseable REST response");
            trace!(body, "REST response body");
            None
        }
    }
}

fn checked_type(sobject: &str) -> Option<&str> {
    if names::is_safe_type_name(sobject) {
        Some(sobject)
    } else {
        debug!(sobject, "Skipping REST call for malformed type name");
        None
    }
}

impl super::ApiClient {
    /// Names of every object type the REST API lists.
    #[instrument(skip(self))]
    pub async fn list_sobjects(&self) -> Vec<String> {
        let response = self.get(&data_path("sobjects")).await;
        parse_body::<SObjectList>(&response.body)
            .map(|list| list.sobjects.into_iter().map(|item| item.name).collect())
            .unwrap_or_default()
    }

    /// One record by type and id, textual members only.
    #[instrument(skip(self))]
    pub async fn get_sobject(&self, sobject: &str, id: &str) -> Option<RestRecord> {
        let Some(path) = url_security::sobject_path(sobject, id) else {
            debug!(sobject, id, "Skipping REST lookup for malformed type or id");
            return None;
        };
        let response = self.get(&data_path(&path)).await;
        let value: Value = parse_body(&response.body)?;
        let record = textual_record(&value, sobject);
        if record.is_none() {
            trace!(sobject, id, "REST record not readable");
        }
        record
    }

    /// Ids of the recently viewed records of a type.
    #[instrument(skip(self))]
    pub async fn recent_item_ids(&self, sobject: &str) -> Vec<String> {
        let Some(sobject) = checked_type(sobject) else {
            return Vec::new();
        };
        let response = self.get(&data_path(&format!("sobjects/{sobject}/"))).await;
        parse_body::<RecentItems>(&response.body)
            .map(|recent| {
                recent
                    .recent_items
                    .iter()
                    .filter_map(|item| item.get("Id").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Field names of a type, as `Type.field`.
    #[instrument(skip(self))]
    pub async fn describe_fields(&self, sobject: &str) -> BTreeSet<String> {
        let Some(sobject) = checked_type(sobject) else {
            return BTreeSet::new();
        };
        let response = self
            .get(&data_path(&format!("sobjects/{sobject}/describe")))
            .await;
        parse_body::<DescribeResult>(&response.body)
            .map(|describe| {
                describe
                    .fields
                    .into_iter()
                    .map(|field| format!("{sobject}.{}", field.name))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Up to ten records of a type through the query endpoint.
    #[instrument(skip(self))]
    pub async fn query_records(&self, sobject: &str) -> Vec<RestRecord> {
        let Some(sobject) = checked_type(sobject) else {
            return Vec::new();
        };
        let path = data_path(&format!(
            "query/?q=SELECT+FIELDS(ALL)+FROM+{sobject}+LIMIT+10"
        ));
        let response = self.get(&path).await;
        let Some(value) = parse_body::<Value>(&response.body) else {
            return Vec::new();
        };
        match value.get("records").and_then(Value::as_array) {
            Some(records) => records
                .iter()
                .filter_map(|record| textual_record(record, sobject))
                .collect(),
            None => {
                debug!(sobject, "No records in query response");
                Vec::new()
            }
        }
    }
}
