//! REST response shapes. Unknown members are ignored.

use serde::Deserialize;
use serde_json::{Map, Value};

/// REST API version used for every path.
pub const API_VERSION: &str = "v60.0";

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct SObjectList {
    #[serde(default)]
    pub sobjects: Vec<SObjectListItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SObjectListItem {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct DescribeResult {
    #[serde(default)]
    pub fields: Vec<DescribeField>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DescribeField {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RecentItems {
    #[serde(default)]
    pub recent_items: Vec<Map<String, Value>>,
}

/// A record as returned by the REST channels: textual members only, plus
/// `sobjectType`.
pub type RestRecord = Map<String, Value>;

/// Keep the textual members of a JSON object and tag it with its type.
///
/// Returns `None` when `value` is not an object.
pub fn textual_record(value: &Value, sobject: &str) -> Option<RestRecord> {
    let object = value.as_object()?;
    let mut record: RestRecord = object
        .iter()
        .filter(|(_, v)| v.is_string())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    record.insert("sobjectType".to_string(), Value::String(sobject.to_string()));
    Some(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_textual_record_keeps_strings() {
        let value = json!({
            "attributes": {"type": "Account"},
            "Id": "001000000000001AAA",
            "Name": "Acme",
            "NumberOfEmployees": 12,
            "IsDeleted": false,
            "ParentId": null
        });
        let record = textual_record(&value, "Account").unwrap();
        assert_eq!(record.len(), 3);
        assert_eq!(record["Id"], "001000000000001AAA");
        assert_eq!(record["sobjectType"], "Account");
        assert!(!record.contains_key("NumberOfEmployees"));
    }

    #[test]
    fn test_textual_record_rejects_non_objects() {
        assert!(textual_record(&json!([{"errorCode": "NOT_FOUND"}]), "Account").is_none());
    }
}
