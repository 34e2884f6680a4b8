//! Action templates per protocol operation.
//!
//! Each operation maps to one or more server-side action descriptors with a
//! default parameter object. Callers take a copy of a template and fill the
//! parameters it declares before sending it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{Error, ErrorKind, Result};

/// Protocol operations that have action templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Login,
    GetRecord,
    GetRecords,
    GetRecordFields,
    GetRecordInfo,
    GetRecordTypes,
    CreateRecord,
    WriteRecordFields,
}

impl Operation {
    /// Every operation, in catalog order.
    pub const ALL: [Operation; 8] = [
        Operation::Login,
        Operation::GetRecord,
        Operation::GetRecords,
        Operation::GetRecordFields,
        Operation::GetRecordInfo,
        Operation::GetRecordTypes,
        Operation::CreateRecord,
        Operation::WriteRecordFields,
    ];

    /// Name used as key in JSON catalogs.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Login => "login",
            Operation::GetRecord => "getrecord",
            Operation::GetRecords => "getrecords",
            Operation::GetRecordFields => "getrecordfields",
            Operation::GetRecordInfo => "getrecordinfo",
            Operation::GetRecordTypes => "getrecordtypes",
            Operation::CreateRecord => "createrecord",
            Operation::WriteRecordFields => "writerecordfields",
        }
    }

    /// Parse a catalog key.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One action descriptor and its parameter object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionTemplate {
    pub descriptor: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl ActionTemplate {
    pub fn new(descriptor: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            descriptor: descriptor.into(),
            params,
        }
    }

    /// Returns true if the template declares `name`.
    pub fn has_param(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    /// Set a parameter, declared or not.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.params.insert(name.to_string(), value.into());
    }

    /// Set a parameter only if the template declares it.
    ///
    /// Returns whether the value was applied.
    pub fn fill(&mut self, name: &str, value: impl Into<Value>) -> bool {
        match self.params.get_mut(name) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }
}

/// Templates for every operation.
#[derive(Debug, Clone, Default)]
pub struct ActionCatalog {
    templates: HashMap<Operation, Vec<ActionTemplate>>,
}

impl ActionCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the templates of one operation.
    pub fn with_templates(mut self, operation: Operation, templates: Vec<ActionTemplate>) -> Self {
        self.templates.insert(operation, templates);
        self
    }

    /// Copies of the templates for `operation`, ready to be filled.
    pub fn templates(&self, operation: Operation) -> Vec<ActionTemplate> {
        self.templates.get(&operation).cloned().unwrap_or_default()
    }

    /// Copy of the first template for `operation`.
    pub fn first(&self, operation: Operation) -> Option<ActionTemplate> {
        self.templates
            .get(&operation)
            .and_then(|templates| templates.first())
            .cloned()
    }

    /// Load a catalog from `{"operation": [{"descriptor": .., "params": {..}}]}`.
    ///
    /// Unknown operation names are rejected; operations absent from the
    /// document have no templates.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: HashMap<String, Vec<ActionTemplate>> = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        for (name, templates) in raw {
            let operation = Operation::from_name(&name).ok_or_else(|| {
                Error::new(ErrorKind::Config(format!("unknown catalog operation '{name}'")))
            })?;
            catalog.templates.insert(operation, templates);
        }
        Ok(catalog)
    }

    /// Descriptors commonly exposed to guest and community users.
    pub fn builtin() -> Self {
        Self::new()
            .with_templates(
                Operation::Login,
                vec![template(
                    "apex://LightningLoginFormController/ACTION$login",
                    json!({"username": "", "password": "", "startUrl": ""}),
                )],
            )
            .with_templates(
                Operation::GetRecord,
                vec![
                    template(
                        "serviceComponent://ui.force.components.controllers.detail.DetailController/ACTION$getRecord",
                        json!({
                            "recordId": "",
                            "record": null,
                            "inContextOfComponent": "",
                            "mode": "VIEW",
                            "layoutType": "FULL",
                            "defaultFieldValues": null,
                            "navigationLocation": "DETAIL"
                        }),
                    ),
                    template(
                        "serviceComponent://ui.force.components.controllers.recordGlobalValueProvider.RecordGvpController/ACTION$getRecord",
                        json!({"recordDescriptor": ""}),
                    ),
                ],
            )
            .with_templates(
                Operation::GetRecords,
                vec![
                    template(
                        "serviceComponent://ui.force.components.controllers.lists.selectableListDataProvider.SelectableListDataProviderController/ACTION$getItems",
                        json!({
                            "entityNameOrId": "",
                            "layoutType": "FULL",
                            "pageSize": 100,
                            "currentPage": 0,
                            "useTimeout": false,
                            "getCount": false,
                            "enableRowActions": false
                        }),
                    ),
                    template(
                        "serviceComponent://ui.force.components.controllers.lists.listViewPickerDataProvider.ListViewPickerDataProviderController/ACTION$getInitialListViews",
                        json!({"scope": "", "maxMruResults": 10, "maxAllResults": 20}),
                    ),
                    template(
                        "serviceComponent://ui.force.components.controllers.lookup.ScopedResultsDataProviderController/ACTION$getLookupItems",
                        json!({
                            "scope": "",
                            "term": "",
                            "pageSize": 10,
                            "currentPage": 1,
                            "enableRowActions": false,
                            "additionalFields": [],
                            "useADS": false
                        }),
                    ),
                ],
            )
            .with_templates(
                Operation::GetRecordFields,
                vec![template(
                    "aura://RecordUiController/ACTION$getRecordWithFields",
                    json!({"recordId": "", "fields": []}),
                )],
            )
            .with_templates(
                Operation::GetRecordInfo,
                vec![template(
                    "aura://RecordUiController/ACTION$getObjectInfo",
                    json!({"objectApiName": ""}),
                )],
            )
            .with_templates(
                Operation::GetRecordTypes,
                vec![template(
                    "serviceComponent://ui.force.components.controllers.hostConfig.HostConfigController/ACTION$getConfigData",
                    json!({}),
                )],
            )
            .with_templates(
                Operation::CreateRecord,
                vec![template(
                    "aura://RecordUiController/ACTION$createRecord",
                    json!({"apiName": "", "fields": {}}),
                )],
            )
            .with_templates(
                Operation::WriteRecordFields,
                vec![template(
                    "aura://RecordUiController/ACTION$updateRecord",
                    json!({"recordId": "", "apiName": "", "recordInput": {}}),
                )],
            )
    }
}

fn template(descriptor: &str, params: Value) -> ActionTemplate {
    let params = match params {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    ActionTemplate::new(descriptor, params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_every_operation() {
        let catalog = ActionCatalog::builtin();
        for op in Operation::ALL {
            assert!(
                !catalog.templates(op).is_empty(),
                "no template for {op}"
            );
        }
        assert_eq!(catalog.templates(Operation::GetRecord).len(), 2);
        assert_eq!(catalog.templates(Operation::GetRecords).len(), 3);
    }

    #[test]
    fn test_fill_only_declared_params() {
        let mut t = ActionCatalog::builtin()
            .first(Operation::GetRecordInfo)
            .unwrap();
        assert!(t.fill("objectApiName", "Account"));
        assert!(!t.fill("recordId", "001"));
        assert_eq!(t.param("objectApiName"), Some(&json!("Account")));
        assert!(!t.has_param("recordId"));
    }

    #[test]
    fn test_set_adds_params() {
        let mut t = ActionCatalog::builtin()
            .first(Operation::GetRecordFields)
            .unwrap();
        t.set("objectApiName", "Contact");
        assert!(t.has_param("objectApiName"));
    }

    #[test]
    fn test_templates_are_copies() {
        let catalog = ActionCatalog::builtin();
        let mut first = catalog.first(Operation::Login).unwrap();
        first.set("username", "someone");
        let again = catalog.first(Operation::Login).unwrap();
        assert_eq!(again.param("username"), Some(&json!("")));
    }

    #[test]
    fn test_from_json() {
        let catalog = ActionCatalog::from_json(
            r#"{"getrecordinfo": [{"descriptor": "aura://X/ACTION$y", "params": {"objectApiName": ""}}],
                "getrecordtypes": [{"descriptor": "aura://Z/ACTION$w"}]}"#,
        )
        .unwrap();
        let info = catalog.first(Operation::GetRecordInfo).unwrap();
        assert_eq!(info.descriptor, "aura://X/ACTION$y");
        assert!(catalog.first(Operation::GetRecordTypes).unwrap().params.is_empty());
        assert!(catalog.templates(Operation::Login).is_empty());
    }

    #[test]
    fn test_from_json_rejects_unknown_operation() {
        let err = ActionCatalog::from_json(r#"{"deleterecord": []}"#).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Config(_)));
        assert!(ActionCatalog::from_json("not json").is_err());
    }

    #[test]
    fn test_operation_names_round_trip() {
        for op in Operation::ALL {
            assert_eq!(Operation::from_name(op.name()), Some(op));
        }
        assert_eq!(Operation::from_name("nope"), None);
    }
}
