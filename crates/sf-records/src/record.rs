//! Record model.
//!
//! Channels return the same logical record in different shapes: flat REST
//! maps, UI API records (`apiName` + `fields`), attribute records wrapping a
//! `value`. Everything is normalized into [`Record`], a case-insensitive set
//! of fields whose type and id are derived from the fields themselves.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

use chrono::NaiveDate;
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use serde_json::{Map, Number, Value};

/// Field holding the object type of a root record.
pub const TYPE_FIELD: &str = "sobjectType";
/// Field holding the record id.
pub const ID_FIELD: &str = "Id";
/// Wrapper field of attribute records.
const VALUE_FIELD: &str = "value";
/// Always kept as text.
const DISPLAY_VALUE_FIELD: &str = "displayValue";
/// Marks a UI API record to be flattened.
const API_NAME_MEMBER: &str = "apiName";
const FIELDS_MEMBER: &str = "fields";

/// Inferred kind of a field value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKind {
    String,
    Boolean,
    Date,
    /// Integer- and float-looking values alike.
    Integer,
    List,
    /// A reference to another object type.
    SObject(String),
}

impl FieldKind {
    pub fn label(&self) -> &str {
        match self {
            FieldKind::String => "string",
            FieldKind::Boolean => "boolean",
            FieldKind::Date => "date",
            FieldKind::Integer => "integer",
            FieldKind::List => "list",
            FieldKind::SObject(name) => name,
        }
    }

    /// Inverse of [`FieldKind::label`]; unknown labels are object types.
    pub fn from_label(label: &str) -> Self {
        match label {
            "string" => FieldKind::String,
            "boolean" => FieldKind::Boolean,
            "date" => FieldKind::Date,
            "integer" => FieldKind::Integer,
            "list" => FieldKind::List,
            other => FieldKind::SObject(other.to_string()),
        }
    }

    /// Kind of a textual value, checked as boolean, date, integer, float.
    pub fn infer_text(text: &str) -> Self {
        if text.eq_ignore_ascii_case("true") || text.eq_ignore_ascii_case("false") {
            FieldKind::Boolean
        } else if is_iso_date(text) {
            FieldKind::Date
        } else if text.parse::<i32>().is_ok() || text.parse::<f32>().is_ok() {
            FieldKind::Integer
        } else {
            FieldKind::String
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, FieldKind::SObject(_))
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// `YYYY-MM-DD`, optionally followed by time information.
fn is_iso_date(text: &str) -> bool {
    let Some(date) = text.get(..10) else {
        return false;
    };
    let rest = &text[10..];
    (rest.is_empty() || rest.starts_with(['T', ' ', 'Z', '+', '-']))
        && NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok()
}

/// Value of one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
    Record(Box<Record>),
    List(Vec<FieldValue>),
}

impl FieldValue {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(*b),
            Value::Number(n) => FieldValue::Number(n.clone()),
            Value::String(s) => FieldValue::Text(s.clone()),
            Value::Array(items) => FieldValue::List(items.iter().map(FieldValue::from_json).collect()),
            Value::Object(map) => FieldValue::Record(Box::new(Record::from_json(map))),
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Null => FieldKind::String,
            FieldValue::Bool(_) => FieldKind::Boolean,
            FieldValue::Number(_) => FieldKind::Integer,
            FieldValue::Text(text) => FieldKind::infer_text(text),
            FieldValue::Record(record) => record.kind().clone(),
            FieldValue::List(_) => FieldKind::List,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            FieldValue::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Returns true if this value is what `sent` would read back as.
    pub fn matches_json(&self, sent: &Value) -> bool {
        match (self, sent) {
            (FieldValue::Null, Value::Null) => true,
            (FieldValue::Bool(a), Value::Bool(b)) => a == b,
            (FieldValue::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
                (Some(a), Some(b)) => a == b,
                _ => a.as_f64() == b.as_f64(),
            },
            (FieldValue::Text(a), Value::String(b)) => a == b,
            _ => false,
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Null => serializer.serialize_none(),
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::Number(n) => n.serialize(serializer),
            FieldValue::Text(text) => serializer.serialize_str(text),
            FieldValue::Record(record) => record.serialize(serializer),
            FieldValue::List(items) => serializer.collect_seq(items),
        }
    }
}

/// A named value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
}

impl Field {
    pub fn new(name: impl Into<String>, value: FieldValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn kind(&self) -> FieldKind {
        self.value.kind()
    }

    /// The value, unwrapped from an attribute record's `value` field.
    pub fn real_value(&self) -> &FieldValue {
        match &self.value {
            FieldValue::Record(record) => match record.field(VALUE_FIELD) {
                Some(inner) => inner.real_value(),
                None => &self.value,
            },
            other => other,
        }
    }
}

/// A record assembled from one or more channels.
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: Vec<Field>,
    kind: OnceLock<FieldKind>,
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty record of a known type.
    pub fn with_type(sobject: impl Into<String>) -> Self {
        let mut record = Self::new();
        record.insert(Field::new(TYPE_FIELD, FieldValue::Text(sobject.into())));
        record
    }

    /// Build a record from a JSON object.
    ///
    /// An object carrying `apiName` is flattened into `sobjectType` plus the
    /// members of its `fields` object. Nested objects become nested records.
    pub fn from_json(map: &Map<String, Value>) -> Self {
        match map.get(API_NAME_MEMBER) {
            Some(api_name) => {
                let mut flat = Map::new();
                flat.insert(TYPE_FIELD.to_string(), api_name.clone());
                if let Some(Value::Object(fields)) = map.get(FIELDS_MEMBER) {
                    for (name, value) in fields {
                        flat.insert(name.clone(), value.clone());
                    }
                }
                Self::from_flat(&flat)
            }
            None => Self::from_flat(map),
        }
    }

    /// [`Record::from_json`] for a value that should be an object.
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_object().map(Self::from_json)
    }

    fn from_flat(map: &Map<String, Value>) -> Self {
        let mut record = Self::new();
        for (name, value) in map {
            let value = match value {
                Value::Null | Value::Object(_) => FieldValue::from_json(value),
                Value::String(text) if name.eq_ignore_ascii_case(DISPLAY_VALUE_FIELD) => {
                    FieldValue::Text(text.clone())
                }
                other if name.eq_ignore_ascii_case(DISPLAY_VALUE_FIELD) => {
                    FieldValue::Text(other.to_string())
                }
                other => FieldValue::from_json(other),
            };
            record.insert(Field::new(name.clone(), value));
        }
        record
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Case-insensitive field lookup.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name.eq_ignore_ascii_case(name))
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Add a field. An existing field of the same name keeps its value
    /// unless that value is null.
    pub fn insert(&mut self, field: Field) {
        match self
            .fields
            .iter_mut()
            .find(|f| f.name.eq_ignore_ascii_case(&field.name))
        {
            Some(existing) => {
                if existing.value.is_null() && !field.value.is_null() {
                    existing.value = field.value;
                }
            }
            None => self.fields.push(field),
        }
        self.kind = OnceLock::new();
    }

    /// Resolved kind: `sobjectType`, else the kind of the `value` field,
    /// else string. Computed once.
    pub fn kind(&self) -> &FieldKind {
        self.kind.get_or_init(|| self.resolve_kind())
    }

    /// Type label, e.g. `Account` or `string` for attribute records.
    pub fn sobject_type(&self) -> &str {
        self.kind().label()
    }

    fn resolve_kind(&self) -> FieldKind {
        if let Some(FieldValue::Text(sobject)) = self.field(TYPE_FIELD).map(|f| &f.value) {
            if !sobject.is_empty() {
                return FieldKind::SObject(sobject.clone());
            }
        }
        match self.field(VALUE_FIELD) {
            Some(field) => field.value.kind(),
            None => FieldKind::String,
        }
    }

    /// Record id: the `Id` field, unwrapped from nested records, else the
    /// `value` wrapper.
    pub fn id(&self) -> Option<&str> {
        if let Some(field) = self.field(ID_FIELD) {
            match &field.value {
                FieldValue::Text(id) => return Some(id.as_str()).filter(|id| !id.is_empty()),
                FieldValue::Record(record) => return record.id(),
                _ => {}
            }
        }
        match self.field(VALUE_FIELD).map(|f| &f.value) {
            Some(FieldValue::Record(record)) => record.id(),
            Some(FieldValue::Text(id)) if !id.is_empty() => Some(id.as_str()),
            _ => None,
        }
    }

    /// Field names qualified with the record type, `Type.field`. The type
    /// field itself is left out.
    pub fn qualified_field_names(&self) -> BTreeSet<String> {
        let sobject = self.sobject_type();
        self.fields
            .iter()
            .filter(|f| !f.name.eq_ignore_ascii_case(TYPE_FIELD))
            .map(|f| format!("{sobject}.{}", f.name))
            .collect()
    }

    /// Union of the fields of `records`. `None` for an empty input.
    pub fn merge(records: impl IntoIterator<Item = Record>) -> Option<Record> {
        let mut records = records.into_iter();
        let mut merged = records.next()?;
        for record in records {
            for field in record.fields {
                merged.insert(field);
            }
        }
        Some(merged)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Record", 3)?;
        state.serialize_field("sobjectType", self.sobject_type())?;
        state.serialize_field("id", &self.id())?;
        state.serialize_field("fields", &self.fields)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::from_value(&value).unwrap()
    }

    fn value_kind(value: Value) -> FieldKind {
        record(json!({ "value": value })).kind().clone()
    }

    #[test]
    fn test_kind_inference() {
        assert_eq!(value_kind(json!("true")), FieldKind::Boolean);
        assert_eq!(value_kind(json!("FALSE")), FieldKind::Boolean);
        assert_eq!(value_kind(json!("2024-01-01")), FieldKind::Date);
        assert_eq!(value_kind(json!("2024-01-01T10:00:00.000Z")), FieldKind::Date);
        assert_eq!(value_kind(json!("42")), FieldKind::Integer);
        assert_eq!(value_kind(json!("3.14")), FieldKind::Integer);
        assert_eq!(value_kind(json!("Acme")), FieldKind::String);
        assert_eq!(value_kind(json!("2024-13-45")), FieldKind::String);
        assert_eq!(value_kind(json!(null)), FieldKind::String);
        assert_eq!(
            value_kind(json!({"sobjectType": "User", "Id": "005000000000001AAA"})),
            FieldKind::SObject("User".into())
        );
        assert_eq!(record(json!({"Name": "x"})).kind(), &FieldKind::String);
    }

    #[test]
    fn test_kind_is_value_derived() {
        let a = value_kind(json!("12"));
        let b = value_kind(json!("12"));
        assert_eq!(a, b);
        assert_eq!(FieldKind::from_label(a.label()), a);
        assert_eq!(FieldKind::from_label("Account"), FieldKind::SObject("Account".into()));
    }

    #[test]
    fn test_type_field_wins() {
        let r = record(json!({"sobjectType": "Account", "value": "42"}));
        assert_eq!(r.sobject_type(), "Account");
    }

    #[test]
    fn test_api_name_flattening() {
        let r = record(json!({
            "apiName": "Contact",
            "id": "003000000000001AAA",
            "fields": {
                "Id": {"displayValue": null, "value": "003000000000001AAA"},
                "LastName": {"displayValue": 12, "value": "Doe"}
            }
        }));
        assert_eq!(r.sobject_type(), "Contact");
        assert_eq!(r.id(), Some("003000000000001AAA"));
        assert!(!r.has_field("apiName"));
        assert_eq!(r.field("id").unwrap().name, "Id");

        let last_name = r.field("lastname").unwrap();
        assert_eq!(last_name.real_value(), &FieldValue::Text("Doe".into()));
        let display = last_name.value.as_record().unwrap().field("displayValue").unwrap();
        assert_eq!(display.value, FieldValue::Text("12".into()));
    }

    #[test]
    fn test_id_resolution() {
        assert_eq!(record(json!({"Id": "001000000000001AAA"})).id(), Some("001000000000001AAA"));
        assert_eq!(
            record(json!({"Id": {"value": "001000000000001AAA"}})).id(),
            Some("001000000000001AAA")
        );
        assert_eq!(record(json!({"value": "a0B000000000001AAA"})).id(), Some("a0B000000000001AAA"));
        assert_eq!(record(json!({"Name": "x"})).id(), None);
        assert_eq!(record(json!({"Id": ""})).id(), None);
    }

    #[test]
    fn test_merge_unions_fields() {
        let a = record(json!({"sobjectType": "Account", "Id": "001000000000001AAA", "Name": null}));
        let b = record(json!({"Id": "001000000000001AAA", "Name": "Acme", "Phone": "555"}));
        let merged = Record::merge([a, b]).unwrap();
        assert_eq!(merged.len(), 4);
        assert_eq!(merged.field("Name").unwrap().value, FieldValue::Text("Acme".into()));
        assert_eq!(merged.sobject_type(), "Account");

        assert!(Record::merge(Vec::new()).is_none());
    }

    #[test]
    fn test_merge_keeps_first_non_null() {
        let a = record(json!({"Name": "first"}));
        let b = record(json!({"NAME": "second"}));
        let merged = Record::merge([a, b]).unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged.field("name").unwrap().value, FieldValue::Text("first".into()));
    }

    #[test]
    fn test_arrays_become_lists() {
        let r = record(json!({"Tags": [{"Id": "x"}, "b"]}));
        let field = r.field("Tags").unwrap();
        assert_eq!(field.kind(), FieldKind::List);
        let FieldValue::List(items) = &field.value else {
            panic!("expected a list");
        };
        assert!(items[0].as_record().is_some());
        assert_eq!(items[1].as_str(), Some("b"));
    }

    #[test]
    fn test_qualified_field_names() {
        let r = record(json!({"sobjectType": "Case", "Subject": "s"}));
        let names = r.qualified_field_names();
        assert!(names.contains("Case.Subject"));
        assert!(!names.contains("Case.sobjectType"));
    }

    #[test]
    fn test_matches_json() {
        assert!(FieldValue::Text("a".into()).matches_json(&json!("a")));
        assert!(FieldValue::Bool(true).matches_json(&json!(true)));
        assert!(FieldValue::from_json(&json!(12345)).matches_json(&json!(12345)));
        assert!(!FieldValue::Text("12345".into()).matches_json(&json!(12345)));
        assert!(!FieldValue::Null.matches_json(&json!("a")));
    }

    #[test]
    fn test_serialized_shape() {
        let r = record(json!({
            "sobjectType": "Account",
            "Id": "001000000000001AAA",
            "Owner": {"sobjectType": "User", "Id": "005000000000001AAA"}
        }));
        let value = serde_json::to_value(&r).unwrap();
        assert_eq!(value["sobjectType"], "Account");
        assert_eq!(value["id"], "001000000000001AAA");
        let fields = value["fields"].as_array().unwrap();
        assert_eq!(fields.len(), 3);
        let owner = fields.iter().find(|f| f["name"] == "Owner").unwrap();
        assert_eq!(owner["value"]["sobjectType"], "User");
        assert_eq!(owner["value"]["id"], "005000000000001AAA");
    }
}
