//! Synthetic values for write and create testing.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde_json::Value;

use crate::record::{Field, FieldKind, FieldValue};

/// Id sent for reference fields.
pub const FAKE_REFERENCE_ID: &str = "1234567890ABCDE";

/// A field name and the value to send for it.
///
/// Reference fields are sent as `{name}.Id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthetic {
    pub name: String,
    pub value: Value,
}

/// Build a value matching the inferred kind of `field`.
///
/// Lists get no value.
pub fn synthetic(field: &Field) -> Option<Synthetic> {
    let name = field.name.clone();
    let value = match field.kind() {
        FieldKind::Boolean => Value::Bool(!is_true(field.real_value())),
        FieldKind::Date => Value::String(timestamp(Utc::now())),
        FieldKind::Integer => Value::from(random_digits()),
        FieldKind::String => Value::String(format!("test-{name}{}", random_digits())),
        FieldKind::SObject(_) => {
            return Some(Synthetic {
                name: format!("{name}.Id"),
                value: Value::String(FAKE_REFERENCE_ID.to_string()),
            });
        }
        FieldKind::List => return None,
    };
    Some(Synthetic { name, value })
}

fn is_true(value: &FieldValue) -> bool {
    match value {
        FieldValue::Bool(b) => *b,
        FieldValue::Text(text) => text.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn random_digits() -> u32 {
    rand::rng().random_range(10_000..=99_999)
}

/// ISO-8601 with milliseconds and an explicit `+00:00` offset.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.3f+00:00").to_string()
}
