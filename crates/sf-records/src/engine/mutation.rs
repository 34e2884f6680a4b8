//! Write testing: field updates on existing records and record creation.
//!
//! Every attempt sends real data to the target.

use std::collections::BTreeSet;
use std::fmt;

use auraprobe_aura::{classifier, ActionTemplate, Operation};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, error, info, instrument, trace, warn};

use super::RecordEngine;
use crate::error::{Error, ErrorKind, Result};
use crate::fake::{self, Synthetic};
use crate::item::ItemBag;
use crate::record::{Field, FieldValue, Record, ID_FIELD, TYPE_FIELD};

/// Outcome of one field update attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
    /// The value read back is the value sent.
    Writable,
    /// Accepted, but the value read back differs or could not be read.
    Inconclusive,
    /// The field is protected against updates.
    NotWritable,
    /// The field is probably writable but the value was rejected.
    InvalidValue,
    /// Rejected for another reason.
    Rejected,
    /// The whole record cannot be updated; remaining fields are skipped.
    RecordLocked,
}

impl fmt::Display for WriteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WriteOutcome::Writable => "writable",
            WriteOutcome::Inconclusive => "inconclusive",
            WriteOutcome::NotWritable => "not writable",
            WriteOutcome::InvalidValue => "invalid value",
            WriteOutcome::Rejected => "rejected",
            WriteOutcome::RecordLocked => "record locked",
        };
        f.write_str(label)
    }
}

/// One tested field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldWriteReport {
    pub record_id: String,
    pub sobject: String,
    /// Name sent, `Owner.Id` for references.
    pub field: String,
    pub descriptor: String,
    pub outcome: WriteOutcome,
}

/// A record the target accepted to create.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedRecord {
    pub descriptor: String,
    pub sobject: String,
    /// The single field sent, `None` when created without fields.
    pub field: Option<String>,
    pub record: Record,
}

impl RecordEngine {
    /// Try to update every field of a retrieved record.
    #[instrument(skip(self, record), fields(record_id = ?record.id()))]
    pub async fn write_record_fields(&mut self, record: &Record) -> Result<Vec<FieldWriteReport>> {
        let Some(record_id) = record.id().map(str::to_string) else {
            error!("Cannot test fields of a record without id");
            return Err(Error::new(ErrorKind::MissingRecordId));
        };
        let sobject = record.sobject_type().to_string();
        let fields: Vec<Field> = record
            .fields()
            .iter()
            .filter(|f| {
                !f.name.eq_ignore_ascii_case(ID_FIELD) && !f.name.eq_ignore_ascii_case(TYPE_FIELD)
            })
            .cloned()
            .collect();
        self.try_update_fields(&record_id, &sobject, &fields).await
    }

    /// Try to update the known fields of `types` on an arbitrary record id.
    ///
    /// Field values are unknown here, so every field is tested as text.
    #[instrument(skip(self))]
    pub async fn write_fields_by_type(
        &mut self,
        record_id: &str,
        types: &[&str],
    ) -> Result<Vec<FieldWriteReport>> {
        if record_id.trim().is_empty() || types.is_empty() {
            error!("Field testing needs a record id and at least one type");
            return Err(Error::new(ErrorKind::MissingRecordId));
        }

        let mut reports = Vec::new();
        for sobject in types {
            let names = match self.field_names(sobject).await {
                Ok(names) => names,
                Err(e) if e.is_invalid_parameters() => {
                    error!(sobject, "Cannot list fields");
                    continue;
                }
                Err(e) => return Err(e),
            };
            warn!(sobject, "Testing every field as text, expect more rejections");
            let fields: Vec<Field> = names
                .iter()
                .map(|name| unqualified(name, sobject))
                .filter(|name| !name.eq_ignore_ascii_case(ID_FIELD))
                .map(|name| Field::new(name, FieldValue::Text(String::new())))
                .collect();
            reports.extend(self.try_update_fields(record_id, sobject, &fields).await?);
        }
        Ok(reports)
    }

    /// Send one update per field with a synthetic value and classify the
    /// outcome. Accepted updates are verified by reading the field back.
    #[instrument(skip(self, fields), fields(count = fields.len()))]
    pub async fn try_update_fields(
        &mut self,
        record_id: &str,
        sobject: &str,
        fields: &[Field],
    ) -> Result<Vec<FieldWriteReport>> {
        let mut reports = Vec::new();
        if fields.is_empty() {
            error!(record_id, "No field to test");
            return Ok(reports);
        }
        let Some(template) = self.aura.catalog().first(Operation::WriteRecordFields) else {
            debug!("No update descriptor");
            return Ok(reports);
        };
        info!(record_id, sobject, count = fields.len(), "Testing field updates");

        for field in fields {
            let Some(synthetic) = fake::synthetic(field) else {
                trace!(field = %field.name, "No synthetic value for list field");
                continue;
            };
            let report = |outcome| FieldWriteReport {
                record_id: record_id.to_string(),
                sobject: sobject.to_string(),
                field: synthetic.name.clone(),
                descriptor: template.descriptor.clone(),
                outcome,
            };

            let mut action = template.clone();
            action.set("apiName", sobject);
            action.set("recordId", record_id);
            action.set("recordInput", record_input(&synthetic));

            let response = match self.aura.send(&action).await {
                Ok(response) => response,
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => {
                    debug!(field = %synthetic.name, error = %e, "Update request failed");
                    reports.push(report(WriteOutcome::Rejected));
                    continue;
                }
            };
            let Some(first) = response.first_action() else {
                debug!("No action in update response");
                return Ok(reports);
            };

            let outcome = if first.is_success() {
                self.verify_write(record_id, sobject, &synthetic).await?
            } else {
                let body = &response.raw_body;
                if classifier::restricted_update(body) {
                    warn!(record_id, "Record cannot be updated");
                    reports.push(report(WriteOutcome::RecordLocked));
                    return Ok(reports);
                } else if classifier::invalid_field_value(body) {
                    WriteOutcome::InvalidValue
                } else if classifier::secured_field(body) {
                    WriteOutcome::NotWritable
                } else {
                    WriteOutcome::Rejected
                }
            };
            match outcome {
                WriteOutcome::Writable => {
                    warn!(record_id, field = %synthetic.name, "Field is writable")
                }
                WriteOutcome::InvalidValue => {
                    warn!(field = %synthetic.name, "Field probably writable, value rejected")
                }
                other => debug!(field = %synthetic.name, outcome = %other, "Field tested"),
            }
            reports.push(report(outcome));
        }
        Ok(reports)
    }

    /// Read the field back and compare with the value sent.
    async fn verify_write(
        &mut self,
        record_id: &str,
        sobject: &str,
        synthetic: &Synthetic,
    ) -> Result<WriteOutcome> {
        let qualified = BTreeSet::from([format!("{sobject}.{}", synthetic.name)]);
        let mut items = ItemBag::new();
        match self
            .fetch_with_fields_into(&mut items, record_id, sobject, Some(qualified))
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                debug!(error = %e, "Cannot read the field back");
                return Ok(WriteOutcome::Inconclusive);
            }
        }
        let confirmed = items
            .into_merged()
            .is_some_and(|updated| read_back_matches(&updated, synthetic));
        Ok(if confirmed {
            WriteOutcome::Writable
        } else {
            WriteOutcome::Inconclusive
        })
    }

    /// Try to create a record of each type: without fields first, then
    /// with one synthetic field at a time. Stops at the first success per
    /// descriptor and type.
    #[instrument(skip(self))]
    pub async fn try_create(&mut self, types: &[&str]) -> Result<Vec<CreatedRecord>> {
        let types: Vec<String> = if types.is_empty() {
            self.record_types().await?.into_iter().collect()
        } else {
            types.iter().map(ToString::to_string).collect()
        };

        let mut created = Vec::new();
        for sobject in &types {
            for template in self.aura.catalog().templates(Operation::CreateRecord) {
                if !self.unsupported.is_supported(&template.descriptor, sobject) {
                    continue;
                }
                let names = match self.field_names(sobject).await {
                    Ok(names) => names,
                    Err(e) if e.is_invalid_parameters() => {
                        error!(sobject, "Cannot list fields");
                        continue;
                    }
                    Err(e) => return Err(e),
                };

                if let Some(record) = self.create_with(&template, sobject, Map::new()).await? {
                    warn!(sobject, "Record can be created without any field");
                    created.push(CreatedRecord {
                        descriptor: template.descriptor.clone(),
                        sobject: sobject.clone(),
                        field: None,
                        record,
                    });
                    continue;
                }
                if names.is_empty() {
                    debug!(sobject, "No known field for single-field creation");
                    continue;
                }

                info!(sobject, count = names.len(), "Trying single-field creation");
                for name in &names {
                    let field = Field::new(unqualified(name, sobject), FieldValue::Text(String::new()));
                    let Some(synthetic) = fake::synthetic(&field) else {
                        continue;
                    };
                    let mut fields = Map::new();
                    fields.insert(synthetic.name.clone(), synthetic.value);
                    if let Some(record) = self.create_with(&template, sobject, fields).await? {
                        warn!(sobject, field = %synthetic.name, "Record can be created");
                        created.push(CreatedRecord {
                            descriptor: template.descriptor.clone(),
                            sobject: sobject.clone(),
                            field: Some(synthetic.name),
                            record,
                        });
                        break;
                    }
                }
            }
        }
        Ok(created)
    }

    async fn create_with(
        &mut self,
        template: &ActionTemplate,
        sobject: &str,
        fields: Map<String, Value>,
    ) -> Result<Option<Record>> {
        let mut action = template.clone();
        action.set("apiName", sobject);
        action.set("fields", Value::Object(fields));

        let response = match self.aura.send(&action).await {
            Ok(response) => response,
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                debug!(sobject, error = %e, "Create request failed");
                return Ok(None);
            }
        };
        if !response.is_success() {
            if let Some(unsupported) = classifier::unsupported_type(&response.raw_body) {
                self.unsupported.mark(&template.descriptor, unsupported);
            }
            return Ok(None);
        }
        Ok(response.return_map().map(Record::from_json))
    }
}

fn record_input(synthetic: &Synthetic) -> Value {
    let mut fields = Map::new();
    fields.insert(synthetic.name.clone(), synthetic.value.clone());
    let mut input = Map::new();
    input.insert("fields".to_string(), Value::Object(fields));
    Value::Object(input)
}

fn unqualified<'a>(name: &'a str, sobject: &str) -> &'a str {
    name.strip_prefix(sobject)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(name)
}

/// Whether `record` holds the value sent. References (`Owner.Id`) are
/// compared against the id of the nested record.
fn read_back_matches(record: &Record, synthetic: &Synthetic) -> bool {
    if let Some(field) = record.field(&synthetic.name) {
        return field.real_value().matches_json(&synthetic.value);
    }
    let Some(reference) = synthetic
        .name
        .strip_suffix(".Id")
        .and_then(|base| record.field(base))
    else {
        return false;
    };
    let read = match reference.real_value() {
        FieldValue::Record(nested) => nested.id(),
        FieldValue::Text(id) => Some(id.as_str()),
        _ => None,
    };
    read.is_some() && read == synthetic.value.as_str()
}
