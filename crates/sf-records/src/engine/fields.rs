//! Field names per type and record retrieval by explicit field list.

use std::collections::BTreeSet;

use auraprobe_aura::{classifier, Operation};
use serde_json::Value;
use tracing::{debug, error, info, instrument, trace, warn};

use super::{propagates, RecordEngine};
use crate::error::{Error, ErrorKind, Result};
use crate::item::{ItemBag, ItemKey};
use crate::record::Record;
use crate::sources::FieldShape;

impl RecordEngine {
    /// Known field names of `sobject`, as `Type.field`.
    ///
    /// Looked up live only once per type: an entry is cached even when no
    /// channel returned anything.
    #[instrument(skip(self))]
    pub async fn field_names(&mut self, sobject: &str) -> Result<BTreeSet<String>> {
        self.sync_session();
        if sobject.trim().is_empty() {
            error!("Cannot look up fields without a type");
            return Ok(BTreeSet::new());
        }
        if self.field_cache.contains_type(sobject) {
            trace!(sobject, "Fields already known");
            return Ok(self.field_cache.fields(sobject));
        }
        self.field_cache.ensure(sobject);

        for mut action in self.aura.catalog().templates(Operation::GetRecordInfo) {
            let descriptor = action.descriptor.clone();
            if !self.unsupported.is_supported(&descriptor, sobject) {
                break;
            }
            action.fill("objectApiName", sobject);

            let response = match self.aura.send(&action).await {
                Ok(response) => response,
                Err(e) if propagates(&e, true) => return Err(e.into()),
                Err(e) => {
                    debug!(descriptor, error = %e, "Object info request failed");
                    break;
                }
            };
            let Some(first) = response.first_action() else {
                break;
            };
            if !first.is_success() {
                if let Some(unsupported) = classifier::unsupported_type(&response.raw_body) {
                    self.unsupported.mark(&descriptor, unsupported);
                    break;
                }
            }
            let Some(return_value) = first.return_map() else {
                debug!(sobject, "No object info");
                break;
            };

            let names: BTreeSet<String> = return_value
                .get("fields")
                .and_then(Value::as_object)
                .into_iter()
                .flat_map(|fields| fields.keys())
                .map(|name| format!("{sobject}.{name}"))
                .collect();
            if !names.is_empty() {
                info!(count = names.len(), sobject, "Fields found through object info");
                self.field_cache.add_fields(sobject, names);
            }
        }

        let described = self.api.describe_fields(sobject).await;
        if !described.is_empty() {
            info!(count = described.len(), sobject, "Fields found through REST describe");
            self.field_cache.add_fields(sobject, described);
        }
        Ok(self.field_cache.fields(sobject))
    }

    /// Retrieve `record_id` as `sobject` requesting explicit fields.
    ///
    /// Without `fields`, every known field of the type is requested.
    #[instrument(skip(self))]
    pub async fn fetch_one_with_fields(
        &mut self,
        record_id: &str,
        sobject: &str,
        fields: Option<BTreeSet<String>>,
    ) -> Result<Option<Record>> {
        let mut items = ItemBag::new();
        self.fetch_with_fields_into(&mut items, record_id, sobject, fields)
            .await?;
        Ok(items.into_merged())
    }

    /// One explicit-field request. An unknown field is dropped (from the
    /// request and the cache) and the request is sent again.
    pub(super) async fn fetch_with_fields_into(
        &mut self,
        items: &mut ItemBag,
        record_id: &str,
        sobject: &str,
        fields: Option<BTreeSet<String>>,
    ) -> Result<()> {
        if record_id.trim().is_empty() {
            return Err(Error::new(ErrorKind::MissingRecordId));
        }
        let Some(mut action) = self.aura.catalog().first(Operation::GetRecordFields) else {
            debug!("No explicit-field descriptor");
            return Ok(());
        };
        let descriptor = action.descriptor.clone();
        let key = ItemKey::new(&descriptor, record_id, Some(sobject));
        if items.contains(&key) || !self.unsupported.is_supported(&descriptor, sobject) {
            return Ok(());
        }

        let explicit = fields.is_some();
        let selected = match fields {
            Some(fields) => {
                if fields.is_empty() {
                    error!(sobject, "No field to request");
                }
                fields
            }
            None => self.default_fields(sobject).await?,
        };
        let selected = if selected.is_empty() {
            BTreeSet::from([format!("{sobject}.Id")])
        } else {
            selected
        };

        action.set("recordId", record_id);
        action.set("objectApiName", sobject);
        action.set(
            "fields",
            Value::from(selected.iter().cloned().collect::<Vec<_>>()),
        );

        let response = match self.aura.send(&action).await {
            Ok(response) => response,
            Err(e) if propagates(&e, true) => return Err(e.into()),
            Err(e) => {
                debug!(descriptor, error = %e, "Explicit-field request failed");
                return Ok(());
            }
        };
        let Some(first) = response.first_action() else {
            return Ok(());
        };

        if !first.is_success() {
            if let Some(unsupported) = classifier::unsupported_type(&response.raw_body) {
                self.unsupported.mark(&descriptor, unsupported);
                return Ok(());
            }
            if let Some(column) = classifier::unknown_field(&response.raw_body) {
                let fragment = format!("{sobject}.{column}");
                let remaining: BTreeSet<String> = selected
                    .iter()
                    .filter(|name| !name.contains(&fragment))
                    .cloned()
                    .collect();
                let removed = self.field_cache.remove_matching(sobject, &fragment);
                warn!(sobject, column, removed, "Dropping unknown field");

                if remaining.is_empty() || remaining.len() == selected.len() {
                    error!(sobject, "No field left to request");
                    return Ok(());
                }
                return Box::pin(self.fetch_with_fields_into(
                    items,
                    record_id,
                    sobject,
                    Some(remaining),
                ))
                .await;
            }
        }

        match first.return_map() {
            Some(return_value) => {
                if explicit {
                    self.field_cache.add_fields(sobject, selected);
                }
                info!(record_id, sobject, "Record found through explicit fields");
                items.insert(key, Record::from_json(return_value));
            }
            None => debug!(record_id, sobject, "No record for explicit fields"),
        }
        Ok(())
    }

    /// Fields requested when none are given: the schema collaborator's
    /// (when enabled) plus every cached name.
    async fn default_fields(&mut self, sobject: &str) -> Result<BTreeSet<String>> {
        if !self.field_cache.contains_type(sobject) {
            self.field_names(sobject).await?;
        }

        let mut selected = BTreeSet::new();
        if self.options.introspection {
            match self.schema.describe(sobject) {
                Some(fields) => {
                    for field in fields {
                        match field.kind {
                            FieldShape::Array => {}
                            FieldShape::Reference => {
                                selected.insert(format!("{sobject}.{}.Id", field.name));
                            }
                            FieldShape::Scalar => {
                                selected.insert(format!("{sobject}.{}", field.name));
                            }
                        }
                    }
                }
                None => {
                    debug!(sobject, "Type unknown to the schema");
                    selected.insert(format!("{sobject}.Id"));
                }
            }
        }
        selected.extend(self.field_cache.fields(sobject));
        Ok(selected)
    }
}
