//! Partial results keyed by source, record id and type.

use crate::record::Record;

/// Source name of the REST record-by-id and recently-viewed channels.
pub const SOBJECTS_REST_SOURCE: &str = "SOBJECTS_REST_API";
/// Source name of the REST query channel.
pub const QUERY_REST_SOURCE: &str = "QUERY_DATA_REST_API";
/// Source name of the SOAP query channel.
pub const SOAP_SOURCE: &str = "SOAP_API";

/// Where a partial record came from.
///
/// `source` is a descriptor or one of the channel names above.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey {
    pub source: String,
    pub record_id: String,
    pub record_type: Option<String>,
}

impl ItemKey {
    pub fn new(source: impl Into<String>, record_id: impl Into<String>, record_type: Option<&str>) -> Self {
        Self {
            source: source.into(),
            record_id: record_id.into(),
            record_type: record_type.map(str::to_string),
        }
    }
}

/// Partial records in retrieval order.
///
/// Inserting an existing key replaces its record in place.
#[derive(Debug, Clone, Default)]
pub struct ItemBag {
    items: Vec<(ItemKey, Record)>,
}

impl ItemBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &ItemKey) -> bool {
        self.items.iter().any(|(k, _)| k == key)
    }

    pub fn insert(&mut self, key: ItemKey, record: Record) {
        match self.items.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = record,
            None => self.items.push((key, record)),
        }
    }

    pub fn get(&self, key: &ItemKey) -> Option<&Record> {
        self.items.iter().find(|(k, _)| k == key).map(|(_, r)| r)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.items.iter().map(|(_, r)| r)
    }

    /// Union of every partial record.
    pub fn into_merged(self) -> Option<Record> {
        Record::merge(self.items.into_iter().map(|(_, r)| r))
    }

    /// One merged record per record id, in first-seen order.
    pub fn into_grouped(self) -> Vec<Record> {
        let mut groups: Vec<(String, Vec<Record>)> = Vec::new();
        for (key, record) in self.items {
            match groups.iter_mut().find(|(id, _)| *id == key.record_id) {
                Some((_, records)) => records.push(record),
                None => groups.push((key.record_id, vec![record])),
            }
        }
        groups
            .into_iter()
            .filter_map(|(_, records)| Record::merge(records))
            .collect()
    }
}
