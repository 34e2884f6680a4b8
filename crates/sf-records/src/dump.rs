//! Persisting merged records.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Error, ErrorKind, Result};
use crate::record::Record;

/// Destination for merged records.
pub trait DumpWriter {
    /// Persist one record, returning where it went.
    fn write(&self, record: &Record) -> Result<PathBuf>;

    fn write_all(&self, records: &[Record]) -> Result<Vec<PathBuf>> {
        records.iter().map(|record| self.write(record)).collect()
    }
}

/// Writes `<root>/<type>/<id>.json`, creating directories as needed.
#[derive(Debug, Clone)]
pub struct JsonDumpWriter {
    root: PathBuf,
}

impl JsonDumpWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Target file of `record`. Fails without an id.
    pub fn path_for(&self, record: &Record) -> Result<PathBuf> {
        let id = record
            .id()
            .ok_or_else(|| Error::new(ErrorKind::MissingRecordId))?;
        Ok(self
            .root
            .join(path_component(record.sobject_type()))
            .join(format!("{}.json", path_component(id))))
    }
}

impl DumpWriter for JsonDumpWriter {
    fn write(&self, record: &Record) -> Result<PathBuf> {
        let path = self.path_for(record)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        info!(record_id = ?record.id(), path = %path.display(), "Dumping merged record");
        let file = fs::File::create(&path)?;
        serde_json::to_writer_pretty(file, record)?;
        Ok(path)
    }
}

/// Server-supplied names are restricted to a safe character set.
fn path_component(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_writes_type_directory() {
        let dir = tempfile::tempdir().unwrap();
        let writer = JsonDumpWriter::new(dir.path());
        let record = Record::from_value(&json!({
            "sobjectType": "Account",
            "Id": "001000000000001AAA",
            "Name": "Acme"
        }))
        .unwrap();

        let path = writer.write(&record).unwrap();
        assert_eq!(path, dir.path().join("Account").join("001000000000001AAA.json"));

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["sobjectType"], "Account");
        assert_eq!(written["id"], "001000000000001AAA");
        assert_eq!(written["fields"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_record_without_id() {
        let dir = tempfile::tempdir().unwrap();
        let writer = JsonDumpWriter::new(dir.path());
        let record = Record::with_type("Account");
        let err = writer.write(&record).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::MissingRecordId));
    }

    #[test]
    fn test_path_components_are_sanitized() {
        let writer = JsonDumpWriter::new("/out");
        let record = Record::from_value(&json!({"sobjectType": "../etc", "Id": "a/b"})).unwrap();
        let path = writer.path_for(&record).unwrap();
        assert_eq!(path, PathBuf::from("/out/___etc/a_b.json"));
    }
}
