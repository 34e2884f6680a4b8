//! Per-scan knowledge: field names per type and descriptor/type support.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

/// Known field names per object type, as `Type.field`.
///
/// An entry exists once a type has been looked up, even if no field was
/// found; callers use that to avoid a second live lookup.
#[derive(Debug, Clone, Default)]
pub struct FieldCache {
    entries: HashMap<String, BTreeSet<String>>,
}

impl FieldCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_type(&self, sobject: &str) -> bool {
        self.entries.contains_key(sobject)
    }

    pub fn get(&self, sobject: &str) -> Option<&BTreeSet<String>> {
        self.entries.get(sobject)
    }

    /// Cached fields of `sobject`, empty when unknown.
    pub fn fields(&self, sobject: &str) -> BTreeSet<String> {
        self.entries.get(sobject).cloned().unwrap_or_default()
    }

    /// Create an empty entry if none exists.
    pub fn ensure(&mut self, sobject: &str) {
        self.entries.entry(sobject.to_string()).or_default();
    }

    pub fn add_fields(&mut self, sobject: &str, fields: impl IntoIterator<Item = String>) {
        self.entries
            .entry(sobject.to_string())
            .or_default()
            .extend(fields);
    }

    /// Drop every cached name of `sobject` containing `fragment`.
    ///
    /// Returns the number of names removed.
    pub fn remove_matching(&mut self, sobject: &str, fragment: &str) -> usize {
        let Some(fields) = self.entries.get_mut(sobject) else {
            return 0;
        };
        let before = fields.len();
        fields.retain(|name| !name.contains(fragment));
        before - fields.len()
    }

    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Object types each descriptor is known not to serve.
///
/// Entries are never removed during a scan.
#[derive(Debug, Clone, Default)]
pub struct UnsupportedRegistry {
    entries: HashMap<String, BTreeSet<String>>,
}

impl UnsupportedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `descriptor` cannot serve `sobject`. Blank types are ignored.
    pub fn mark(&mut self, descriptor: &str, sobject: &str) {
        if sobject.trim().is_empty() {
            return;
        }
        debug!(descriptor, sobject, "Marking type as unsupported by descriptor");
        self.entries
            .entry(descriptor.to_string())
            .or_default()
            .insert(sobject.to_string());
    }

    pub fn is_supported(&self, descriptor: &str, sobject: &str) -> bool {
        let unsupported = self
            .entries
            .get(descriptor)
            .is_some_and(|types| types.contains(sobject));
        if unsupported {
            debug!(descriptor, sobject, "Type not supported by descriptor");
        }
        !unsupported
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_cache_entry_without_fields() {
        let mut cache = FieldCache::new();
        assert!(!cache.contains_type("Account"));
        cache.ensure("Account");
        assert!(cache.contains_type("Account"));
        assert!(cache.fields("Account").is_empty());

        cache.add_fields("Account", ["Account.Name".to_string()]);
        cache.ensure("Account");
        assert_eq!(cache.fields("Account").len(), 1);
    }

    #[test]
    fn test_remove_matching() {
        let mut cache = FieldCache::new();
        cache.add_fields(
            "Bar",
            ["Bar.Foo", "Bar.Foo.Id", "Bar.Name"].map(String::from),
        );
        assert_eq!(cache.remove_matching("Bar", "Bar.Foo"), 2);
        assert_eq!(cache.fields("Bar"), BTreeSet::from(["Bar.Name".to_string()]));
        assert_eq!(cache.remove_matching("Missing", "x"), 0);
    }

    #[test]
    fn test_unsupported_registry() {
        let mut registry = UnsupportedRegistry::new();
        assert!(registry.is_supported("d1", "Account"));

        registry.mark("d1", "Account");
        registry.mark("d1", " ");
        assert!(!registry.is_supported("d1", "Account"));
        assert!(registry.is_supported("d2", "Account"));
        assert!(registry.is_supported("d1", "Contact"));
    }
}
