//! Escaping and validation for values spliced into paths, queries and SOAP bodies.
//!
//! Type names and record ids come from server responses and wordlists, so
//! they are validated before being placed in a URL path or a query string.
//!
//! ```rust
//! use auraprobe_client::security::{names, url};
//!
//! assert!(names::is_safe_type_name("Invoice__c"));
//! assert_eq!(
//!     url::sobject_path("Account", "001000000000001"),
//!     Some("sobjects/Account/001000000000001".to_string())
//! );
//! ```

/// Object type and field name validation.
pub mod names {
    /// Returns true if `name` is a plausible API name: a leading ASCII letter
    /// followed by letters, digits and underscores.
    #[must_use]
    pub fn is_safe_type_name(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        }
    }

    /// Returns true if `name` ends with the custom object suffix `__c`.
    #[must_use]
    pub fn is_custom_type(name: &str) -> bool {
        name.ends_with("__c")
    }
}

/// URL path helpers.
pub mod url {
    use super::names::is_safe_type_name;

    /// Returns true for 15 or 18 alphanumeric characters.
    #[must_use]
    pub fn is_valid_record_id(id: &str) -> bool {
        matches!(id.len(), 15 | 18) && id.chars().all(|c| c.is_ascii_alphanumeric())
    }

    /// `sobjects/{type}/{id}` when both parts are well formed.
    #[must_use]
    pub fn sobject_path(sobject: &str, id: &str) -> Option<String> {
        (is_safe_type_name(sobject) && is_valid_record_id(id))
            .then(|| format!("sobjects/{sobject}/{id}"))
    }
}

/// XML text escaping for SOAP envelopes.
pub mod xml {
    /// Replace the five predefined XML entities.
    #[must_use]
    pub fn escape(value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        for ch in value.chars() {
            match ch {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                '\'' => out.push_str("&apos;"),
                other => out.push(other),
            }
        }
        out
    }
}
