//! Response body classification.
//!
//! Every function here is pure and total: a body that matches nothing (or
//! is not text the server would ever send) yields "no classification".
//! Patterns that carry a name are tried one at a time in a fixed order and
//! the first non-empty capture wins.

use std::sync::LazyLock;

use regex_lite::Regex;

use crate::response::AuraResponse;

/// Phrase sent with a `warning` action when the client build id is stale.
pub const STALE_CLIENT_PHRASE: &str = "This page has changes since the last refresh. To get the latest updates, save your work and finish your conversations before refreshing the page.";

const CSRF_MARKER: &str = "invalid_csrf";
const NO_ACCESS_MARKER: &str = "markup://aura:noAccess";

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static classifier pattern is valid")
}

static LEGACY_OUT_OF_SYNC: LazyLock<Regex> =
    LazyLock::new(|| compile(r"Framework has been updated. Expected: (.+) Actual"));

static UNKNOWN_FIELD: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        compile(r"No such column '(.+)' on "),
        compile(r"Didn't understand relationship '(.+)' in field"),
        compile(r"No such relation '(.+)' on "),
    ]
});

static UNSUPPORTED_TYPE: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        compile(r"\bObject (\S+) is not supported"),
        compile(r"sObject type '(.*)' is not supported"),
        compile(
            r"query string parameter contained object api names that do not correspond to the api names of any of the requested record ids. The requested object api names were: \[(.*)\], while the",
        ),
    ]
});

static INVALID_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"INVALID_OR_NULL_FOR_RESTRICTED_PICKLIST|FIELD_INTEGRITY_EXCEPTION|INVALID_TYPE_ON_FIELD_IN_RECORD|Value for field '(.*)'  is not |STRING_TOO_LONG",
    )
});

static RESTRICTED_UPDATE: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"CANNOT_INSERT_UPDATE_ACTIVATE_ENTITY|INSUFFICIENT_ACCESS_OR_READONLY")
});

const SECURED_FIELD_MARKER: &str = "Unable to create/update fields";

fn first_capture<'a>(patterns: &[Regex], body: &'a str) -> Option<&'a str> {
    patterns.iter().find_map(|pattern| {
        pattern
            .captures(body)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .filter(|name| !name.trim().is_empty())
    })
}

/// Returns true if `body` matches the detection pattern.
pub fn is_framework_detected(pattern: &Regex, body: &str) -> bool {
    !body.trim().is_empty() && pattern.is_match(body)
}

/// New build id when a parsed response says the client is stale.
///
/// Requires an action in the `warning` state together with the stale
/// client phrase; the new id comes from the response context.
pub fn out_of_sync(response: &AuraResponse) -> Option<String> {
    if !response.has_warning() || !response.raw_body.contains(STALE_CLIENT_PHRASE) {
        return None;
    }
    response.context_fwuid().map(str::to_string)
}

/// New build id from the legacy "Framework has been updated" body.
pub fn out_of_sync_legacy(body: &str) -> Option<String> {
    LEGACY_OUT_OF_SYNC
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// The server rejected the anti-forgery token. In practice this means the
/// application name does not match the site.
pub fn anti_forgery_mismatch(body: &str) -> bool {
    body.contains(CSRF_MARKER)
}

/// The application name cannot be used on this target at all.
pub fn no_access(body: &str) -> bool {
    body.contains(NO_ACCESS_MARKER)
}

/// Object type the current descriptor refuses to serve.
pub fn unsupported_type(body: &str) -> Option<&str> {
    first_capture(UNSUPPORTED_TYPE.as_slice(), body)
}

/// Field name the server does not know for the requested type.
pub fn unknown_field(body: &str) -> Option<&str> {
    first_capture(UNKNOWN_FIELD.as_slice(), body)
}

/// The value sent for a field was rejected.
pub fn invalid_field_value(body: &str) -> bool {
    INVALID_VALUE.is_match(body)
}

/// The whole record cannot be updated by this user.
pub fn restricted_update(body: &str) -> bool {
    RESTRICTED_UPDATE.is_match(body)
}

/// The field is protected against create/update.
pub fn secured_field(body: &str) -> bool {
    body.contains(SECURED_FIELD_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection() {
        let pattern = Regex::new(crate::config::DEFAULT_DETECTION_PATTERN).unwrap();
        assert!(is_framework_detected(
            &pattern,
            r#"*/{"event":{"descriptor":"markup://aura:invalidSession"}}"#
        ));
        assert!(is_framework_detected(&pattern, r#"{"exceptionEvent":true}"#));
        assert!(!is_framework_detected(&pattern, "<html>Not found</html>"));
        assert!(!is_framework_detected(&pattern, ""));
    }

    #[test]
    fn test_out_of_sync_requires_warning() {
        let body = format!(
            r#"{{"actions":[{{"state":"warning"}}],"context":{{"fwuid":"NEW"}},"events":[{{"descriptor":"{STALE_CLIENT_PHRASE}"}}]}}"#
        );
        let response = AuraResponse::parse(&body).unwrap();
        assert_eq!(out_of_sync(&response).as_deref(), Some("NEW"));

        let body = body.replace("warning", "SUCCESS");
        let response = AuraResponse::parse(&body).unwrap();
        assert_eq!(out_of_sync(&response), None);
    }

    #[test]
    fn test_out_of_sync_without_phrase() {
        let body = r#"{"actions":[{"state":"warning"}],"context":{"fwuid":"NEW"}}"#;
        let response = AuraResponse::parse(body).unwrap();
        assert_eq!(out_of_sync(&response), None);
    }

    #[test]
    fn test_out_of_sync_legacy() {
        let body = "*/ERROR: Framework has been updated. Expected: abc123 Actual: random";
        assert_eq!(out_of_sync_legacy(body).as_deref(), Some("abc123"));
        assert_eq!(out_of_sync_legacy("Framework has been updated."), None);
    }

    #[test]
    fn test_markers() {
        assert!(anti_forgery_mismatch(r#"{"exceptionEvent":true,"event":"invalid_csrf"}"#));
        assert!(!anti_forgery_mismatch("csrf"));
        assert!(no_access(r#"{"descriptor":"markup://aura:noAccess"}"#));
        assert!(!no_access("aura:access"));
    }

    #[test]
    fn test_unknown_field() {
        assert_eq!(unknown_field("No such column 'Foo' on Bar"), Some("Foo"));
        assert_eq!(
            unknown_field("Didn't understand relationship 'Owner' in field path"),
            Some("Owner")
        );
        assert_eq!(unknown_field("No such relation 'Parent' on entity 'X'"), Some("Parent"));
        assert_eq!(unknown_field("all good"), None);
        assert_eq!(unknown_field(""), None);
    }

    #[test]
    fn test_unknown_field_priority() {
        let body = "No such relation 'B' on X. No such column 'A' on Y";
        assert_eq!(unknown_field(body), Some("A"));
    }

    #[test]
    fn test_unsupported_type() {
        assert_eq!(
            unsupported_type("Object Foo__c is not supported in UI API"),
            Some("Foo__c")
        );
        assert_eq!(
            unsupported_type("sObject type 'Secret' is not supported."),
            Some("Secret")
        );
        assert_eq!(
            unsupported_type(
                "The query string parameter contained object api names that do not correspond to the api names of any of the requested record ids. The requested object api names were: [Case], while the requested records"
            ),
            Some("Case")
        );
        assert_eq!(unsupported_type("Object  is not supported"), None);
        assert_eq!(unsupported_type("nothing"), None);
        assert_eq!(
            unsupported_type(r#"{"message":"sObject type 'Invoice__c' is not supported. If you are attempting"}"#),
            Some("Invoice__c")
        );
    }

    #[test]
    fn test_write_failure_markers() {
        assert!(invalid_field_value("FIELD_INTEGRITY_EXCEPTION: bad"));
        assert!(invalid_field_value("Value for field 'X'  is not valid"));
        assert!(invalid_field_value("STRING_TOO_LONG"));
        assert!(!invalid_field_value("ok"));

        assert!(restricted_update("INSUFFICIENT_ACCESS_OR_READONLY"));
        assert!(restricted_update("CANNOT_INSERT_UPDATE_ACTIVATE_ENTITY"));
        assert!(!restricted_update("FIELD_INTEGRITY_EXCEPTION"));

        assert!(secured_field("Unable to create/update fields: Name."));
        assert!(!secured_field("Unable to read"));
    }
}
