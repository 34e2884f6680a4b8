//! SOAP envelopes and response parsing.

use auraprobe_client::security::xml;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{Error, ErrorKind, Result};

/// SOAP endpoint path.
pub const SOAP_PATH: &str = "/services/Soap/c/60.0/";

/// Namespace of the session header and query operation.
pub const ENTERPRISE_NAMESPACE: &str = "urn:enterprise.soap.sforce.com";

/// Maximum rows requested by a query.
pub const QUERY_LIMIT: u32 = 10;

fn envelope(session_id: &str, body: &str) -> String {
    format!(
        "<soapenv:Envelope xmlns:soapenv=\"http://schemas.xmlsoap.org/soap/envelope/\" xmlns:urn=\"{ENTERPRISE_NAMESPACE}\">\
<soapenv:Header><urn:SessionHeader><urn:sessionId>{}</urn:sessionId></urn:SessionHeader></soapenv:Header>\
<soapenv:Body>{body}</soapenv:Body>\
</soapenv:Envelope>",
        xml::escape(session_id)
    )
}

/// `SELECT {fields} FROM {type} LIMIT 10` wrapped in a session envelope.
pub fn query_request(session_id: &str, sobject: &str, fields: &[&str]) -> String {
    let query = format!(
        "SELECT {} FROM {} LIMIT {QUERY_LIMIT}",
        fields.join(","),
        sobject
    );
    envelope(
        session_id,
        &format!(
            "<urn:query><urn:queryString>{}</urn:queryString></urn:query>",
            xml::escape(&query)
        ),
    )
}

/// Single-field update of one record, in the partner object namespace.
pub fn update_request(
    session_id: &str,
    sobject: &str,
    record_id: &str,
    field: &str,
    value: &str,
) -> String {
    let sobject = xml::escape(sobject);
    let record_id = xml::escape(record_id);
    let value = xml::escape(value);
    envelope(
        session_id,
        &format!(
            "<urn:update>\
<urn:sObjects xmlns:urn1=\"urn:sobject.partner.soap.sforce.com\" xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" xsi:type=\"{sobject}\">\
<urn1:Id>{record_id}</urn1:Id>\
<urn1:{field}>{value}</urn1:{field}>\
</urn:sObjects>\
</urn:update>"
        ),
    )
}

/// Returns true for a fault about an entity the SOAP API does not expose.
pub fn is_unsupported_entity(body: &str) -> bool {
    body.contains("INVALID_TYPE")
}

/// Record ids from a query response.
///
/// Collects the text of every `Id` element that is a direct child of a
/// `records` element, whatever their namespace prefixes. A document that is
/// not well-formed XML fails with `SoapParsingFailed`.
pub fn parse_record_ids(body: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut seen_root = false;
    let mut ids = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                seen_root = true;
                stack.push(start.local_name().as_ref().to_vec());
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Empty(_) => seen_root = true,
            Event::Text(text) => {
                if in_record_id(&stack) {
                    ids.push(text.unescape()?.into_owned());
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(Error::new(ErrorKind::SoapParsingFailed(
            "no XML element in response".to_string(),
        )));
    }
    if !stack.is_empty() {
        return Err(Error::new(ErrorKind::SoapParsingFailed(
            "unclosed element at end of response".to_string(),
        )));
    }
    Ok(ids)
}

fn in_record_id(stack: &[Vec<u8>]) -> bool {
    matches!(
        stack,
        [.., parent, current] if parent.as_slice() == b"records" && current.as_slice() == b"Id"
    )
}
