use auraprobe_client::security::names;
use auraprobe_client::ContentType;
use tracing::{debug, instrument, trace};

use crate::error::{Error, ErrorKind, Result};
use crate::soap::{is_unsupported_entity, parse_record_ids, query_request, SOAP_PATH};

impl super::ApiClient {
    /// Ids of up to ten records of a type through a SOAP query.
    ///
    /// A blank response or an unsupported entity fault yields no ids. A body
    /// that is not XML fails with `SoapParsingFailed`.
    #[instrument(skip(self))]
    pub async fn soap_query_ids(&self, sobject: &str) -> Result<Vec<String>> {
        if !names::is_safe_type_name(sobject) {
            return Err(Error::new(ErrorKind::InvalidType(sobject.to_string())));
        }

        let body = query_request(self.sid().unwrap_or_default(), sobject, &["Id"]);
        let response = self
            .transport
            .post(SOAP_PATH, body, ContentType::Xml, &[("SOAPAction", "blank")])
            .await;

        if response.body.trim().is_empty() {
            trace!(sobject, status = response.status, "Empty SOAP response");
            return Ok(Vec::new());
        }
        if is_unsupported_entity(&response.body) {
            trace!(sobject, "Entity not exposed over SOAP");
            return Ok(Vec::new());
        }

        let ids = parse_record_ids(&response.body)?;
        debug!(sobject, count = ids.len(), "SOAP query returned ids");
        Ok(ids)
    }
}
