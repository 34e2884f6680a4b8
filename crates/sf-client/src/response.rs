//! Buffered HTTP responses.

use tracing::trace;

/// A fully buffered HTTP response.
///
/// A `status` of 0 marks a transport failure: the request never produced a
/// response (connection refused, TLS failure, timeout, unreadable body).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code, or 0 on transport failure.
    pub status: u16,
    /// Response headers in arrival order. Repeated headers are kept.
    pub headers: Vec<(String, String)>,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    /// Sentinel returned when the request failed below HTTP.
    pub fn transport_failure() -> Self {
        Self::default()
    }

    /// Build a response from its parts.
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<String>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Buffer a reqwest response. Reading failures yield the sentinel.
    pub(crate) async fn read(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        match response.text().await {
            Ok(body) => Self {
                status,
                headers,
                body,
            },
            Err(e) => {
                trace!(error = %e, "Failed to read response body");
                Self::transport_failure()
            }
        }
    }

    /// Returns true if the request never reached the server.
    pub fn is_transport_failure(&self) -> bool {
        self.status == 0
    }

    /// Returns true for HTTP 200.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// First header with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers_named(name).next()
    }

    /// All headers with the given name (case-insensitive).
    pub fn headers_named(&self, name: &str) -> impl Iterator<Item = &str> + '_ {
        let name = name.to_owned();
        self.headers
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(&name))
            .map(|(_, v)| v.as_str())
    }

    /// Value of a cookie set by this response.
    ///
    /// With `strict`, the cookie name must equal `name`; otherwise it only has
    /// to contain it. The value is the text between the first `=` and the
    /// first `;`.
    pub fn find_cookie(&self, name: &str, strict: bool) -> Option<String> {
        if name.is_empty() {
            return None;
        }

        let found = self.headers_named("set-cookie").find_map(|cookie| {
            let (cookie_name, rest) = cookie.split_once('=')?;
            let cookie_name = cookie_name.trim();
            let matches = if strict {
                cookie_name == name
            } else {
                cookie_name.contains(name)
            };
            matches.then(|| rest.split(';').next().unwrap_or_default().to_string())
        });

        if found.is_none() {
            trace!(cookie = name, strict, "No matching cookie in response");
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_cookies(cookies: &[&str]) -> HttpResponse {
        HttpResponse::new(
            200,
            cookies
                .iter()
                .map(|c| ("Set-Cookie".to_string(), c.to_string()))
                .collect(),
            "",
        )
    }

    #[test]
    fn test_transport_failure_sentinel() {
        let response = HttpResponse::transport_failure();
        assert!(response.is_transport_failure());
        assert!(!response.is_ok());
        assert!(response.body.is_empty());
        assert!(response.headers.is_empty());
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = HttpResponse::new(
            302,
            vec![
                ("location".into(), "/next".into()),
                ("Link".into(), "<a>".into()),
                ("link".into(), "<b>".into()),
            ],
            "",
        );
        assert_eq!(response.header("Location"), Some("/next"));
        assert_eq!(response.headers_named("LINK").count(), 2);
        assert_eq!(response.header("missing"), None);
    }

    #[test]
    fn test_header_outlives_name() {
        let response = HttpResponse::new(200, vec![("Link".into(), "<a>".into())], "");
        let link = {
            let name = String::from("link");
            response.header(&name)
        };
        assert_eq!(link, Some("<a>"));

        let mut links = {
            let name = "LINK".to_string();
            response.headers_named(&name)
        };
        assert_eq!(links.next(), Some("<a>"));
    }

    #[test]
    fn test_find_cookie_strict() {
        let response = with_cookies(&[
            "sidCookie=nope; Path=/",
            "sid=00D000000000001!AQ; Path=/; Secure",
        ]);
        assert_eq!(
            response.find_cookie("sid", true).as_deref(),
            Some("00D000000000001!AQ")
        );
    }

    #[test]
    fn test_find_cookie_loose() {
        let response = with_cookies(&["__Host-ERIC_PROD123=eyJ0b2tlbiI6IjEifQ; Path=/; Secure"]);
        assert_eq!(
            response.find_cookie("Host-ERIC", false).as_deref(),
            Some("eyJ0b2tlbiI6IjEifQ")
        );
        assert_eq!(response.find_cookie("Host-ERIC", true), None);
    }

    #[test]
    fn test_find_cookie_without_attributes() {
        let response = with_cookies(&["sid=abc"]);
        assert_eq!(response.find_cookie("sid", true).as_deref(), Some("abc"));
    }

    #[test]
    fn test_find_cookie_missing() {
        let response = with_cookies(&["other=1; Path=/"]);
        assert_eq!(response.find_cookie("sid", true), None);
        assert_eq!(response.find_cookie("", false), None);
    }
}
