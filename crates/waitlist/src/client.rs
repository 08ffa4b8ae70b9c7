use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Url;
use serde_json::Value;
use tracing::debug;

use crate::form::SignupRecord;
use crate::WaitlistError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Delivers a validated signup somewhere.
pub trait SignupTransport {
    fn submit(&self, record: &SignupRecord) -> Result<(), WaitlistError>;
}

/// Reports the current waitlist size.
pub trait CountSource {
    fn fetch_count(&self) -> Result<u64, WaitlistError>;
}

impl<T: SignupTransport + ?Sized> SignupTransport for &T {
    fn submit(&self, record: &SignupRecord) -> Result<(), WaitlistError> {
        (**self).submit(record)
    }
}

impl<T: CountSource + ?Sized> CountSource for &T {
    fn fetch_count(&self) -> Result<u64, WaitlistError> {
        (**self).fetch_count()
    }
}

/// HTTP client for the spreadsheet webhook that backs both signup and counting.
#[derive(Debug, Clone)]
pub struct WaitlistClient {
    http: Client,
    endpoint: Option<Url>,
}

impl WaitlistClient {
    /// A client without an endpoint is valid; every call fails with
    /// [`WaitlistError::MissingEndpoint`].
    pub fn new(endpoint: Option<&str>) -> Result<Self, WaitlistError> {
        let endpoint = endpoint
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(|raw| Url::parse(raw).map_err(|err| WaitlistError::InvalidEndpoint(format!("{raw}: {err}"))))
            .transpose()?;
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> Option<&Url> {
        self.endpoint.as_ref()
    }

    fn require_endpoint(&self) -> Result<&Url, WaitlistError> {
        self.endpoint.as_ref().ok_or(WaitlistError::MissingEndpoint)
    }
}

impl SignupTransport for WaitlistClient {
    fn submit(&self, record: &SignupRecord) -> Result<(), WaitlistError> {
        let url = self.require_endpoint()?;
        debug!(%url, os = %record.os, "posting waitlist signup");
        // The webhook answers with an opaque redirect; any response counts.
        let response = self.http.post(url.clone()).json(record).send()?;
        debug!(status = %response.status(), "signup delivered");
        Ok(())
    }
}

impl CountSource for WaitlistClient {
    fn fetch_count(&self) -> Result<u64, WaitlistError> {
        let url = self.require_endpoint()?;
        let body = self
            .http
            .get(url.clone())
            .send()?
            .error_for_status()?
            .text()?;
        parse_count(&body)
    }
}

/// Extracts `count` from a `{ "count": n }` body.
pub fn parse_count(body: &str) -> Result<u64, WaitlistError> {
    let malformed = || {
        let snippet = body.chars().take(80).collect::<String>();
        WaitlistError::MalformedCount(snippet)
    };
    let value: Value = serde_json::from_str(body).map_err(|_| malformed())?;
    match value.get("count") {
        Some(Value::Number(number)) => number
            .as_u64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|n| n.is_finite() && *n >= 0.0)
                    .map(|n| n.floor() as u64)
            })
            .ok_or_else(malformed),
        _ => Err(malformed()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_integer_and_float_counts() {
        assert_eq!(parse_count(r#"{"count": 41}"#).unwrap(), 41);
        assert_eq!(parse_count(r#"{"count": 12.0, "extra": true}"#).unwrap(), 12);
    }

    #[test]
    fn rejects_malformed_bodies() {
        for body in ["", "not json", r#"{"total": 3}"#, r#"{"count": "7"}"#, r#"{"count": -1}"#] {
            assert!(
                matches!(parse_count(body), Err(WaitlistError::MalformedCount(_))),
                "{body:?} accepted"
            );
        }
    }

    #[test]
    fn missing_endpoint_fails_without_network() {
        let client = WaitlistClient::new(None).unwrap();
        assert!(client.endpoint().is_none());
        assert!(matches!(
            client.fetch_count(),
            Err(WaitlistError::MissingEndpoint)
        ));
        let blank = WaitlistClient::new(Some("  ")).unwrap();
        assert!(blank.endpoint().is_none());
    }

    #[test]
    fn invalid_endpoint_is_reported() {
        assert!(matches!(
            WaitlistClient::new(Some("not a url")),
            Err(WaitlistError::InvalidEndpoint(_))
        ));
    }
}
