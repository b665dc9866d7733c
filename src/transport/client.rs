//! Single-attempt HTTP exchange with the broker.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONNECTION, CONTENT_TYPE};
use reqwest::StatusCode;

use crate::config::TransportSettings;
use crate::error::AttemptError;

pub const CONTENT_TYPE_XML: &str = "text/xml; charset=utf-8";
pub const ACCEPT_TEXT: &str = "text/plain;charset=utf-8";

/// One request/response exchange. Implementations must not retry; retry
/// policy lives in [`super::retry`].
pub trait Transport: Send + Sync {
    fn send(&self, endpoint: &str, body: &str, timeout: Duration) -> Result<String, AttemptError>;
}

/// Blocking HTTP transport.
///
/// Connections are not pooled: every attempt opens a fresh connection and
/// releases it when the response is dropped.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(settings: &TransportSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout())
            .timeout(settings.read_timeout())
            .pool_max_idle_per_host(0)
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn send(&self, endpoint: &str, body: &str, timeout: Duration) -> Result<String, AttemptError> {
        let response = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, CONTENT_TYPE_XML)
            .header(CONNECTION, "close")
            .header(ACCEPT, ACCEPT_TEXT)
            .timeout(timeout)
            .body(body.to_string())
            .send()?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(AttemptError::Status(status.as_u16()));
        }

        // The broker always answers UTF-8 regardless of declared charset.
        let bytes = response.bytes()?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| AttemptError::Request(format!("response body is not UTF-8: {}", e)))
    }
}
