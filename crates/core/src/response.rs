//! Response payloads returned to the page and kept in stores.

use bytes::Bytes;

/// Body of the synthetic response returned when neither store nor network can answer.
pub const OFFLINE_BODY: &str = "Offline: this resource is not available right now.";

/// Status of the synthetic offline response.
pub const OFFLINE_STATUS: u16 = 503;

/// An HTTP response: status, headers, body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self { status, headers: Vec::new(), body: body.into() }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// The fixed 503 fallback.
    pub fn offline() -> Self {
        Self::new(OFFLINE_STATUS, Bytes::from_static(OFFLINE_BODY.as_bytes()))
            .with_header("content-type", "text/plain; charset=utf-8")
    }

    /// Status in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
