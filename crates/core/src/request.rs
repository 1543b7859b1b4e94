//! Intercepted request model and cache key derivation.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

use crate::Error;

/// HTTP methods the worker can see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    /// Only GET results are ever written to a store.
    pub fn is_idempotent_read(self) -> bool {
        self == Method::Get
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "HEAD" => Ok(Method::Head),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            "OPTIONS" => Ok(Method::Options),
            other => Err(Error::InvalidInput(format!("unsupported method: {other}"))),
        }
    }
}

/// Declared destination of a request, as reported by the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Document,
    Script,
    Style,
    Image,
    Font,
    Manifest,
    /// `fetch()` / XHR calls carry no destination.
    #[default]
    Empty,
    Other,
}

/// A request intercepted on its way to the network.
#[derive(Debug, Clone)]
pub struct Request {
    pub url: Url,
    pub method: Method,
    pub destination: Destination,
    pub headers: Vec<(String, String)>,
    /// Only forwarded for pass-through requests.
    pub body: Option<Vec<u8>>,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self { url, method, destination: Destination::Empty, headers: Vec::new(), body: None }
    }

    /// A GET with the given destination.
    pub fn get(url: Url, destination: Destination) -> Self {
        Self { destination, ..Self::new(Method::Get, url) }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn key(&self) -> RequestKey {
        RequestKey::new(self.method, &self.url)
    }
}

/// Store identity of a request: canonical URL plus method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub url: String,
    pub method: Method,
}

impl RequestKey {
    pub fn new(method: Method, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self { url: url.into(), method }
    }

    /// SHA-256 over `METHOD\nURL`, hex encoded.
    pub fn hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.method.as_str().as_bytes());
        hasher.update(b"\n");
        hasher.update(self.url.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_method_parse_case_insensitive() {
        assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
        assert_eq!(" Post ".parse::<Method>().unwrap(), Method::Post);
        assert!(matches!("BREW".parse::<Method>(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_only_get_is_storable() {
        assert!(Method::Get.is_idempotent_read());
        assert!(!Method::Head.is_idempotent_read());
        assert!(!Method::Post.is_idempotent_read());
    }

    #[test]
    fn test_key_ignores_fragment() {
        let a = RequestKey::new(Method::Get, &url("https://shop.test/app.js#v"));
        let b = RequestKey::new(Method::Get, &url("https://shop.test/app.js"));
        assert_eq!(a, b);
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn test_key_hash_depends_on_method() {
        let get = RequestKey::new(Method::Get, &url("https://shop.test/api/products"));
        let head = RequestKey::new(Method::Head, &url("https://shop.test/api/products"));
        assert_ne!(get.hash(), head.hash());
    }

    #[test]
    fn test_key_hash_format() {
        let hash = RequestKey::new(Method::Get, &url("https://shop.test/")).hash();
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_destination_serde_lowercase() {
        let d: Destination = serde_json::from_str("\"image\"").unwrap();
        assert_eq!(d, Destination::Image);
        assert_eq!(serde_json::to_string(&Destination::Empty).unwrap(), "\"empty\"");
    }
}
