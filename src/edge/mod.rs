//! Edge-function event model and the two viewer hooks.
//!
//! A CDN invokes an edge function with one event and expects one value back.
//! The shapes below mirror that wire contract field for field:
//!
//! ```text
//! viewer-request   { "request":  { "uri": "/a?b=1", "headers": { "host": { "value": "example.com" } } } }
//!                  → the request (continue) or a response (answer at the edge)
//!
//! viewer-response  { "response": { "statusCode": 200, "headers": { … } } }
//!                  → the response
//! ```
//!
//! Both hooks are pure: no I/O, no shared state, no clocks. One event in, one
//! value out.

mod redirect;
mod security_headers;

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub use redirect::ApexRedirect;
pub use security_headers::SecurityHeaders;

// ── Headers ───────────────────────────────────────────────────────────────────

/// One header as the CDN runtime wraps it: `{ "value": "…" }`, sometimes with
/// `multiValue` and friends alongside.
///
/// The entry is kept as raw JSON so fields this crate does not read survive a
/// pass-through, and an entry with no string `value` still parses; it just
/// reads as absent.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct HeaderEntry(Value);

impl HeaderEntry {
    pub fn new(value: impl Into<String>) -> Self {
        let mut entry = Map::new();
        entry.insert("value".to_owned(), Value::String(value.into()));
        Self(Value::Object(entry))
    }

    /// The `value` field, if it is a string.
    pub fn value(&self) -> Option<&str> {
        self.0.get("value").and_then(Value::as_str)
    }
}

/// Header map keyed by lower-case header name. One entry per name.
///
/// Keys are lower-cased on the way in, whether inserted or deserialized. When
/// an event spells one header two ways, the already lower-case spelling wins.
///
/// A `BTreeMap` keeps serialized output stable, which the CLI and the tests
/// both lean on. Order carries no meaning on the wire.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EdgeHeaders(BTreeMap<String, HeaderEntry>);

impl EdgeHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// String value stored under `name`. Names are matched after lower-casing.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).and_then(HeaderEntry::value)
    }

    /// Sets `name` to `value`, replacing any previous entry.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.insert_entry(name, HeaderEntry::new(value));
    }

    fn insert_entry(&mut self, name: &str, entry: HeaderEntry) {
        self.0.insert(name.to_ascii_lowercase(), entry);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Headers with a string value. Entries without one are skipped.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().filter_map(|(k, v)| Some((k.as_str(), v.value()?)))
    }
}

impl<'de> Deserialize<'de> for EdgeHeaders {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, HeaderEntry>::deserialize(deserializer)?;
        let mut headers = Self::new();
        // Sorted order puts `x-a` after `X-A`, so the lower-case spelling lands last.
        for (name, entry) in raw {
            headers.insert_entry(&name, entry);
        }
        Ok(headers)
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for EdgeHeaders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (k, v) in iter {
            headers.insert(k.as_ref(), v);
        }
        headers
    }
}

// ── Request / Response ────────────────────────────────────────────────────────

/// The viewer's request as the edge sees it, before any origin fetch.
///
/// `uri` and `headers` stay `None` when the event leaves them out, so a
/// pass-through serializes back to what came in.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EdgeRequest {
    /// Path plus query string, exactly as received.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<EdgeHeaders>,
    /// Fields this crate does not interpret (`method`, `querystring`,
    /// `cookies`, …). Carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EdgeRequest {
    pub fn uri(&self) -> &str {
        self.uri.as_deref().unwrap_or_default()
    }

    /// The `host` header, if the runtime supplied a usable one.
    pub fn host(&self) -> Option<&str> {
        self.headers.as_ref()?.get("host")
    }
}

/// A response travelling back to the viewer, or one synthesised at the edge.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeResponse {
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_description: Option<String>,
    #[serde(default)]
    pub headers: EdgeHeaders,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for EdgeResponse {
    fn default() -> Self {
        Self {
            status_code: 200,
            status_description: None,
            headers: EdgeHeaders::new(),
            extra: Map::new(),
        }
    }
}

// ── Events ────────────────────────────────────────────────────────────────────

/// Input to the viewer-request hook.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ViewerRequestEvent {
    pub request: EdgeRequest,
}

/// Input to the viewer-response hook. The request is informational only.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ViewerResponseEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<EdgeRequest>,
    pub response: EdgeResponse,
}

/// What a viewer-request hook hands back to the runtime.
///
/// `Request` means "carry on to the origin"; `Response` means "answer the
/// viewer now". Untagged: the runtime tells them apart by shape, and only a
/// response carries `statusCode`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RequestOrResponse {
    Response(EdgeResponse),
    Request(EdgeRequest),
}

impl RequestOrResponse {
    pub fn is_response(&self) -> bool {
        matches!(self, Self::Response(_))
    }
}
