//! Outgoing HTTP response type.
//!
//! Origin handlers build a [`Response`] and return it. The host converts it to
//! an `http::Response` and runs the viewer-response hook over its headers.

use bytes::Bytes;
use http::{HeaderName, HeaderValue, StatusCode};
use http_body_util::Full;
use tracing::warn;

use crate::edge::EdgeResponse;

const JSON: &str = "application/json";
const TEXT: &str = "text/plain; charset=utf-8";

/// An outgoing HTTP response.
///
/// ```rust
/// use http::StatusCode;
/// use idfs_edge::Response;
///
/// Response::text("ok");
/// Response::status(StatusCode::NOT_FOUND);
///
/// Response::builder()
///     .status(StatusCode::BAD_REQUEST)
///     .header("access-control-allow-origin", "*")
///     .json(br#"{"ok":false}"#.to_vec());
/// ```
#[derive(Debug)]
pub struct Response {
    pub(crate) body: Vec<u8>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) status: StatusCode,
}

impl Response {
    /// `200 OK` — `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// Response with no body.
    pub fn status(code: StatusCode) -> Self {
        Self { body: Vec::new(), headers: Vec::new(), status: code }
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: Vec::new(), status: StatusCode::OK }
    }

    pub fn status_code(&self) -> StatusCode { self.status }
    pub fn body(&self) -> &[u8] { &self.body }

    /// First value of `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Converts into the `http` type hyper writes to the wire.
    ///
    /// A header whose name or value is not valid on the wire is dropped and
    /// logged rather than failing the whole response.
    pub(crate) fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut response = http::Response::new(Full::new(Bytes::from(self.body)));
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        for (name, value) in self.headers {
            match (HeaderName::try_from(name.as_str()), HeaderValue::try_from(value.as_str())) {
                (Ok(name), Ok(value)) => { headers.append(name, value); }
                _ => warn!(header = %name, "dropping invalid response header"),
            }
        }
        response
    }
}

/// An edge-generated response (a redirect) on its way to the viewer.
impl From<EdgeResponse> for Response {
    fn from(edge: EdgeResponse) -> Self {
        let status = StatusCode::from_u16(edge.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let headers = edge.headers.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Self { body: Vec::new(), headers, status }
    }
}

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `200 OK`.
/// Terminated by a typed body method.
pub struct ResponseBuilder {
    headers: Vec<(String, String)>,
    status: StatusCode,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json(self, body: Vec<u8>) -> Response {
        self.finish(JSON, body)
    }

    /// Terminate with a plain-text body (`text/plain; charset=utf-8`).
    pub fn text(self, body: impl Into<String>) -> Response {
        self.finish(TEXT, body.into().into_bytes())
    }

    fn finish(self, content_type: &str, body: Vec<u8>) -> Response {
        let mut headers = vec![("content-type".to_owned(), content_type.to_owned())];
        headers.extend(self.headers);
        Response { body, headers, status: self.status }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_puts_content_type_first() {
        let resp = Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .header("access-control-allow-origin", "*")
            .json(b"{}".to_vec());
        assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(resp.headers[0], ("content-type".to_owned(), JSON.to_owned()));
        assert_eq!(resp.header("Access-Control-Allow-Origin"), Some("*"));
    }

    #[test]
    fn invalid_headers_are_dropped_on_conversion() {
        let inner = Response::builder()
            .header("x-ok", "1")
            .header("bad header", "2")
            .header("x-bad-value", "a\nb")
            .text("")
            .into_inner();
        assert_eq!(inner.headers().get("x-ok").unwrap(), "1");
        assert_eq!(inner.headers().get("content-type").unwrap(), TEXT);
        assert_eq!(inner.headers().len(), 2);
    }

    #[test]
    fn edge_redirect_converts_to_bodyless_response() {
        let edge = EdgeResponse {
            status_code: 301,
            headers: [("location", "https://www.example.com/a")].into_iter().collect(),
            ..EdgeResponse::default()
        };
        let resp = Response::from(edge);
        assert_eq!(resp.status_code(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(resp.header("location"), Some("https://www.example.com/a"));
        assert!(resp.body().is_empty());
    }
}
