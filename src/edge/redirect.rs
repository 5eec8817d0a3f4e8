//! Viewer-request hook: send the bare apex domain to its `www` twin.

use tracing::debug;

use super::{EdgeHeaders, EdgeResponse, RequestOrResponse, ViewerRequestEvent};

/// Redirects `apex_domain` to `https://<www_domain><uri>` with a `301`.
///
/// Hosts are compared byte for byte: no case folding, no port stripping, no
/// trailing-dot handling. Anything that is not exactly the apex, including a
/// request with no `host` header at all, goes through untouched.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApexRedirect {
    apex_domain: String,
    www_domain: String,
}

impl ApexRedirect {
    pub const STATUS_CODE: u16 = 301;
    pub const STATUS_DESCRIPTION: &'static str = "Moved Permanently";

    pub fn new(apex_domain: impl Into<String>, www_domain: impl Into<String>) -> Self {
        Self { apex_domain: apex_domain.into(), www_domain: www_domain.into() }
    }

    pub fn apex_domain(&self) -> &str {
        &self.apex_domain
    }

    pub fn www_domain(&self) -> &str {
        &self.www_domain
    }

    /// Runs the hook on one event.
    pub fn handle(&self, event: ViewerRequestEvent) -> RequestOrResponse {
        let request = event.request;
        match self.classify(request.host(), request.uri()) {
            Some(redirect) => RequestOrResponse::Response(redirect),
            None => RequestOrResponse::Request(request),
        }
    }

    /// The redirect for `host` + `uri`, or `None` to let the request continue.
    pub fn classify(&self, host: Option<&str>, uri: &str) -> Option<EdgeResponse> {
        let host = host?;
        if host != self.apex_domain {
            return None;
        }

        let location = format!("https://{}{uri}", self.www_domain);
        debug!(%host, %location, "apex redirect");

        let mut headers = EdgeHeaders::new();
        headers.insert("location", location);
        Some(EdgeResponse {
            status_code: Self::STATUS_CODE,
            status_description: Some(Self::STATUS_DESCRIPTION.to_owned()),
            headers,
            ..EdgeResponse::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::EdgeRequest;

    fn hook() -> ApexRedirect {
        ApexRedirect::new("example.com", "www.example.com")
    }

    fn event(host: Option<&str>, uri: &str) -> ViewerRequestEvent {
        let headers = host.map(|host| [("host", host)].into_iter().collect());
        ViewerRequestEvent {
            request: EdgeRequest { uri: Some(uri.to_owned()), headers, ..EdgeRequest::default() },
        }
    }

    fn location(out: &RequestOrResponse) -> &str {
        match out {
            RequestOrResponse::Response(r) => r.headers.get("location").unwrap(),
            RequestOrResponse::Request(_) => panic!("expected a redirect"),
        }
    }

    #[test]
    fn apex_with_query_redirects_to_www() {
        let out = hook().handle(event(Some("example.com"), "/products?id=5"));

        let RequestOrResponse::Response(resp) = &out else { panic!("expected a redirect") };
        assert_eq!(resp.status_code, 301);
        assert_eq!(resp.status_description.as_deref(), Some("Moved Permanently"));
        assert_eq!(resp.headers.len(), 1);
        assert_eq!(location(&out), "https://www.example.com/products?id=5");
    }

    #[test]
    fn apex_redirect_keeps_uri_verbatim() {
        for uri in ["", "/", "/a%20b?q=%2F&x=1", "/deep/path/"] {
            let out = hook().handle(event(Some("example.com"), uri));
            assert_eq!(location(&out), format!("https://www.example.com{uri}"));
        }
    }

    #[test]
    fn www_host_passes_through_untouched() {
        let input = event(Some("www.example.com"), "/about");
        let out = hook().handle(input.clone());
        assert_eq!(out, RequestOrResponse::Request(input.request));
    }

    #[test]
    fn unrelated_and_sub_domains_pass_through() {
        for host in ["other.org", "api.example.com", "example.com.evil.net"] {
            assert!(!hook().handle(event(Some(host), "/")).is_response(), "{host}");
        }
    }

    #[test]
    fn host_comparison_is_exact() {
        for host in ["Example.com", "example.com:443", "example.com.", " example.com"] {
            assert!(!hook().handle(event(Some(host), "/")).is_response(), "{host}");
        }
    }

    #[test]
    fn missing_host_passes_through() {
        let input = event(None, "/contact");
        let out = hook().handle(input.clone());
        assert_eq!(out, RequestOrResponse::Request(input.request));
    }

    #[test]
    fn host_entry_without_value_passes_through() {
        for host in [r#"{}"#, r#"{"value":5}"#, r#"{"value":null}"#] {
            let json = format!(r#"{{"request":{{"uri":"/","headers":{{"host":{host}}}}}}}"#);
            let input: ViewerRequestEvent = serde_json::from_str(&json).unwrap();
            let out = hook().handle(input.clone());
            assert_eq!(out, RequestOrResponse::Request(input.request), "{host}");
        }
    }

    #[test]
    fn www_pass_through_echoes_multi_value_headers() {
        let request = r#"{"uri":"/","headers":{"host":{"value":"www.example.com"},"accept":{"value":"a","multiValue":[{"value":"a"},{"value":"b"}]}}}"#;
        let input: ViewerRequestEvent =
            serde_json::from_str(&format!(r#"{{"request":{request}}}"#)).unwrap();

        let out = serde_json::to_value(hook().handle(input)).unwrap();
        assert_eq!(out, serde_json::from_str::<serde_json::Value>(request).unwrap());
    }

    #[test]
    fn request_without_headers_echoes_as_is() {
        let input: ViewerRequestEvent = serde_json::from_str(r#"{"request":{"uri":"/"}}"#).unwrap();
        let out = serde_json::to_string(&hook().handle(input)).unwrap();
        assert_eq!(out, r#"{"uri":"/"}"#);
    }

    #[test]
    fn pass_through_keeps_fields_the_hook_does_not_read() {
        let json = r#"{"request":{"uri":"/","method":"GET","headers":{"host":{"value":"www.example.com"},"accept":{"value":"*/*"}}}}"#;
        let input: ViewerRequestEvent = serde_json::from_str(json).unwrap();
        let out = hook().handle(input.clone());
        assert_eq!(out, RequestOrResponse::Request(input.request));
    }
}
