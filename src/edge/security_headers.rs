//! Viewer-response hook: stamp the site's security headers on every response.

use http::{HeaderMap, HeaderName, HeaderValue};

use super::{EdgeHeaders, EdgeResponse, ViewerResponseEvent};

const CSP: &str = "content-security-policy";

/// Injects [`SecurityHeaders::BASELINE`] plus an optional `content-security-policy`.
///
/// With no policy configured the hook never touches `content-security-policy`,
/// so whatever the origin sent (or did not send) reaches the viewer as is.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SecurityHeaders {
    content_security_policy: Option<String>,
}

impl SecurityHeaders {
    /// Headers set on every response, overwriting whatever the origin sent.
    pub const BASELINE: [(&'static str, &'static str); 5] = [
        ("strict-transport-security", "max-age=31536000; includeSubDomains; preload"),
        ("x-content-type-options",    "nosniff"),
        ("x-frame-options",           "DENY"),
        ("referrer-policy",           "no-referrer-when-downgrade"),
        ("permissions-policy",        "geolocation=(), microphone=(), camera=()"),
    ];

    /// The site's own policy: self-hosted assets, `data:` images, inline
    /// styles, reCAPTCHA scripts and frames, Google Fonts.
    pub const SITE_CSP: &'static str = "default-src 'self'; \
        img-src 'self' data:; \
        script-src 'self' https://www.google.com https://www.gstatic.com; \
        style-src 'self' 'unsafe-inline' https://fonts.googleapis.com; \
        font-src 'self' https://fonts.gstatic.com; \
        frame-src 'self' https://www.google.com; \
        connect-src 'self'";

    pub fn new(content_security_policy: Option<String>) -> Self {
        Self { content_security_policy }
    }

    /// Shorthand for [`SecurityHeaders::new`] with [`SecurityHeaders::SITE_CSP`].
    pub fn with_site_csp() -> Self {
        Self::new(Some(Self::SITE_CSP.to_owned()))
    }

    pub fn content_security_policy(&self) -> Option<&str> {
        self.content_security_policy.as_deref()
    }

    /// Runs the hook on one event.
    pub fn handle(&self, event: ViewerResponseEvent) -> EdgeResponse {
        let mut response = event.response;
        self.apply(&mut response.headers);
        response
    }

    pub fn apply(&self, headers: &mut EdgeHeaders) {
        self.for_each(|name, value| headers.insert(name, value));
    }

    /// Same as [`apply`](Self::apply), on a live `http` header map.
    ///
    /// A configured policy that is not a valid header value is skipped; the
    /// baseline is always written.
    pub fn apply_to_http(&self, headers: &mut HeaderMap) {
        self.for_each(|name, value| match HeaderValue::from_str(value) {
            Ok(value) => {
                headers.insert(HeaderName::from_static(name), value);
            }
            Err(_) => tracing::warn!(header = name, "skipping header with invalid value"),
        });
    }

    fn for_each(&self, mut f: impl FnMut(&'static str, &str)) {
        for (name, value) in Self::BASELINE {
            f(name, value);
        }
        if let Some(csp) = &self.content_security_policy {
            f(CSP, csp);
        }
    }
}
