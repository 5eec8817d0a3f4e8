//! # idfs-edge
//!
//! The edge layer in front of the IDFS marketing site.
//!
//! Two CDN edge functions, each a pure function of one event:
//!
//! - **viewer-request** — [`ApexRedirect`] sends `example.com/…` to
//!   `https://www.example.com/…` with a `301`, and lets every other host
//!   through untouched.
//! - **viewer-response** — [`SecurityHeaders`] stamps HSTS, `nosniff`,
//!   `DENY` framing, a referrer policy, a permissions policy and, when
//!   configured, a content security policy on every response.
//!
//! Around them sits a small local host that replays the CDN lifecycle over a
//! real socket, with a mock `/contact` endpoint as the origin, so the whole
//! path can be exercised with `curl` before anything is deployed.
//!
//! ## Quick start
//!
//! ```rust
//! use idfs_edge::{ApexRedirect, RequestOrResponse, ViewerRequestEvent};
//!
//! let hook = ApexRedirect::new("example.com", "www.example.com");
//! let event: ViewerRequestEvent = serde_json::from_str(
//!     r#"{"request":{"uri":"/products?id=5","headers":{"host":{"value":"example.com"}}}}"#,
//! ).unwrap();
//!
//! let RequestOrResponse::Response(redirect) = hook.handle(event) else { unreachable!() };
//! assert_eq!(redirect.status_code, 301);
//! assert_eq!(redirect.headers.get("location"), Some("https://www.example.com/products?id=5"));
//! ```

mod contact;
mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod config;
pub mod edge;
pub mod health;

pub use config::Config;
pub use contact::{ContactError, ContactForm, ContactSubmission};
pub use edge::{
    ApexRedirect, EdgeHeaders, EdgeRequest, EdgeResponse, HeaderEntry, RequestOrResponse,
    SecurityHeaders, ViewerRequestEvent, ViewerResponseEvent,
};
pub use error::Error;
pub use handler::Handler;
pub use request::Request;
pub use response::{Response, ResponseBuilder};
pub use router::Router;
pub use server::{EdgeHost, Server};

/// The local host as configured: both hooks around the contact and health
/// endpoints.
pub fn app(config: &Config) -> EdgeHost {
    let origin = Router::new()
        .get("/healthz", health::liveness)
        .get("/readyz", health::readiness);
    let origin = ContactForm::new(config.server.contact_delay(), &config.server.allowed_origin)
        .register(origin);

    EdgeHost::new(config.edge.apex_redirect(), config.edge.security_headers(), origin)
}
