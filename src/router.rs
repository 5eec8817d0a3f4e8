//! Radix-tree origin router.
//!
//! One tree per HTTP method, O(path-length) lookup. The edge host consults it
//! only for requests the viewer-request hook lets through.

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHandler, Handler};

/// The origin router.
///
/// Build it once at startup and hand it to [`EdgeHost`](crate::EdgeHost).
/// Each [`Router::on`] call returns `self` so registrations chain.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    /// Register a handler for a method + path pair.
    ///
    /// # Panics
    ///
    /// Panics on a malformed or conflicting route. Routes are fixed at
    /// startup, so this is a programming error.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::GET, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::POST, path, handler)
    }

    pub fn options(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::OPTIONS, path, handler)
    }

    pub(crate) fn lookup(&self, method: &Method, path: &str) -> Option<BoxedHandler> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        Some(Arc::clone(matched.value))
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Request, Response};

    async fn ok(_req: Request) -> Response {
        Response::text("ok")
    }

    #[test]
    fn lookup_is_per_method() {
        let router = Router::new().post("/contact", ok);
        assert!(router.lookup(&Method::POST, "/contact").is_some());
        assert!(router.lookup(&Method::GET, "/contact").is_none());
        assert!(router.lookup(&Method::POST, "/other").is_none());
    }

    #[test]
    fn lookup_matches_whole_paths_only() {
        let router = Router::new().get("/healthz", ok);
        assert!(router.lookup(&Method::GET, "/healthz").is_some());
        assert!(router.lookup(&Method::GET, "/healthz/").is_none());
        assert!(router.lookup(&Method::GET, "/healthzz").is_none());
    }

    #[test]
    #[should_panic(expected = "invalid route")]
    fn conflicting_routes_panic() {
        let _ = Router::new().get("/contact", ok).get("/contact", ok);
    }
}
