//! Incoming HTTP request type, as seen by origin handlers.

use bytes::Bytes;

/// A request that reached the origin, body fully buffered.
///
/// Routing has already happened on method and path, and the viewer-request
/// hook has already looked at the host; the handlers only need the body.
pub struct Request {
    pub(crate) body: Bytes,
}

impl Request {
    pub(crate) fn new(body: Bytes) -> Self {
        Self { body }
    }

    pub fn body(&self) -> &[u8] { &self.body }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_is_exposed_as_bytes() {
        let req = Request::new(Bytes::from_static(br#"{"name":"Ada"}"#));
        assert_eq!(req.body(), br#"{"name":"Ada"}"#);
    }
}
