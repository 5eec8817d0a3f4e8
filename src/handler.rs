//! Origin handlers as shared trait objects.
//!
//! The router keeps every handler behind one type, an `Arc`'d closure that
//! returns a boxed future. [`Handler`] is how a plain `async fn` or a capturing
//! closure becomes that type at registration time:
//!
//! ```text
//! router.post("/contact", submit)   →   submit.into_boxed_handler()
//!                                   →   Arc<dyn Fn(Request) -> BoxFuture>
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::Response;

pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

#[doc(hidden)]
pub type BoxedHandler = Arc<dyn Fn(Request) -> BoxFuture + Send + Sync + 'static>;

/// Anything callable as `Fn(Request) -> impl Future<Output = Response>`.
///
/// Implemented for every such function and closure; there is nothing to
/// implement by hand.
pub trait Handler: Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

impl<F, Fut> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(move |req: Request| -> BoxFuture { Box::pin(self(req)) })
    }
}
