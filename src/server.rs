//! Local edge host: the CDN lifecycle around an origin router.
//!
//! Each request walks the same path it would in production:
//!
//! ```text
//! viewer ──► viewer-request hook ──► origin router ──► viewer-response hook ──► viewer
//!                    │
//!                    └── apex host? answer 301 here, origin never sees it
//! ```
//!
//! As on CloudFront, a response generated by the viewer-request hook goes
//! straight back to the viewer; viewer-response hooks only see origin
//! responses.
//!
//! # Graceful shutdown
//!
//! On SIGTERM or Ctrl-C the server stops accepting, lets every in-flight
//! connection finish, then returns from [`Server::serve`].

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body::Body;
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::edge::{ApexRedirect, SecurityHeaders};
use crate::error::Error;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

// ── EdgeHost ──────────────────────────────────────────────────────────────────

/// The two viewer hooks wrapped around an origin [`Router`].
pub struct EdgeHost {
    redirect: ApexRedirect,
    headers: SecurityHeaders,
    origin: Router,
}

impl EdgeHost {
    pub fn new(redirect: ApexRedirect, headers: SecurityHeaders, origin: Router) -> Self {
        Self { redirect, headers, origin }
    }

    /// Runs one request through the full lifecycle.
    ///
    /// Never fails: an unreadable body or an unknown route becomes a `4xx`
    /// response, which still gets the security headers.
    pub async fn handle<B>(&self, req: http::Request<B>) -> http::Response<Full<Bytes>>
    where
        B: Body<Data = Bytes>,
        B::Error: std::fmt::Display,
    {
        let (parts, body) = req.into_parts();

        // viewer-request
        let uri = parts.uri.path_and_query().map_or("", |pq| pq.as_str());
        if let Some(redirect) = self.redirect.classify(viewer_host(&parts), uri) {
            return Response::from(redirect).into_inner();
        }

        // origin
        let response = match self.origin.lookup(&parts.method, parts.uri.path()) {
            Some(handler) => match body.collect().await {
                Ok(collected) => handler(Request::new(collected.to_bytes())).await,
                Err(e) => {
                    debug!("failed to read request body: {e}");
                    Response::status(StatusCode::BAD_REQUEST)
                }
            },
            None => Response::status(StatusCode::NOT_FOUND),
        };

        // viewer-response
        let mut response = response.into_inner();
        self.headers.apply_to_http(response.headers_mut());
        response
    }
}

/// The host the viewer asked for: the `Host` header on HTTP/1.1, the
/// `:authority` pseudo-header (surfaced as the URI authority) on HTTP/2.
fn viewer_host(parts: &http::request::Parts) -> Option<&str> {
    parts.headers
        .get(http::header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| parts.uri.authority().map(|a| a.as_str()))
}

// ── Server ────────────────────────────────────────────────────────────────────

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    pub fn bind(addr: SocketAddr) -> Self {
        Self { addr }
    }

    /// Accepts connections and runs each request through `host`.
    ///
    /// Returns only after a full graceful shutdown.
    pub async fn serve(self, host: EdgeHost) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let host = Arc::new(host);

        info!(addr = %self.addr, "edge host listening");

        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Shutdown first so a queued backlog cannot delay it.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let host = Arc::clone(&host);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        let svc = service_fn(move |req: http::Request<hyper::body::Incoming>| {
                            let host = Arc::clone(&host);
                            async move {
                                let method = req.method().clone();
                                let path = req.uri().path().to_owned();
                                let response = host.handle(req).await;
                                debug!(peer = %remote_addr, %method, %path, status = response.status().as_u16(), "request");
                                Ok::<_, std::convert::Infallible>(response)
                            }
                        });

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished tasks so the set does not grow without bound.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("edge host stopped");
        Ok(())
    }
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or SIGINT (Ctrl-C only on Windows).
///
/// If a handler cannot be installed that signal is simply never observed.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
