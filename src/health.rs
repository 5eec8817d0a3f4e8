//! Health-check handlers for whatever supervises the local host.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? |
//! | **Readiness** | `/readyz` | Can it serve traffic? |
//!
//! Both answers pass through the viewer-response hook like any other origin
//! response, so they double as a quick way to eyeball the security headers:
//!
//! ```text
//! curl -i http://localhost:3000/healthz
//! ```

use crate::{Request, Response};

/// Always `200 OK` with body `"ok"`.
pub async fn liveness(_req: Request) -> Response {
    Response::text("ok")
}

/// `200 OK` with body `"ready"`. The host holds no dependencies to wait on.
pub async fn readiness(_req: Request) -> Response {
    Response::text("ready")
}
