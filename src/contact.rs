//! Mock contact-form endpoint.
//!
//! `POST /contact` validates the submission, logs it, waits a fixed delay and
//! answers `{"ok":true}`. Nothing is emailed or stored. `OPTIONS /contact`
//! answers the browser's CORS preflight. Every reply carries the same CORS
//! headers so the form works when the page is served from another origin.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Request, Response, Router};

const MAX_NAME_CHARS: usize = 100;
const MAX_MESSAGE_CHARS: usize = 5000;

/// A contact-form submission as the site's script posts it.
///
/// Missing text fields read as empty so they fail validation with a
/// field-specific message instead of a generic decode error.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub service_type: Option<String>,
    /// reCAPTCHA token. Accepted, never verified.
    pub token: Option<String>,
}

/// Why a submission was rejected. `Display` is the message sent back.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContactError {
    NameRequired,
    NameTooLong,
    EmailRequired,
    EmailInvalid,
    MessageRequired,
    MessageTooLong,
}

impl fmt::Display for ContactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NameRequired    => "Name is required",
            Self::NameTooLong     => "Name must be less than 100 characters",
            Self::EmailRequired   => "Email is required",
            Self::EmailInvalid    => "Invalid email format",
            Self::MessageRequired => "Message is required",
            Self::MessageTooLong  => "Message must be less than 5000 characters",
        })
    }
}

impl std::error::Error for ContactError {}

impl ContactSubmission {
    /// Checks name, email and message in that order; the first failure wins.
    /// Surrounding whitespace does not count.
    pub fn validate(&self) -> Result<(), ContactError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ContactError::NameRequired);
        }
        if name.chars().count() > MAX_NAME_CHARS {
            return Err(ContactError::NameTooLong);
        }

        let email = self.email.trim();
        if email.is_empty() {
            return Err(ContactError::EmailRequired);
        }
        if !is_valid_email(email) {
            return Err(ContactError::EmailInvalid);
        }

        let message = self.message.trim();
        if message.is_empty() {
            return Err(ContactError::MessageRequired);
        }
        if message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(ContactError::MessageTooLong);
        }
        Ok(())
    }
}

/// `local@host.tld`: local part `[A-Za-z0-9._%+-]+`, host `[A-Za-z0-9.-]+`,
/// TLD two or more ASCII letters.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };

    let local_ok = !local.is_empty()
        && local.chars().all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c));
    let host_ok = !host.is_empty()
        && host.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    let tld_ok = tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic());

    local_ok && host_ok && tld_ok
}

#[derive(Serialize)]
struct Reply<'a> {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

/// The contact endpoint and its settings.
#[derive(Clone, Debug)]
pub struct ContactForm {
    delay: Duration,
    allowed_origin: String,
}

impl ContactForm {
    pub fn new(delay: Duration, allowed_origin: impl Into<String>) -> Self {
        Self { delay, allowed_origin: allowed_origin.into() }
    }

    /// Mounts `POST /contact` and `OPTIONS /contact` on `router`.
    pub fn register(self, router: Router) -> Router {
        let form = Arc::new(self);
        let submit = {
            let form = Arc::clone(&form);
            move |req: Request| {
                let form = Arc::clone(&form);
                async move { form.submit(req).await }
            }
        };
        let preflight = move |_req: Request| {
            let form = Arc::clone(&form);
            async move { form.preflight() }
        };
        router.post("/contact", submit).options("/contact", preflight)
    }

    pub async fn submit(&self, req: Request) -> Response {
        let submission: ContactSubmission = match serde_json::from_slice(req.body()) {
            Ok(s) => s,
            Err(e) => {
                debug!("contact body rejected: {e}");
                return self.reply(StatusCode::BAD_REQUEST, Some("Invalid JSON"));
            }
        };

        if let Err(e) = submission.validate() {
            debug!(reason = %e, "contact submission rejected");
            return self.reply(StatusCode::BAD_REQUEST, Some(&e.to_string()));
        }

        info!(
            name = submission.name.trim(),
            email = submission.email.trim(),
            company = submission.company.as_deref().unwrap_or("Not provided"),
            phone = submission.phone.as_deref().unwrap_or("Not provided"),
            service_type = submission.service_type.as_deref().unwrap_or("Not provided"),
            content = submission.message.trim(),
            "contact form submission received (not sent)"
        );

        tokio::time::sleep(self.delay).await;
        self.reply(StatusCode::OK, None)
    }

    pub fn preflight(&self) -> Response {
        self.reply(StatusCode::OK, None)
    }

    fn reply(&self, status: StatusCode, error: Option<&str>) -> Response {
        let body = match serde_json::to_vec(&Reply { ok: error.is_none(), error }) {
            Ok(bytes) => bytes,
            Err(_) => return Response::status(StatusCode::INTERNAL_SERVER_ERROR),
        };
        Response::builder()
            .status(status)
            .header("access-control-allow-origin", &self.allowed_origin)
            .header("access-control-allow-methods", "POST, OPTIONS")
            .header("access-control-allow-headers", "Content-Type")
            .header("access-control-max-age", "86400")
            .json(body)
    }
}
