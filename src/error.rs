//! Unified error type.

use std::fmt;

/// The error type returned by idfs-edge's fallible operations.
///
/// The edge hooks themselves never fail, and application-level problems
/// (a bad contact form, an unknown path) are HTTP responses. This type covers
/// what is left: loading configuration, binding a socket, decoding an event.
#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Config(String),
    Json(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Json(e) => write!(f, "json: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Config(_) => None,
            Self::Json(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<figment::Error> for Error {
    fn from(e: figment::Error) -> Self {
        Self::Config(e.to_string())
    }
}
