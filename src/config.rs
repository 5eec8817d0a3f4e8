//! Layered configuration.
//!
//! Sources, lowest priority first:
//! 1. struct defaults
//! 2. `edge.yaml` in the working directory, if present
//! 3. `EDGE_`-prefixed environment variables, nested with `__`
//!    (`EDGE_EDGE__APEX_DOMAIN`, `EDGE_SERVER__PORT`, …)

use std::net::SocketAddr;
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::edge::{ApexRedirect, SecurityHeaders};
use crate::error::Error;

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub edge: EdgeConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// What the two edge hooks need to know about the deployment.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EdgeConfig {
    /// Bare domain that gets redirected, e.g. `example.com`.
    #[serde(default = "default_apex_domain")]
    pub apex_domain: String,

    /// Redirect target, e.g. `www.example.com`.
    #[serde(default = "default_www_domain")]
    pub www_domain: String,

    /// `content-security-policy` to stamp on responses. Unset leaves the
    /// header alone.
    #[serde(default)]
    pub content_security_policy: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Artificial delay before `POST /contact` answers.
    #[serde(default = "default_contact_delay_ms")]
    pub contact_delay_ms: u64,

    /// `access-control-allow-origin` on contact responses.
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_apex_domain() -> String {
    "example.com".to_owned()
}

fn default_www_domain() -> String {
    "www.example.com".to_owned()
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

fn default_port() -> u16 {
    3000
}

fn default_contact_delay_ms() -> u64 {
    500
}

fn default_allowed_origin() -> String {
    "*".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            apex_domain: default_apex_domain(),
            www_domain: default_www_domain(),
            content_security_policy: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            contact_delay_ms: default_contact_delay_ms(),
            allowed_origin: default_allowed_origin(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

impl Config {
    /// The provider stack, exposed so callers can merge overrides on top.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Yaml::file("edge.yaml"))
            .merge(Env::prefixed("EDGE_").split("__"))
    }

    /// Loads and validates configuration from every source.
    pub fn load() -> Result<Self, Error> {
        Self::from_figment(Self::figment())
    }

    pub fn from_figment(figment: Figment) -> Result<Self, Error> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects domain settings that would break or loop the redirect.
    pub fn validate(&self) -> Result<(), Error> {
        let edge = &self.edge;
        if edge.apex_domain.trim().is_empty() {
            return Err(Error::Config("edge.apex_domain must not be empty".into()));
        }
        if edge.www_domain.trim().is_empty() {
            return Err(Error::Config("edge.www_domain must not be empty".into()));
        }
        if edge.apex_domain == edge.www_domain {
            return Err(Error::Config(format!(
                "edge.apex_domain and edge.www_domain are both `{}`; requests would redirect to themselves",
                edge.apex_domain
            )));
        }
        Ok(())
    }
}

impl EdgeConfig {
    pub fn apex_redirect(&self) -> ApexRedirect {
        ApexRedirect::new(&self.apex_domain, &self.www_domain)
    }

    pub fn security_headers(&self) -> SecurityHeaders {
        SecurityHeaders::new(self.content_security_policy.clone())
    }
}

impl ServerConfig {
    pub fn addr(&self) -> Result<SocketAddr, Error> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| Error::Config(format!("invalid listen address `{}:{}`: {e}", self.host, self.port)))
    }

    pub fn contact_delay(&self) -> Duration {
        Duration::from_millis(self.contact_delay_ms)
    }
}
