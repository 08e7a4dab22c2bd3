//! # Service Configuration
//!
//! Everything needed to reach a Splunk management port: where it is, who to
//! log in as, and which namespace relative paths resolve into.
//!
//! | Field | Default | Environment |
//! |-------|---------|-------------|
//! | `scheme` | `https` | `SPLUNK_SCHEME` |
//! | `host` | `localhost` | `SPLUNK_HOST` |
//! | `port` | `8089` | `SPLUNK_PORT` |
//! | `owner` | none | `SPLUNK_OWNER` |
//! | `app` | none | `SPLUNK_APP` |
//! | `token` | none | `SPLUNK_TOKEN` |
//! | `username` | none | `SPLUNK_USERNAME` |
//! | `password` | none | `SPLUNK_PASSWORD` |
//! | `verify` | `false` | `SPLUNK_VERIFY` |
//!
//! ## Namespaces
//!
//! Relative paths resolve under `/services/` when neither owner nor app is
//! set, and under `/servicesNS/{owner}/{app}/` otherwise, with `-` standing
//! in for whichever half is missing. Paths that already start with `/` are
//! used verbatim.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Invalid configuration document: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub owner: Option<String>,
    pub app: Option<String>,
    pub token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Verify the server certificate. Splunk ships a self-signed one.
    pub verify: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            scheme: "https".to_string(),
            host: "localhost".to_string(),
            port: 8089,
            owner: None,
            app: None,
            token: None,
            username: None,
            password: None,
            verify: false,
        }
    }
}

impl ServiceConfig {
    /// Defaults overridden by any `SPLUNK_*` variables that are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` answers for the `SPLUNK_*`
    /// keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(scheme) = lookup("SPLUNK_SCHEME") {
            config.scheme = scheme;
        }
        if let Some(host) = lookup("SPLUNK_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("SPLUNK_PORT") {
            config.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "SPLUNK_PORT".to_string(),
                value: port.clone(),
            })?;
        }
        config.owner = lookup("SPLUNK_OWNER").or(config.owner);
        config.app = lookup("SPLUNK_APP").or(config.app);
        config.token = lookup("SPLUNK_TOKEN").or(config.token);
        config.username = lookup("SPLUNK_USERNAME").or(config.username);
        config.password = lookup("SPLUNK_PASSWORD").or(config.password);
        if let Some(verify) = lookup("SPLUNK_VERIFY") {
            config.verify = parse_flag(&verify).ok_or(ConfigError::InvalidValue {
                key: "SPLUNK_VERIFY".to_string(),
                value: verify,
            })?;
        }
        Ok(config)
    }

    /// Parses a JSON document; absent fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    /// The path prefix relative paths resolve under.
    pub fn namespace(&self) -> String {
        if self.owner.is_none() && self.app.is_none() {
            return "/services/".to_string();
        }
        format!(
            "/servicesNS/{}/{}/",
            self.owner.as_deref().unwrap_or("-"),
            self.app.as_deref().unwrap_or("-")
        )
    }

    /// The absolute request path for `path`.
    pub fn resolve(&self, path: &str) -> String {
        if path.starts_with('/') {
            path.to_string()
        } else {
            format!("{}{}", self.namespace(), path)
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
