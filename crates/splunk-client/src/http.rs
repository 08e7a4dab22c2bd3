//! # HTTP Transport
//!
//! [`HttpTransport`] carries framework requests to a live Splunk management
//! port over `reqwest`. It owns the concerns the framework leaves open:
//!
//! - **Namespacing**: relative paths are resolved through
//!   [`ServiceConfig::resolve`], absolute ones are sent as given
//! - **Authentication**: a session token, either configured or obtained by
//!   [`HttpTransport::login`], travels as `Authorization: Splunk <token>`
//! - **Encoding**: query parameters go on the URL, form parameters in an
//!   `application/x-www-form-urlencoded` body, raw bodies as-is
//!
//! Every status comes back as a [`Response`]; turning statuses into errors is
//! the endpoint's job.

use crate::config::ServiceConfig;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use resource_framework::atom;
use resource_framework::{Method, Params, RequestMessage, ResourceError, Response, Result, Transport};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Where credentials are exchanged for a session key.
pub const PATH_LOGIN: &str = "/services/auth/login";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpTransport {
    http: Client,
    base: Url,
    config: ServiceConfig,
    token: Option<String>,
}

impl HttpTransport {
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let http = Client::builder()
            .danger_accept_invalid_certs(!config.verify)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(transport_error)?;
        let base = Url::parse(&config.base_url())
            .map_err(|e| ResourceError::InvalidArgument(format!("bad service address: {e}")))?;
        let token = config.token.as_deref().map(authorization);
        Ok(Self {
            http,
            base,
            config,
            token,
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Exchanges the configured username and password for a session key.
    /// A transport that already holds a token, or has no credentials, is
    /// returned unchanged.
    #[tracing::instrument(skip(self), fields(host = %self.config.host))]
    pub async fn login(mut self) -> Result<Self> {
        if self.token.is_some() {
            return Ok(self);
        }
        let (Some(username), Some(password)) = (&self.config.username, &self.config.password)
        else {
            debug!("No credentials, continuing unauthenticated");
            return Ok(self);
        };
        let form = Params::new()
            .with("username", username)
            .with("password", password);
        let response = self.post(PATH_LOGIN, &form).await?.error_for_status()?;
        let session_key = atom::load_response_field(&response.body, "sessionKey")?;
        self.token = Some(authorization(&session_key));
        info!(%username, "Logged in");
        Ok(self)
    }

    /// The absolute URL for a request path plus its query parameters.
    pub fn url(&self, path: &str, query: &Params) -> Result<Url> {
        let mut url = self
            .base
            .join(&self.config.resolve(path))
            .map_err(|e| ResourceError::InvalidArgument(format!("bad path {path}: {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, path: &str, message: RequestMessage) -> Result<Response> {
        let url = self.url(path, &message.query)?;
        let method = match message.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
        };
        debug!(%url, %method, "Sending request");

        let mut request = self.http.request(method, url);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, token);
        }
        if !message.form.is_empty() {
            let form: Vec<(&str, &str)> = message.form.iter().collect();
            request = request.form(&form);
        } else if let Some(body) = message.body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(transport_error)?;
        debug!(status, "Received response");
        Ok(Response::new(status, body.to_vec()))
    }
}

/// The `Authorization` header value for a session key.
fn authorization(session_key: &str) -> String {
    if session_key.starts_with("Splunk ") {
        session_key.to_string()
    } else {
        format!("Splunk {session_key}")
    }
}

fn transport_error(e: reqwest::Error) -> ResourceError {
    ResourceError::Transport(Box::new(e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(config: ServiceConfig) -> HttpTransport {
        HttpTransport::new(config).unwrap()
    }

    #[test]
    fn test_relative_paths_resolve_into_namespace() {
        let http = transport(ServiceConfig {
            owner: Some("admin".to_string()),
            app: Some("search".to_string()),
            ..Default::default()
        });
        let url = http
            .url("saved/searches/", &Params::new().with("count", -1))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://localhost:8089/servicesNS/admin/search/saved/searches/?count=-1"
        );
    }

    #[test]
    fn test_absolute_paths_are_verbatim_and_query_is_encoded() {
        let http = transport(ServiceConfig::default());
        let url = http
            .url(
                "/services/search/jobs/",
                &Params::new().with("search", "search index=main | head 10"),
            )
            .unwrap();
        assert_eq!(url.path(), "/services/search/jobs/");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs, [("search".to_string(), "search index=main | head 10".to_string())]);
    }

    #[test]
    fn test_configured_token_becomes_authorization() {
        let http = transport(ServiceConfig {
            token: Some("abc123".to_string()),
            ..Default::default()
        });
        assert!(http.is_authenticated());
        assert_eq!(http.token.as_deref(), Some("Splunk abc123"));
        assert_eq!(authorization("Splunk abc123"), "Splunk abc123");
    }

    #[tokio::test]
    async fn test_login_without_credentials_is_a_no_op() {
        let http = transport(ServiceConfig::default()).login().await.unwrap();
        assert!(!http.is_authenticated());
    }
}
