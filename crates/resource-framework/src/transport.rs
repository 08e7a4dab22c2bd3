//! # Transport Seam
//!
//! The framework never talks to the network directly. Every request goes
//! through a [`Transport`], which an application supplies (an HTTP client in
//! production, [`MockTransport`](crate::mock::MockTransport) in tests).
//!
//! A transport reports every completed exchange as `Ok(Response)`, whatever
//! its status. Interpreting statuses (404 as "not found", 204 as "not ready",
//! everything else at or above 400 as a failure) is the framework's job, done
//! by [`Endpoint`](crate::endpoint::Endpoint) and its callers.

use crate::error::{ResourceError, Result};
use async_trait::async_trait;
use std::fmt;

const MAX_ERROR_BODY: usize = 200;

/// HTTP verbs used by the resource layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered string pairs, used both as query strings and as form bodies.
/// Keys may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Params::push`].
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl ToString) {
        self.0.push((key.into(), value.to_string()));
    }

    /// Replaces every existing value for `key` with a single one, keeping the
    /// position of the first occurrence.
    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        let key = key.into();
        let value = value.to_string();
        match self.0.iter().position(|(k, _)| *k == key) {
            Some(index) => {
                self.0[index].1 = value;
                let mut seen = false;
                self.0.retain(|(k, _)| {
                    if *k != key {
                        return true;
                    }
                    let keep = !seen;
                    seen = true;
                    keep
                });
            }
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    /// Removes every value for `key`, returning the first.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let first = self.get(key).map(str::to_string);
        self.0.retain(|(k, _)| k != key);
        first
    }

    pub fn extend(&mut self, other: Params) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (key, value) in iter {
            params.push(key, value);
        }
        params
    }
}

impl IntoIterator for Params {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// A request as seen by the transport: verb, query string, form fields and
/// an optional raw body. A request carries either form fields or a raw body.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestMessage {
    pub method: Method,
    pub query: Params,
    pub form: Params,
    pub body: Option<Vec<u8>>,
}

impl RequestMessage {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            query: Params::new(),
            form: Params::new(),
            body: None,
        }
    }

    pub fn query(mut self, query: Params) -> Self {
        self.query = query;
        self
    }

    pub fn form(mut self, form: Params) -> Self {
        self.form = form;
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// A completed HTTP exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.status)
    }

    pub fn text(&self) -> Result<&str> {
        Ok(std::str::from_utf8(&self.body)?)
    }

    /// Turns a status of 400 or above into [`ResourceError::Http`], with the
    /// (truncated) body as the message.
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let text = String::from_utf8_lossy(&self.body);
        let message: String = text.trim().chars().take(MAX_ERROR_BODY).collect();
        Err(ResourceError::Http {
            status: self.status,
            message,
        })
    }
}

/// The request/response collaborator every endpoint is bound to.
///
/// Only [`Transport::request`] is required; the verb helpers build a
/// [`RequestMessage`] and forward to it.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, path: &str, message: RequestMessage) -> Result<Response>;

    async fn get(&self, path: &str, query: &Params) -> Result<Response> {
        self.request(path, RequestMessage::new(Method::Get).query(query.clone()))
            .await
    }

    async fn post(&self, path: &str, form: &Params) -> Result<Response> {
        self.request(path, RequestMessage::new(Method::Post).form(form.clone()))
            .await
    }

    async fn delete(&self, path: &str) -> Result<Response> {
        self.request(path, RequestMessage::new(Method::Delete)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_keep_order_and_repeats() {
        let mut params = Params::new()
            .with("name", "web")
            .with("blacklist.0", "a")
            .with("blacklist.1", "b")
            .with("name", "again");
        assert_eq!(params.get("name"), Some("web"));

        params.set("name", "final");
        let pairs: Vec<(&str, &str)> = params.iter().collect();
        assert_eq!(
            pairs,
            [("name", "final"), ("blacklist.0", "a"), ("blacklist.1", "b")]
        );

        assert_eq!(params.remove("blacklist.0"), Some("a".to_string()));
        assert!(!params.contains("blacklist.0"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_error_for_status_truncates_body() {
        let body = "x".repeat(500);
        let err = Response::new(500, body).error_for_status().unwrap_err();
        match err {
            ResourceError::Http { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message.len(), MAX_ERROR_BODY);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(Response::new(204, "").error_for_status().is_ok());
    }
}
