//! # Mock Transport & Testing Guide
//!
//! [`MockTransport`] implements [`Transport`] entirely in memory. Tests queue
//! the exchanges they expect, in order, and the resource code under test runs
//! unchanged against it.
//!
//! ## When to use the mock vs a live server
//!
//! | Feature | MockTransport | Live server |
//! |---------|---------------|-------------|
//! | **Speed** | Instant (in-memory) | Network round trips |
//! | **Determinism** | Fully deterministic | Depends on server state |
//! | **Error Injection** | Easy (`return_ok(404, ..)`, `return_err`) | Hard |
//! | **Use Case** | Resource and collection logic | End-to-end checks |
//!
//! ## Expectations
//!
//! Each `expect_*` call returns a builder naming the method and full path of
//! the next request; finishing it with `return_ok(status, body)` or
//! `return_err(error)` queues the answer. Expectations are consumed first in,
//! first out. A request that does not match the head of the queue panics with
//! `"Unexpected request or expectation mismatch"`, and [`MockTransport::verify`]
//! panics if anything is left over.
//!
//! ```rust
//! use resource_framework::mock::{atom_feed, AtomEntry, MockTransport};
//! use resource_framework::{Collection, Entity, ResourceMap};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mock = MockTransport::new();
//!     mock.expect_get("data/indexes/").return_ok(
//!         200,
//!         atom_feed(&[AtomEntry::new("main").alternate("/services/data/indexes/main")]),
//!     );
//!
//!     let indexes = Collection::new(mock.transport(), "data/indexes", |t, path, state| {
//!         Entity::with_state(t, path, state)
//!     });
//!     assert_eq!(indexes.keys().await.unwrap(), ["main"]);
//!
//!     let sent = mock.requests();
//!     assert_eq!(sent[0].message.query.get("count"), Some("-1"));
//!     mock.verify();
//! }
//! ```
//!
//! ## Atom fixtures
//!
//! [`AtomEntry`], [`atom_feed`] and [`atom_entry`] render the response shapes
//! the decoder consumes, so tests describe entries instead of spelling out
//! XML.

use crate::error::{ResourceError, Result};
use crate::transport::{Method, RequestMessage, Response, Transport};
use async_trait::async_trait;
use quick_xml::escape::escape;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

struct Expectation {
    method: Method,
    path: String,
    response: Result<Response>,
}

/// A request the mock has seen.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub path: String,
    pub message: RequestMessage,
}

/// An in-memory transport with expectation tracking.
#[derive(Clone, Default)]
pub struct MockTransport {
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockTransport {
    /// Creates a mock with no expectations.
    pub fn new() -> Self {
        Self::default()
    }

    /// A shared handle for binding endpoints, collections and services.
    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::new(self.clone())
    }

    pub fn expect_get(&self, path: impl Into<String>) -> ExpectationBuilder {
        self.expect_request(Method::Get, path)
    }

    pub fn expect_post(&self, path: impl Into<String>) -> ExpectationBuilder {
        self.expect_request(Method::Post, path)
    }

    pub fn expect_delete(&self, path: impl Into<String>) -> ExpectationBuilder {
        self.expect_request(Method::Delete, path)
    }

    pub fn expect_request(&self, method: Method, path: impl Into<String>) -> ExpectationBuilder {
        ExpectationBuilder {
            method,
            path: path.into(),
            expectations: self.expectations.clone(),
        }
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let exps = self.expectations.lock().unwrap();
        if !exps.is_empty() {
            let pending: Vec<String> = exps
                .iter()
                .map(|e| format!("{} {}", e.method, e.path))
                .collect();
            panic!(
                "Not all expectations were met. {} remaining: {:?}",
                exps.len(),
                pending
            );
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(&self, path: &str, message: RequestMessage) -> Result<Response> {
        let method = message.method;
        self.requests.lock().unwrap().push(RecordedRequest {
            path: path.to_string(),
            message,
        });

        let expectation = self.expectations.lock().unwrap().pop_front();
        match expectation {
            Some(exp) if exp.method == method && exp.path == path => exp.response,
            Some(exp) => panic!(
                "Unexpected request or expectation mismatch: got {method} {path}, expected {} {}",
                exp.method, exp.path
            ),
            None => panic!("Unexpected request or expectation mismatch: got {method} {path}"),
        }
    }
}

/// Builder for a single expected exchange.
pub struct ExpectationBuilder {
    method: Method,
    path: String,
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
}

impl ExpectationBuilder {
    /// Answers with a completed exchange of the given status and body.
    pub fn return_ok(self, status: u16, body: impl Into<Vec<u8>>) {
        let mut exps = self.expectations.lock().unwrap();
        exps.push_back(Expectation {
            method: self.method,
            path: self.path,
            response: Ok(Response::new(status, body)),
        });
    }

    /// Fails the exchange at the transport level.
    pub fn return_err(self, error: ResourceError) {
        let mut exps = self.expectations.lock().unwrap();
        exps.push_back(Expectation {
            method: self.method,
            path: self.path,
            response: Err(error),
        });
    }
}

// =============================================================================
// ATOM FIXTURES
// =============================================================================

const ATOM_NS: &str = r#"xmlns="http://www.w3.org/2005/Atom" xmlns:s="http://dev.splunk.com/ns/rest" xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/""#;

/// A server entry described field by field.
#[derive(Debug, Clone, Default)]
pub struct AtomEntry {
    title: String,
    links: Vec<(String, String)>,
    fields: Vec<(String, FixtureValue)>,
    acl: Vec<(String, String)>,
    required: Vec<String>,
    optional: Vec<String>,
    wildcard: Vec<String>,
}

#[derive(Debug, Clone)]
enum FixtureValue {
    Text(String),
    List(Vec<String>),
}

impl AtomEntry {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn link(mut self, rel: impl Into<String>, href: impl Into<String>) -> Self {
        self.links.push((rel.into(), href.into()));
        self
    }

    pub fn alternate(self, href: impl Into<String>) -> Self {
        self.link("alternate", href)
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((key.into(), FixtureValue::Text(value.into())));
        self
    }

    pub fn list_field<S: Into<String>>(
        mut self,
        key: impl Into<String>,
        items: impl IntoIterator<Item = S>,
    ) -> Self {
        let items = items.into_iter().map(Into::into).collect();
        self.fields.push((key.into(), FixtureValue::List(items)));
        self
    }

    pub fn acl(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.acl.push((key.into(), value.into()));
        self
    }

    pub fn required(mut self, name: impl Into<String>) -> Self {
        self.required.push(name.into());
        self
    }

    pub fn optional(mut self, name: impl Into<String>) -> Self {
        self.optional.push(name.into());
        self
    }

    pub fn wildcard(mut self, name: impl Into<String>) -> Self {
        self.wildcard.push(name.into());
        self
    }

    fn has_content(&self) -> bool {
        !(self.fields.is_empty()
            && self.acl.is_empty()
            && self.required.is_empty()
            && self.optional.is_empty()
            && self.wildcard.is_empty())
    }

    fn render(&self, namespaces: &str) -> String {
        let mut xml = format!("<entry{namespaces}>");
        xml.push_str(&format!("<title>{}</title>", escape(self.title.as_str())));
        for (rel, href) in &self.links {
            xml.push_str(&format!(
                r#"<link href="{}" rel="{}"/>"#,
                escape(href.as_str()),
                escape(rel.as_str())
            ));
        }
        if self.has_content() {
            xml.push_str(r#"<content type="text/xml"><s:dict>"#);
            for (key, value) in &self.fields {
                xml.push_str(&key_xml(key, &value_xml(value)));
            }
            if !self.acl.is_empty() {
                let acl: String = self
                    .acl
                    .iter()
                    .map(|(k, v)| key_xml(k, &escape(v.as_str())))
                    .collect();
                xml.push_str(&key_xml("eai:acl", &format!("<s:dict>{acl}</s:dict>")));
            }
            if !(self.required.is_empty() && self.optional.is_empty() && self.wildcard.is_empty()) {
                let attributes = [
                    ("optionalFields", &self.optional),
                    ("requiredFields", &self.required),
                    ("wildcardFields", &self.wildcard),
                ]
                .iter()
                .map(|(k, names)| key_xml(k, &list_xml(names)))
                .collect::<String>();
                xml.push_str(&key_xml(
                    "eai:attributes",
                    &format!("<s:dict>{attributes}</s:dict>"),
                ));
            }
            xml.push_str("</s:dict></content>");
        }
        xml.push_str("</entry>");
        xml
    }
}

fn key_xml(name: &str, inner: &str) -> String {
    format!(r#"<s:key name="{}">{inner}</s:key>"#, escape(name))
}

fn list_xml(items: &[String]) -> String {
    let items: String = items
        .iter()
        .map(|item| format!("<s:item>{}</s:item>", escape(item.as_str())))
        .collect();
    format!("<s:list>{items}</s:list>")
}

fn value_xml(value: &FixtureValue) -> String {
    match value {
        FixtureValue::Text(text) => escape(text.as_str()).into_owned(),
        FixtureValue::List(items) => list_xml(items),
    }
}

/// An Atom feed holding `entries`, in order.
pub fn atom_feed(entries: &[AtomEntry]) -> String {
    let body: String = entries.iter().map(|entry| entry.render("")).collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><feed {ATOM_NS}><title>feed</title><opensearch:totalResults>{}</opensearch:totalResults>{body}</feed>"#,
        entries.len()
    )
}

/// A document rooted at a single entry, as job reads return.
pub fn atom_entry(entry: &AtomEntry) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>{}"#,
        entry.render(&format!(" {ATOM_NS}"))
    )
}

/// A `<response>` document with one child per pair.
pub fn response_document(fields: &[(&str, &str)]) -> String {
    let body: String = fields
        .iter()
        .map(|(k, v)| format!("<{k}>{}</{k}>", escape(*v)))
        .collect();
    format!(r#"<?xml version="1.0" encoding="UTF-8"?><response>{body}</response>"#)
}
