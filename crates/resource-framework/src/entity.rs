//! # Resource Trait
//!
//! The [`Resource`] trait is the contract every addressable server resource
//! satisfies. A resource wraps an [`Entity`]: an [`Endpoint`] plus the cached
//! [`ParsedEntry`] last read from it. Everything else (reading, refreshing,
//! field lookup, updates, the standard actions) is provided by the trait, so
//! a concrete resource only supplies accessors to its entity and overrides
//! what it reinterprets.
//!
//! # State
//!
//! State starts either unset or pre-filled (items built from a collection
//! listing already carry their entry). Accessors such as
//! [`Resource::content`] fetch it lazily on first use. [`Resource::read`]
//! never touches the cache; [`Resource::refresh`] replaces it wholesale.
//! Mutations ([`Resource::update`], [`Resource::enable`], ...) do not refresh:
//! the cache is stale until the caller asks for a refresh. Resources whose
//! updates go elsewhere, or need extra fields, override
//! [`Resource::update_path`] and [`Resource::prepare_update`].
//!
//! # Field Lookup
//!
//! [`Resource::get`] resolves a key in three stages and stops at the first hit:
//!
//! | Stage | Source | Hook |
//! |-------|--------|------|
//! | 1 | a computed member of the resource | [`Resource::member`] |
//! | 2 | cached content, exact key then dotted group | [`Record::resolve`] |
//! | 3 | static defaults | [`Resource::default_field`] |
//!
//! A resource shadows a content field by answering for it in `member`, and
//! fills genuinely absent fields through `default_field`. A present but empty
//! content value is still a hit at stage 2.
//!
//! ```rust
//! use async_trait::async_trait;
//! use resource_framework::{Entity, Resource, Result, Value};
//!
//! struct Alert {
//!     entity: Entity,
//! }
//!
//! #[async_trait]
//! impl Resource for Alert {
//!     fn entity(&self) -> &Entity { &self.entity }
//!     fn entity_mut(&mut self) -> &mut Entity { &mut self.entity }
//!
//!     async fn member(&mut self, key: &str) -> Result<Option<Value>> {
//!         match key {
//!             "severity" => Ok(Some(Value::from("high"))),
//!             _ => self.entity.member(key).await,
//!         }
//!     }
//!
//!     fn default_field(&self, key: &str) -> Option<Value> {
//!         (key == "digest_mode").then(|| Value::from("1"))
//!     }
//! }
//! ```

use crate::atom::{self, FieldSchema, ParsedEntry};
use crate::endpoint::Endpoint;
use crate::error::{ResourceError, Result};
use crate::record::{Record, Value};
use crate::transport::{Params, Response, Transport};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// The base resource: an endpoint and its optionally cached entry.
#[derive(Debug, Clone)]
pub struct Entity {
    endpoint: Endpoint,
    state: Option<ParsedEntry>,
}

impl Entity {
    /// An entity whose state is fetched on first access.
    pub fn new(transport: Arc<dyn Transport>, path: impl Into<String>) -> Self {
        Self {
            endpoint: Endpoint::new(transport, path),
            state: None,
        }
    }

    /// An entity adopting an already decoded entry, skipping the first read.
    pub fn with_state(
        transport: Arc<dyn Transport>,
        path: impl Into<String>,
        state: ParsedEntry,
    ) -> Self {
        Self {
            endpoint: Endpoint::new(transport, path),
            state: Some(state),
        }
    }

    pub fn from_parts(
        transport: Arc<dyn Transport>,
        path: impl Into<String>,
        state: Option<ParsedEntry>,
    ) -> Self {
        Self {
            endpoint: Endpoint::new(transport, path),
            state,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The cached entry, without triggering a read.
    pub fn cached(&self) -> Option<&ParsedEntry> {
        self.state.as_ref()
    }

    pub fn set_state(&mut self, state: ParsedEntry) {
        self.state = Some(state);
    }
}

#[async_trait]
impl Resource for Entity {
    fn entity(&self) -> &Entity {
        self
    }

    fn entity_mut(&mut self) -> &mut Entity {
        self
    }
}

/// Contract for every addressable resource.
#[async_trait]
pub trait Resource: Send + Sync {
    fn entity(&self) -> &Entity;

    fn entity_mut(&mut self) -> &mut Entity;

    fn endpoint(&self) -> &Endpoint {
        self.entity().endpoint()
    }

    fn path(&self) -> &str {
        self.endpoint().path()
    }

    /// Fetches and decodes the resource without touching cached state.
    async fn read(&self) -> Result<ParsedEntry> {
        let response = self.endpoint().get("", &Params::new()).await?;
        Ok(atom::parse_entry(&atom::load_entry(&response.body)?))
    }

    /// Replaces cached state with a fresh [`Resource::read`].
    async fn refresh(&mut self) -> Result<&mut Self>
    where
        Self: Sized,
    {
        let state = self.read().await?;
        self.entity_mut().set_state(state);
        Ok(self)
    }

    /// Adopts `state` verbatim as cached state.
    fn refresh_with(&mut self, state: ParsedEntry) -> &mut Self
    where
        Self: Sized,
    {
        self.entity_mut().set_state(state);
        self
    }

    /// Cached state, read on first access.
    async fn state(&mut self) -> Result<&ParsedEntry> {
        if self.entity().cached().is_none() {
            let state = self.read().await?;
            self.entity_mut().set_state(state);
        }
        self.entity()
            .cached()
            .ok_or_else(|| ResourceError::Decode(format!("no state for {}", self.path())))
    }

    async fn name(&mut self) -> Result<String> {
        Ok(self.state().await?.title.clone())
    }

    async fn access(&mut self) -> Result<Option<Record>> {
        Ok(self.state().await?.access.clone())
    }

    async fn fields(&mut self) -> Result<Option<FieldSchema>> {
        Ok(self.state().await?.fields.clone())
    }

    async fn links(&mut self) -> Result<Record> {
        Ok(self.state().await?.links.clone())
    }

    async fn content(&mut self) -> Result<Record> {
        Ok(self.state().await?.content.clone())
    }

    /// Stage 1 of field lookup: computed members. `None` passes the lookup
    /// on to content.
    async fn member(&mut self, key: &str) -> Result<Option<Value>> {
        match key {
            "name" => Ok(Some(Value::Text(self.name().await?))),
            "path" => Ok(Some(Value::from(self.path()))),
            _ => self.state_member(key).await,
        }
    }

    /// The state accessors as members: `access`, `fields`, `links` and
    /// `content`. Absent metadata answers `Null`.
    async fn state_member(&mut self, key: &str) -> Result<Option<Value>> {
        let value = match key {
            "access" => self.access().await?.map(Value::from).unwrap_or_default(),
            "fields" => self.fields().await?.map(Value::from).unwrap_or_default(),
            "links" => Value::from(self.links().await?),
            "content" => Value::from(self.content().await?),
            _ => return Ok(None),
        };
        Ok(Some(value))
    }

    /// Stage 3 of field lookup.
    fn default_field(&self, _key: &str) -> Option<Value> {
        None
    }

    /// Resolves `key` through members, content and defaults, in that order.
    async fn get(&mut self, key: &str) -> Result<Value> {
        if let Some(value) = self.member(key).await? {
            return Ok(value);
        }
        if let Some(value) = self.state().await?.content.resolve(key) {
            return Ok(value);
        }
        self.default_field(key)
            .ok_or_else(|| ResourceError::NoSuchField(key.to_string()))
    }

    /// Rewrites update parameters before they are sent.
    async fn prepare_update(&mut self, params: Params) -> Result<Params> {
        Ok(params)
    }

    /// Where updates are POSTed. Defaults to the resource itself.
    async fn update_path(&mut self) -> Result<String> {
        Ok(self.path().to_string())
    }

    /// POSTs `params` to the resource. Renaming is not expressible here, so a
    /// `name` field is rejected before any request.
    #[tracing::instrument(skip(self))]
    async fn update(&mut self, params: Params) -> Result<&mut Self>
    where
        Self: Sized,
    {
        if params.contains("name") {
            return Err(ResourceError::InvalidArgument(
                "cannot update the name of a resource".to_string(),
            ));
        }
        let params = self.prepare_update(params).await?;
        let path = self.update_path().await?;
        debug!(%path, "POST");
        self.endpoint()
            .transport()
            .post(&path, &params)
            .await?
            .error_for_status()?;
        info!(%path, "Updated");
        Ok(self)
    }

    /// POSTs to an action sub-path of the resource.
    async fn post_action(&self, action: &str, params: Params) -> Result<Response> {
        self.endpoint().post(action, &params).await
    }

    async fn enable(&mut self) -> Result<&mut Self>
    where
        Self: Sized,
    {
        self.post_action("enable", Params::new()).await?;
        Ok(self)
    }

    async fn disable(&mut self) -> Result<&mut Self>
    where
        Self: Sized,
    {
        self.post_action("disable", Params::new()).await?;
        Ok(self)
    }

    async fn reload(&mut self) -> Result<&mut Self>
    where
        Self: Sized,
    {
        self.post_action("_reload", Params::new()).await?;
        Ok(self)
    }

    /// GETs a sub-path that answers with a single entry and returns that
    /// entry's content.
    async fn run_method(&self, method: &str, params: Params) -> Result<Record> {
        let response = self.endpoint().get(method, &params).await?;
        Ok(atom::parse_entry(&atom::load_feed_entry(&response.body)?).content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{atom_feed, AtomEntry, MockTransport};

    struct SavedReport {
        entity: Entity,
    }

    #[async_trait]
    impl Resource for SavedReport {
        fn entity(&self) -> &Entity {
            &self.entity
        }

        fn entity_mut(&mut self) -> &mut Entity {
            &mut self.entity
        }

        async fn member(&mut self, key: &str) -> Result<Option<Value>> {
            match key {
                "schedule" => Ok(Some(Value::from("computed"))),
                _ => self.entity.member(key).await,
            }
        }

        fn default_field(&self, key: &str) -> Option<Value> {
            match key {
                "schedule" | "dispatch.ttl" => Some(Value::from("default")),
                _ => None,
            }
        }
    }

    fn report_feed() -> String {
        atom_feed(&[AtomEntry::new("weekly")
            .alternate("/services/saved/searches/weekly")
            .field("schedule", "content")
            .field("email.to", "ops@example.com")
            .field("email.format", "csv")
            .field("description", "")
            .acl("owner", "admin")
            .required("search")])
    }

    fn report(mock: &MockTransport) -> SavedReport {
        SavedReport {
            entity: Entity::new(mock.transport(), "saved/searches/weekly"),
        }
    }

    #[tokio::test]
    async fn test_cascade_prefers_member_over_content_and_default() {
        let mock = MockTransport::new();
        mock.expect_get("saved/searches/weekly/")
            .return_ok(200, report_feed());

        let mut report = report(&mock);
        assert_eq!(report.get("schedule").await.unwrap(), Value::from("computed"));
        mock.verify();
    }

    #[tokio::test]
    async fn test_state_accessors_shadow_content_keys() {
        let mock = MockTransport::new();
        mock.expect_get("saved/searches/weekly/").return_ok(
            200,
            atom_feed(&[AtomEntry::new("weekly")
                .field("access", "from content")
                .field("links", "from content")
                .acl("owner", "admin")]),
        );

        let mut entity = Entity::new(mock.transport(), "saved/searches/weekly");
        let access = entity.get("access").await.unwrap();
        assert_eq!(access.as_record().and_then(|a| a.text("owner")), Some("admin"));
        assert_eq!(entity.get("links").await.unwrap(), Value::Record(Record::new()));
        assert_eq!(entity.get("fields").await.unwrap(), Value::Null);
        let content = entity.get("content").await.unwrap();
        assert_eq!(
            content.as_record().and_then(|c| c.text("access")),
            Some("from content")
        );
        mock.verify();
    }

    #[tokio::test]
    async fn test_cascade_falls_through_to_content_then_default() {
        let mock = MockTransport::new();
        mock.expect_get("saved/searches/weekly/")
            .return_ok(200, report_feed());

        let mut report = report(&mock);
        assert_eq!(report.get("description").await.unwrap(), Value::Null);
        assert_eq!(report.get("dispatch.ttl").await.unwrap(), Value::from("default"));

        let email = report.get("email").await.unwrap();
        assert_eq!(email.as_record().and_then(|e| e.text("format")), Some("csv"));

        assert!(matches!(
            report.get("missing").await,
            Err(ResourceError::NoSuchField(key)) if key == "missing"
        ));
        // One lazy read serves every lookup.
        mock.verify();
    }

    #[tokio::test]
    async fn test_accessors_project_cached_state() {
        let mock = MockTransport::new();
        mock.expect_get("saved/searches/weekly/")
            .return_ok(200, report_feed());

        let mut report = report(&mock);
        assert_eq!(report.name().await.unwrap(), "weekly");
        assert_eq!(report.get("name").await.unwrap(), Value::from("weekly"));
        let access = report.access().await.unwrap().unwrap();
        assert_eq!(access.text("owner"), Some("admin"));
        let fields = report.fields().await.unwrap().unwrap();
        assert_eq!(fields.required, ["search"]);
        assert!(!report.content().await.unwrap().contains_key("eai:acl"));
        assert_eq!(
            report.links().await.unwrap().text("alternate"),
            Some("/services/saved/searches/weekly")
        );
        mock.verify();
    }

    #[tokio::test]
    async fn test_read_does_not_touch_cache_but_refresh_does() {
        let mock = MockTransport::new();
        let stale = atom::ParsedEntry {
            title: "stale".to_string(),
            ..Default::default()
        };
        mock.expect_get("saved/searches/weekly/")
            .return_ok(200, report_feed());
        mock.expect_get("saved/searches/weekly/")
            .return_ok(200, report_feed());

        let mut entity = Entity::with_state(mock.transport(), "saved/searches/weekly", stale);
        let fresh = entity.read().await.unwrap();
        assert_eq!(fresh.title, "weekly");
        assert_eq!(entity.cached().map(|s| s.title.as_str()), Some("stale"));

        entity.refresh().await.unwrap();
        assert_eq!(entity.name().await.unwrap(), "weekly");
        mock.verify();
    }

    #[tokio::test]
    async fn test_update_rejects_name_without_request() {
        let mock = MockTransport::new();
        let mut entity = Entity::new(mock.transport(), "saved/searches/weekly");
        let result = entity.update(Params::new().with("name", "other")).await;
        assert!(matches!(result, Err(ResourceError::InvalidArgument(_))));
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_actions_post_without_refresh() {
        let mock = MockTransport::new();
        mock.expect_post("saved/searches/weekly/").return_ok(200, "");
        mock.expect_post("saved/searches/weekly/disable").return_ok(200, "");
        mock.expect_post("saved/searches/weekly/enable").return_ok(200, "");
        mock.expect_post("saved/searches/weekly/_reload").return_ok(200, "");

        let mut entity = Entity::new(mock.transport(), "saved/searches/weekly");
        entity
            .update(Params::new().with("description", "weekly report"))
            .await
            .unwrap()
            .disable()
            .await
            .unwrap()
            .enable()
            .await
            .unwrap()
            .reload()
            .await
            .unwrap();

        let requests = mock.requests();
        assert_eq!(requests.len(), 4);
        assert_eq!(requests[0].message.form.get("description"), Some("weekly report"));
        assert!(entity.cached().is_none());
        mock.verify();
    }

    #[tokio::test]
    async fn test_read_propagates_server_errors() {
        let mock = MockTransport::new();
        mock.expect_get("saved/searches/weekly/")
            .return_ok(500, "internal error");

        let entity = Entity::new(mock.transport(), "saved/searches/weekly");
        let err = entity.read().await.unwrap_err();
        assert_eq!(err.status(), Some(500));
    }
}
