//! # Kinded Collections
//!
//! Some server collections are really several typed endpoints side by side:
//! inputs live under `monitor/`, `tcp/raw/`, `udp/` and so on. A
//! [`KindedCollection`] presents them as one collection while keeping every
//! item tagged with the kind it came from.
//!
//! The kind directory is a [`KindMap`], built once and shared by reference.
//! A kind the server has nothing for answers 404 on listing; that kind is
//! skipped. Any other failure aborts the listing.

use crate::atom::{self, EntryMetadata, ParsedEntry};
use crate::collection::{ResourceMap, COUNT_ALL};
use crate::endpoint::Endpoint;
use crate::entity::Resource;
use crate::error::{ResourceError, Result};
use crate::transport::{Params, Transport};
use async_trait::async_trait;
use linked_hash_map::LinkedHashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Builds an item from the transport, its path, its kind and its entry, if
/// one was decoded.
pub type KindedFactory<T> =
    Arc<dyn Fn(Arc<dyn Transport>, String, &str, Option<ParsedEntry>) -> T + Send + Sync>;

/// An ordered `kind -> sub-path` directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KindMap {
    kinds: LinkedHashMap<String, String>,
}

impl KindMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subpath(&self, kind: &str) -> Option<&str> {
        self.kinds.get(kind).map(String::as_str)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for KindMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            kinds: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// One logical collection spread over the sub-paths of a [`KindMap`].
pub struct KindedCollection<T> {
    endpoint: Endpoint,
    kinds: &'static KindMap,
    factory: KindedFactory<T>,
}

impl<T> Clone for KindedCollection<T> {
    fn clone(&self) -> Self {
        Self {
            endpoint: self.endpoint.clone(),
            kinds: self.kinds,
            factory: self.factory.clone(),
        }
    }
}

impl<T> fmt::Debug for KindedCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KindedCollection")
            .field("path", &self.endpoint.path())
            .field("kinds", &self.kinds.kinds().collect::<Vec<_>>())
            .finish()
    }
}

impl<T: Resource + 'static> KindedCollection<T> {
    pub fn new<F>(
        transport: Arc<dyn Transport>,
        path: impl Into<String>,
        kinds: &'static KindMap,
        factory: F,
    ) -> Self
    where
        F: Fn(Arc<dyn Transport>, String, &str, Option<ParsedEntry>) -> T + Send + Sync + 'static,
    {
        Self {
            endpoint: Endpoint::new(transport, path),
            kinds,
            factory: Arc::new(factory),
        }
    }

    pub fn path(&self) -> &str {
        self.endpoint.path()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.kinds.kinds().collect()
    }

    /// The sub-path of `kind`, relative to this collection.
    pub fn kindpath(&self, kind: &str) -> Result<&'static str> {
        self.kinds
            .subpath(kind)
            .ok_or_else(|| ResourceError::InvalidArgument(format!("unknown kind: {kind}")))
    }

    fn kind_endpoint(&self, kind: &str) -> Result<Endpoint> {
        Ok(self.endpoint.child(self.kindpath(kind)?))
    }

    /// Lists the given kinds (all kinds when empty) and concatenates the
    /// results in kind order.
    #[tracing::instrument(skip(self), fields(path = %self.path()))]
    pub async fn list(&self, kinds: &[&str]) -> Result<Vec<T>> {
        let kinds: Vec<&str> = if kinds.is_empty() {
            self.kinds.kinds().collect()
        } else {
            kinds.to_vec()
        };

        let mut items = Vec::new();
        for kind in kinds {
            let endpoint = self.kind_endpoint(kind)?;
            debug!(kind, "Sending request");
            let query = Params::new().with("count", COUNT_ALL);
            let response = match endpoint.get("", &query).await {
                Ok(response) => response,
                Err(e) if e.status() == Some(404) => {
                    warn!(kind, "No items of this kind");
                    continue;
                }
                Err(e) => return Err(e),
            };
            let entries = atom::load_entries(&response.body)?.unwrap_or_default();
            for entry in &entries {
                let state = atom::parse_entry(entry);
                let path = match state.alternate() {
                    Some(href) => href.to_string(),
                    None => endpoint.join_name(&state.title),
                };
                items.push((self.factory)(
                    self.endpoint.transport().clone(),
                    path,
                    kind,
                    Some(state),
                ));
            }
        }
        Ok(items)
    }

    /// POSTs a new item of `kind`. The item is returned without a follow-up
    /// read; its state loads on first access.
    #[tracing::instrument(skip(self, params), fields(path = %self.path()))]
    pub async fn create(&self, kind: &str, name: &str, params: Params) -> Result<T> {
        if name.trim().is_empty() {
            return Err(ResourceError::InvalidArgument(
                "name must be a non-empty string".to_string(),
            ));
        }
        let endpoint = self.kind_endpoint(kind)?;
        let mut form = Params::new().with("name", name);
        form.extend(params);
        endpoint.post("", &form).await?;
        info!(kind, name, "Created");
        Ok((self.factory)(
            self.endpoint.transport().clone(),
            endpoint.join_name(name),
            kind,
            None,
        ))
    }

    /// Deletes the item named `name`, whatever its kind.
    #[tracing::instrument(skip(self), fields(path = %self.path()))]
    pub async fn delete(&self, name: &str) -> Result<&Self> {
        let item = match self.get(name).await {
            Ok(item) => item,
            Err(e) => {
                warn!(name, error = %e, "Delete failed");
                return Err(e);
            }
        };
        let path = item.path().to_string();
        match self.endpoint.transport().delete(&path).await?.error_for_status() {
            Ok(_) => {
                info!(name, "Deleted");
                Ok(self)
            }
            Err(e) if e.status() == Some(404) => Err(ResourceError::NotFound(name.to_string())),
            Err(e) => Err(e),
        }
    }

    /// The metadata a new item of `kind` would have.
    pub async fn itemmeta(&self, kind: &str) -> Result<EntryMetadata> {
        let endpoint = self.kind_endpoint(kind)?;
        let response = endpoint.get("_new", &Params::new()).await?;
        Ok(atom::parse_metadata(&atom::load_content(&response.body)?))
    }
}

#[async_trait]
impl<T: Resource + 'static> ResourceMap for KindedCollection<T> {
    type Item = T;

    async fn list_all(&self) -> Result<Vec<T>> {
        self.list(&[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use crate::mock::{atom_feed, AtomEntry, MockTransport};
    use once_cell::sync::Lazy;

    static KINDS: Lazy<KindMap> = Lazy::new(|| {
        [("monitor", "monitor"), ("tcp", "tcp/raw"), ("udp", "udp")]
            .into_iter()
            .collect()
    });

    #[derive(Debug)]
    struct Tagged {
        entity: Entity,
        kind: String,
    }

    #[async_trait]
    impl Resource for Tagged {
        fn entity(&self) -> &Entity {
            &self.entity
        }

        fn entity_mut(&mut self) -> &mut Entity {
            &mut self.entity
        }
    }

    fn inputs(mock: &MockTransport) -> KindedCollection<Tagged> {
        KindedCollection::new(mock.transport(), "data/inputs", &KINDS, |t, path, kind, state| {
            Tagged {
                entity: Entity::from_parts(t, path, state),
                kind: kind.to_string(),
            }
        })
    }

    fn entry(kind: &str, name: &str) -> AtomEntry {
        AtomEntry::new(name).alternate(format!("/services/data/inputs/{kind}/{name}"))
    }

    #[test]
    fn test_kindpath() {
        let mock = MockTransport::new();
        let inputs = inputs(&mock);
        assert_eq!(inputs.kinds(), ["monitor", "tcp", "udp"]);
        assert_eq!(inputs.kindpath("tcp").unwrap(), "tcp/raw");
        assert!(matches!(
            inputs.kindpath("carrier-pigeon"),
            Err(ResourceError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_list_skips_kinds_answering_404() {
        let mock = MockTransport::new();
        mock.expect_get("data/inputs/monitor/")
            .return_ok(200, atom_feed(&[entry("monitor", "/var/log")]));
        mock.expect_get("data/inputs/tcp/raw/")
            .return_ok(404, "no such endpoint");
        mock.expect_get("data/inputs/udp/")
            .return_ok(200, atom_feed(&[entry("udp", "514"), entry("udp", "515")]));

        let items = inputs(&mock).list(&[]).await.unwrap();
        let kinds: Vec<&str> = items.iter().map(|i| i.kind.as_str()).collect();
        assert_eq!(kinds, ["monitor", "udp", "udp"]);
        assert_eq!(items[1].path(), "/services/data/inputs/udp/514/");
        mock.verify();
    }

    #[tokio::test]
    async fn test_list_propagates_other_failures() {
        let mock = MockTransport::new();
        mock.expect_get("data/inputs/monitor/")
            .return_ok(200, atom_feed(&[]));
        mock.expect_get("data/inputs/tcp/raw/")
            .return_ok(500, "boom");

        let err = inputs(&mock).list(&[]).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        mock.verify();
    }

    #[tokio::test]
    async fn test_list_selected_kinds_only() {
        let mock = MockTransport::new();
        mock.expect_get("data/inputs/udp/")
            .return_ok(200, atom_feed(&[entry("udp", "514")]));
        let items = inputs(&mock).list(&["udp"]).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(mock.requests()[0].message.query.get("count"), Some("-1"));
    }

    #[tokio::test]
    async fn test_create_posts_to_kind_and_skips_read() {
        let mock = MockTransport::new();
        mock.expect_post("data/inputs/tcp/raw/").return_ok(201, "");

        let item = inputs(&mock)
            .create("tcp", "9997", Params::new().with("sourcetype", "syslog"))
            .await
            .unwrap();
        assert_eq!(item.kind, "tcp");
        assert_eq!(item.path(), "data/inputs/tcp/raw/9997/");
        assert!(item.entity.cached().is_none());
        assert_eq!(mock.requests()[0].message.form.get("name"), Some("9997"));
        mock.verify();
    }

    #[tokio::test]
    async fn test_delete_by_name_across_kinds() {
        let mock = MockTransport::new();
        mock.expect_get("data/inputs/monitor/").return_ok(200, atom_feed(&[]));
        mock.expect_get("data/inputs/tcp/raw/")
            .return_ok(200, atom_feed(&[entry("tcp/raw", "9997")]));
        mock.expect_get("data/inputs/udp/").return_ok(404, "");
        mock.expect_delete("/services/data/inputs/tcp/raw/9997/")
            .return_ok(200, "");

        inputs(&mock).delete("9997").await.unwrap();
        mock.verify();
    }

    #[tokio::test]
    async fn test_delete_unknown_name_is_not_found() {
        let mock = MockTransport::new();
        for kind in ["monitor/", "tcp/raw/", "udp/"] {
            mock.expect_get(format!("data/inputs/{kind}"))
                .return_ok(200, atom_feed(&[]));
        }
        assert!(matches!(
            inputs(&mock).delete("nope").await,
            Err(ResourceError::NotFound(_))
        ));
    }
}
