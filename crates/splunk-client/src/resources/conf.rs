//! # Configuration Files
//!
//! `properties/` lists the server's `.conf` files. Each [`Conf`] is itself a
//! collection of [`Stanza`]s living under `configs/conf-{file}/`, so a conf
//! is addressed by its file name rather than by the listing's links.

use crate::service::PATH_CONFS;
use async_trait::async_trait;
use resource_framework::{
    Collection, Entity, Method, ParsedEntry, Params, RequestMessage, Resource, ResourceMap,
    Result, Transport,
};
use std::sync::Arc;
use tracing::info;

entity_resource!(Stanza);
impl_resource!(Stanza);

impl Stanza {
    /// POSTs `stanza` verbatim as the request body, populating the stanza
    /// in its file.
    pub async fn submit(&self, stanza: &str) -> Result<&Self> {
        let message = RequestMessage::new(Method::Post).body(stanza.as_bytes().to_vec());
        self.endpoint().request("", message).await?;
        Ok(self)
    }
}

/// One configuration file.
#[derive(Debug, Clone)]
pub struct Conf {
    entity: Entity,
    name: String,
    stanzas: Collection<Stanza>,
}

impl Conf {
    pub fn new(transport: Arc<dyn Transport>, name: &str, state: Option<ParsedEntry>) -> Self {
        let path = conf_path(name);
        Self {
            entity: Entity::from_parts(transport.clone(), path.clone(), state),
            name: name.to_string(),
            stanzas: Collection::new(transport, path, |t, path, state| {
                Stanza::with_state(t, path, state)
            }),
        }
    }

    /// The stanzas of this file.
    pub fn stanzas(&self) -> &Collection<Stanza> {
        &self.stanzas
    }

    pub async fn stanza(&self, name: &str) -> Result<Stanza> {
        self.stanzas.get(name).await
    }

    pub async fn create(&self, name: &str, params: Params) -> Result<Stanza> {
        self.stanzas.create(name, params).await
    }

    pub async fn delete(&self, name: &str) -> Result<&Self> {
        self.stanzas.delete(name).await?;
        Ok(self)
    }
}

#[async_trait]
impl Resource for Conf {
    fn entity(&self) -> &Entity {
        &self.entity
    }

    fn entity_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }

    async fn name(&mut self) -> Result<String> {
        Ok(self.name.clone())
    }
}

fn conf_path(name: &str) -> String {
    format!("configs/conf-{name}/")
}

/// Every configuration file on the server.
#[derive(Debug, Clone)]
pub struct Confs {
    inner: Collection<Conf>,
}

impl Confs {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Collection::new(transport, PATH_CONFS, |t, _path, state| {
                let name = state.title.clone();
                Conf::new(t, &name, Some(state))
            }),
        }
    }

    /// Creates an empty configuration file named `name`.
    #[tracing::instrument(skip(self, params))]
    pub async fn create(&self, name: &str, params: Params) -> Result<Conf> {
        let mut form = Params::new().with("__conf", name);
        form.extend(params);
        self.inner.endpoint().post("", &form).await?;
        info!(name, "Created");
        self.inner.get(name).await
    }
}

impl std::ops::Deref for Confs {
    type Target = Collection<Conf>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resource_framework::mock::{atom_feed, AtomEntry, MockTransport};
    use resource_framework::Value;

    #[tokio::test]
    async fn test_confs_address_files_by_name() {
        let mock = MockTransport::new();
        mock.expect_get("properties/").return_ok(
            200,
            atom_feed(&[
                AtomEntry::new("props").alternate("/services/properties/props"),
                AtomEntry::new("transforms").alternate("/services/properties/transforms"),
            ]),
        );
        let confs = Confs::new(mock.transport()).values().await.unwrap();
        assert_eq!(confs[0].path(), "configs/conf-props/");
        assert_eq!(confs[1].stanzas().path(), "configs/conf-transforms/");
    }

    #[tokio::test]
    async fn test_create_posts_conf_marker() {
        let mock = MockTransport::new();
        mock.expect_post("properties/").return_ok(201, "");
        mock.expect_get("properties/").return_ok(
            200,
            atom_feed(&[AtomEntry::new("myapp").alternate("/services/properties/myapp")]),
        );
        let mut conf = Confs::new(mock.transport())
            .create("myapp", Params::new())
            .await
            .unwrap();
        assert_eq!(conf.name().await.unwrap(), "myapp");
        assert_eq!(mock.requests()[0].message.form.get("__conf"), Some("myapp"));
        assert!(!mock.requests()[0].message.form.contains("name"));
        mock.verify();
    }

    #[tokio::test]
    async fn test_stanza_lifecycle() {
        let mock = MockTransport::new();
        mock.expect_post("configs/conf-myapp/").return_ok(201, "");
        mock.expect_get("configs/conf-myapp/").return_ok(
            200,
            atom_feed(&[AtomEntry::new("default")
                .alternate("/services/configs/conf-myapp/default")
                .field("color", "blue")]),
        );
        mock.expect_request(Method::Post, "/services/configs/conf-myapp/default/")
            .return_ok(200, "");

        let conf = Conf::new(mock.transport(), "myapp", None);
        let mut stanza = conf
            .create("default", Params::new().with("color", "blue"))
            .await
            .unwrap();
        assert_eq!(stanza.get("color").await.unwrap(), Value::from("blue"));
        stanza.submit("color = red").await.unwrap();
        assert_eq!(
            mock.requests()[2].message.body.as_deref(),
            Some(&b"color = red"[..])
        );
        mock.verify();
    }
}
