//! # Deployment
//!
//! The deployment endpoints describe a deployment server, its tenants, its
//! server classes and the clients polling it. They are read-mostly: the REST
//! API can neither create nor delete most of them, and a few fields travel
//! under different names than they are read with.
//!
//! | Type | Create | Delete | Update goes to |
//! |------|--------|--------|----------------|
//! | [`DeploymentClient`] | no | no | itself |
//! | [`DeploymentTenant`] | no | no | `deployment/tenants/{name}` |
//! | [`DeploymentServer`] | no | no | `deployment/server/{name}` |
//! | [`DeploymentServerClass`] | yes | no | itself |

use super::split_list;
use crate::service::{
    PATH_DEPLOYMENT_CLIENTS, PATH_DEPLOYMENT_SERVERCLASSES, PATH_DEPLOYMENT_SERVERS,
    PATH_DEPLOYMENT_TENANTS,
};
use resource_framework::{
    Collection, ParsedEntry, Params, Resource, ResourceError, Result, Transport, Value,
};
use std::ops::Deref;
use std::sync::Arc;

/// A deployment collection: listable, but closed to creation and deletion.
pub struct DeploymentCollection<T> {
    inner: Collection<T>,
    kind: &'static str,
}

impl<T> Clone for DeploymentCollection<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            kind: self.kind,
        }
    }
}

impl<T> std::fmt::Debug for DeploymentCollection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeploymentCollection")
            .field("kind", &self.kind)
            .field("inner", &self.inner)
            .finish()
    }
}

impl<T: Resource + 'static> DeploymentCollection<T> {
    pub fn new<F>(transport: Arc<dyn Transport>, path: &str, kind: &'static str, factory: F) -> Self
    where
        F: Fn(Arc<dyn Transport>, String, ParsedEntry) -> T + Send + Sync + 'static,
    {
        Self {
            inner: Collection::new(transport, path, factory).with_default_count(0),
            kind,
        }
    }

    pub async fn create(&self, _name: &str, _params: Params) -> Result<T> {
        Err(ResourceError::NotSupported(format!(
            "cannot create {} with the REST API",
            self.kind
        )))
    }

    pub async fn delete(&self, _name: &str) -> Result<&Self> {
        Err(ResourceError::NotSupported(format!(
            "cannot delete {} with the REST API",
            self.kind
        )))
    }
}

impl<T> Deref for DeploymentCollection<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

pub type DeploymentServers = DeploymentCollection<DeploymentServer>;

pub fn deployment_clients(transport: Arc<dyn Transport>) -> DeploymentCollection<DeploymentClient> {
    DeploymentCollection::new(transport, PATH_DEPLOYMENT_CLIENTS, "deployment clients", |t, path, state| {
        DeploymentClient::with_state(t, path, state)
    })
}

pub fn deployment_tenants(transport: Arc<dyn Transport>) -> DeploymentCollection<DeploymentTenant> {
    DeploymentCollection::new(transport, PATH_DEPLOYMENT_TENANTS, "deployment tenants", |t, path, state| {
        DeploymentTenant::with_state(t, path, state)
    })
}

pub fn deployment_servers(transport: Arc<dyn Transport>) -> DeploymentServers {
    DeploymentCollection::new(transport, PATH_DEPLOYMENT_SERVERS, "deployment servers", |t, path, state| {
        DeploymentServer::with_state(t, path, state)
    })
}

/// `true`-ish update values become `1`, everything else `0`.
fn normalize_flag(value: &str) -> &'static str {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => "1",
        _ => "0",
    }
}

/// Renames `from` to `to`, keeping the value.
fn rename(params: &mut Params, from: &str, to: &str) {
    if let Some(value) = params.remove(from) {
        params.set(to, value);
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_str)
        .is_some_and(|value| normalize_flag(value) == "1")
}

entity_resource!(
    /// A client polling the deployment server.
    DeploymentClient
);
impl_resource!(DeploymentClient {
    async fn member(&mut self, key: &str) -> Result<Option<Value>> {
        match key {
            "serverClasses" => {
                let classes = self.server_classes().await?;
                Ok(Some(Value::List(classes.into_iter().map(Value::from).collect())))
            }
            _ => self.entity.member(key).await,
        }
    }
});

impl DeploymentClient {
    /// The server classes this client belongs to.
    pub async fn server_classes(&mut self) -> Result<Vec<String>> {
        Ok(self
            .content()
            .await?
            .text("serverClasses")
            .map(split_list)
            .unwrap_or_default())
    }
}

entity_resource!(DeploymentTenant);
impl_resource!(DeploymentTenant {
    async fn member(&mut self, key: &str) -> Result<Option<Value>> {
        match key {
            "check_new" => Ok(Some(Value::from(flag_text(self.check_new().await?)))),
            _ => self.entity.member(key).await,
        }
    }

    async fn prepare_update(&mut self, mut params: Params) -> Result<Params> {
        rename(&mut params, "check_new", "check-new");
        Ok(params)
    }

    async fn update_path(&mut self) -> Result<String> {
        Ok(format!("{PATH_DEPLOYMENT_TENANTS}{}", self.name().await?))
    }
});

impl DeploymentTenant {
    pub async fn check_new(&mut self) -> Result<bool> {
        Ok(is_truthy(self.content().await?.get("check-new")))
    }
}

entity_resource!(DeploymentServer);
impl_resource!(DeploymentServer {
    async fn member(&mut self, key: &str) -> Result<Option<Value>> {
        match key {
            "whitelist" => Ok(Some(self.whitelist().await?.map(Value::from).unwrap_or_default())),
            "check_new" => Ok(Some(Value::from(flag_text(self.check_new().await?)))),
            _ => self.entity.member(key).await,
        }
    }

    async fn prepare_update(&mut self, mut params: Params) -> Result<Params> {
        if let Some(disabled) = params.get("disabled") {
            let disabled = normalize_flag(disabled);
            params.set("disabled", disabled);
        }
        rename(&mut params, "check_new", "check-new");
        rename(&mut params, "whitelist", "whitelist.0");
        Ok(params)
    }

    async fn update_path(&mut self) -> Result<String> {
        Ok(format!("{PATH_DEPLOYMENT_SERVERS}{}", self.name().await?))
    }
});

impl DeploymentServer {
    /// The first whitelist entry.
    pub async fn whitelist(&mut self) -> Result<Option<String>> {
        Ok(self.content().await?.text("whitelist.0").map(str::to_string))
    }

    pub async fn check_new(&mut self) -> Result<bool> {
        Ok(is_truthy(self.content().await?.get("check-new")))
    }
}

/// Optional server class fields that read as null when the server omits them.
const SERVER_CLASS_DEFAULTS: [&str; 6] = [
    "endpoint",
    "tmpfolder",
    "filterType",
    "targetRepositoryLocation",
    "repositoryLocation",
    "continueMatching",
];

entity_resource!(DeploymentServerClass);
impl_resource!(DeploymentServerClass {
    async fn member(&mut self, key: &str) -> Result<Option<Value>> {
        match key {
            "blacklist" => Ok(Some(list_value(self.blacklist().await?))),
            "whitelist" => Ok(Some(list_value(self.whitelist().await?))),
            _ => self.entity.member(key).await,
        }
    }

    fn default_field(&self, key: &str) -> Option<Value> {
        SERVER_CLASS_DEFAULTS.contains(&key).then_some(Value::Null)
    }
});

impl DeploymentServerClass {
    pub async fn blacklist(&mut self) -> Result<Option<Vec<String>>> {
        Ok(self.content().await?.text("blacklist").map(split_list))
    }

    pub async fn whitelist(&mut self) -> Result<Option<Vec<String>>> {
        Ok(self.content().await?.text("whitelist").map(split_list))
    }

    pub async fn delete(&self) -> Result<()> {
        Err(ResourceError::NotSupported(
            "cannot delete server classes with the REST API".to_string(),
        ))
    }
}

fn list_value(items: Option<Vec<String>>) -> Value {
    match items {
        Some(items) => Value::List(items.into_iter().map(Value::from).collect()),
        None => Value::Null,
    }
}

fn flag_text(flag: bool) -> &'static str {
    if flag {
        "1"
    } else {
        "0"
    }
}

/// Server classes. Unlike the other deployment collections these can be
/// created, with list-valued blacklists and whitelists expanded into
/// numbered fields.
#[derive(Debug, Clone)]
pub struct DeploymentServerClasses {
    inner: DeploymentCollection<DeploymentServerClass>,
}

impl DeploymentServerClasses {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: DeploymentCollection::new(
                transport,
                PATH_DEPLOYMENT_SERVERCLASSES,
                "deployment server classes",
                |t, path, state| DeploymentServerClass::with_state(t, path, state),
            ),
        }
    }

    /// Creates a server class. `filterType` defaults to `blacklist`.
    pub async fn create(
        &self,
        name: &str,
        blacklist: &[&str],
        whitelist: &[&str],
        params: Params,
    ) -> Result<DeploymentServerClass> {
        let mut form = params;
        for (i, entry) in blacklist.iter().enumerate() {
            form.push(format!("blacklist.{i}"), entry);
        }
        for (i, entry) in whitelist.iter().enumerate() {
            form.push(format!("whitelist.{i}"), entry);
        }
        if !form.contains("filterType") {
            form.push("filterType", "blacklist");
        }
        self.inner.inner.create(name, form).await
    }
}

impl Deref for DeploymentServerClasses {
    type Target = DeploymentCollection<DeploymentServerClass>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
