//! # Service
//!
//! [`Service`] is the root of the binding: one authenticated transport and a
//! set of accessors handing out the server's collections and singletons.
//! Accessors are cheap. They build a fresh handle each call and perform no
//! I/O until the handle is used.
//!
//! ```rust
//! use resource_framework::mock::{atom_feed, AtomEntry, MockTransport};
//! use resource_framework::ResourceMap;
//! use splunk_client::Service;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mock = MockTransport::new();
//!     mock.expect_get("data/indexes/").return_ok(
//!         200,
//!         atom_feed(&[AtomEntry::new("main").alternate("/services/data/indexes/main")]),
//!     );
//!
//!     let service = Service::new(mock.transport());
//!     assert_eq!(service.indexes().keys().await.unwrap(), ["main"]);
//! }
//! ```

use crate::config::ServiceConfig;
use crate::http::HttpTransport;
use crate::resources::deployment::{deployment_clients, deployment_servers, deployment_tenants};
use crate::resources::{
    AlertGroup, Application, Confs, DeploymentClient, DeploymentCollection,
    DeploymentServerClasses, DeploymentServers, DeploymentTenant, Index, Inputs, Job, Jobs,
    Loggers, Message, SavedSearches, Settings, Users,
};
use resource_framework::atom;
use resource_framework::{
    Collection, Endpoint, Entity, Params, Record, Response, Result, RetryPolicy, Transport,
};
use std::sync::Arc;
use tracing::info;

pub const PATH_APPS: &str = "apps/local/";
pub const PATH_CAPABILITIES: &str = "authorization/capabilities/";
pub const PATH_CONFS: &str = "properties/";
pub const PATH_DEPLOYMENT_CLIENTS: &str = "deployment/client/";
pub const PATH_DEPLOYMENT_TENANTS: &str = "deployment/tenants/";
pub const PATH_DEPLOYMENT_SERVERS: &str = "deployment/server/";
pub const PATH_DEPLOYMENT_SERVERCLASSES: &str = "deployment/serverclass/";
pub const PATH_EVENT_TYPES: &str = "saved/eventtypes/";
pub const PATH_FIRED_ALERTS: &str = "alerts/fired_alerts/";
pub const PATH_INDEXES: &str = "data/indexes/";
pub const PATH_INFO: &str = "server/info";
pub const PATH_INPUTS: &str = "data/inputs/";
pub const PATH_JOBS: &str = "search/jobs/";
pub const PATH_LOGGER: &str = "server/logger/";
pub const PATH_MESSAGES: &str = "messages/";
pub const PATH_PARSER: &str = "search/parser";
pub const PATH_RESTART: &str = "server/control/restart";
pub const PATH_ROLES: &str = "authentication/roles/";
pub const PATH_SAVED_SEARCHES: &str = "saved/searches/";
pub const PATH_SETTINGS: &str = "server/settings";
pub const PATH_USERS: &str = "authentication/users/";

#[derive(Clone)]
pub struct Service {
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
}

impl Service {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            retry: RetryPolicy::default(),
        }
    }

    /// Builds an HTTP transport from `config` and logs in with its
    /// credentials.
    #[tracing::instrument(skip(config), fields(host = %config.host, port = config.port))]
    pub async fn connect(config: ServiceConfig) -> Result<Self> {
        let transport = HttpTransport::new(config)?.login().await?;
        info!(authenticated = transport.is_authenticated(), "Connected");
        Ok(Self::new(Arc::new(transport)))
    }

    /// The polling policy given to jobs this service hands out.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    fn root(&self) -> Endpoint {
        Endpoint::new(self.transport.clone(), "")
    }

    fn entities(&self, path: &str) -> Collection<Entity> {
        Collection::new(self.transport.clone(), path, |t, path, state| {
            Entity::with_state(t, path, state)
        })
    }

    pub fn apps(&self) -> Collection<Application> {
        Collection::new(self.transport.clone(), PATH_APPS, |t, path, state| {
            Application::with_state(t, path, state)
        })
    }

    /// Every capability the server defines.
    pub async fn capabilities(&self) -> Result<Vec<String>> {
        let response = self.root().get(PATH_CAPABILITIES, &Params::new()).await?;
        let content = atom::load_content(&response.body)?;
        Ok(content
            .get("capabilities")
            .map(|capabilities| capabilities.to_strings())
            .unwrap_or_default())
    }

    pub fn confs(&self) -> Confs {
        Confs::new(self.transport.clone())
    }

    pub fn deployment_clients(&self) -> DeploymentCollection<DeploymentClient> {
        deployment_clients(self.transport.clone())
    }

    pub fn deployment_servers(&self) -> DeploymentServers {
        deployment_servers(self.transport.clone())
    }

    pub fn deployment_server_classes(&self) -> DeploymentServerClasses {
        DeploymentServerClasses::new(self.transport.clone())
    }

    pub fn deployment_tenants(&self) -> DeploymentCollection<DeploymentTenant> {
        deployment_tenants(self.transport.clone())
    }

    pub fn event_types(&self) -> Collection<Entity> {
        self.entities(PATH_EVENT_TYPES)
    }

    pub fn fired_alerts(&self) -> Collection<AlertGroup> {
        Collection::new(self.transport.clone(), PATH_FIRED_ALERTS, |t, path, state| {
            AlertGroup::with_state(t, path, state)
        })
    }

    pub fn indexes(&self) -> Collection<Index> {
        Collection::new(self.transport.clone(), PATH_INDEXES, |t, path, state| {
            Index::with_state(t, path, state)
        })
    }

    /// Version, build and host details of the server.
    pub async fn info(&self) -> Result<Record> {
        let response = self.root().get(PATH_INFO, &Params::new()).await?;
        Ok(atom::strip_reserved(&atom::load_content(&response.body)?))
    }

    pub fn inputs(&self) -> Inputs {
        Inputs::new(self.transport.clone())
    }

    pub fn jobs(&self) -> Jobs {
        Jobs::new(self.transport.clone())
    }

    pub fn loggers(&self) -> Loggers {
        Loggers::new(self.transport.clone())
    }

    pub fn messages(&self) -> Collection<Message> {
        Collection::new(self.transport.clone(), PATH_MESSAGES, |t, path, state| {
            Message::with_state(t, path, state)
        })
    }

    /// Parses `query` without running it. The response body is the parse
    /// tree in whatever `output_mode` the caller asked for.
    pub async fn parse(&self, query: &str, params: Params) -> Result<Response> {
        let mut query_params = Params::new().with("q", query);
        query_params.extend(params);
        self.root().get(PATH_PARSER, &query_params).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn restart(&self) -> Result<Response> {
        let response = self.root().get(PATH_RESTART, &Params::new()).await?;
        info!("Restart requested");
        Ok(response)
    }

    pub fn roles(&self) -> Collection<Entity> {
        self.entities(PATH_ROLES)
    }

    /// Dispatches `query` as a new search job.
    pub async fn search(&self, query: &str, params: Params) -> Result<Job> {
        let job = self.jobs().create(query, params).await?;
        Ok(job.with_retry_policy(self.retry))
    }

    pub fn saved_searches(&self) -> SavedSearches {
        SavedSearches::new(self.transport.clone())
    }

    pub fn settings(&self) -> Settings {
        Settings::new(self.transport.clone())
    }

    pub fn users(&self) -> Users {
        Users::new(self.transport.clone())
    }
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service").field("retry", &self.retry).finish()
    }
}
