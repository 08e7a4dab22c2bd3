//! # Splunk Client
//!
//! Typed bindings for the Splunk management REST API, built on
//! `resource_framework`.
//!
//! ## Core Components
//!
//! - **[config]**: [`ServiceConfig`], loaded from defaults, `SPLUNK_*` variables or JSON
//! - **[http]**: [`HttpTransport`], the `reqwest`-backed transport with login and namespacing
//! - **[service]**: [`Service`], the root handing out every collection
//! - **[resources]**: the specialized resources ([`Job`], [`SavedSearch`], [`Index`], ...)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use splunk_client::{Service, ServiceConfig};
//! use resource_framework::{Params, Resource};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = Service::connect(ServiceConfig::from_env()?).await?;
//!     let mut job = service.search("search index=_internal | head 5", Params::new()).await?;
//!     println!("{}", job.get("dispatchState").await?.as_str().unwrap_or("?"));
//!     Ok(())
//! }
//! ```
//!
//! ## Testing
//!
//! Every binding takes an `Arc<dyn Transport>`, so tests run against
//! [`resource_framework::mock::MockTransport`] instead of a live server.

pub mod config;
pub mod http;
pub mod resources;
pub mod service;

pub use config::{ConfigError, ServiceConfig};
pub use http::HttpTransport;
pub use resources::{
    AlertGroup, Application, Conf, Confs, DeploymentClient, DeploymentCollection,
    DeploymentServer, DeploymentServerClass, DeploymentServerClasses, DeploymentServers,
    DeploymentTenant, EventMeta, Index, Input, Inputs, Job, Jobs, Loggers, Message, SavedSearch,
    SavedSearches, Settings, Stanza, Users,
};
pub use service::Service;
