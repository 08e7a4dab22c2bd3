//! # Resource Bindings
//!
//! Typed wrappers for the Splunk endpoints the [`Service`](crate::Service)
//! hands out. Each resource wraps an [`Entity`](resource_framework::Entity)
//! and overrides only what its endpoint does differently: computed members,
//! defaults for optional fields, where updates go, and extra actions.
//!
//! | Resource | Path | Specialization |
//! |----------|------|----------------|
//! | [`Job`] | `search/jobs/{sid}` | polled reads, control actions, result streams |
//! | [`SavedSearch`] | `saved/searches/{name}` | dispatch, history, suppression |
//! | [`Index`] | `data/indexes/{name}` | event submission, cleaning |
//! | [`Input`] | `data/inputs/{kind}/{name}` | remembers its kind |
//! | [`Conf`] / [`Stanza`] | `configs/conf-{file}/{stanza}` | nested collections |
//! | [`Settings`] | `server/settings` | updates go to a sub-path |
//! | deployment types | `deployment/...` | read-mostly, renamed fields |

/// Declares a resource struct wrapping an [`Entity`](resource_framework::Entity)
/// with the usual constructors.
macro_rules! entity_resource {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            entity: resource_framework::Entity,
        }

        impl $name {
            pub fn new(
                transport: std::sync::Arc<dyn resource_framework::Transport>,
                path: impl Into<String>,
            ) -> Self {
                Self {
                    entity: resource_framework::Entity::new(transport, path),
                }
            }

            pub fn with_state(
                transport: std::sync::Arc<dyn resource_framework::Transport>,
                path: impl Into<String>,
                state: resource_framework::ParsedEntry,
            ) -> Self {
                Self {
                    entity: resource_framework::Entity::with_state(transport, path, state),
                }
            }
        }
    };
}

/// Implements the two required [`Resource`](resource_framework::Resource)
/// accessors; any overrides go in the braces.
macro_rules! impl_resource {
    ($name:ident { $($body:tt)* }) => {
        #[async_trait::async_trait]
        impl resource_framework::Resource for $name {
            fn entity(&self) -> &resource_framework::Entity {
                &self.entity
            }

            fn entity_mut(&mut self) -> &mut resource_framework::Entity {
                &mut self.entity
            }

            $($body)*
        }
    };
    ($name:ident) => {
        impl_resource!($name {});
    };
}

pub mod alert;
pub mod application;
pub mod conf;
pub mod deployment;
pub mod index;
pub mod input;
pub mod job;
pub mod logger;
pub mod message;
pub mod saved_search;
pub mod settings;
pub mod user;

pub use alert::AlertGroup;
pub use application::Application;
pub use conf::{Conf, Confs, Stanza};
pub use deployment::{
    DeploymentClient, DeploymentCollection, DeploymentServer, DeploymentServerClass,
    DeploymentServerClasses, DeploymentServers, DeploymentTenant,
};
pub use index::{EventMeta, Index};
pub use input::{Input, Inputs, INPUT_KINDS};
pub use job::{Job, Jobs};
pub use logger::Loggers;
pub use message::Message;
pub use saved_search::{SavedSearch, SavedSearches};
pub use settings::Settings;
pub use user::Users;

use resource_framework::{Endpoint, Resource};

/// An endpoint at the service root, for resources whose actions live
/// outside their own path.
pub(crate) fn service_root<R: Resource + ?Sized>(resource: &R) -> Endpoint {
    Endpoint::new(resource.endpoint().transport().clone(), "")
}

/// Splits a comma-separated content value.
pub(crate) fn split_list(value: &str) -> Vec<String> {
    value.split(',').map(str::to_string).collect()
}
