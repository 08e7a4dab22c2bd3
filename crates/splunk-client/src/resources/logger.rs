//! Server loggers.

use crate::service::PATH_LOGGER;
use resource_framework::{Collection, Entity, EntryMetadata, ResourceError, Result, Transport};
use std::ops::Deref;
use std::sync::Arc;

/// The logger collection. Loggers cannot be created, so there is no
/// template to describe.
#[derive(Debug, Clone)]
pub struct Loggers {
    inner: Collection<Entity>,
}

impl Loggers {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Collection::new(transport, PATH_LOGGER, |t, path, state| {
                Entity::with_state(t, path, state)
            }),
        }
    }

    pub async fn itemmeta(&self) -> Result<EntryMetadata> {
        Err(ResourceError::NotSupported("logger metadata".to_string()))
    }
}

impl Deref for Loggers {
    type Target = Collection<Entity>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
