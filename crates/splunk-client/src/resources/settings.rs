//! Server-wide settings. Read from `server/settings`, written through its
//! `settings` sub-entry.

use crate::service::PATH_SETTINGS;
use async_trait::async_trait;
use resource_framework::{Entity, Resource, Result, Transport};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Settings {
    entity: Entity,
}

impl Settings {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            entity: Entity::new(transport, PATH_SETTINGS),
        }
    }
}

#[async_trait]
impl Resource for Settings {
    fn entity(&self) -> &Entity {
        &self.entity
    }

    fn entity_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }

    async fn update_path(&mut self) -> Result<String> {
        Ok(self.endpoint().join("settings"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resource_framework::mock::{atom_feed, AtomEntry, MockTransport};
    use resource_framework::{Params, Value};

    #[tokio::test]
    async fn test_reads_settings_and_updates_sub_entry() {
        let mock = MockTransport::new();
        mock.expect_get("server/settings/").return_ok(
            200,
            atom_feed(&[AtomEntry::new("settings")
                .field("SPLUNK_HOME", "/opt/splunk")
                .field("mgmtHostPort", "8089")]),
        );
        mock.expect_post("server/settings/settings").return_ok(200, "");

        let mut settings = Settings::new(mock.transport());
        assert_eq!(settings.get("mgmtHostPort").await.unwrap(), Value::from("8089"));
        settings
            .update(Params::new().with("sessionTimeout", "2h"))
            .await
            .unwrap();
        assert_eq!(mock.requests()[1].message.form.get("sessionTimeout"), Some("2h"));
        mock.verify();
    }
}
