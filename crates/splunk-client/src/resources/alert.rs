//! Fired alerts, grouped by the saved search that triggered them.

use resource_framework::{Collection, Entity, Resource, ResourceError, Result, Value};

entity_resource!(AlertGroup);
impl_resource!(AlertGroup {
    async fn member(&mut self, key: &str) -> Result<Option<Value>> {
        match key {
            "count" => Ok(Some(Value::Text(self.count().await?.to_string()))),
            _ => self.entity.member(key).await,
        }
    }
});

impl AlertGroup {
    /// The individual triggered alerts in this group.
    pub fn alerts(&self) -> Collection<Entity> {
        Collection::new(
            self.endpoint().transport().clone(),
            self.path(),
            |t, path, state| Entity::with_state(t, path, state),
        )
    }

    pub async fn count(&mut self) -> Result<u64> {
        let content = self.content().await?;
        let count = content
            .text("triggered_alert_count")
            .ok_or_else(|| ResourceError::NoSuchField("triggered_alert_count".to_string()))?;
        count
            .parse()
            .map_err(|_| ResourceError::Decode(format!("bad alert count: {count}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resource_framework::mock::{atom_feed, AtomEntry, MockTransport};
    use resource_framework::ResourceMap;

    #[tokio::test]
    async fn test_group_counts_and_lists_alerts() {
        let mock = MockTransport::new();
        mock.expect_get("alerts/fired_alerts/errors/").return_ok(
            200,
            atom_feed(&[AtomEntry::new("errors").field("triggered_alert_count", "2")]),
        );
        mock.expect_get("alerts/fired_alerts/errors/").return_ok(
            200,
            atom_feed(&[
                AtomEntry::new("errors_1700000000"),
                AtomEntry::new("errors_1700000300"),
            ]),
        );

        let mut group = AlertGroup::new(mock.transport(), "alerts/fired_alerts/errors");
        assert_eq!(group.count().await.unwrap(), 2);
        assert_eq!(group.get("count").await.unwrap(), Value::from("2"));
        assert_eq!(group.alerts().len().await.unwrap(), 2);
        mock.verify();
    }
}
