//! System messages. Each message entry carries its text under a content key
//! equal to the message's own name.

use resource_framework::{Resource, ResourceError, Result, Value};

entity_resource!(Message);
impl_resource!(Message {
    async fn member(&mut self, key: &str) -> Result<Option<Value>> {
        match key {
            "value" => Ok(Some(self.value().await?)),
            _ => self.entity.member(key).await,
        }
    }
});

impl Message {
    /// The message text: the content key named after the message, looked up
    /// in content only.
    pub async fn value(&mut self) -> Result<Value> {
        let name = self.name().await?;
        self.content()
            .await?
            .resolve(&name)
            .ok_or(ResourceError::NoSuchField(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resource_framework::mock::{atom_feed, AtomEntry, MockTransport};

    #[tokio::test]
    async fn test_value_reads_field_named_after_message() {
        let mock = MockTransport::new();
        mock.expect_get("messages/restart_required/").return_ok(
            200,
            atom_feed(&[AtomEntry::new("restart_required")
                .field("restart_required", "Splunk must be restarted")]),
        );
        let mut message = Message::new(mock.transport(), "messages/restart_required");
        assert_eq!(
            message.get("value").await.unwrap(),
            Value::from("Splunk must be restarted")
        );
        mock.verify();
    }

    #[tokio::test]
    async fn test_message_named_value_reads_its_text() {
        let mock = MockTransport::new();
        mock.expect_get("messages/value/")
            .return_ok(200, atom_feed(&[AtomEntry::new("value").field("value", "x")]));
        let mut message = Message::new(mock.transport(), "messages/value");
        assert_eq!(message.value().await.unwrap(), Value::from("x"));
        assert_eq!(message.get("value").await.unwrap(), Value::from("x"));
        mock.verify();
    }

    #[tokio::test]
    async fn test_message_named_name_reads_its_text_not_title() {
        let mock = MockTransport::new();
        mock.expect_get("messages/name/")
            .return_ok(200, atom_feed(&[AtomEntry::new("name").field("name", "the text")]));
        let mut message = Message::new(mock.transport(), "messages/name");
        assert_eq!(message.value().await.unwrap(), Value::from("the text"));
        mock.verify();
    }

    #[tokio::test]
    async fn test_message_without_text_is_no_such_field() {
        let mock = MockTransport::new();
        mock.expect_get("messages/empty/")
            .return_ok(200, atom_feed(&[AtomEntry::new("empty").field("other", "y")]));
        let mut message = Message::new(mock.transport(), "messages/empty");
        assert!(matches!(
            message.value().await,
            Err(ResourceError::NoSuchField(key)) if key == "empty"
        ));
    }
}
