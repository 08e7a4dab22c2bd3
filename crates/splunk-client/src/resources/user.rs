//! User accounts. Splunk stores user names in lower case, so every name the
//! caller passes is lowercased before it reaches the server.

use crate::service::PATH_USERS;
use resource_framework::{Collection, Entity, Params, ResourceMap, Result, Transport};
use std::ops::Deref;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Users {
    inner: Collection<Entity>,
}

impl Users {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Collection::new(transport, PATH_USERS, |t, path, state| {
                Entity::with_state(t, path, state)
            }),
        }
    }

    pub async fn get(&self, name: &str) -> Result<Entity> {
        self.inner.get(&name.to_lowercase()).await
    }

    pub async fn contains(&self, name: &str) -> Result<bool> {
        self.inner.contains(&name.to_lowercase()).await
    }

    pub async fn create(&self, name: &str, params: Params) -> Result<Entity> {
        self.inner.create(&name.to_lowercase(), params).await
    }

    pub async fn delete(&self, name: &str) -> Result<&Self> {
        self.inner.delete(&name.to_lowercase()).await?;
        Ok(self)
    }
}

impl Deref for Users {
    type Target = Collection<Entity>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resource_framework::mock::{atom_feed, AtomEntry, MockTransport};
    use resource_framework::Resource;

    fn users_feed() -> String {
        atom_feed(&[AtomEntry::new("jsmith")
            .alternate("/services/authentication/users/jsmith")
            .list_field("roles", ["user", "power"])])
    }

    #[tokio::test]
    async fn test_names_are_lowercased() {
        let mock = MockTransport::new();
        mock.expect_post("authentication/users/").return_ok(201, "");
        mock.expect_get("authentication/users/").return_ok(200, users_feed());
        mock.expect_get("authentication/users/").return_ok(200, users_feed());
        mock.expect_delete("authentication/users/jsmith").return_ok(200, "");

        let users = Users::new(mock.transport());
        let mut user = users
            .create("JSmith", Params::new().with("password", "changeme"))
            .await
            .unwrap();
        assert_eq!(user.name().await.unwrap(), "jsmith");
        assert_eq!(mock.requests()[0].message.form.get("name"), Some("jsmith"));
        assert!(users.contains("JSMITH").await.unwrap());
        users.delete("JSmith").await.unwrap();
        mock.verify();
    }

    #[tokio::test]
    async fn test_list_valued_fields_survive() {
        let mock = MockTransport::new();
        mock.expect_get("authentication/users/").return_ok(200, users_feed());
        let mut user = Users::new(mock.transport()).get("JSmith").await.unwrap();
        let roles = user.get("roles").await.unwrap().to_strings();
        assert_eq!(roles, ["user", "power"]);
    }
}
