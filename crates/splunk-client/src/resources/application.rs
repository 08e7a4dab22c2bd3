//! Installed apps.

use resource_framework::{Params, Record, Resource, Result, Value};

entity_resource!(Application);
impl_resource!(Application {
    async fn member(&mut self, key: &str) -> Result<Option<Value>> {
        match key {
            "setupInfo" => Ok(Some(self.setup_info().await?.unwrap_or_default())),
            _ => self.entity.member(key).await,
        }
    }
});

impl Application {
    /// The app's setup descriptor, if it has one.
    pub async fn setup_info(&mut self) -> Result<Option<Value>> {
        Ok(self.content().await?.get("eai:setup").cloned())
    }

    /// Packages the app and reports where the archive was written.
    pub async fn package(&self) -> Result<Record> {
        self.run_method("package", Params::new()).await
    }

    /// Whether an update is available, and where from.
    pub async fn update_info(&self) -> Result<Record> {
        self.run_method("update", Params::new()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resource_framework::mock::{atom_feed, AtomEntry, MockTransport};

    #[tokio::test]
    async fn test_package_runs_method() {
        let mock = MockTransport::new();
        mock.expect_get("apps/local/search/package").return_ok(
            200,
            atom_feed(&[AtomEntry::new("search")
                .field("name", "search")
                .field("path", "/opt/splunk/etc/system/static/app-packages/search.spl")]),
        );
        let app = Application::new(mock.transport(), "apps/local/search");
        let package = app.package().await.unwrap();
        assert_eq!(
            package.text("path"),
            Some("/opt/splunk/etc/system/static/app-packages/search.spl")
        );
        mock.verify();
    }

    #[tokio::test]
    async fn test_setup_info_is_absent_without_setup() {
        let mock = MockTransport::new();
        mock.expect_get("apps/local/search/").return_ok(
            200,
            atom_feed(&[AtomEntry::new("search").field("visible", "1")]),
        );
        let mut app = Application::new(mock.transport(), "apps/local/search");
        assert_eq!(app.setup_info().await.unwrap(), None);
        assert_eq!(app.get("setupInfo").await.unwrap(), Value::Null);
    }
}
