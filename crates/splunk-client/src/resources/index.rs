//! Indexes: event submission, file uploads and bucket maintenance.

use super::service_root;
use resource_framework::{Method, Params, RequestMessage, Resource, ResourceError, Result};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

const PATH_RECEIVERS_SIMPLE: &str = "receivers/simple";
const PATH_ONESHOT: &str = "data/inputs/oneshot";
const CLEAN_POLL_INTERVAL: Duration = Duration::from_secs(1);
const CLEAN_SETTINGS: [&str; 2] = ["maxTotalDataSizeMB", "frozenTimePeriodInSecs"];

/// Metadata attached to submitted events. Unset fields are left to the
/// server's defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventMeta {
    pub host: Option<String>,
    pub source: Option<String>,
    pub sourcetype: Option<String>,
}

impl EventMeta {
    fn to_params(&self, index: &str) -> Params {
        let mut params = Params::new().with("index", index);
        if let Some(host) = &self.host {
            params.push("host", host);
        }
        if let Some(source) = &self.source {
            params.push("source", source);
        }
        if let Some(sourcetype) = &self.sourcetype {
            params.push("sourcetype", sourcetype);
        }
        params
    }
}

entity_resource!(Index);
impl_resource!(Index);

impl Index {
    /// Sends one raw event into this index.
    #[tracing::instrument(skip(self, event))]
    pub async fn submit(&mut self, event: &str, meta: &EventMeta) -> Result<&mut Self> {
        let query = meta.to_params(&self.name().await?);
        let message = RequestMessage::new(Method::Post)
            .query(query)
            .body(event.as_bytes().to_vec());
        service_root(&*self)
            .request(PATH_RECEIVERS_SIMPLE, message)
            .await?;
        Ok(self)
    }

    /// Indexes a file that is already present on the server.
    pub async fn upload(&mut self, filename: &str, params: Params) -> Result<&mut Self> {
        let mut form = params;
        form.set("index", self.name().await?);
        form.set("name", filename);
        service_root(&*self).post(PATH_ONESHOT, &form).await?;
        info!(filename, "Uploaded");
        Ok(self)
    }

    pub async fn roll_hot_buckets(&mut self) -> Result<&mut Self> {
        self.post_action("roll-hot-buckets", Params::new()).await?;
        Ok(self)
    }

    /// Deletes every event in the index by shrinking its retention to the
    /// minimum and rolling its hot buckets, then waits up to `timeout` for the
    /// event count to reach zero. The original retention settings are
    /// restored either way.
    #[tracing::instrument(skip(self))]
    pub async fn clean(&mut self, timeout: Duration) -> Result<&mut Self> {
        self.refresh().await?;
        let saved: Params = self
            .content()
            .await?
            .select(&CLEAN_SETTINGS)?
            .iter()
            .filter_map(|(key, value)| Some((key.clone(), value.as_str()?.to_string())))
            .collect();

        self.update(
            Params::new()
                .with("maxTotalDataSizeMB", 1)
                .with("frozenTimePeriodInSecs", 1),
        )
        .await?;
        self.roll_hot_buckets().await?;

        let mut waited = Duration::ZERO;
        while !self.is_empty().await? && waited < timeout {
            sleep(CLEAN_POLL_INTERVAL).await;
            waited += CLEAN_POLL_INTERVAL;
            self.refresh().await?;
        }

        self.update(saved).await?;
        if !self.is_empty().await? {
            warn!(path = %self.path(), "Index still has events");
            return Err(ResourceError::TimedOut(self.path().to_string()));
        }
        info!(path = %self.path(), "Cleaned");
        Ok(self)
    }

    async fn is_empty(&mut self) -> Result<bool> {
        Ok(self.get("totalEventCount").await?.as_str() == Some("0"))
    }
}
