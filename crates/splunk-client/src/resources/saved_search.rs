//! # Saved Searches
//!
//! A [`SavedSearch`] is a stored query plus its schedule and alerting
//! settings. Besides the usual entity operations it can be dispatched into a
//! [`Job`], report its past jobs and upcoming run times, and have its alerts
//! suppressed for a while.
//!
//! The server requires `search` on every update, so [`Resource::update`]
//! re-sends the current query when the caller does not change it.

use super::job::Job;
use crate::service::PATH_SAVED_SEARCHES;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use resource_framework::atom;
use resource_framework::{Collection, Entity, Params, Resource, ResourceError, Result, Transport};
use std::ops::Deref;
use std::sync::Arc;
use tracing::info;

entity_resource!(SavedSearch);

#[async_trait]
impl Resource for SavedSearch {
    fn entity(&self) -> &Entity {
        &self.entity
    }

    fn entity_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }

    async fn prepare_update(&mut self, mut params: Params) -> Result<Params> {
        if !params.contains("search") {
            let search = self
                .content()
                .await?
                .text("search")
                .ok_or_else(|| ResourceError::NoSuchField("search".to_string()))?
                .to_string();
            params.push("search", search);
        }
        Ok(params)
    }
}

impl SavedSearch {
    /// Acknowledges the search's fired alerts so alerting resumes.
    pub async fn acknowledge(&mut self) -> Result<&mut Self> {
        self.post_action("acknowledge", Params::new()).await?;
        Ok(self)
    }

    /// Runs the search now.
    #[tracing::instrument(skip(self, params), fields(path = %self.path()))]
    pub async fn dispatch(&self, params: Params) -> Result<Job> {
        let response = self.post_action("dispatch", params).await?;
        let sid = atom::load_sid(&response.body)?;
        info!(%sid, "Dispatched");
        Ok(Job::new(self.endpoint().transport().clone(), &sid))
    }

    /// Jobs previously dispatched from this search.
    pub async fn history(&self) -> Result<Vec<Job>> {
        let response = self.endpoint().get("history", &Params::new()).await?;
        let entries = atom::load_entries(&response.body)?.unwrap_or_default();
        Ok(entries
            .iter()
            .map(|entry| {
                let title = entry.text("title").unwrap_or_default();
                Job::new(self.endpoint().transport().clone(), title)
            })
            .collect())
    }

    /// When the search is scheduled to run between `earliest` and `latest`,
    /// both in Splunk time syntax (`now`, `+1h`, `-1d@d`, ...).
    pub async fn scheduled_times(&self, earliest: &str, latest: &str) -> Result<Vec<DateTime<Utc>>> {
        let query = Params::new()
            .with("earliest_time", earliest)
            .with("latest_time", latest);
        let response = self.endpoint().get("scheduled_times", &query).await?;
        let entry = atom::parse_entry(&atom::load_feed_entry(&response.body)?);
        let times = entry
            .content
            .get("scheduled_times")
            .map(|times| times.to_strings())
            .unwrap_or_default();
        times.iter().map(String::as_str).map(parse_epoch).collect()
    }

    /// Suppresses alerts from this search for `expiration` seconds.
    pub async fn suppress(&mut self, expiration: u64) -> Result<&mut Self> {
        let form = Params::new()
            .with("suppressed", 1)
            .with("expiration", expiration);
        self.post_action("suppress", form).await?;
        Ok(self)
    }

    /// Seconds of suppression left, or zero when alerts are not suppressed.
    pub async fn suppressed(&self) -> Result<u64> {
        let status = self.run_method("suppress", Params::new()).await?;
        if status.text("suppressed") != Some("1") {
            return Ok(0);
        }
        let expiration = status.text("expiration").unwrap_or("0");
        expiration
            .parse()
            .map_err(|_| ResourceError::Decode(format!("bad expiration: {expiration}")))
    }

    pub async fn unsuppress(&mut self) -> Result<&mut Self> {
        let form = Params::new()
            .with("suppressed", 0)
            .with("expiration", 0);
        self.post_action("suppress", form).await?;
        Ok(self)
    }
}

fn parse_epoch(value: &str) -> Result<DateTime<Utc>> {
    value
        .parse::<i64>()
        .ok()
        .and_then(|seconds| Utc.timestamp_opt(seconds, 0).single())
        .ok_or_else(|| ResourceError::Decode(format!("bad scheduled time: {value}")))
}

#[derive(Debug, Clone)]
pub struct SavedSearches {
    inner: Collection<SavedSearch>,
}

impl SavedSearches {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Collection::new(transport, PATH_SAVED_SEARCHES, |t, path, state| {
                SavedSearch::with_state(t, path, state)
            }),
        }
    }

    /// Creates a saved search named `name` running `search`.
    pub async fn create(&self, name: &str, search: &str, params: Params) -> Result<SavedSearch> {
        let mut form = Params::new().with("search", search);
        form.extend(params);
        self.inner.create(name, form).await
    }
}

impl Deref for SavedSearches {
    type Target = Collection<SavedSearch>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
