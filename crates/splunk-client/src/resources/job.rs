//! # Search Jobs
//!
//! A [`Job`] exists on the server as soon as it is dispatched but answers
//! `204 No Content` until it has been materialized, so its reads go through
//! [`poll_entry`] instead of a plain GET. Its name is its search id.
//!
//! Control actions POST `action=<verb>` to the job's `control` sub-path.
//! Result accessors return the raw response body; the caller picks the
//! output format through the query parameters.

use crate::service::PATH_JOBS;
use async_trait::async_trait;
use resource_framework::atom;
use resource_framework::retry::poll_entry;
use resource_framework::{
    Collection, Entity, ParsedEntry, Params, Resource, ResourceError, Result, RetryPolicy,
    Transport, Value,
};
use std::ops::Deref;
use std::sync::Arc;
use tracing::{debug, info};

/// Highest priority a job accepts.
pub const MAX_PRIORITY: u8 = 10;

#[derive(Debug, Clone)]
pub struct Job {
    entity: Entity,
    sid: String,
    retry: RetryPolicy,
}

impl Job {
    /// The job with search id `sid`, under `search/jobs/`.
    pub fn new(transport: Arc<dyn Transport>, sid: &str) -> Self {
        Self::from_parts(transport, format!("{PATH_JOBS}{sid}"), sid, None)
    }

    /// A job built from a listing entry. The search id comes from the
    /// entry's `sid` field, or from the last path segment.
    pub fn from_entry(transport: Arc<dyn Transport>, path: String, state: ParsedEntry) -> Self {
        let sid = match state.content.text("sid") {
            Some(sid) => sid.to_string(),
            None => path
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string(),
        };
        Self::from_parts(transport, path, &sid, Some(state))
    }

    fn from_parts(
        transport: Arc<dyn Transport>,
        path: String,
        sid: &str,
        state: Option<ParsedEntry>,
    ) -> Self {
        Self {
            entity: Entity::from_parts(transport, path, state),
            sid: sid.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn sid(&self) -> &str {
        &self.sid
    }

    #[tracing::instrument(skip(self, params), fields(sid = %self.sid))]
    async fn control(&mut self, action: &str, params: Params) -> Result<&mut Self> {
        let mut form = Params::new().with("action", action);
        form.extend(params);
        self.post_action("control", form).await?;
        info!("Control action sent");
        Ok(self)
    }

    pub async fn cancel(&mut self) -> Result<&mut Self> {
        self.control("cancel", Params::new()).await
    }

    pub async fn disable_preview(&mut self) -> Result<&mut Self> {
        self.control("disablepreview", Params::new()).await
    }

    pub async fn enable_preview(&mut self) -> Result<&mut Self> {
        self.control("enablepreview", Params::new()).await
    }

    /// Stops the search and makes what it has found so far final.
    pub async fn finalize(&mut self) -> Result<&mut Self> {
        self.control("finalize", Params::new()).await
    }

    pub async fn pause(&mut self) -> Result<&mut Self> {
        self.control("pause", Params::new()).await
    }

    pub async fn unpause(&mut self) -> Result<&mut Self> {
        self.control("unpause", Params::new()).await
    }

    /// Restarts the job's time-to-live from now.
    pub async fn touch(&mut self) -> Result<&mut Self> {
        self.control("touch", Params::new()).await
    }

    pub async fn set_ttl(&mut self, seconds: u64) -> Result<&mut Self> {
        self.control("setttl", Params::new().with("ttl", seconds))
            .await
    }

    pub async fn set_priority(&mut self, priority: u8) -> Result<&mut Self> {
        if priority > MAX_PRIORITY {
            return Err(ResourceError::InvalidArgument(format!(
                "priority must be between 0 and {MAX_PRIORITY}, got {priority}"
            )));
        }
        self.control("setpriority", Params::new().with("priority", priority))
            .await
    }

    async fn stream(&self, relative: &str, params: Params) -> Result<Vec<u8>> {
        debug!(sid = %self.sid, relative, "Fetching job output");
        Ok(self.endpoint().get(relative, &params).await?.body)
    }

    pub async fn events(&self, params: Params) -> Result<Vec<u8>> {
        self.stream("events", params).await
    }

    /// Results computed so far, while the job is still running.
    pub async fn preview(&self, params: Params) -> Result<Vec<u8>> {
        self.stream("results_preview", params).await
    }

    pub async fn results(&self, params: Params) -> Result<Vec<u8>> {
        self.stream("results", params).await
    }

    pub async fn searchlog(&self, params: Params) -> Result<Vec<u8>> {
        self.stream("search.log", params).await
    }

    pub async fn summary(&self, params: Params) -> Result<Vec<u8>> {
        self.stream("summary", params).await
    }

    pub async fn timeline(&self, params: Params) -> Result<Vec<u8>> {
        self.stream("timeline", params).await
    }
}

#[async_trait]
impl Resource for Job {
    fn entity(&self) -> &Entity {
        &self.entity
    }

    fn entity_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }

    async fn read(&self) -> Result<ParsedEntry> {
        poll_entry(self.endpoint(), &self.retry).await
    }

    async fn name(&mut self) -> Result<String> {
        Ok(self.sid.clone())
    }

    async fn member(&mut self, key: &str) -> Result<Option<Value>> {
        // a job's title is its query
        match key {
            "sid" | "name" => Ok(Some(Value::from(self.sid.as_str()))),
            "path" => Ok(Some(Value::from(self.path()))),
            _ => self.state_member(key).await,
        }
    }
}

/// The search jobs collection. Listings default to the server's own page
/// size rather than everything.
#[derive(Debug, Clone)]
pub struct Jobs {
    inner: Collection<Job>,
}

impl Jobs {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Collection::new(transport, PATH_JOBS, Job::from_entry).with_default_count(0),
        }
    }

    /// Dispatches `query` as a new job. The job is returned unread; its
    /// first access polls until the server has it ready.
    #[tracing::instrument(skip(self, params))]
    pub async fn create(&self, query: &str, params: Params) -> Result<Job> {
        if params.get("exec_mode") == Some("oneshot") {
            return Err(ResourceError::InvalidArgument(
                "cannot create a job with exec_mode=oneshot, use oneshot instead".to_string(),
            ));
        }
        let mut form = Params::new().with("search", query);
        form.extend(params);
        let response = self.inner.endpoint().post("", &form).await?;
        let sid = atom::load_sid(&response.body)?;
        info!(%sid, "Job created");
        Ok(Job::new(self.inner.endpoint().transport().clone(), &sid))
    }

    /// Runs `query` to completion in a single request and returns its
    /// results as JSON.
    #[tracing::instrument(skip(self, params))]
    pub async fn oneshot(&self, query: &str, params: Params) -> Result<serde_json::Value> {
        if params.contains("exec_mode") {
            return Err(ResourceError::InvalidArgument(
                "cannot specify an exec_mode to oneshot".to_string(),
            ));
        }
        let mut form = Params::new()
            .with("search", query)
            .with("exec_mode", "oneshot")
            .with("output_mode", "json");
        form.extend(params);
        let response = self.inner.endpoint().post("", &form).await?;
        serde_json::from_slice(&response.body)
            .map_err(|e| ResourceError::Decode(format!("oneshot results: {e}")))
    }
}

impl Deref for Jobs {
    type Target = Collection<Job>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
