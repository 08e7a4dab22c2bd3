//! A transport bound to a path. Relative requests are resolved against that
//! path, and non-success statuses are turned into errors here so callers only
//! deal with [`ResourceError`](crate::error::ResourceError).

use crate::error::Result;
use crate::transport::{Params, RequestMessage, Response, Transport};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct Endpoint {
    transport: Arc<dyn Transport>,
    path: String,
}

impl Endpoint {
    /// Binds `transport` to `path`, normalized to end with `/`. The empty
    /// path is the service root and stays empty.
    pub fn new(transport: Arc<dyn Transport>, path: impl Into<String>) -> Self {
        let mut path = path.into();
        if !path.is_empty() && !path.ends_with('/') {
            path.push('/');
        }
        Self { transport, path }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// The absolute path of a relative segment; the empty segment is the
    /// endpoint itself.
    pub fn join(&self, relative: &str) -> String {
        format!("{}{}", self.path, relative.trim_start_matches('/'))
    }

    /// The path of the item called `name`, encoded as one path segment.
    pub fn join_name(&self, name: &str) -> String {
        self.join(&urlencoding::encode(name))
    }

    /// A child endpoint.
    pub fn child(&self, relative: &str) -> Endpoint {
        Endpoint::new(self.transport.clone(), self.join(relative))
    }

    pub async fn get(&self, relative: &str, query: &Params) -> Result<Response> {
        let path = self.join(relative);
        debug!(%path, "GET");
        self.transport.get(&path, query).await?.error_for_status()
    }

    pub async fn post(&self, relative: &str, form: &Params) -> Result<Response> {
        let path = self.join(relative);
        debug!(%path, "POST");
        self.transport.post(&path, form).await?.error_for_status()
    }

    pub async fn delete(&self, relative: &str) -> Result<Response> {
        let path = self.join(relative);
        debug!(%path, "DELETE");
        self.transport.delete(&path).await?.error_for_status()
    }

    pub async fn request(&self, relative: &str, message: RequestMessage) -> Result<Response> {
        let path = self.join(relative);
        debug!(%path, method = %message.method, "Request");
        self.transport
            .request(&path, message)
            .await?
            .error_for_status()
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint").field("path", &self.path).finish()
    }
}
