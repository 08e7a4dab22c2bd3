//! # Collections
//!
//! A [`Collection`] is a server-backed set of resources living under one path.
//! It caches nothing: every listing, lookup and containment check is a fresh
//! round trip. Items are built by an injected [`ItemFactory`], which lets a
//! collection of jobs produce `Job`s and a collection of indexes produce
//! `Index`es without the collection knowing either type.
//!
//! Mapping-style access (`keys`, `values`, `contains`, `get`, ...) comes from
//! the [`ResourceMap`] trait, which only needs a way to list everything.
//! Plain iteration yields names; values are the resources themselves.

use crate::atom::{self, EntryMetadata, ParsedEntry};
use crate::endpoint::Endpoint;
use crate::entity::Resource;
use crate::error::{ResourceError, Result};
use crate::transport::{Params, Transport};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Builds an item from the transport, the item's own path and its entry.
pub type ItemFactory<T> = Arc<dyn Fn(Arc<dyn Transport>, String, ParsedEntry) -> T + Send + Sync>;

/// List all items the server has.
pub const COUNT_ALL: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    Auto,
    Alpha,
    AlphaCase,
    Num,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Auto => "auto",
            SortMode::Alpha => "alpha",
            SortMode::AlphaCase => "alpha_case",
            SortMode::Num => "num",
        }
    }
}

/// Listing parameters. Unset options are left to the server, except `count`,
/// which falls back to the collection's default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListOptions {
    pub count: Option<i64>,
    pub offset: Option<u64>,
    pub search: Option<String>,
    pub sort_key: Option<String>,
    pub sort_dir: Option<SortDirection>,
    pub sort_mode: Option<SortMode>,
    pub filters: Params,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(mut self, count: i64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn sort(mut self, key: impl Into<String>, dir: SortDirection, mode: SortMode) -> Self {
        self.sort_key = Some(key.into());
        self.sort_dir = Some(dir);
        self.sort_mode = Some(mode);
        self
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push(key, value);
        self
    }

    /// Query parameters for a listing request.
    pub fn to_params(&self, default_count: i64) -> Params {
        let mut params = Params::new().with("count", self.count.unwrap_or(default_count));
        if let Some(offset) = self.offset {
            params.push("offset", offset);
        }
        if let Some(search) = &self.search {
            params.push("search", search);
        }
        if let Some(sort_key) = &self.sort_key {
            params.push("sort_key", sort_key);
        }
        if let Some(sort_dir) = self.sort_dir {
            params.push("sort_dir", sort_dir.as_str());
        }
        if let Some(sort_mode) = self.sort_mode {
            params.push("sort_mode", sort_mode.as_str());
        }
        params.extend(self.filters.clone());
        params
    }
}

/// Mapping-style access over anything that can list its items.
///
/// Only [`ResourceMap::list_all`] is required. Every provided method performs
/// its own listing, so results always reflect the server at call time.
#[async_trait]
pub trait ResourceMap: Send + Sync {
    type Item: Resource;

    async fn list_all(&self) -> Result<Vec<Self::Item>>;

    /// Names of all items, in server order. This is what iterating the
    /// collection yields.
    async fn iter(&self) -> Result<Vec<String>> {
        self.keys().await
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for mut item in self.list_all().await? {
            names.push(item.name().await?);
        }
        Ok(names)
    }

    async fn items(&self) -> Result<Vec<(String, Self::Item)>> {
        let mut pairs = Vec::new();
        for mut item in self.list_all().await? {
            pairs.push((item.name().await?, item));
        }
        Ok(pairs)
    }

    async fn values(&self) -> Result<Vec<Self::Item>> {
        self.list_all().await
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.list_all().await?.len())
    }

    async fn contains(&self, name: &str) -> Result<bool> {
        match self.get(name).await {
            Ok(_) => Ok(true),
            Err(ResourceError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// The item named `name`, by linear scan of a fresh listing.
    async fn get(&self, name: &str) -> Result<Self::Item> {
        for mut item in self.list_all().await? {
            if item.name().await? == name {
                return Ok(item);
            }
        }
        Err(ResourceError::NotFound(name.to_string()))
    }
}

/// A server-backed set of resources at one path.
pub struct Collection<T> {
    endpoint: Endpoint,
    factory: ItemFactory<T>,
    default_count: i64,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            endpoint: self.endpoint.clone(),
            factory: self.factory.clone(),
            default_count: self.default_count,
        }
    }
}

impl<T> fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("path", &self.endpoint.path())
            .field("default_count", &self.default_count)
            .finish()
    }
}

impl<T: Resource + 'static> Collection<T> {
    pub fn new<F>(transport: Arc<dyn Transport>, path: impl Into<String>, factory: F) -> Self
    where
        F: Fn(Arc<dyn Transport>, String, ParsedEntry) -> T + Send + Sync + 'static,
    {
        Self {
            endpoint: Endpoint::new(transport, path),
            factory: Arc::new(factory),
            default_count: COUNT_ALL,
        }
    }

    /// Overrides the `count` sent when a listing does not set one.
    pub fn with_default_count(mut self, count: i64) -> Self {
        self.default_count = count;
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn path(&self) -> &str {
        self.endpoint.path()
    }

    /// Builds an item from a decoded entry. The item is addressed by the
    /// entry's own `alternate` link, or by its title under this collection
    /// when the entry has none.
    pub fn item(&self, state: ParsedEntry) -> T {
        let path = match state.alternate() {
            Some(href) => href.to_string(),
            None => self.endpoint.join_name(&state.title),
        };
        (self.factory)(self.endpoint.transport().clone(), path, state)
    }

    /// One round trip listing the collection, one item per entry.
    #[tracing::instrument(skip(self), fields(path = %self.path()))]
    pub async fn list(&self, options: &ListOptions) -> Result<Vec<T>> {
        debug!("Sending request");
        let response = self
            .endpoint
            .get("", &options.to_params(self.default_count))
            .await?;
        let entries = atom::load_entries(&response.body)?.unwrap_or_default();
        Ok(entries
            .iter()
            .map(|entry| self.item(atom::parse_entry(entry)))
            .collect())
    }

    /// POSTs `name` plus `params`, then fetches the created item.
    #[tracing::instrument(skip(self, params), fields(path = %self.path()))]
    pub async fn create(&self, name: &str, params: Params) -> Result<T> {
        if name.trim().is_empty() {
            return Err(ResourceError::InvalidArgument(
                "name must be a non-empty string".to_string(),
            ));
        }
        let mut form = Params::new().with("name", name);
        form.extend(params);
        self.endpoint.post("", &form).await?;
        info!(name, "Created");
        self.get(name).await
    }

    /// Deletes the item named `name`. A 404 becomes
    /// [`ResourceError::NotFound`].
    #[tracing::instrument(skip(self), fields(path = %self.path()))]
    pub async fn delete(&self, name: &str) -> Result<&Self> {
        match self.endpoint.delete(&urlencoding::encode(name)).await {
            Ok(_) => {
                info!(name, "Deleted");
                Ok(self)
            }
            Err(e) if e.status() == Some(404) => {
                warn!(name, "Not found");
                Err(ResourceError::NotFound(name.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// The access descriptor and field schema a new item would have.
    pub async fn itemmeta(&self) -> Result<EntryMetadata> {
        let response = self.endpoint.get("_new", &Params::new()).await?;
        Ok(atom::parse_metadata(&atom::load_content(&response.body)?))
    }
}

#[async_trait]
impl<T: Resource + 'static> ResourceMap for Collection<T> {
    type Item = T;

    async fn list_all(&self) -> Result<Vec<T>> {
        self.list(&ListOptions::default()).await
    }
}
