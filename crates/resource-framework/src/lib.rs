//! # Resource Framework
//!
//! This crate provides the building blocks for modelling a remote, hierarchical
//! REST service as typed in-memory objects. Resources are addressed by path and
//! represented on the wire as Atom entries; the framework turns those entries
//! into navigable [`Entity`] values and server-backed [`Collection`]s.
//!
//! ## Architecture Overview
//!
//! The framework separates concerns into four layers, leaves first:
//!
//! 1. **Data Layer** ([`Record`], [`atom`]) - ordered records and the Atom decoder
//! 2. **Transport Layer** ([`Transport`], [`Endpoint`]) - requests bound to paths
//! 3. **Resource Layer** ([`Resource`], [`Entity`]) - one resource with cached state
//! 4. **Collection Layer** ([`Collection`], [`KindedCollection`], [`ResourceMap`]) - sets of resources
//!
//! Data flows upward: response bytes are decoded into entry records, entries
//! become [`ParsedEntry`] values, and those are either adopted as an entity's
//! state or turned into collection items by an item factory. Control flows
//! downward: a method call issues a request through the endpoint, and the
//! response re-enters the decoder.
//!
//! ## Core Abstractions
//!
//! ### [`Resource`] - One Addressable Resource
//!
//! Concrete resources wrap an [`Entity`] and implement two accessors. Reading,
//! refreshing, field lookup and the standard actions come for free:
//!
//! ```rust
//! use resource_framework::mock::{atom_feed, AtomEntry, MockTransport};
//! use resource_framework::{Entity, Resource, Value};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mock = MockTransport::new();
//!     mock.expect_get("data/indexes/main/").return_ok(
//!         200,
//!         atom_feed(&[AtomEntry::new("main").field("maxTotalDataSizeMB", "500000")]),
//!     );
//!
//!     let mut index = Entity::new(mock.transport(), "data/indexes/main");
//!     assert_eq!(index.name().await.unwrap(), "main");
//!     assert_eq!(index.get("maxTotalDataSizeMB").await.unwrap(), Value::from("500000"));
//! }
//! ```
//!
//! ### [`Collection`] - Server-Backed Sets
//!
//! A collection lists, creates and deletes resources under one path. It keeps
//! no cache: each call is a fresh round trip, so it never serves stale data.
//!
//! ```rust
//! use resource_framework::mock::{atom_feed, AtomEntry, MockTransport};
//! use resource_framework::{Collection, Entity, Params, ResourceMap};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mock = MockTransport::new();
//!     mock.expect_post("authorization/roles/").return_ok(201, "");
//!     mock.expect_get("authorization/roles/").return_ok(
//!         200,
//!         atom_feed(&[AtomEntry::new("auditor").alternate("/services/authorization/roles/auditor")]),
//!     );
//!
//!     let roles = Collection::new(mock.transport(), "authorization/roles", |t, path, state| {
//!         Entity::with_state(t, path, state)
//!     });
//!     let role = roles
//!         .create("auditor", Params::new().with("imported_roles", "user"))
//!         .await
//!         .unwrap();
//!     assert_eq!(role.cached().unwrap().title, "auditor");
//!     mock.verify();
//! }
//! ```
//!
//! ### [`KindedCollection`] - Heterogeneous Sets
//!
//! One logical collection over several typed sub-paths, with each item
//! remembering its kind. See the [`kinded`] module.
//!
//! ### Bounded Retry
//!
//! Resources that exist before they can be read (search jobs) are polled with
//! a [`RetryPolicy`]. See the [`retry`] module.
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`Result`], whose error is
//! [`ResourceError`]. Not-found, not-supported, timeout and invalid-argument
//! conditions are distinct variants; server statuses are preserved in
//! [`ResourceError::Http`].
//!
//! ## Testing
//!
//! [`mock::MockTransport`] replaces the network with an expectation queue, and
//! the fixture helpers in [`mock`] render Atom documents. See the [`mock`]
//! module for the testing guide.

pub mod atom;
pub mod collection;
pub mod endpoint;
pub mod entity;
pub mod error;
pub mod kinded;
pub mod mock;
pub mod record;
pub mod retry;
pub mod tracing;
pub mod transport;

pub use atom::{EntryMetadata, FieldSchema, ParsedEntry};
pub use collection::{Collection, ItemFactory, ListOptions, ResourceMap, SortDirection, SortMode};
pub use endpoint::Endpoint;
pub use entity::{Entity, Resource};
pub use error::{ResourceError, Result};
pub use kinded::{KindMap, KindedCollection, KindedFactory};
pub use record::{Record, Value};
pub use retry::RetryPolicy;
pub use transport::{Method, Params, RequestMessage, Response, Transport};
