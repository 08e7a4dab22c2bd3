//! # Observability & Tracing
//!
//! Library code only emits events; binaries install a subscriber with
//! [`setup_tracing`].
//!
//! ## What Gets Traced
//!
//! - **Requests**: every endpoint call logs its method and path at `debug`
//! - **Mutations**: create, update and delete log at `info` with the resource path and name
//! - **Tolerated failures**: kinds skipped on 404, polls that give up, at `warn`
//!
//! ## Usage Examples
//!
//! ```bash
//! # Mutations only
//! RUST_LOG=info cargo run
//!
//! # Every request, with span context
//! RUST_LOG=debug cargo run
//!
//! # Only the framework
//! RUST_LOG=resource_framework=debug cargo run
//! ```
//!
//! **With `RUST_LOG=debug`**:
//!
//! ```text
//! DEBUG list: GET path="saved/searches/"
//! DEBUG create: POST path="search/jobs/"
//! DEBUG GET path="search/jobs/1337/"
//! DEBUG Not ready path="search/jobs/1337/" attempt=1
//! ```

pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
