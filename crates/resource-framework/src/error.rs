//! # Framework Errors
//!
//! This module defines the error type shared by every layer of the framework:
//! the Atom decoder, the transport seam, entities and collections. Each variant
//! is a distinct condition the caller can match on; nothing is folded into a
//! generic "something went wrong".

/// Errors that can occur while reading or mutating remote resources.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// A collection has no member with the given name (HTTP 404 on delete, or
    /// no match in a listing).
    #[error("No such entity: {0}")]
    NotFound(String),

    /// The entity field cascade found nothing for the key.
    #[error("No such field: {0}")]
    NoSuchField(String),

    /// A record has neither the key nor any `key.`-prefixed entries.
    #[error("No key or prefix: {0}")]
    NoSuchKey(String),

    /// The operation is deliberately unavailable for this resource.
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    /// A bounded wait ran out of attempts or time.
    #[error("Operation timed out: {0}")]
    TimedOut(String),

    /// Caller input rejected before any request was issued.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The transport could not complete the exchange.
    #[error("Transport error: {0}")]
    Transport(Box<dyn std::error::Error + Send + Sync>),

    /// The payload did not have the expected shape.
    #[error("Malformed response: {0}")]
    Decode(String),

    #[error(transparent)]
    Xml(#[from] quick_xml::Error),
}

impl ResourceError {
    /// The HTTP status carried by this error, if it came from the server.
    pub fn status(&self) -> Option<u16> {
        match self {
            ResourceError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ResourceError::NotFound(_))
    }
}

impl From<std::str::Utf8Error> for ResourceError {
    fn from(e: std::str::Utf8Error) -> Self {
        ResourceError::Decode(e.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for ResourceError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        ResourceError::Xml(quick_xml::Error::from(e))
    }
}

pub type Result<T, E = ResourceError> = std::result::Result<T, E>;
