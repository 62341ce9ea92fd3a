//! Async HTTP client for the tollgate entitlement backend.
//!
//! The backend exposes one JSON REST collection per entity kind
//! (`vouchers`, `subscriptions`, `payments`). [`ApiClient`] speaks that
//! protocol generically: callers choose the record and request types,
//! the client owns URLs, auth headers, and error decoding.

pub mod client;
pub mod error;
pub mod transport;

pub use client::{ApiClient, EntityKind};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
