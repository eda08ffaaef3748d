// src/integrations/hosted/mod.rs
//
// Hosted backend: REST collections, auth and object storage sharing one
// HTTP client and session token.

pub mod auth;
pub mod client;
pub mod storage;
pub mod store;

pub use auth::HostedAuth;
pub use client::{parse_content_range, Conflict, HostedClient, Query};
pub use storage::HostedObjectStorage;
pub use store::HostedStore;
