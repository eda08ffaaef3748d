// src/integrations/mod.rs
//
// External Integrations Module

pub mod hosted;

pub use hosted::{HostedAuth, HostedClient, HostedObjectStorage, HostedStore};
