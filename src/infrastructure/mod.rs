// src/infrastructure/mod.rs
//
// Infrastructure Layer
//
// Contains implementation details that support the domain
// but are not part of the domain itself.
//
// RULES:
// - Infrastructure serves the domain
// - Infrastructure never dictates domain behavior
// - Infrastructure is replaceable

pub mod auth;
pub mod object_storage;

pub use auth::{AuthProvider, LocalAuth};
pub use object_storage::{
    avatar_path, cover_path, store_public, Bucket, LocalObjectStorage, ObjectStorage, Upload,
};

#[cfg(test)]
pub use auth::MockAuthProvider;
#[cfg(test)]
pub use object_storage::MockObjectStorage;
