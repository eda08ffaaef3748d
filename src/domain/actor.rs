use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An authenticated user as reported by the auth backend.
/// Never created or mutated by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

impl Actor {
    pub fn new(id: Uuid, email: Option<String>) -> Self {
        Self { id, email }
    }
}

/// The current authentication session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub actor: Actor,

    /// Bearer token for the hosted backend (absent for local sessions)
    pub access_token: Option<String>,

    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(actor: Actor) -> Self {
        Self {
            actor,
            access_token: None,
            expires_at: None,
        }
    }

    pub fn with_token(actor: Actor, access_token: String) -> Self {
        Self {
            actor,
            access_token: Some(access_token),
            expires_at: None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}
