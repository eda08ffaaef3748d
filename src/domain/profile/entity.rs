use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Public profile of an actor. One-to-one with the actor, same identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Equal to the owning actor's id
    pub id: Uuid,

    #[serde(default)]
    pub first_name: Option<String>,

    #[serde(default)]
    pub last_name: Option<String>,

    /// Handle shown on public pages
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub bio: Option<String>,

    #[serde(default)]
    pub avatar_url: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable profile fields. `None` leaves a field untouched,
/// `Some("")` clears it.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

impl Profile {
    pub fn new(id: Uuid, email: Option<String>) -> Self {
        let now = crate::domain::timestamp_now();
        Self {
            id,
            first_name: None,
            last_name: None,
            username: None,
            bio: None,
            avatar_url: None,
            email,
            created_at: now,
            updated_at: now,
        }
    }

    /// "First Last", falling back to the handle
    pub fn display_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if !full.is_empty() {
            return full;
        }
        self.username.clone().unwrap_or_default()
    }

    pub fn apply(&mut self, update: ProfileUpdate) {
        fn normalize(value: String) -> Option<String> {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }

        if let Some(v) = update.first_name {
            self.first_name = normalize(v);
        }
        if let Some(v) = update.last_name {
            self.last_name = normalize(v);
        }
        if let Some(v) = update.username {
            self.username = normalize(v);
        }
        if let Some(v) = update.bio {
            self.bio = normalize(v);
        }
        if let Some(v) = update.avatar_url {
            self.avatar_url = normalize(v);
        }
        self.updated_at = crate::domain::timestamp_now();
    }
}
