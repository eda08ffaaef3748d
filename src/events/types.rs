// events/types.rs
//
// All domain events in the system.
// Each event represents an immutable fact that has already occurred.
//
// CRITICAL RULES:
// - Events are facts, not commands
// - Events are immutable
// - Events carry only the data needed to react
// - No business logic in event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{CommentScope, FactKind};

/// Trait that all domain events must implement
pub trait DomainEvent: std::fmt::Debug + Clone {
    /// Unique identifier for this event instance
    fn event_id(&self) -> Uuid;

    /// When this event occurred
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Human-readable event type name
    fn event_type(&self) -> &'static str;
}

macro_rules! domain_event {
    ($name:ident) => {
        impl DomainEvent for $name {
            fn event_id(&self) -> Uuid {
                self.event_id
            }
            fn occurred_at(&self) -> DateTime<Utc> {
                self.occurred_at
            }
            fn event_type(&self) -> &'static str {
                stringify!($name)
            }
        }
    };
}

// ============================================================================
// SESSION EVENTS
// ============================================================================

/// Emitted whenever the current actor changes (sign-in, sign-out, restore)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionChanged {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub actor_id: Option<Uuid>,
}

impl SessionChanged {
    pub fn new(actor_id: Option<Uuid>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            actor_id,
        }
    }
}

domain_event!(SessionChanged);

// ============================================================================
// STORY EVENTS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryCreated {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub story_id: Uuid,
    pub user_id: Uuid,
}

impl StoryCreated {
    pub fn new(story_id: Uuid, user_id: Uuid) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            story_id,
            user_id,
        }
    }
}

domain_event!(StoryCreated);

/// Emitted after the story row and all of its dependents are gone
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryDeleted {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub story_id: Uuid,
    pub user_id: Uuid,
}

impl StoryDeleted {
    pub fn new(story_id: Uuid, user_id: Uuid) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            story_id,
            user_id,
        }
    }
}

domain_event!(StoryDeleted);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterAdded {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub story_id: Uuid,
    pub chapter_id: Uuid,
    pub chapter_number: u32,
}

impl ChapterAdded {
    pub fn new(story_id: Uuid, chapter_id: Uuid, chapter_number: u32) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            story_id,
            chapter_id,
            chapter_number,
        }
    }
}

domain_event!(ChapterAdded);

// ============================================================================
// COMMENT EVENTS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentAdded {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub scope: CommentScope,
    pub parent_id: Uuid,
    pub comment_id: Uuid,
}

impl CommentAdded {
    pub fn new(scope: CommentScope, parent_id: Uuid, comment_id: Uuid) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            scope,
            parent_id,
            comment_id,
        }
    }
}

domain_event!(CommentAdded);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentEdited {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub scope: CommentScope,
    pub parent_id: Uuid,
    pub comment_id: Uuid,
}

impl CommentEdited {
    pub fn new(scope: CommentScope, parent_id: Uuid, comment_id: Uuid) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            scope,
            parent_id,
            comment_id,
        }
    }
}

domain_event!(CommentEdited);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentDeleted {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub scope: CommentScope,
    pub parent_id: Uuid,
    pub comment_id: Uuid,
    /// Actor who removed it; differs from the author on moderation
    pub deleted_by: Uuid,
}

impl CommentDeleted {
    pub fn new(scope: CommentScope, parent_id: Uuid, comment_id: Uuid, deleted_by: Uuid) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            scope,
            parent_id,
            comment_id,
            deleted_by,
        }
    }
}

domain_event!(CommentDeleted);

// ============================================================================
// ENGAGEMENT EVENTS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeToggled {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub kind: FactKind,
    pub parent_id: Uuid,
    pub user_id: Uuid,
    pub liked: bool,
}

impl LikeToggled {
    pub fn new(kind: FactKind, parent_id: Uuid, user_id: Uuid, liked: bool) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            kind,
            parent_id,
            user_id,
            liked,
        }
    }
}

domain_event!(LikeToggled);

// ============================================================================
// CACHE INVALIDATION
// ============================================================================

/// Rows of `collection` under `parent_id` changed; cached reads keyed on
/// that pair are stale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionInvalidated {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub collection: String,
    pub parent_id: Uuid,
}

impl CollectionInvalidated {
    pub fn new(collection: impl Into<String>, parent_id: Uuid) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            collection: collection.into(),
            parent_id,
        }
    }

    pub fn matches(&self, collection: &str, parent_id: Uuid) -> bool {
        self.collection == collection && self.parent_id == parent_id
    }
}

domain_event!(CollectionInvalidated);
