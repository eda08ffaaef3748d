// src/events/mod.rs
//
// Internal Event System - Public API

pub mod bus;
pub mod types;

pub use types::DomainEvent;

pub use types::{
    // Cache
    CollectionInvalidated,
    // Comment
    CommentAdded,
    CommentDeleted,
    CommentEdited,
    // Engagement
    LikeToggled,
    // Session
    SessionChanged,
    // Story
    ChapterAdded,
    StoryCreated,
    StoryDeleted,
};

pub use bus::{EventBus, EventLogEntry, Subscription, DEFAULT_EVENT_LOG_CAPACITY};

/// Initialize a new event bus
pub fn create_event_bus() -> EventBus {
    EventBus::new()
}
