// src/domain/mod.rs
//
// Domain Root - The Single Source of Truth for Domain API
//
// All other modules import from `crate::domain::*`

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod actor;
pub mod chapter;
pub mod comment;
pub mod engagement;
pub mod ownership;
pub mod profile;
pub mod story;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use actor::{Actor, Session};

pub use profile::{validate_profile, Profile, ProfileUpdate};

pub use story::{
    normalize_tags, validate_categories, validate_story, ContentType, Story, StoryStatus,
};

pub use chapter::{
    next_chapter_number, validate_chapter, validate_single_story, Chapter, SingleStory,
};

pub use comment::{checked_comment_text, Comment, CommentScope};

pub use engagement::{ContentTarget, EngagementFact, EngagementStats, FactKind, LikeState};

pub use ownership::{can_delete_comment, can_edit_comment, is_owner, Owned};

// ============================================================================
// TIMESTAMPS
// ============================================================================

use chrono::{DateTime, SubsecRound, Utc};

/// Current time at the precision the stores keep (microseconds), so an
/// entity compares equal to its own stored row
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

// ============================================================================
// DOMAIN ERROR TYPES
// ============================================================================

use thiserror::Error;

/// Domain-level errors
/// These represent violations of business rules and invariants
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Entity not found: {0}")]
    NotFound(String),
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;
