use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::engagement::FactKind;
use crate::domain::{timestamp_now, DomainError, DomainResult};

/// Which thread a comment belongs to.
/// Story threads and chapter threads live in separate collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentScope {
    Story,
    Chapter,
}

impl CommentScope {
    pub fn collection(&self) -> &'static str {
        match self {
            CommentScope::Story => "story_comments",
            CommentScope::Chapter => "chapter_comments",
        }
    }

    pub fn parent_column(&self) -> &'static str {
        match self {
            CommentScope::Story => "story_id",
            CommentScope::Chapter => "chapter_id",
        }
    }

    /// Like collection for comments of this scope, if the platform has one
    pub fn like_kind(&self) -> Option<FactKind> {
        match self {
            CommentScope::Story => Some(FactKind::StoryCommentLike),
            CommentScope::Chapter => None,
        }
    }
}

/// A comment on a story or a chapter.
/// Only `content` changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub scope: CommentScope,

    /// Story or chapter id, depending on `scope`
    pub parent_id: Uuid,

    /// Author
    pub user_id: Uuid,

    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(scope: CommentScope, parent_id: Uuid, user_id: Uuid, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            scope,
            parent_id,
            user_id,
            content,
            created_at: timestamp_now(),
        }
    }
}

/// Rejects blank comment text. The text itself is stored as typed.
pub fn checked_comment_text(text: &str) -> DomainResult<String> {
    if text.trim().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Comment cannot be empty".to_string(),
        ));
    }
    Ok(text.to_string())
}
