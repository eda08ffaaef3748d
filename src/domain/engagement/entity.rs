use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::comment::CommentScope;

/// The join-fact collections. Facts have no identity of interest,
/// only (parent, actor, time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactKind {
    StoryView,
    StoryLike,
    ChapterView,
    ChapterLike,
    StoryCommentLike,
}

impl FactKind {
    pub const ALL: [FactKind; 5] = [
        FactKind::StoryView,
        FactKind::StoryLike,
        FactKind::ChapterView,
        FactKind::ChapterLike,
        FactKind::StoryCommentLike,
    ];

    pub fn collection(&self) -> &'static str {
        match self {
            FactKind::StoryView => "story_views",
            FactKind::StoryLike => "story_likes",
            FactKind::ChapterView => "chapter_views",
            FactKind::ChapterLike => "chapter_likes",
            FactKind::StoryCommentLike => "story_comment_likes",
        }
    }

    pub fn parent_column(&self) -> &'static str {
        match self {
            FactKind::StoryView | FactKind::StoryLike => "story_id",
            FactKind::ChapterView | FactKind::ChapterLike => "chapter_id",
            FactKind::StoryCommentLike => "comment_id",
        }
    }

    /// Likes are unique per (actor, parent); views are not
    pub fn is_like(&self) -> bool {
        !matches!(self, FactKind::StoryView | FactKind::ChapterView)
    }
}

/// A single join fact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementFact {
    pub parent_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Something that can be viewed, liked and commented on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentTarget {
    Story(Uuid),
    Chapter(Uuid),
}

impl ContentTarget {
    pub fn id(&self) -> Uuid {
        match self {
            ContentTarget::Story(id) | ContentTarget::Chapter(id) => *id,
        }
    }

    pub fn view_kind(&self) -> FactKind {
        match self {
            ContentTarget::Story(_) => FactKind::StoryView,
            ContentTarget::Chapter(_) => FactKind::ChapterView,
        }
    }

    pub fn like_kind(&self) -> FactKind {
        match self {
            ContentTarget::Story(_) => FactKind::StoryLike,
            ContentTarget::Chapter(_) => FactKind::ChapterLike,
        }
    }

    pub fn comment_scope(&self) -> CommentScope {
        match self {
            ContentTarget::Story(_) => CommentScope::Story,
            ContentTarget::Chapter(_) => CommentScope::Chapter,
        }
    }
}

/// Derived counts for a content target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementStats {
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
}

/// Like membership plus the displayed counter.
/// The counter is updated optimistically and may drift from the
/// stored count when other sessions like concurrently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeState {
    pub liked: bool,
    pub count: u64,
}

impl LikeState {
    pub fn new(liked: bool, count: u64) -> Self {
        Self { liked, count }
    }

    /// State after a successful toggle
    pub fn toggled(self) -> Self {
        if self.liked {
            Self {
                liked: false,
                count: self.count.saturating_sub(1),
            }
        } else {
            Self {
                liked: true,
                count: self.count + 1,
            }
        }
    }
}
