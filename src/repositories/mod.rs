// src/repositories/mod.rs
//
// Repository layer
//
// CRITICAL RULES:
// - Repositories are DUMB data mappers
// - NO business logic
// - NO invariant enforcement
// - NO event emission
// - NO cross-repository calls
//
// Each trait has a SQLite implementation here (local backend) and a
// hosted implementation in `integrations::hosted`.

pub mod chapter_repository;
pub mod comment_repository;
pub mod engagement_repository;
pub mod profile_repository;
pub mod story_repository;

pub use chapter_repository::{
    ChapterRepository, SingleStoryRepository, SqliteChapterRepository,
    SqliteSingleStoryRepository,
};
pub use comment_repository::{CommentRepository, SqliteCommentRepository};
pub use engagement_repository::{EngagementRepository, SqliteEngagementRepository};
pub use profile_repository::{ProfileRepository, SqliteProfileRepository};
pub use story_repository::{SqliteStoryRepository, StoryRepository};

#[cfg(test)]
pub use chapter_repository::{MockChapterRepository, MockSingleStoryRepository};
#[cfg(test)]
pub use comment_repository::MockCommentRepository;
#[cfg(test)]
pub use engagement_repository::MockEngagementRepository;
#[cfg(test)]
pub use profile_repository::MockProfileRepository;
#[cfg(test)]
pub use story_repository::MockStoryRepository;

use std::sync::Arc;

use crate::db::ConnectionPool;

/// Every repository the services need, behind trait objects
#[derive(Clone)]
pub struct Repositories {
    pub profiles: Arc<dyn ProfileRepository>,
    pub stories: Arc<dyn StoryRepository>,
    pub chapters: Arc<dyn ChapterRepository>,
    pub single_stories: Arc<dyn SingleStoryRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub engagement: Arc<dyn EngagementRepository>,
}

impl Repositories {
    /// All repositories over one local SQLite pool
    pub fn sqlite(pool: Arc<ConnectionPool>) -> Self {
        Self {
            profiles: Arc::new(SqliteProfileRepository::new(pool.clone())),
            stories: Arc::new(SqliteStoryRepository::new(pool.clone())),
            chapters: Arc::new(SqliteChapterRepository::new(pool.clone())),
            single_stories: Arc::new(SqliteSingleStoryRepository::new(pool.clone())),
            comments: Arc::new(SqliteCommentRepository::new(pool.clone())),
            engagement: Arc::new(SqliteEngagementRepository::new(pool)),
        }
    }
}
