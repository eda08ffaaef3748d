// src/repositories/story_repository.rs
//
// Story persistence

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use crate::db::{
    conversion_error, format_timestamp, parse_timestamp, parse_uuid, ConnectionPool,
};
use crate::domain::{ContentType, Story, StoryStatus};
use crate::error::{AppError, AppResult};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoryRepository: Send + Sync {
    async fn insert(&self, story: &Story) -> AppResult<()>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Story>>;
    /// Newest first
    async fn list_by_owner(&self, user_id: Uuid) -> AppResult<Vec<Story>>;
    /// Newest first across all owners
    async fn list_recent(&self, limit: u32) -> AppResult<Vec<Story>>;
    /// Update everything except the owner. `NotFound` when missing.
    async fn update(&self, story: &Story) -> AppResult<()>;
    /// Delete by id; returns rows removed (0 when already gone)
    async fn delete(&self, id: Uuid) -> AppResult<u64>;
}

pub struct SqliteStoryRepository {
    pool: Arc<ConnectionPool>,
}

const STORY_COLUMNS: &str = "id, user_id, title, description, cover_image_url, tags, \
     content_type, categories, status, is_chapters, created_at, updated_at";

impl SqliteStoryRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_story(row: &Row) -> rusqlite::Result<Story> {
        let id: String = row.get("id")?;
        let user_id: String = row.get("user_id")?;

        let tags_json: String = row.get("tags")?;
        let tags: Vec<String> =
            serde_json::from_str(&tags_json).map_err(|e| conversion_error(5, e))?;

        let content_type_str: String = row.get("content_type")?;
        let content_type: ContentType = content_type_str.parse().map_err(|e: String| {
            conversion_error(6, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;

        let categories_json: String = row.get("categories")?;
        let categories: Vec<String> =
            serde_json::from_str(&categories_json).map_err(|e| conversion_error(7, e))?;

        let status_str: String = row.get("status")?;
        let status: StoryStatus = status_str.parse().map_err(|e: String| {
            conversion_error(8, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;

        let created_at: String = row.get("created_at")?;
        let updated_at: String = row.get("updated_at")?;

        Ok(Story {
            id: parse_uuid(&id, 0)?,
            user_id: parse_uuid(&user_id, 1)?,
            title: row.get("title")?,
            description: row.get("description")?,
            cover_image_url: row.get("cover_image_url")?,
            tags,
            content_type,
            categories,
            status,
            is_chapters: row.get("is_chapters")?,
            created_at: parse_timestamp(&created_at, 10)?,
            updated_at: parse_timestamp(&updated_at, 11)?,
        })
    }
}

#[async_trait]
impl StoryRepository for SqliteStoryRepository {
    async fn insert(&self, story: &Story) -> AppResult<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO stories (
                id, user_id, title, description, cover_image_url, tags,
                content_type, categories, status, is_chapters, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                story.id.to_string(),
                story.user_id.to_string(),
                story.title,
                story.description,
                story.cover_image_url,
                serde_json::to_string(&story.tags)?,
                story.content_type.as_str(),
                serde_json::to_string(&story.categories)?,
                story.status.to_string(),
                story.is_chapters,
                format_timestamp(&story.created_at),
                format_timestamp(&story.updated_at),
            ],
        )?;
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Story>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM stories WHERE id = ?1",
            STORY_COLUMNS
        ))?;
        Ok(stmt
            .query_row(params![id.to_string()], Self::row_to_story)
            .optional()?)
    }

    async fn list_by_owner(&self, user_id: Uuid) -> AppResult<Vec<Story>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM stories WHERE user_id = ?1 ORDER BY created_at DESC",
            STORY_COLUMNS
        ))?;
        let stories = stmt
            .query_map(params![user_id.to_string()], Self::row_to_story)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(stories)
    }

    async fn list_recent(&self, limit: u32) -> AppResult<Vec<Story>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM stories ORDER BY created_at DESC LIMIT ?1",
            STORY_COLUMNS
        ))?;
        let stories = stmt
            .query_map(params![limit], Self::row_to_story)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(stories)
    }

    async fn update(&self, story: &Story) -> AppResult<()> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE stories
             SET title = ?2, description = ?3, cover_image_url = ?4, tags = ?5,
                 content_type = ?6, categories = ?7, status = ?8, is_chapters = ?9,
                 updated_at = ?10
             WHERE id = ?1",
            params![
                story.id.to_string(),
                story.title,
                story.description,
                story.cover_image_url,
                serde_json::to_string(&story.tags)?,
                story.content_type.as_str(),
                serde_json::to_string(&story.categories)?,
                story.status.to_string(),
                story.is_chapters,
                format_timestamp(&story.updated_at),
            ],
        )?;

        if rows == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<u64> {
        let conn = self.pool.get()?;
        let rows = conn.execute("DELETE FROM stories WHERE id = ?1", params![id.to_string()])?;
        Ok(rows as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support::memory_store;
    use chrono::{Duration, Utc};

    fn story(owner: Uuid, title: &str) -> Story {
        let mut story = Story::new(owner, title.to_string(), ContentType::Story);
        story.categories = vec!["Nağıl".to_string()];
        story.tags = vec!["yay".to_string()];
        story
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trips_lists() {
        let repo = SqliteStoryRepository::new(memory_store());
        let s = story(Uuid::new_v4(), "Köhnə ev");
        repo.insert(&s).await.unwrap();

        let loaded = repo.get_by_id(s.id).await.unwrap().unwrap();
        assert_eq!(loaded.title, "Köhnə ev");
        assert_eq!(loaded.tags, vec!["yay".to_string()]);
        assert_eq!(loaded.categories, vec!["Nağıl".to_string()]);
        assert_eq!(loaded.content_type, ContentType::Story);
    }

    #[tokio::test]
    async fn test_list_by_owner_newest_first() {
        let repo = SqliteStoryRepository::new(memory_store());
        let owner = Uuid::new_v4();
        let mut older = story(owner, "older");
        older.created_at = Utc::now() - Duration::hours(1);
        let newer = story(owner, "newer");
        repo.insert(&older).await.unwrap();
        repo.insert(&newer).await.unwrap();
        repo.insert(&story(Uuid::new_v4(), "someone else")).await.unwrap();

        let titles: Vec<String> = repo
            .list_by_owner(owner)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, vec!["newer".to_string(), "older".to_string()]);
        assert_eq!(repo.list_recent(2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_keeps_owner() {
        let repo = SqliteStoryRepository::new(memory_store());
        let owner = Uuid::new_v4();
        let mut s = story(owner, "draft");
        repo.insert(&s).await.unwrap();

        s.user_id = Uuid::new_v4();
        s.title = "final".to_string();
        s.is_chapters = true;
        repo.update(&s).await.unwrap();

        let loaded = repo.get_by_id(s.id).await.unwrap().unwrap();
        assert_eq!(loaded.user_id, owner);
        assert_eq!(loaded.title, "final");
        assert!(loaded.is_chapters);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let repo = SqliteStoryRepository::new(memory_store());
        let s = story(Uuid::new_v4(), "gone");
        repo.insert(&s).await.unwrap();

        assert_eq!(repo.delete(s.id).await.unwrap(), 1);
        assert_eq!(repo.delete(s.id).await.unwrap(), 0);
        assert!(repo.get_by_id(s.id).await.unwrap().is_none());
    }
}
