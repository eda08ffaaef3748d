// src/repositories/chapter_repository.rs
//
// Chapter and single-body persistence.
// Both hold the text of a story; which one is used depends on
// `Story::is_chapters`.

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use crate::db::{format_timestamp, parse_timestamp, parse_uuid, ConnectionPool};
use crate::domain::{Chapter, SingleStory};
use crate::error::{AppError, AppResult};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChapterRepository: Send + Sync {
    async fn insert(&self, chapter: &Chapter) -> AppResult<()>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Chapter>>;
    /// Ordered by chapter number ascending
    async fn list_by_story(&self, story_id: Uuid) -> AppResult<Vec<Chapter>>;
    /// Highest number ever assigned among remaining chapters
    async fn max_number(&self, story_id: Uuid) -> AppResult<Option<u32>>;
    /// Title and content only. `NotFound` when missing.
    async fn update(&self, chapter: &Chapter) -> AppResult<()>;
    async fn ids_by_story(&self, story_id: Uuid) -> AppResult<Vec<Uuid>>;
    async fn delete_by_story(&self, story_id: Uuid) -> AppResult<u64>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SingleStoryRepository: Send + Sync {
    async fn get_by_story(&self, story_id: Uuid) -> AppResult<Option<SingleStory>>;
    async fn insert(&self, body: &SingleStory) -> AppResult<()>;
    /// `NotFound` when the story has no body row yet
    async fn update_content(&self, story_id: Uuid, content: &str) -> AppResult<()>;
    async fn delete_by_story(&self, story_id: Uuid) -> AppResult<u64>;
}

pub struct SqliteChapterRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteChapterRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_chapter(row: &Row) -> rusqlite::Result<Chapter> {
        let id: String = row.get("id")?;
        let story_id: String = row.get("story_id")?;
        let created_at: String = row.get("created_at")?;
        let updated_at: String = row.get("updated_at")?;

        Ok(Chapter {
            id: parse_uuid(&id, 0)?,
            story_id: parse_uuid(&story_id, 1)?,
            chapter_number: row.get("chapter_number")?,
            title: row.get("title")?,
            content: row.get("content")?,
            created_at: parse_timestamp(&created_at, 5)?,
            updated_at: parse_timestamp(&updated_at, 6)?,
        })
    }
}

#[async_trait]
impl ChapterRepository for SqliteChapterRepository {
    async fn insert(&self, chapter: &Chapter) -> AppResult<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO chapters (
                id, story_id, chapter_number, title, content, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                chapter.id.to_string(),
                chapter.story_id.to_string(),
                chapter.chapter_number,
                chapter.title,
                chapter.content,
                format_timestamp(&chapter.created_at),
                format_timestamp(&chapter.updated_at),
            ],
        )?;
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Chapter>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, story_id, chapter_number, title, content, created_at, updated_at
             FROM chapters WHERE id = ?1",
        )?;
        Ok(stmt
            .query_row(params![id.to_string()], Self::row_to_chapter)
            .optional()?)
    }

    async fn list_by_story(&self, story_id: Uuid) -> AppResult<Vec<Chapter>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, story_id, chapter_number, title, content, created_at, updated_at
             FROM chapters WHERE story_id = ?1
             ORDER BY chapter_number ASC",
        )?;
        let chapters = stmt
            .query_map(params![story_id.to_string()], Self::row_to_chapter)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(chapters)
    }

    async fn max_number(&self, story_id: Uuid) -> AppResult<Option<u32>> {
        let conn = self.pool.get()?;
        let max: Option<u32> = conn.query_row(
            "SELECT MAX(chapter_number) FROM chapters WHERE story_id = ?1",
            params![story_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(max)
    }

    async fn update(&self, chapter: &Chapter) -> AppResult<()> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE chapters SET title = ?2, content = ?3, updated_at = ?4 WHERE id = ?1",
            params![
                chapter.id.to_string(),
                chapter.title,
                chapter.content,
                format_timestamp(&chapter.updated_at),
            ],
        )?;
        if rows == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn ids_by_story(&self, story_id: Uuid) -> AppResult<Vec<Uuid>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT id FROM chapters WHERE story_id = ?1")?;
        let ids = stmt
            .query_map(params![story_id.to_string()], |row| {
                let raw: String = row.get(0)?;
                parse_uuid(&raw, 0)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    async fn delete_by_story(&self, story_id: Uuid) -> AppResult<u64> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "DELETE FROM chapters WHERE story_id = ?1",
            params![story_id.to_string()],
        )?;
        Ok(rows as u64)
    }
}

pub struct SqliteSingleStoryRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteSingleStoryRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_body(row: &Row) -> rusqlite::Result<SingleStory> {
        let id: String = row.get("id")?;
        let story_id: String = row.get("story_id")?;
        let created_at: String = row.get("created_at")?;
        let updated_at: String = row.get("updated_at")?;

        Ok(SingleStory {
            id: parse_uuid(&id, 0)?,
            story_id: parse_uuid(&story_id, 1)?,
            content: row.get("content")?,
            created_at: parse_timestamp(&created_at, 3)?,
            updated_at: parse_timestamp(&updated_at, 4)?,
        })
    }
}

#[async_trait]
impl SingleStoryRepository for SqliteSingleStoryRepository {
    async fn get_by_story(&self, story_id: Uuid) -> AppResult<Option<SingleStory>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, story_id, content, created_at, updated_at
             FROM single_stories WHERE story_id = ?1",
        )?;
        Ok(stmt
            .query_row(params![story_id.to_string()], Self::row_to_body)
            .optional()?)
    }

    async fn insert(&self, body: &SingleStory) -> AppResult<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO single_stories (id, story_id, content, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                body.id.to_string(),
                body.story_id.to_string(),
                body.content,
                format_timestamp(&body.created_at),
                format_timestamp(&body.updated_at),
            ],
        )?;
        Ok(())
    }

    async fn update_content(&self, story_id: Uuid, content: &str) -> AppResult<()> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE single_stories SET content = ?2, updated_at = ?3 WHERE story_id = ?1",
            params![
                story_id.to_string(),
                content,
                format_timestamp(&chrono::Utc::now()),
            ],
        )?;
        if rows == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn delete_by_story(&self, story_id: Uuid) -> AppResult<u64> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "DELETE FROM single_stories WHERE story_id = ?1",
            params![story_id.to_string()],
        )?;
        Ok(rows as u64)
    }
}
