// src/repositories/comment_repository.rs
//
// Comment persistence for both story and chapter threads.
// The scope picks the collection; rows are otherwise identical.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use uuid::Uuid;

use crate::db::{format_timestamp, parse_timestamp, parse_uuid, placeholders, ConnectionPool};
use crate::domain::{Comment, CommentScope};
use crate::error::{AppError, AppResult};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn insert(&self, comment: &Comment) -> AppResult<()>;
    async fn get_by_id(&self, scope: CommentScope, id: Uuid) -> AppResult<Option<Comment>>;
    /// All comments of a parent, newest first
    async fn list_for_parent(&self, scope: CommentScope, parent_id: Uuid) -> AppResult<Vec<Comment>>;
    /// `NotFound` when missing
    async fn update_content(&self, scope: CommentScope, id: Uuid, content: &str) -> AppResult<()>;
    async fn delete(&self, scope: CommentScope, id: Uuid) -> AppResult<u64>;
    async fn count(&self, scope: CommentScope, parent_id: Uuid) -> AppResult<u64>;
    /// Count over a set of parents
    async fn count_in(&self, scope: CommentScope, parent_ids: &[Uuid]) -> AppResult<u64>;
    /// Per-parent counts in one query. Parents without comments are absent.
    async fn count_by_parent(&self, scope: CommentScope, parent_ids: &[Uuid]) -> AppResult<HashMap<Uuid, u64>>;
    async fn ids_for_parents(&self, scope: CommentScope, parent_ids: &[Uuid]) -> AppResult<Vec<Uuid>>;
    async fn delete_for_parents(&self, scope: CommentScope, parent_ids: &[Uuid]) -> AppResult<u64>;
}

pub struct SqliteCommentRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteCommentRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn select_sql(scope: CommentScope, filter: &str) -> String {
        format!(
            "SELECT id, {parent} AS parent_id, user_id, content, created_at FROM {table} WHERE {filter}",
            parent = scope.parent_column(),
            table = scope.collection(),
            filter = filter,
        )
    }

    fn row_to_comment(scope: CommentScope, row: &Row) -> rusqlite::Result<Comment> {
        let id: String = row.get("id")?;
        let parent_id: String = row.get("parent_id")?;
        let user_id: String = row.get("user_id")?;
        let created_at: String = row.get("created_at")?;

        Ok(Comment {
            id: parse_uuid(&id, 0)?,
            scope,
            parent_id: parse_uuid(&parent_id, 1)?,
            user_id: parse_uuid(&user_id, 2)?,
            content: row.get("content")?,
            created_at: parse_timestamp(&created_at, 4)?,
        })
    }
}

#[async_trait]
impl CommentRepository for SqliteCommentRepository {
    async fn insert(&self, comment: &Comment) -> AppResult<()> {
        let conn = self.pool.get()?;
        conn.execute(
            &format!(
                "INSERT INTO {} (id, {}, user_id, content, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                comment.scope.collection(),
                comment.scope.parent_column()
            ),
            params![
                comment.id.to_string(),
                comment.parent_id.to_string(),
                comment.user_id.to_string(),
                comment.content,
                format_timestamp(&comment.created_at),
            ],
        )?;
        Ok(())
    }

    async fn get_by_id(&self, scope: CommentScope, id: Uuid) -> AppResult<Option<Comment>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&Self::select_sql(scope, "id = ?1"))?;
        Ok(stmt
            .query_row(params![id.to_string()], |row| Self::row_to_comment(scope, row))
            .optional()?)
    }

    async fn list_for_parent(&self, scope: CommentScope, parent_id: Uuid) -> AppResult<Vec<Comment>> {
        let conn = self.pool.get()?;
        let sql = format!(
            "{} ORDER BY created_at DESC",
            Self::select_sql(scope, &format!("{} = ?1", scope.parent_column()))
        );
        let mut stmt = conn.prepare(&sql)?;
        let comments = stmt
            .query_map(params![parent_id.to_string()], |row| Self::row_to_comment(scope, row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(comments)
    }

    async fn update_content(&self, scope: CommentScope, id: Uuid, content: &str) -> AppResult<()> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            &format!("UPDATE {} SET content = ?2 WHERE id = ?1", scope.collection()),
            params![id.to_string(), content],
        )?;
        if rows == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, scope: CommentScope, id: Uuid) -> AppResult<u64> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", scope.collection()),
            params![id.to_string()],
        )?;
        Ok(rows as u64)
    }

    async fn count(&self, scope: CommentScope, parent_id: Uuid) -> AppResult<u64> {
        self.count_in(scope, &[parent_id]).await
    }

    async fn count_in(&self, scope: CommentScope, parent_ids: &[Uuid]) -> AppResult<u64> {
        if parent_ids.is_empty() {
            return Ok(0);
        }
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE {} IN ({})",
                scope.collection(),
                scope.parent_column(),
                placeholders(parent_ids.len())
            ),
            params_from_iter(parent_ids.iter().map(Uuid::to_string)),
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    async fn count_by_parent(&self, scope: CommentScope, parent_ids: &[Uuid]) -> AppResult<HashMap<Uuid, u64>> {
        if parent_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {col}, COUNT(*) FROM {table} WHERE {col} IN ({list}) GROUP BY {col}",
            col = scope.parent_column(),
            table = scope.collection(),
            list = placeholders(parent_ids.len())
        ))?;

        let counts = stmt
            .query_map(params_from_iter(parent_ids.iter().map(Uuid::to_string)), |row| {
                let raw: String = row.get(0)?;
                let n: i64 = row.get(1)?;
                Ok((parse_uuid(&raw, 0)?, n as u64))
            })?
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(counts)
    }

    async fn ids_for_parents(&self, scope: CommentScope, parent_ids: &[Uuid]) -> AppResult<Vec<Uuid>> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT id FROM {} WHERE {} IN ({})",
            scope.collection(),
            scope.parent_column(),
            placeholders(parent_ids.len())
        ))?;
        let ids = stmt
            .query_map(params_from_iter(parent_ids.iter().map(Uuid::to_string)), |row| {
                let raw: String = row.get(0)?;
                parse_uuid(&raw, 0)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    async fn delete_for_parents(&self, scope: CommentScope, parent_ids: &[Uuid]) -> AppResult<u64> {
        if parent_ids.is_empty() {
            return Ok(0);
        }
        let conn = self.pool.get()?;
        let rows = conn.execute(
            &format!(
                "DELETE FROM {} WHERE {} IN ({})",
                scope.collection(),
                scope.parent_column(),
                placeholders(parent_ids.len())
            ),
            params_from_iter(parent_ids.iter().map(Uuid::to_string)),
        )?;
        Ok(rows as u64)
    }
}
