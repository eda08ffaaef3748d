// src/repositories/engagement_repository.rs
//
// Join facts: views and likes.
//
// Facts have no identity beyond (parent, user). Like inserts are
// idempotent; view inserts always add a row.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, params_from_iter};
use uuid::Uuid;

use crate::db::{format_timestamp, parse_uuid, placeholders, ConnectionPool};
use crate::domain::FactKind;
use crate::error::AppResult;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EngagementRepository: Send + Sync {
    async fn record(&self, kind: FactKind, parent_id: Uuid, user_id: Uuid) -> AppResult<()>;
    /// Removes the user's facts for a parent; returns rows removed
    async fn remove(&self, kind: FactKind, parent_id: Uuid, user_id: Uuid) -> AppResult<u64>;
    async fn exists(&self, kind: FactKind, parent_id: Uuid, user_id: Uuid) -> AppResult<bool>;
    async fn count(&self, kind: FactKind, parent_id: Uuid) -> AppResult<u64>;
    /// One count over a set of parents
    async fn count_in(&self, kind: FactKind, parent_ids: &[Uuid]) -> AppResult<u64>;
    /// Per-parent counts in one query. Parents with no facts are absent.
    async fn count_by_parent(&self, kind: FactKind, parent_ids: &[Uuid]) -> AppResult<HashMap<Uuid, u64>>;
    /// The subset of `parent_ids` the user has a fact for
    async fn liked_among(&self, kind: FactKind, user_id: Uuid, parent_ids: &[Uuid]) -> AppResult<HashSet<Uuid>>;
    async fn delete_for_parents(&self, kind: FactKind, parent_ids: &[Uuid]) -> AppResult<u64>;
}

pub struct SqliteEngagementRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteEngagementRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EngagementRepository for SqliteEngagementRepository {
    async fn record(&self, kind: FactKind, parent_id: Uuid, user_id: Uuid) -> AppResult<()> {
        let conn = self.pool.get()?;
        let verb = if kind.is_like() { "INSERT OR IGNORE" } else { "INSERT" };
        conn.execute(
            &format!(
                "{} INTO {} ({}, user_id, created_at) VALUES (?1, ?2, ?3)",
                verb,
                kind.collection(),
                kind.parent_column()
            ),
            params![
                parent_id.to_string(),
                user_id.to_string(),
                format_timestamp(&Utc::now()),
            ],
        )?;
        Ok(())
    }

    async fn remove(&self, kind: FactKind, parent_id: Uuid, user_id: Uuid) -> AppResult<u64> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            &format!(
                "DELETE FROM {} WHERE {} = ?1 AND user_id = ?2",
                kind.collection(),
                kind.parent_column()
            ),
            params![parent_id.to_string(), user_id.to_string()],
        )?;
        Ok(rows as u64)
    }

    async fn exists(&self, kind: FactKind, parent_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let conn = self.pool.get()?;
        let found: bool = conn.query_row(
            &format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ?1 AND user_id = ?2)",
                kind.collection(),
                kind.parent_column()
            ),
            params![parent_id.to_string(), user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(found)
    }

    async fn count(&self, kind: FactKind, parent_id: Uuid) -> AppResult<u64> {
        self.count_in(kind, &[parent_id]).await
    }

    async fn count_in(&self, kind: FactKind, parent_ids: &[Uuid]) -> AppResult<u64> {
        if parent_ids.is_empty() {
            return Ok(0);
        }
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE {} IN ({})",
                kind.collection(),
                kind.parent_column(),
                placeholders(parent_ids.len())
            ),
            params_from_iter(parent_ids.iter().map(Uuid::to_string)),
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    async fn count_by_parent(&self, kind: FactKind, parent_ids: &[Uuid]) -> AppResult<HashMap<Uuid, u64>> {
        if parent_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {col}, COUNT(*) FROM {table} WHERE {col} IN ({list}) GROUP BY {col}",
            col = kind.parent_column(),
            table = kind.collection(),
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

    async fn liked_among(&self, kind: FactKind, user_id: Uuid, parent_ids: &[Uuid]) -> AppResult<HashSet<Uuid>> {
        if parent_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT DISTINCT {col} FROM {table} WHERE user_id = ? AND {col} IN ({list})",
            col = kind.parent_column(),
            table = kind.collection(),
            list = placeholders(parent_ids.len())
        ))?;

        let args = std::iter::once(user_id.to_string())
            .chain(parent_ids.iter().map(Uuid::to_string));
        let liked = stmt
            .query_map(params_from_iter(args), |row| {
                let raw: String = row.get(0)?;
                parse_uuid(&raw, 0)
            })?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(liked)
    }

    async fn delete_for_parents(&self, kind: FactKind, parent_ids: &[Uuid]) -> AppResult<u64> {
        if parent_ids.is_empty() {
            return Ok(0);
        }
        let conn = self.pool.get()?;
        let rows = conn.execute(
            &format!(
                "DELETE FROM {} WHERE {} IN ({})",
                kind.collection(),
                kind.parent_column(),
                placeholders(parent_ids.len())
            ),
            params_from_iter(parent_ids.iter().map(Uuid::to_string)),
        )?;
        Ok(rows as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support::memory_store;

    #[tokio::test]
    async fn test_views_are_not_deduplicated() {
        let repo = SqliteEngagementRepository::new(memory_store());
        let (story, user) = (Uuid::new_v4(), Uuid::new_v4());

        repo.record(FactKind::StoryView, story, user).await.unwrap();
        repo.record(FactKind::StoryView, story, user).await.unwrap();
        assert_eq!(repo.count(FactKind::StoryView, story).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_like_insert_is_idempotent() {
        let repo = SqliteEngagementRepository::new(memory_store());
        let (chapter, user) = (Uuid::new_v4(), Uuid::new_v4());

        repo.record(FactKind::ChapterLike, chapter, user).await.unwrap();
        repo.record(FactKind::ChapterLike, chapter, user).await.unwrap();
        assert_eq!(repo.count(FactKind::ChapterLike, chapter).await.unwrap(), 1);
        assert!(repo.exists(FactKind::ChapterLike, chapter, user).await.unwrap());

        assert_eq!(repo.remove(FactKind::ChapterLike, chapter, user).await.unwrap(), 1);
        assert!(!repo.exists(FactKind::ChapterLike, chapter, user).await.unwrap());
    }

    #[tokio::test]
    async fn test_grouped_counts_and_membership() {
        let repo = SqliteEngagementRepository::new(memory_store());
        let (c1, c2, c3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let (me, other) = (Uuid::new_v4(), Uuid::new_v4());

        repo.record(FactKind::StoryCommentLike, c1, me).await.unwrap();
        repo.record(FactKind::StoryCommentLike, c1, other).await.unwrap();
        repo.record(FactKind::StoryCommentLike, c2, other).await.unwrap();

        let counts = repo
            .count_by_parent(FactKind::StoryCommentLike, &[c1, c2, c3])
            .await
            .unwrap();
        assert_eq!(counts.get(&c1), Some(&2));
        assert_eq!(counts.get(&c2), Some(&1));
        assert_eq!(counts.get(&c3), None);

        let liked = repo
            .liked_among(FactKind::StoryCommentLike, me, &[c1, c2, c3])
            .await
            .unwrap();
        assert_eq!(liked, HashSet::from([c1]));

        assert_eq!(repo.count_in(FactKind::StoryCommentLike, &[c1, c2]).await.unwrap(), 3);
        assert_eq!(repo.delete_for_parents(FactKind::StoryCommentLike, &[c1]).await.unwrap(), 2);
        assert_eq!(repo.count_in(FactKind::StoryCommentLike, &[c1, c2]).await.unwrap(), 1);
    }
}
