// src/repositories/profile_repository.rs
//
// Profile persistence

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use uuid::Uuid;

use crate::db::{format_timestamp, parse_timestamp, parse_uuid, placeholders, ConnectionPool};
use crate::domain::Profile;
use crate::error::{AppError, AppResult};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Insert or replace the whole row
    async fn save(&self, profile: &Profile) -> AppResult<()>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Profile>>;
    /// Batched read; missing ids are skipped
    async fn get_many(&self, ids: &[Uuid]) -> AppResult<Vec<Profile>>;
    /// Update editable fields. `NotFound` when the row is missing.
    async fn update(&self, profile: &Profile) -> AppResult<()>;
}

pub struct SqliteProfileRepository {
    pool: Arc<ConnectionPool>,
}

const PROFILE_COLUMNS: &str =
    "id, first_name, last_name, username, bio, avatar_url, email, created_at, updated_at";

impl SqliteProfileRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_profile(row: &Row) -> rusqlite::Result<Profile> {
        let id: String = row.get("id")?;
        let created_at: String = row.get("created_at")?;
        let updated_at: String = row.get("updated_at")?;

        Ok(Profile {
            id: parse_uuid(&id, 0)?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            username: row.get("username")?,
            bio: row.get("bio")?,
            avatar_url: row.get("avatar_url")?,
            email: row.get("email")?,
            created_at: parse_timestamp(&created_at, 7)?,
            updated_at: parse_timestamp(&updated_at, 8)?,
        })
    }
}

#[async_trait]
impl ProfileRepository for SqliteProfileRepository {
    async fn save(&self, profile: &Profile) -> AppResult<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT OR REPLACE INTO profiles (
                id, first_name, last_name, username, bio, avatar_url, email,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                profile.id.to_string(),
                profile.first_name,
                profile.last_name,
                profile.username,
                profile.bio,
                profile.avatar_url,
                profile.email,
                format_timestamp(&profile.created_at),
                format_timestamp(&profile.updated_at),
            ],
        )?;
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Profile>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM profiles WHERE id = ?1",
            PROFILE_COLUMNS
        ))?;

        Ok(stmt
            .query_row(params![id.to_string()], Self::row_to_profile)
            .optional()?)
    }

    async fn get_many(&self, ids: &[Uuid]) -> AppResult<Vec<Profile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM profiles WHERE id IN ({})",
            PROFILE_COLUMNS,
            placeholders(ids.len())
        ))?;

        let profiles = stmt
            .query_map(params_from_iter(ids.iter().map(Uuid::to_string)), Self::row_to_profile)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(profiles)
    }

    async fn update(&self, profile: &Profile) -> AppResult<()> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE profiles
             SET first_name = ?2, last_name = ?3, username = ?4, bio = ?5,
                 avatar_url = ?6, updated_at = ?7
             WHERE id = ?1",
            params![
                profile.id.to_string(),
                profile.first_name,
                profile.last_name,
                profile.username,
                profile.bio,
                profile.avatar_url,
                format_timestamp(&profile.updated_at),
            ],
        )?;

        if rows == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
