// src/db/migrations.rs
//
// Database schema initialization and migrations
//
// PRINCIPLES:
// - Explicit schema versions
// - No automatic migrations
// - Idempotent operations

use rusqlite::Connection;

use crate::domain::FactKind;
use crate::error::{AppError, AppResult};

/// Current schema version
/// Increment this when adding migrations
const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
///
/// Safe to call multiple times (idempotent).
pub fn initialize_database(conn: &Connection) -> AppResult<()> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        apply_initial_schema(conn)?;
        set_schema_version(conn, CURRENT_SCHEMA_VERSION)?;
        log::info!("local store initialized at schema version {}", CURRENT_SCHEMA_VERSION);
    } else if current_version < CURRENT_SCHEMA_VERSION {
        return Err(AppError::Other(format!(
            "Schema version {} is outdated. Expected {}. Manual migration required.",
            current_version, CURRENT_SCHEMA_VERSION
        )));
    } else if current_version > CURRENT_SCHEMA_VERSION {
        return Err(AppError::Other(format!(
            "Schema version {} is newer than supported {}. Update the application.",
            current_version, CURRENT_SCHEMA_VERSION
        )));
    }

    Ok(())
}

/// Returns 0 if schema_version table doesn't exist (fresh database)
fn get_schema_version(conn: &Connection) -> AppResult<i32> {
    let table_exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get(0),
    )?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;

    Ok(version.unwrap_or(0))
}

fn set_schema_version(conn: &Connection, version: i32) -> AppResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?1, datetime('now'))",
        [version],
    )?;
    Ok(())
}

fn apply_initial_schema(conn: &Connection) -> AppResult<()> {
    let schema = include_str!("../../schema.sql");

    conn.execute_batch(schema)
        .map_err(|e| AppError::Other(format!("Failed to apply initial schema: {}", e)))?;

    Ok(())
}

/// Row counts per collection, for debugging and residual checks
pub fn get_database_stats(conn: &Connection) -> AppResult<DatabaseStats> {
    let count = |table: &str| -> AppResult<i64> {
        Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?)
    };

    let mut fact_counts = Vec::with_capacity(FactKind::ALL.len());
    for kind in FactKind::ALL {
        fact_counts.push((kind, count(kind.collection())?));
    }

    Ok(DatabaseStats {
        profile_count: count("profiles")?,
        story_count: count("stories")?,
        chapter_count: count("chapters")?,
        single_story_count: count("single_stories")?,
        comment_count: count("story_comments")? + count("chapter_comments")?,
        fact_counts,
    })
}

/// Database statistics
#[derive(Debug)]
pub struct DatabaseStats {
    pub profile_count: i64,
    pub story_count: i64,
    pub chapter_count: i64,
    pub single_story_count: i64,
    pub comment_count: i64,
    pub fact_counts: Vec<(FactKind, i64)>,
}

impl DatabaseStats {
    /// Total number of rows across every collection
    pub fn total_rows(&self) -> i64 {
        self.profile_count
            + self.story_count
            + self.chapter_count
            + self.single_story_count
            + self.comment_count
            + self.fact_counts.iter().map(|(_, n)| n).sum::<i64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn test_initialize_fresh_database() {
        let conn = conn();
        assert_eq!(get_schema_version(&conn).unwrap(), 0);

        initialize_database(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), 1);

        let table_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(table_count, 12, "schema_version + 11 collections");
    }

    #[test]
    fn test_initialize_idempotent() {
        let conn = conn();
        initialize_database(&conn).unwrap();
        initialize_database(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), 1);
    }

    #[test]
    fn test_like_uniqueness_enforced() {
        let conn = conn();
        initialize_database(&conn).unwrap();

        conn.execute(
            "INSERT INTO story_likes (story_id, user_id, created_at) VALUES ('s', 'u', 'now')",
            [],
        )
        .unwrap();
        let second = conn.execute(
            "INSERT INTO story_likes (story_id, user_id, created_at) VALUES ('s', 'u', 'now')",
            [],
        );
        assert!(second.is_err());
    }

    #[test]
    fn test_database_stats_empty() {
        let conn = conn();
        initialize_database(&conn).unwrap();

        let stats = get_database_stats(&conn).unwrap();
        assert_eq!(stats.total_rows(), 0);
        assert_eq!(stats.fact_counts.len(), 5);
    }
}
