// src/integrations/hosted/store.rs
//
// Repository implementations over the hosted REST collections
//
// Same contracts as the SQLite repositories. The REST layer has no
// GROUP BY and caps the rows of one response, so grouped counts are one
// exact HEAD count per parent and list reads page until exhausted.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::domain::{Chapter, Comment, CommentScope, FactKind, Profile, SingleStory, Story};
use crate::error::{AppError, AppResult};
use crate::integrations::hosted::client::{Conflict, HostedClient, Query};
use crate::repositories::{
    ChapterRepository, CommentRepository, EngagementRepository, ProfileRepository,
    SingleStoryRepository, StoryRepository,
};

pub struct HostedStore {
    client: Arc<HostedClient>,
}

impl HostedStore {
    pub fn new(client: Arc<HostedClient>) -> Self {
        Self { client }
    }

    fn first<T>(rows: Vec<T>) -> Option<T> {
        rows.into_iter().next()
    }

    /// One exact HEAD count per distinct parent (N requests for N parents).
    /// Parents without rows are left out, as with a grouped query.
    async fn counts_per_parent(
        &self,
        collection: &str,
        column: &str,
        parent_ids: &[Uuid],
    ) -> AppResult<HashMap<Uuid, u64>> {
        let mut counts = HashMap::new();
        for parent_id in distinct(parent_ids) {
            let n = self
                .client
                .count(collection, &parent_count_query(column, parent_id))
                .await?;
            if n > 0 {
                counts.insert(parent_id, n);
            }
        }
        Ok(counts)
    }
}

#[derive(Debug, Deserialize)]
struct IdRow {
    id: Uuid,
}

#[derive(Debug, Deserialize)]
struct NumberRow {
    chapter_number: u32,
}

/// Comment row as stored; the parent column depends on the collection
#[derive(Debug, Deserialize)]
struct CommentRow {
    id: Uuid,
    user_id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    story_id: Option<Uuid>,
    #[serde(default)]
    chapter_id: Option<Uuid>,
}

impl CommentRow {
    fn into_comment(self, scope: CommentScope) -> AppResult<Comment> {
        let parent_id = match scope {
            CommentScope::Story => self.story_id,
            CommentScope::Chapter => self.chapter_id,
        }
        .ok_or_else(|| AppError::Backend(format!("comment {} has no parent", self.id)))?;

        Ok(Comment {
            id: self.id,
            scope,
            parent_id,
            user_id: self.user_id,
            content: self.content,
            created_at: self.created_at,
        })
    }
}

/// Parent ids of fact rows, keyed by whichever parent column was selected
fn parent_ids(rows: Vec<Value>, column: &str) -> AppResult<Vec<Uuid>> {
    rows.iter()
        .map(|row| {
            row.get(column)
                .and_then(Value::as_str)
                .ok_or_else(|| AppError::Backend(format!("fact row without {}", column)))
                .and_then(|raw| Ok(Uuid::parse_str(raw)?))
        })
        .collect()
}

/// `ids` without repeats, in first-seen order
fn distinct(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Exact count filter for one parent
fn parent_count_query(column: &str, parent_id: Uuid) -> Query {
    Query::new().eq(column, parent_id)
}

fn not_found_if_zero(rows: u64) -> AppResult<()> {
    if rows == 0 {
        Err(AppError::NotFound)
    } else {
        Ok(())
    }
}

// ============================================================================
// PROFILES
// ============================================================================

#[async_trait]
impl ProfileRepository for HostedStore {
    async fn save(&self, profile: &Profile) -> AppResult<()> {
        self.client
            .insert("profiles", profile, Conflict::Merge, &Query::new().on_conflict("id"))
            .await
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Profile>> {
        let rows = self
            .client
            .select("profiles", &Query::new().select("*").eq("id", id).limit(1))
            .await?;
        Ok(Self::first(rows))
    }

    async fn get_many(&self, ids: &[Uuid]) -> AppResult<Vec<Profile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.client
            .select_all("profiles", &Query::new().select("*").in_list("id", ids))
            .await
    }

    async fn update(&self, profile: &Profile) -> AppResult<()> {
        let patch = json!({
            "first_name": profile.first_name,
            "last_name": profile.last_name,
            "username": profile.username,
            "bio": profile.bio,
            "avatar_url": profile.avatar_url,
            "email": profile.email,
            "updated_at": profile.updated_at,
        });
        let rows = self
            .client
            .update("profiles", &Query::new().eq("id", profile.id), &patch)
            .await?;
        not_found_if_zero(rows)
    }
}

// ============================================================================
// STORIES
// ============================================================================

#[async_trait]
impl StoryRepository for HostedStore {
    async fn insert(&self, story: &Story) -> AppResult<()> {
        self.client
            .insert("stories", story, Conflict::Fail, &Query::new())
            .await
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Story>> {
        let rows = self
            .client
            .select("stories", &Query::new().select("*").eq("id", id).limit(1))
            .await?;
        Ok(Self::first(rows))
    }

    async fn list_by_owner(&self, user_id: Uuid) -> AppResult<Vec<Story>> {
        self.client
            .select_all(
                "stories",
                &Query::new()
                    .select("*")
                    .eq("user_id", user_id)
                    .order("created_at", true),
            )
            .await
    }

    async fn list_recent(&self, limit: u32) -> AppResult<Vec<Story>> {
        self.client
            .select(
                "stories",
                &Query::new().select("*").order("created_at", true).limit(limit),
            )
            .await
    }

    async fn update(&self, story: &Story) -> AppResult<()> {
        let patch = json!({
            "title": story.title,
            "description": story.description,
            "cover_image_url": story.cover_image_url,
            "tags": story.tags,
            "content_type": story.content_type,
            "categories": story.categories,
            "status": story.status,
            "is_chapters": story.is_chapters,
            "updated_at": story.updated_at,
        });
        let rows = self
            .client
            .update("stories", &Query::new().eq("id", story.id), &patch)
            .await?;
        not_found_if_zero(rows)
    }

    async fn delete(&self, id: Uuid) -> AppResult<u64> {
        self.client.delete("stories", &Query::new().eq("id", id)).await
    }
}

// ============================================================================
// CHAPTERS AND SINGLE BODIES
// ============================================================================

#[async_trait]
impl ChapterRepository for HostedStore {
    async fn insert(&self, chapter: &Chapter) -> AppResult<()> {
        self.client
            .insert("chapters", chapter, Conflict::Fail, &Query::new())
            .await
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Chapter>> {
        let rows = self
            .client
            .select("chapters", &Query::new().select("*").eq("id", id).limit(1))
            .await?;
        Ok(Self::first(rows))
    }

    async fn list_by_story(&self, story_id: Uuid) -> AppResult<Vec<Chapter>> {
        self.client
            .select_all(
                "chapters",
                &Query::new()
                    .select("*")
                    .eq("story_id", story_id)
                    .order("chapter_number", false),
            )
            .await
    }

    async fn max_number(&self, story_id: Uuid) -> AppResult<Option<u32>> {
        let rows: Vec<NumberRow> = self
            .client
            .select(
                "chapters",
                &Query::new()
                    .select("chapter_number")
                    .eq("story_id", story_id)
                    .order("chapter_number", true)
                    .limit(1),
            )
            .await?;
        Ok(Self::first(rows).map(|r| r.chapter_number))
    }

    async fn update(&self, chapter: &Chapter) -> AppResult<()> {
        let patch = json!({
            "title": chapter.title,
            "content": chapter.content,
            "updated_at": chapter.updated_at,
        });
        let rows = self
            .client
            .update("chapters", &Query::new().eq("id", chapter.id), &patch)
            .await?;
        not_found_if_zero(rows)
    }

    async fn ids_by_story(&self, story_id: Uuid) -> AppResult<Vec<Uuid>> {
        let rows: Vec<IdRow> = self
            .client
            .select_all("chapters", &Query::new().select("id").eq("story_id", story_id))
            .await?;
        Ok(rows.into_iter().map(|r| r.id).collect())
    }

    async fn delete_by_story(&self, story_id: Uuid) -> AppResult<u64> {
        self.client
            .delete("chapters", &Query::new().eq("story_id", story_id))
            .await
    }
}

#[async_trait]
impl SingleStoryRepository for HostedStore {
    async fn get_by_story(&self, story_id: Uuid) -> AppResult<Option<SingleStory>> {
        let rows = self
            .client
            .select(
                "single_stories",
                &Query::new().select("*").eq("story_id", story_id).limit(1),
            )
            .await?;
        Ok(Self::first(rows))
    }

    async fn insert(&self, body: &SingleStory) -> AppResult<()> {
        self.client
            .insert("single_stories", body, Conflict::Fail, &Query::new())
            .await
    }

    async fn update_content(&self, story_id: Uuid, content: &str) -> AppResult<()> {
        let patch = json!({ "content": content, "updated_at": Utc::now() });
        let rows = self
            .client
            .update("single_stories", &Query::new().eq("story_id", story_id), &patch)
            .await?;
        not_found_if_zero(rows)
    }

    async fn delete_by_story(&self, story_id: Uuid) -> AppResult<u64> {
        self.client
            .delete("single_stories", &Query::new().eq("story_id", story_id))
            .await
    }
}

// ============================================================================
// COMMENTS
// ============================================================================

#[async_trait]
impl CommentRepository for HostedStore {
    async fn insert(&self, comment: &Comment) -> AppResult<()> {
        let mut row = json!({
            "id": comment.id,
            "user_id": comment.user_id,
            "content": comment.content,
            "created_at": comment.created_at,
        });
        row[comment.scope.parent_column()] = json!(comment.parent_id);
        self.client
            .insert(comment.scope.collection(), &row, Conflict::Fail, &Query::new())
            .await
    }

    async fn get_by_id(&self, scope: CommentScope, id: Uuid) -> AppResult<Option<Comment>> {
        let rows: Vec<CommentRow> = self
            .client
            .select(scope.collection(), &Query::new().select("*").eq("id", id).limit(1))
            .await?;
        Self::first(rows).map(|r| r.into_comment(scope)).transpose()
    }

    async fn list_for_parent(&self, scope: CommentScope, parent_id: Uuid) -> AppResult<Vec<Comment>> {
        let rows: Vec<CommentRow> = self
            .client
            .select_all(
                scope.collection(),
                &Query::new()
                    .select("*")
                    .eq(scope.parent_column(), parent_id)
                    .order("created_at", true),
            )
            .await?;
        rows.into_iter().map(|r| r.into_comment(scope)).collect()
    }

    async fn update_content(&self, scope: CommentScope, id: Uuid, content: &str) -> AppResult<()> {
        let rows = self
            .client
            .update(scope.collection(), &Query::new().eq("id", id), &json!({ "content": content }))
            .await?;
        not_found_if_zero(rows)
    }

    async fn delete(&self, scope: CommentScope, id: Uuid) -> AppResult<u64> {
        self.client
            .delete(scope.collection(), &Query::new().eq("id", id))
            .await
    }

    async fn count(&self, scope: CommentScope, parent_id: Uuid) -> AppResult<u64> {
        self.client
            .count(scope.collection(), &Query::new().eq(scope.parent_column(), parent_id))
            .await
    }

    async fn count_in(&self, scope: CommentScope, parent_ids: &[Uuid]) -> AppResult<u64> {
        if parent_ids.is_empty() {
            return Ok(0);
        }
        self.client
            .count(
                scope.collection(),
                &Query::new().in_list(scope.parent_column(), parent_ids),
            )
            .await
    }

    async fn count_by_parent(&self, scope: CommentScope, parent_ids: &[Uuid]) -> AppResult<HashMap<Uuid, u64>> {
        self.counts_per_parent(scope.collection(), scope.parent_column(), parent_ids)
            .await
    }

    async fn ids_for_parents(&self, scope: CommentScope, parent_ids: &[Uuid]) -> AppResult<Vec<Uuid>> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<IdRow> = self
            .client
            .select_all(
                scope.collection(),
                &Query::new()
                    .select("id")
                    .in_list(scope.parent_column(), parent_ids),
            )
            .await?;
        Ok(rows.into_iter().map(|r| r.id).collect())
    }

    async fn delete_for_parents(&self, scope: CommentScope, parent_ids: &[Uuid]) -> AppResult<u64> {
        if parent_ids.is_empty() {
            return Ok(0);
        }
        self.client
            .delete(
                scope.collection(),
                &Query::new().in_list(scope.parent_column(), parent_ids),
            )
            .await
    }
}

// ============================================================================
// ENGAGEMENT FACTS
// ============================================================================

#[async_trait]
impl EngagementRepository for HostedStore {
    async fn record(&self, kind: FactKind, parent_id: Uuid, user_id: Uuid) -> AppResult<()> {
        let (row, conflict, query) = fact_insert(kind, parent_id, user_id);
        self.client
            .insert(kind.collection(), &row, conflict, &query)
            .await
    }

    async fn remove(&self, kind: FactKind, parent_id: Uuid, user_id: Uuid) -> AppResult<u64> {
        self.client
            .delete(
                kind.collection(),
                &Query::new()
                    .eq(kind.parent_column(), parent_id)
                    .eq("user_id", user_id),
            )
            .await
    }

    async fn exists(&self, kind: FactKind, parent_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let rows: Vec<Value> = self
            .client
            .select(
                kind.collection(),
                &Query::new()
                    .select(kind.parent_column())
                    .eq(kind.parent_column(), parent_id)
                    .eq("user_id", user_id)
                    .limit(1),
            )
            .await?;
        Ok(!rows.is_empty())
    }

    async fn count(&self, kind: FactKind, parent_id: Uuid) -> AppResult<u64> {
        self.client
            .count(kind.collection(), &Query::new().eq(kind.parent_column(), parent_id))
            .await
    }

    async fn count_in(&self, kind: FactKind, parent_ids: &[Uuid]) -> AppResult<u64> {
        if parent_ids.is_empty() {
            return Ok(0);
        }
        self.client
            .count(
                kind.collection(),
                &Query::new().in_list(kind.parent_column(), parent_ids),
            )
            .await
    }

    async fn count_by_parent(&self, kind: FactKind, parent_ids: &[Uuid]) -> AppResult<HashMap<Uuid, u64>> {
        self.counts_per_parent(kind.collection(), kind.parent_column(), parent_ids)
            .await
    }

    async fn liked_among(&self, kind: FactKind, user_id: Uuid, parent_ids: &[Uuid]) -> AppResult<HashSet<Uuid>> {
        if parent_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let rows: Vec<Value> = self
            .client
            .select_all(
                kind.collection(),
                &Query::new()
                    .select(kind.parent_column())
                    .eq("user_id", user_id)
                    .in_list(kind.parent_column(), parent_ids)
                    // fact rows have no id; equal keys are interchangeable here
                    .order(kind.parent_column(), false),
            )
            .await?;
        Ok(self::parent_ids(rows, kind.parent_column())?.into_iter().collect())
    }

    async fn delete_for_parents(&self, kind: FactKind, parent_ids: &[Uuid]) -> AppResult<u64> {
        if parent_ids.is_empty() {
            return Ok(0);
        }
        self.client
            .delete(
                kind.collection(),
                &Query::new().in_list(kind.parent_column(), parent_ids),
            )
            .await
    }
}

/// Row and insert mode for one engagement fact. Likes are plain inserts:
/// the hosted tables carry no unique key on (parent, user), so duplicates
/// are kept out by the read-before-write in the like toggle.
fn fact_insert(kind: FactKind, parent_id: Uuid, user_id: Uuid) -> (Value, Conflict, Query) {
    let mut row = json!({ "user_id": user_id, "created_at": Utc::now() });
    row[kind.parent_column()] = json!(parent_id);
    (row, Conflict::Fail, Query::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_row_picks_scope_parent() {
        let (id, user, story) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let raw = json!({
            "id": id,
            "user_id": user,
            "story_id": story,
            "content": "Nice!",
            "created_at": "2024-05-01T10:00:00Z",
        });
        let row: CommentRow = serde_json::from_value(raw).unwrap();
        let comment = row.into_comment(CommentScope::Story).unwrap();
        assert_eq!(comment.parent_id, story);
        assert_eq!(comment.scope, CommentScope::Story);
    }

    #[test]
    fn test_comment_row_without_parent_is_rejected() {
        let raw = json!({
            "id": Uuid::new_v4(),
            "user_id": Uuid::new_v4(),
            "story_id": Uuid::new_v4(),
            "content": "x",
            "created_at": "2024-05-01T10:00:00Z",
        });
        let row: CommentRow = serde_json::from_value(raw).unwrap();
        assert!(row.into_comment(CommentScope::Chapter).is_err());
    }

    #[test]
    fn test_fact_rows_to_parent_ids() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let rows = vec![
            json!({ "comment_id": a }),
            json!({ "comment_id": b }),
            json!({ "comment_id": a }),
        ];
        assert_eq!(parent_ids(rows, "comment_id").unwrap(), vec![a, b, a]);
        assert!(parent_ids(vec![json!({ "story_id": a })], "comment_id").is_err());
    }

    #[test]
    fn test_like_insert_is_plain() {
        let (parent, user) = (Uuid::new_v4(), Uuid::new_v4());
        for kind in [FactKind::StoryLike, FactKind::ChapterLike, FactKind::StoryCommentLike] {
            let (row, conflict, query) = fact_insert(kind, parent, user);
            assert_eq!(conflict, Conflict::Fail);
            assert!(!query.has("on_conflict"));
            assert_eq!(row[kind.parent_column()], json!(parent));
            assert_eq!(row["user_id"], json!(user));
        }
    }

    #[test]
    fn test_grouped_counts_are_one_exact_count_per_parent() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(distinct(&[a, b, a, a]), vec![a, b]);

        let query = parent_count_query("story_id", a);
        assert_eq!(query.params(), &[("story_id".to_string(), format!("eq.{}", a))]);
        assert!(!query.has("limit"));
    }

    #[test]
    fn test_story_row_deserializes_with_null_lists() {
        let raw = json!({
            "id": Uuid::new_v4(),
            "user_id": Uuid::new_v4(),
            "title": "Dağlar",
            "description": null,
            "cover_image_url": null,
            "tags": null,
            "content_type": "şeir",
            "categories": ["Lirik"],
            "status": "draft",
            "is_chapters": false,
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-05-01T10:00:00Z",
        });
        let story: Story = serde_json::from_value(raw).unwrap();
        assert!(story.tags.is_empty());
        assert_eq!(story.content_type, crate::domain::ContentType::Poem);
    }
}
