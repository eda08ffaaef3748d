// src/services/story_service.rs
//
// Story Service - Authoring and Deletion
//
// CRITICAL RULES:
// - Every write requires the actor to own the story
// - Input rules are enforced here, before anything is persisted
// - is_chapters follows the last body written (single body or chapter)
// - Deletion removes dependents first, story row last

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{
    is_owner, next_chapter_number, normalize_tags, timestamp_now, validate_chapter,
    validate_single_story, validate_story, Actor, Chapter, CommentScope, ContentType,
    EngagementStats, FactKind, SingleStory, Story, StoryStatus,
};
use crate::error::{AppError, AppResult};
use crate::events::{ChapterAdded, CollectionInvalidated, EventBus, StoryCreated, StoryDeleted};
use crate::infrastructure::{cover_path, store_public, Bucket, ObjectStorage, Upload};
use crate::repositories::{
    ChapterRepository, CommentRepository, EngagementRepository, Repositories,
    SingleStoryRepository, StoryRepository,
};
use crate::services::AggregationService;

/// Request to create a new story
#[derive(Debug, Clone)]
pub struct CreateStoryRequest {
    pub title: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub content_type: ContentType,
    pub categories: Vec<String>,
    pub cover: Option<Upload>,
}

/// Request to update story metadata
#[derive(Debug, Clone)]
pub struct UpdateStoryRequest {
    pub story_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub content_type: ContentType,
    pub categories: Vec<String>,
    /// Replaces the current cover when present
    pub cover: Option<Upload>,
    /// Keeps the current status when absent
    pub status: Option<StoryStatus>,
}

/// A story with its aggregate counts, for listings
#[derive(Debug, Clone, Serialize)]
pub struct StorySummary {
    pub story: Story,
    pub stats: EngagementStats,
}

/// One idempotent delete-by-filter in the story deletion sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DeletionStep {
    ChapterComments,
    ChapterLikes,
    ChapterViews,
    Chapters,
    SingleBody,
    StoryCommentLikes,
    StoryComments,
    StoryLikes,
    StoryViews,
    Story,
}

impl DeletionStep {
    /// Dependency order: nothing is removed before the rows that point at it
    pub const ORDER: [DeletionStep; 10] = [
        DeletionStep::ChapterComments,
        DeletionStep::ChapterLikes,
        DeletionStep::ChapterViews,
        DeletionStep::Chapters,
        DeletionStep::SingleBody,
        DeletionStep::StoryCommentLikes,
        DeletionStep::StoryComments,
        DeletionStep::StoryLikes,
        DeletionStep::StoryViews,
        DeletionStep::Story,
    ];
}

impl fmt::Display for DeletionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeletionStep::ChapterComments => "chapter_comments",
            DeletionStep::ChapterLikes => "chapter_likes",
            DeletionStep::ChapterViews => "chapter_views",
            DeletionStep::Chapters => "chapters",
            DeletionStep::SingleBody => "single_stories",
            DeletionStep::StoryCommentLikes => "story_comment_likes",
            DeletionStep::StoryComments => "story_comments",
            DeletionStep::StoryLikes => "story_likes",
            DeletionStep::StoryViews => "story_views",
            DeletionStep::Story => "stories",
        };
        f.write_str(name)
    }
}

/// Outcome of a story deletion.
///
/// When `failed` is set the story still exists and running the deletion
/// again continues where this one stopped.
#[derive(Debug, Clone, Serialize)]
pub struct DeletionReport {
    pub story_id: Uuid,
    /// Steps that finished, with rows removed by each
    pub completed: Vec<(DeletionStep, u64)>,
    pub failed: Option<(DeletionStep, String)>,
}

impl DeletionReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_none()
    }

    pub fn rows_removed(&self) -> u64 {
        self.completed.iter().map(|(_, n)| n).sum()
    }
}

pub struct StoryService {
    story_repo: Arc<dyn StoryRepository>,
    chapter_repo: Arc<dyn ChapterRepository>,
    single_story_repo: Arc<dyn SingleStoryRepository>,
    comment_repo: Arc<dyn CommentRepository>,
    engagement_repo: Arc<dyn EngagementRepository>,
    storage: Arc<dyn ObjectStorage>,
    aggregation: Arc<AggregationService>,
    event_bus: Arc<EventBus>,
    delete_max_attempts: u32,
}

impl StoryService {
    pub fn new(
        repos: &Repositories,
        storage: Arc<dyn ObjectStorage>,
        aggregation: Arc<AggregationService>,
        event_bus: Arc<EventBus>,
        delete_max_attempts: u32,
    ) -> Self {
        Self {
            story_repo: repos.stories.clone(),
            chapter_repo: repos.chapters.clone(),
            single_story_repo: repos.single_stories.clone(),
            comment_repo: repos.comments.clone(),
            engagement_repo: repos.engagement.clone(),
            storage,
            aggregation,
            event_bus,
            delete_max_attempts: delete_max_attempts.max(1),
        }
    }

    // ========================================================================
    // READS
    // ========================================================================

    pub async fn get_story(&self, story_id: Uuid) -> AppResult<Story> {
        self.story_repo
            .get_by_id(story_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// The story, provided `actor` owns it
    pub async fn require_owned(&self, story_id: Uuid, actor: Option<&Actor>) -> AppResult<Story> {
        let actor = actor.ok_or(AppError::Unauthenticated)?;
        let story = self.get_story(story_id).await?;
        if !is_owner(Some(actor), &story) {
            log::warn!("actor {} denied write on story {}", actor.id, story_id);
            return Err(AppError::Forbidden);
        }
        Ok(story)
    }

    pub async fn chapters(&self, story_id: Uuid) -> AppResult<Vec<Chapter>> {
        self.chapter_repo.list_by_story(story_id).await
    }

    /// A chapter of the given story; `NotFound` if it belongs elsewhere
    pub async fn get_chapter(&self, story_id: Uuid, chapter_id: Uuid) -> AppResult<Chapter> {
        self.chapter_repo
            .get_by_id(chapter_id)
            .await?
            .filter(|c| c.story_id == story_id)
            .ok_or(AppError::NotFound)
    }

    pub async fn single_body(&self, story_id: Uuid) -> AppResult<Option<SingleStory>> {
        self.single_story_repo.get_by_story(story_id).await
    }

    /// Owner's stories, newest first, with batched story-level counts
    pub async fn list_by_owner(&self, user_id: Uuid) -> AppResult<Vec<StorySummary>> {
        let stories = self.story_repo.list_by_owner(user_id).await?;
        let mut stats = self.aggregation.stats_for_stories(&stories).await;
        Ok(stories
            .into_iter()
            .map(|story| StorySummary {
                stats: stats.remove(&story.id).unwrap_or_default(),
                story,
            })
            .collect())
    }

    // ========================================================================
    // AUTHORING
    // ========================================================================

    /// Create a draft, single-bodied story owned by `actor`
    pub async fn create_story(&self, actor: Option<&Actor>, request: CreateStoryRequest) -> AppResult<Story> {
        let actor = actor.ok_or(AppError::Unauthenticated)?;

        let mut story = Story::new(actor.id, request.title.trim().to_string(), request.content_type);
        story.description = non_blank(request.description);
        story.tags = normalize_tags(&request.tags);
        story.categories = request.categories;
        validate_story(&story)?;

        if let Some(cover) = request.cover {
            story.cover_image_url = Some(self.upload_cover(actor.id, cover).await?);
        }

        self.story_repo.insert(&story).await?;

        // The empty body row is a convenience for the editor
        if let Err(e) = self
            .single_story_repo
            .insert(&SingleStory::new(story.id, String::new()))
            .await
        {
            log::warn!("creating empty body for story {} failed: {}", story.id, e);
        }

        log::info!("story {} created by {}", story.id, actor.id);
        self.event_bus.emit(StoryCreated::new(story.id, actor.id));
        self.event_bus
            .emit(CollectionInvalidated::new("stories", actor.id));
        Ok(story)
    }

    pub async fn update_metadata(&self, actor: Option<&Actor>, request: UpdateStoryRequest) -> AppResult<Story> {
        let mut story = self.require_owned(request.story_id, actor).await?;

        story.title = request.title.trim().to_string();
        story.description = non_blank(request.description);
        story.tags = normalize_tags(&request.tags);
        story.content_type = request.content_type;
        story.categories = request.categories;
        if let Some(status) = request.status {
            story.status = status;
        }
        validate_story(&story)?;

        if let Some(cover) = request.cover {
            story.cover_image_url = Some(self.upload_cover(story.user_id, cover).await?);
        }

        story.touch();
        self.story_repo.update(&story).await?;
        self.event_bus
            .emit(CollectionInvalidated::new("stories", story.user_id));
        Ok(story)
    }

    /// Write the single body and mark the story single-bodied
    pub async fn save_single_body(&self, actor: Option<&Actor>, story_id: Uuid, text: &str) -> AppResult<SingleStory> {
        let mut story = self.require_owned(story_id, actor).await?;

        let body = SingleStory::new(story_id, text.trim().to_string());
        validate_single_story(&body)?;

        if story.is_chapters {
            story.is_chapters = false;
            story.touch();
            self.story_repo.update(&story).await?;
        }

        let saved = match self.single_story_repo.get_by_story(story_id).await? {
            Some(mut existing) => {
                self.single_story_repo
                    .update_content(story_id, &body.content)
                    .await?;
                existing.content = body.content;
                existing.updated_at = timestamp_now();
                existing
            }
            None => {
                self.single_story_repo.insert(&body).await?;
                body
            }
        };

        self.event_bus
            .emit(CollectionInvalidated::new("single_stories", story_id));
        Ok(saved)
    }

    /// Append a chapter numbered one past the current highest
    pub async fn add_chapter(&self, actor: Option<&Actor>, story_id: Uuid, title: &str, content: &str) -> AppResult<Chapter> {
        let mut story = self.require_owned(story_id, actor).await?;

        let number = next_chapter_number(self.chapter_repo.max_number(story_id).await?);
        let chapter = Chapter::new(
            story_id,
            number,
            title.trim().to_string(),
            content.trim().to_string(),
        );
        validate_chapter(&chapter)?;

        if !story.is_chapters {
            story.is_chapters = true;
            story.touch();
            self.story_repo.update(&story).await?;
        }

        self.chapter_repo.insert(&chapter).await?;

        self.event_bus
            .emit(ChapterAdded::new(story_id, chapter.id, chapter.chapter_number));
        self.event_bus
            .emit(CollectionInvalidated::new("chapters", story_id));
        Ok(chapter)
    }

    pub async fn update_chapter(
        &self,
        actor: Option<&Actor>,
        story_id: Uuid,
        chapter_id: Uuid,
        title: &str,
        content: &str,
    ) -> AppResult<Chapter> {
        self.require_owned(story_id, actor).await?;
        let mut chapter = self.get_chapter(story_id, chapter_id).await?;

        chapter.revise(title.trim().to_string(), content.trim().to_string());
        validate_chapter(&chapter)?;
        self.chapter_repo.update(&chapter).await?;

        self.event_bus
            .emit(CollectionInvalidated::new("chapters", story_id));
        Ok(chapter)
    }

    async fn upload_cover(&self, user_id: Uuid, cover: Upload) -> AppResult<String> {
        let path = cover_path(user_id, &cover, Utc::now());
        store_public(self.storage.as_ref(), Bucket::StoryCovers, &path, cover, false).await
    }

    // ========================================================================
    // DELETION
    // ========================================================================

    /// Delete a story and everything hanging off it.
    ///
    /// Steps run in `DeletionStep::ORDER`; each is retried up to the
    /// configured attempt count. The first step that keeps failing stops
    /// the sequence and is named in the report.
    pub async fn delete_story(&self, actor: Option<&Actor>, story_id: Uuid) -> AppResult<DeletionReport> {
        let story = self.require_owned(story_id, actor).await?;

        let mut report = DeletionReport {
            story_id,
            completed: Vec::with_capacity(DeletionStep::ORDER.len()),
            failed: None,
        };

        for step in DeletionStep::ORDER {
            match self.run_with_retry(step, story_id).await {
                Ok(rows) => {
                    log::debug!("delete {}: {} removed {} rows", story_id, step, rows);
                    report.completed.push((step, rows));
                }
                Err(e) => {
                    log::error!("delete {} stopped at {}: {}", story_id, step, e);
                    report.failed = Some((step, e.to_string()));
                    return Ok(report);
                }
            }
        }

        log::info!("story {} deleted ({} rows)", story_id, report.rows_removed());
        self.event_bus.emit(StoryDeleted::new(story_id, story.user_id));
        self.event_bus
            .emit(CollectionInvalidated::new("stories", story.user_id));
        Ok(report)
    }

    async fn run_with_retry(&self, step: DeletionStep, story_id: Uuid) -> AppResult<u64> {
        let mut attempt = 1;
        loop {
            match self.run_step(step, story_id).await {
                Ok(rows) => return Ok(rows),
                Err(e) if attempt < self.delete_max_attempts => {
                    log::warn!("{} attempt {} failed, retrying: {}", step, attempt, e);
                    tokio::time::sleep(Duration::from_millis(25 * u64::from(attempt))).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Each step re-reads the ids it needs, so a re-run sees only what is left
    async fn run_step(&self, step: DeletionStep, story_id: Uuid) -> AppResult<u64> {
        match step {
            DeletionStep::ChapterComments => {
                let ids = self.chapter_repo.ids_by_story(story_id).await?;
                self.comment_repo
                    .delete_for_parents(CommentScope::Chapter, &ids)
                    .await
            }
            DeletionStep::ChapterLikes => {
                let ids = self.chapter_repo.ids_by_story(story_id).await?;
                self.engagement_repo
                    .delete_for_parents(FactKind::ChapterLike, &ids)
                    .await
            }
            DeletionStep::ChapterViews => {
                let ids = self.chapter_repo.ids_by_story(story_id).await?;
                self.engagement_repo
                    .delete_for_parents(FactKind::ChapterView, &ids)
                    .await
            }
            DeletionStep::Chapters => self.chapter_repo.delete_by_story(story_id).await,
            DeletionStep::SingleBody => self.single_story_repo.delete_by_story(story_id).await,
            DeletionStep::StoryCommentLikes => {
                let ids = self
                    .comment_repo
                    .ids_for_parents(CommentScope::Story, &[story_id])
                    .await?;
                self.engagement_repo
                    .delete_for_parents(FactKind::StoryCommentLike, &ids)
                    .await
            }
            DeletionStep::StoryComments => {
                self.comment_repo
                    .delete_for_parents(CommentScope::Story, &[story_id])
                    .await
            }
            DeletionStep::StoryLikes => {
                self.engagement_repo
                    .delete_for_parents(FactKind::StoryLike, &[story_id])
                    .await
            }
            DeletionStep::StoryViews => {
                self.engagement_repo
                    .delete_for_parents(FactKind::StoryView, &[story_id])
                    .await
            }
            DeletionStep::Story => self.story_repo.delete(story_id).await,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, get_database_stats, ConnectionPool};
    use crate::domain::{Comment, ContentTarget, LikeState};
    use crate::infrastructure::LocalObjectStorage;
    use crate::repositories::test_support::memory_store;
    use crate::repositories::MockEngagementRepository;
    use tempfile::TempDir;

    struct Fixture {
        service: StoryService,
        aggregation: Arc<AggregationService>,
        repos: Repositories,
        pool: Arc<ConnectionPool>,
        bus: Arc<EventBus>,
        _storage_dir: TempDir,
    }

    fn fixture_with(repos: Repositories, pool: Arc<ConnectionPool>) -> Fixture {
        let storage_dir = TempDir::new().unwrap();
        let bus = Arc::new(EventBus::new());
        let aggregation = Arc::new(AggregationService::new(
            repos.engagement.clone(),
            repos.comments.clone(),
            repos.chapters.clone(),
            bus.clone(),
        ));
        let service = StoryService::new(
            &repos,
            Arc::new(LocalObjectStorage::new(storage_dir.path())),
            aggregation.clone(),
            bus.clone(),
            3,
        );
        Fixture {
            service,
            aggregation,
            repos,
            pool,
            bus,
            _storage_dir: storage_dir,
        }
    }

    fn fixture() -> Fixture {
        let pool = memory_store();
        fixture_with(Repositories::sqlite(pool.clone()), pool)
    }

    fn actor() -> Actor {
        Actor::new(Uuid::new_v4(), None)
    }

    fn request(title: &str) -> CreateStoryRequest {
        CreateStoryRequest {
            title: title.to_string(),
            description: Some("  ".to_string()),
            tags: vec![" kənd ".to_string(), "".to_string(), "kənd".to_string()],
            content_type: ContentType::Story,
            categories: vec!["Dram".to_string()],
            cover: None,
        }
    }

    #[tokio::test]
    async fn test_create_story_defaults() {
        let f = fixture();
        let me = actor();
        let story = f.service.create_story(Some(&me), request("  Dağ kəndi ")).await.unwrap();

        assert_eq!(story.title, "Dağ kəndi");
        assert_eq!(story.user_id, me.id);
        assert_eq!(story.status, StoryStatus::Draft);
        assert!(!story.is_chapters);
        assert_eq!(story.description, None);
        assert_eq!(story.tags, vec!["kənd".to_string()]);
        assert_eq!(f.service.get_story(story.id).await.unwrap(), story);

        let body = f.service.single_body(story.id).await.unwrap().unwrap();
        assert_eq!(body.content, "");
    }

    #[tokio::test]
    async fn test_create_requires_actor_and_valid_input() {
        let f = fixture();
        assert!(matches!(
            f.service.create_story(None, request("T")).await,
            Err(AppError::Unauthenticated)
        ));
        assert!(matches!(
            f.service.create_story(Some(&actor()), request("   ")).await,
            Err(AppError::Domain(_))
        ));

        let mut bad = request("T");
        bad.categories = vec!["Qəzəl".to_string()];
        assert!(f.service.create_story(Some(&actor()), bad).await.is_err());
    }

    #[tokio::test]
    async fn test_create_with_cover_stores_public_url() {
        let f = fixture();
        let me = actor();
        let mut req = request("Cover");
        req.cover = Some(Upload::new("front.PNG", vec![7, 7]));

        let story = f.service.create_story(Some(&me), req).await.unwrap();
        let url = story.cover_image_url.unwrap();
        assert!(url.contains(&format!("story-covers/{}/", me.id)));
        assert!(url.ends_with(".png"));
    }

    #[tokio::test]
    async fn test_create_then_two_views() {
        let f = fixture();
        let story = f.service.create_story(Some(&actor()), request("T")).await.unwrap();
        for _ in 0..2 {
            f.aggregation
                .record_view(ContentTarget::Story(story.id), Some(&actor()))
                .await;
        }
        assert_eq!(f.aggregation.story_stats(&story).await.views, 2);

        let listed = f.service.list_by_owner(story.user_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].stats.views, 2);
    }

    #[tokio::test]
    async fn test_only_owner_can_edit() {
        let f = fixture();
        let owner = actor();
        let story = f.service.create_story(Some(&owner), request("T")).await.unwrap();

        let stranger = actor();
        assert!(matches!(
            f.service.save_single_body(Some(&stranger), story.id, "text").await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            f.service.add_chapter(None, story.id, "I", "text").await,
            Err(AppError::Unauthenticated)
        ));
        assert!(matches!(
            f.service.add_chapter(Some(&owner), Uuid::new_v4(), "I", "text").await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_body_mode_follows_last_write() {
        let f = fixture();
        let me = actor();
        let story = f.service.create_story(Some(&me), request("T")).await.unwrap();

        let one = f.service.add_chapter(Some(&me), story.id, "I", "Birinci").await.unwrap();
        let two = f.service.add_chapter(Some(&me), story.id, "II", "İkinci").await.unwrap();
        assert_eq!((one.chapter_number, two.chapter_number), (1, 2));
        assert!(f.service.get_story(story.id).await.unwrap().is_chapters);

        let body = f.service.save_single_body(Some(&me), story.id, "  Mətn  ").await.unwrap();
        assert_eq!(body.content, "Mətn");
        assert!(!f.service.get_story(story.id).await.unwrap().is_chapters);
        assert!(f.service.save_single_body(Some(&me), story.id, "   ").await.is_err());
    }

    #[tokio::test]
    async fn test_chapter_numbers_are_not_reused() {
        let f = fixture();
        let me = actor();
        let story = f.service.create_story(Some(&me), request("T")).await.unwrap();
        f.service.add_chapter(Some(&me), story.id, "I", "a").await.unwrap();
        f.service.add_chapter(Some(&me), story.id, "II", "b").await.unwrap();
        let three = f.service.add_chapter(Some(&me), story.id, "III", "c").await.unwrap();
        assert_eq!(three.chapter_number, 3);

        let updated = f
            .service
            .update_chapter(Some(&me), story.id, three.id, "III bis", "c2")
            .await
            .unwrap();
        assert_eq!(updated.chapter_number, 3);
        assert!(f
            .service
            .update_chapter(Some(&me), story.id, three.id, "", "c2")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_update_metadata_keeps_owner_and_status() {
        let f = fixture();
        let me = actor();
        let story = f.service.create_story(Some(&me), request("T")).await.unwrap();

        let updated = f
            .service
            .update_metadata(
                Some(&me),
                UpdateStoryRequest {
                    story_id: story.id,
                    title: "Yeni".to_string(),
                    description: Some("Təsvir".to_string()),
                    tags: vec![],
                    content_type: ContentType::Poem,
                    categories: vec!["Qəzəl".to_string()],
                    cover: None,
                    status: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.user_id, me.id);
        assert_eq!(updated.status, StoryStatus::Draft);
        assert_eq!(updated.content_type, ContentType::Poem);
    }

    #[tokio::test]
    async fn test_cascade_delete_leaves_no_rows() {
        let f = fixture();
        let owner = actor();
        let reader = actor();
        let story = f.service.create_story(Some(&owner), request("T")).await.unwrap();
        let chapter = f.service.add_chapter(Some(&owner), story.id, "I", "x").await.unwrap();

        let story_target = ContentTarget::Story(story.id);
        let chapter_target = ContentTarget::Chapter(chapter.id);
        f.aggregation.record_view(story_target, Some(&reader)).await;
        f.aggregation.record_view(chapter_target, Some(&reader)).await;
        f.aggregation
            .toggle_target_like(chapter_target, Some(&reader), LikeState::default())
            .await
            .unwrap();
        f.aggregation
            .toggle_target_like(story_target, Some(&reader), LikeState::default())
            .await
            .unwrap();

        let story_comment = Comment::new(CommentScope::Story, story.id, reader.id, "Nice!".into());
        f.repos.comments.insert(&story_comment).await.unwrap();
        f.repos
            .comments
            .insert(&Comment::new(CommentScope::Chapter, chapter.id, reader.id, "Əla".into()))
            .await
            .unwrap();
        f.aggregation
            .toggle_like(FactKind::StoryCommentLike, story_comment.id, Some(&owner), LikeState::default())
            .await
            .unwrap();

        let report = f.service.delete_story(Some(&owner), story.id).await.unwrap();
        assert!(report.is_complete());
        assert_eq!(report.completed.len(), DeletionStep::ORDER.len());

        let stats = get_database_stats(&get_connection(&f.pool).unwrap()).unwrap();
        assert_eq!(stats.total_rows(), 0);
        assert!(f
            .bus
            .get_event_log()
            .iter()
            .any(|e| e.event_type == "StoryDeleted"));
    }

    #[tokio::test]
    async fn test_delete_requires_owner() {
        let f = fixture();
        let story = f.service.create_story(Some(&actor()), request("T")).await.unwrap();
        assert!(matches!(
            f.service.delete_story(Some(&actor()), story.id).await,
            Err(AppError::Forbidden)
        ));
        assert!(f.service.get_story(story.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_failed_step_is_reported_and_rerun_finishes() {
        let pool = memory_store();
        let mut repos = Repositories::sqlite(pool.clone());
        let sqlite_engagement = repos.engagement.clone();

        let mut flaky = MockEngagementRepository::new();
        flaky
            .expect_delete_for_parents()
            .times(3)
            .returning(|_, _| Err(AppError::Backend("503".to_string())));
        repos.engagement = Arc::new(flaky);
        let broken = fixture_with(repos.clone(), pool.clone());

        let owner = actor();
        let story = broken.service.create_story(Some(&owner), request("T")).await.unwrap();

        let report = broken.service.delete_story(Some(&owner), story.id).await.unwrap();
        assert!(!report.is_complete());
        assert_eq!(report.completed.len(), 1);
        assert_eq!(report.completed[0].0, DeletionStep::ChapterComments);
        assert_eq!(report.failed.as_ref().map(|(s, _)| *s), Some(DeletionStep::ChapterLikes));
        assert!(broken.service.get_story(story.id).await.is_ok());

        repos.engagement = sqlite_engagement;
        let healthy = fixture_with(repos, pool);
        let report = healthy.service.delete_story(Some(&owner), story.id).await.unwrap();
        assert!(report.is_complete());
        assert!(matches!(healthy.service.get_story(story.id).await, Err(AppError::NotFound)));
    }

    #[test]
    fn test_deletion_order_ends_with_story() {
        assert_eq!(DeletionStep::ORDER[0], DeletionStep::ChapterComments);
        assert_eq!(DeletionStep::ORDER[9], DeletionStep::Story);
        let chapters = DeletionStep::ORDER.iter().position(|s| *s == DeletionStep::Chapters);
        let comment_likes = DeletionStep::ORDER
            .iter()
            .position(|s| *s == DeletionStep::StoryCommentLikes);
        let comments = DeletionStep::ORDER.iter().position(|s| *s == DeletionStep::StoryComments);
        assert!(chapters > Some(2));
        assert!(comment_likes < comments);
    }
}
