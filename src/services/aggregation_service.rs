// src/services/aggregation_service.rs
//
// Aggregation Service - Views, Likes and Comment Counts
//
// CRITICAL RULES:
// - Counts are derived, never stored
// - A failed count is logged and reads as 0; it never fails a page
// - Like toggles are check-then-write; the displayed counter is
//   optimistic and not re-queried

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{
    Actor, CommentScope, ContentTarget, DomainError, EngagementStats, FactKind, LikeState, Story,
};
use crate::error::{AppError, AppResult};
use crate::events::{CollectionInvalidated, EventBus, LikeToggled};
use crate::repositories::{ChapterRepository, CommentRepository, EngagementRepository};

pub struct AggregationService {
    engagement_repo: Arc<dyn EngagementRepository>,
    comment_repo: Arc<dyn CommentRepository>,
    chapter_repo: Arc<dyn ChapterRepository>,
    event_bus: Arc<EventBus>,
}

fn or_zero(result: AppResult<u64>, what: &str, parent: Uuid) -> u64 {
    result.unwrap_or_else(|e| {
        log::warn!("{} count for {} failed, showing 0: {}", what, parent, e);
        0
    })
}

impl AggregationService {
    pub fn new(
        engagement_repo: Arc<dyn EngagementRepository>,
        comment_repo: Arc<dyn CommentRepository>,
        chapter_repo: Arc<dyn ChapterRepository>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            engagement_repo,
            comment_repo,
            chapter_repo,
            event_bus,
        }
    }

    /// Counts attached directly to one story or chapter
    pub async fn stats(&self, target: ContentTarget) -> EngagementStats {
        let id = target.id();
        EngagementStats {
            views: or_zero(self.engagement_repo.count(target.view_kind(), id).await, "view", id),
            likes: or_zero(self.engagement_repo.count(target.like_kind(), id).await, "like", id),
            comments: or_zero(
                self.comment_repo.count(target.comment_scope(), id).await,
                "comment",
                id,
            ),
        }
    }

    /// Story totals. Chapter-structured stories sum the facts of all their
    /// chapters; single stories use the story-level facts.
    pub async fn story_stats(&self, story: &Story) -> EngagementStats {
        if !story.is_chapters {
            return self.stats(ContentTarget::Story(story.id)).await;
        }

        let chapter_ids = match self.chapter_repo.ids_by_story(story.id).await {
            Ok(ids) => ids,
            Err(e) => {
                log::warn!("chapter lookup for {} failed, showing 0: {}", story.id, e);
                return EngagementStats::default();
            }
        };

        EngagementStats {
            views: or_zero(
                self.engagement_repo.count_in(FactKind::ChapterView, &chapter_ids).await,
                "chapter view",
                story.id,
            ),
            likes: or_zero(
                self.engagement_repo.count_in(FactKind::ChapterLike, &chapter_ids).await,
                "chapter like",
                story.id,
            ),
            comments: or_zero(
                self.comment_repo.count_in(CommentScope::Chapter, &chapter_ids).await,
                "chapter comment",
                story.id,
            ),
        }
    }

    /// Story-level counts for a list of stories, one grouped read per
    /// collection. Every story gets an entry.
    pub async fn stats_for_stories(&self, stories: &[Story]) -> HashMap<Uuid, EngagementStats> {
        let ids: Vec<Uuid> = stories.iter().map(|s| s.id).collect();

        let views = self.grouped(FactKind::StoryView, &ids).await;
        let likes = self.grouped(FactKind::StoryLike, &ids).await;
        let comments = self
            .comment_repo
            .count_by_parent(CommentScope::Story, &ids)
            .await
            .unwrap_or_else(|e| {
                log::warn!("grouped comment count failed, showing 0: {}", e);
                HashMap::new()
            });

        ids.iter()
            .map(|id| {
                let stats = EngagementStats {
                    views: views.get(id).copied().unwrap_or(0),
                    likes: likes.get(id).copied().unwrap_or(0),
                    comments: comments.get(id).copied().unwrap_or(0),
                };
                (*id, stats)
            })
            .collect()
    }

    async fn grouped(&self, kind: FactKind, ids: &[Uuid]) -> HashMap<Uuid, u64> {
        self.engagement_repo
            .count_by_parent(kind, ids)
            .await
            .unwrap_or_else(|e| {
                log::warn!("grouped {} count failed, showing 0: {}", kind.collection(), e);
                HashMap::new()
            })
    }

    /// False without an actor or when the lookup fails
    pub async fn is_liked(&self, kind: FactKind, parent_id: Uuid, actor: Option<&Actor>) -> bool {
        let Some(actor) = actor else {
            return false;
        };
        self.engagement_repo
            .exists(kind, parent_id, actor.id)
            .await
            .unwrap_or_else(|e| {
                log::warn!("like lookup on {} failed: {}", parent_id, e);
                false
            })
    }

    /// Count and membership for a like button
    pub async fn like_state(&self, target: ContentTarget, actor: Option<&Actor>) -> LikeState {
        let id = target.id();
        let count = or_zero(self.engagement_repo.count(target.like_kind(), id).await, "like", id);
        LikeState::new(self.is_liked(target.like_kind(), id, actor).await, count)
    }

    /// Record one view by an authenticated actor. Never deduplicated;
    /// failures are logged only.
    pub async fn record_view(&self, target: ContentTarget, actor: Option<&Actor>) {
        let Some(actor) = actor else {
            return;
        };
        if let Err(e) = self
            .engagement_repo
            .record(target.view_kind(), target.id(), actor.id)
            .await
        {
            log::warn!("recording view on {:?} failed: {}", target, e);
        }
    }

    /// Flip the actor's like on any likeable parent.
    ///
    /// Returns the new optimistic state. Without an actor nothing is
    /// read or written.
    pub async fn toggle_like(
        &self,
        kind: FactKind,
        parent_id: Uuid,
        actor: Option<&Actor>,
        state: LikeState,
    ) -> AppResult<LikeState> {
        if !kind.is_like() {
            return Err(AppError::Domain(DomainError::Unsupported(format!(
                "{} is not a like collection",
                kind.collection()
            ))));
        }
        let actor = actor.ok_or(AppError::Unauthenticated)?;

        let next = if self.engagement_repo.exists(kind, parent_id, actor.id).await? {
            self.engagement_repo.remove(kind, parent_id, actor.id).await?;
            LikeState::new(false, state.count.saturating_sub(1))
        } else {
            self.engagement_repo.record(kind, parent_id, actor.id).await?;
            LikeState::new(true, state.count + 1)
        };

        self.event_bus
            .emit(LikeToggled::new(kind, parent_id, actor.id, next.liked));
        self.event_bus
            .emit(CollectionInvalidated::new(kind.collection(), parent_id));
        Ok(next)
    }

    /// Like toggle on a story or chapter page
    pub async fn toggle_target_like(
        &self,
        target: ContentTarget,
        actor: Option<&Actor>,
        state: LikeState,
    ) -> AppResult<LikeState> {
        self.toggle_like(target.like_kind(), target.id(), actor, state).await
    }

    /// Story-level like. Chapter-structured stories are liked per chapter.
    pub async fn toggle_story_like(
        &self,
        story: &Story,
        actor: Option<&Actor>,
        state: LikeState,
    ) -> AppResult<LikeState> {
        if story.is_chapters {
            return Err(AppError::Domain(DomainError::Unsupported(
                "like individual chapters of this story".to_string(),
            )));
        }
        self.toggle_target_like(ContentTarget::Story(story.id), actor, state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Chapter, Comment, ContentType};
    use crate::repositories::test_support::memory_store;
    use crate::repositories::{
        MockChapterRepository, MockCommentRepository, MockEngagementRepository,
        SqliteChapterRepository, SqliteCommentRepository, SqliteEngagementRepository,
    };

    struct Fixture {
        service: AggregationService,
        chapters: Arc<SqliteChapterRepository>,
        comments: Arc<SqliteCommentRepository>,
        bus: Arc<EventBus>,
    }

    fn fixture() -> Fixture {
        let pool = memory_store();
        let chapters = Arc::new(SqliteChapterRepository::new(pool.clone()));
        let comments = Arc::new(SqliteCommentRepository::new(pool.clone()));
        let bus = Arc::new(EventBus::new());
        let service = AggregationService::new(
            Arc::new(SqliteEngagementRepository::new(pool)),
            comments.clone(),
            chapters.clone(),
            bus.clone(),
        );
        Fixture { service, chapters, comments, bus }
    }

    fn actor() -> Actor {
        Actor::new(Uuid::new_v4(), None)
    }

    #[tokio::test]
    async fn test_two_views_by_two_actors() {
        let f = fixture();
        let story = Story::new(Uuid::new_v4(), "Dağ kəndi".to_string(), ContentType::Story);
        let target = ContentTarget::Story(story.id);

        f.service.record_view(target, Some(&actor())).await;
        f.service.record_view(target, Some(&actor())).await;
        f.service.record_view(target, None).await;

        assert_eq!(f.service.stats(target).await.views, 2);
        assert_eq!(f.service.story_stats(&story).await.views, 2);
    }

    #[tokio::test]
    async fn test_like_toggle_twice_restores_state() {
        let f = fixture();
        let me = actor();
        let target = ContentTarget::Chapter(Uuid::new_v4());
        let start = f.service.like_state(target, Some(&me)).await;
        assert_eq!(start, LikeState::new(false, 0));

        let liked = f.service.toggle_target_like(target, Some(&me), start).await.unwrap();
        assert_eq!(liked, LikeState::new(true, 1));
        assert!(f.service.is_liked(target.like_kind(), target.id(), Some(&me)).await);

        let back = f.service.toggle_target_like(target, Some(&me), liked).await.unwrap();
        assert_eq!(back, start);
        assert_eq!(f.service.stats(target).await.likes, 0);
    }

    #[tokio::test]
    async fn test_unauthenticated_like_changes_nothing() {
        let f = fixture();
        let target = ContentTarget::Story(Uuid::new_v4());
        let state = LikeState::new(false, 3);

        let result = f.service.toggle_target_like(target, None, state).await;
        assert!(matches!(result, Err(AppError::Unauthenticated)));
        assert_eq!(f.service.stats(target).await.likes, 0);
        assert!(f.bus.get_event_log().is_empty());
    }

    #[tokio::test]
    async fn test_story_like_rejected_for_chapter_story() {
        let f = fixture();
        let mut story = Story::new(Uuid::new_v4(), "Roman".to_string(), ContentType::Story);
        story.is_chapters = true;

        let result = f
            .service
            .toggle_story_like(&story, Some(&actor()), LikeState::default())
            .await;
        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::Unsupported(_)))
        ));
    }

    #[tokio::test]
    async fn test_toggle_emits_invalidation() {
        let f = fixture();
        let comment = Uuid::new_v4();
        f.service
            .toggle_like(FactKind::StoryCommentLike, comment, Some(&actor()), LikeState::default())
            .await
            .unwrap();

        let types: Vec<String> = f.bus.get_event_log().into_iter().map(|e| e.event_type).collect();
        assert_eq!(types, vec!["LikeToggled", "CollectionInvalidated"]);
    }

    #[tokio::test]
    async fn test_view_kind_cannot_be_toggled() {
        let f = fixture();
        let result = f
            .service
            .toggle_like(FactKind::StoryView, Uuid::new_v4(), Some(&actor()), LikeState::default())
            .await;
        assert!(matches!(result, Err(AppError::Domain(DomainError::Unsupported(_)))));
    }

    #[tokio::test]
    async fn test_chapter_story_sums_chapter_facts() {
        let f = fixture();
        let mut story = Story::new(Uuid::new_v4(), "Roman".to_string(), ContentType::Story);
        story.is_chapters = true;
        let one = Chapter::new(story.id, 1, "I".to_string(), "...".to_string());
        let two = Chapter::new(story.id, 2, "II".to_string(), "...".to_string());
        f.chapters.insert(&one).await.unwrap();
        f.chapters.insert(&two).await.unwrap();

        let reader = actor();
        f.service.record_view(ContentTarget::Chapter(one.id), Some(&reader)).await;
        f.service.record_view(ContentTarget::Chapter(two.id), Some(&reader)).await;
        f.service
            .toggle_target_like(ContentTarget::Chapter(two.id), Some(&reader), LikeState::default())
            .await
            .unwrap();
        f.comments
            .insert(&Comment::new(CommentScope::Chapter, one.id, reader.id, "Əla!".to_string()))
            .await
            .unwrap();

        let stats = f.service.story_stats(&story).await;
        assert_eq!(stats, EngagementStats { views: 2, likes: 1, comments: 1 });
    }

    #[tokio::test]
    async fn test_batched_stats_cover_every_story() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let a = Story::new(owner, "A".to_string(), ContentType::Story);
        let b = Story::new(owner, "B".to_string(), ContentType::Poem);
        f.service.record_view(ContentTarget::Story(a.id), Some(&actor())).await;
        f.comments
            .insert(&Comment::new(CommentScope::Story, a.id, owner, "x".to_string()))
            .await
            .unwrap();

        let stats = f.service.stats_for_stories(&[a.clone(), b.clone()]).await;
        assert_eq!(stats[&a.id], EngagementStats { views: 1, likes: 0, comments: 1 });
        assert_eq!(stats[&b.id], EngagementStats::default());
    }

    #[tokio::test]
    async fn test_failed_counts_read_as_zero() {
        let mut engagement = MockEngagementRepository::new();
        engagement
            .expect_count()
            .returning(|_, _| Err(AppError::Backend("timeout".to_string())));
        let mut comments = MockCommentRepository::new();
        comments.expect_count().returning(|_, _| Ok(4));

        let service = AggregationService::new(
            Arc::new(engagement),
            Arc::new(comments),
            Arc::new(MockChapterRepository::new()),
            Arc::new(EventBus::new()),
        );

        let stats = service.stats(ContentTarget::Story(Uuid::new_v4())).await;
        assert_eq!(stats, EngagementStats { views: 0, likes: 0, comments: 4 });
    }

    #[tokio::test]
    async fn test_failed_like_lookup_reads_as_not_liked() {
        let mut engagement = MockEngagementRepository::new();
        engagement
            .expect_exists()
            .returning(|_, _, _| Err(AppError::Backend("timeout".to_string())));
        let service = AggregationService::new(
            Arc::new(engagement),
            Arc::new(MockCommentRepository::new()),
            Arc::new(MockChapterRepository::new()),
            Arc::new(EventBus::new()),
        );

        assert!(!service.is_liked(FactKind::StoryLike, Uuid::new_v4(), Some(&actor())).await);
        assert!(!service.is_liked(FactKind::StoryLike, Uuid::new_v4(), None).await);
    }
}
