// src/services/comment_service.rs
//
// Comment Service - Thread Reads and Comment Mutations
//
// CRITICAL RULES:
// - Edit: author only. Delete: author or owner of the story.
// - A thread read is three batched reads (comments, authors, likes),
//   never one read per comment
// - Every mutation invalidates (collection, parent id)

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::domain::{
    can_delete_comment, can_edit_comment, checked_comment_text, Actor, Comment, CommentScope,
    DomainError, LikeState, Profile,
};
use crate::error::{AppError, AppResult};
use crate::events::{
    CollectionInvalidated, CommentAdded, CommentDeleted, CommentEdited, EventBus,
};
use crate::repositories::{CommentRepository, EngagementRepository, ProfileRepository};
use crate::services::AggregationService;

/// A comment joined with its author and like aggregate
#[derive(Debug, Clone, Serialize)]
pub struct CommentEntry {
    pub comment: Comment,
    /// Missing when the author has no profile row or the lookup failed
    pub author: Option<Profile>,
    /// Absent for scopes without comment likes
    pub like: Option<LikeState>,
    pub can_edit: bool,
    pub can_delete: bool,
}

impl CommentEntry {
    pub fn like_count(&self) -> u64 {
        self.like.map(|l| l.count).unwrap_or(0)
    }

    pub fn author_name(&self) -> String {
        self.author
            .as_ref()
            .map(Profile::display_name)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "İstifadəçi".to_string())
    }
}

pub struct CommentService {
    comment_repo: Arc<dyn CommentRepository>,
    profile_repo: Arc<dyn ProfileRepository>,
    engagement_repo: Arc<dyn EngagementRepository>,
    aggregation: Arc<AggregationService>,
    event_bus: Arc<EventBus>,
}

impl CommentService {
    pub fn new(
        comment_repo: Arc<dyn CommentRepository>,
        profile_repo: Arc<dyn ProfileRepository>,
        engagement_repo: Arc<dyn EngagementRepository>,
        aggregation: Arc<AggregationService>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            comment_repo,
            profile_repo,
            engagement_repo,
            aggregation,
            event_bus,
        }
    }

    /// All comments of a parent, newest first, joined with authors and likes.
    ///
    /// Only the comment read can fail; author and like lookups degrade to
    /// missing authors and zero counts.
    pub async fn load_entries(
        &self,
        scope: CommentScope,
        parent_id: Uuid,
        content_owner_id: Uuid,
        actor: Option<&Actor>,
    ) -> AppResult<Vec<CommentEntry>> {
        let comments = self.comment_repo.list_for_parent(scope, parent_id).await?;
        if comments.is_empty() {
            return Ok(Vec::new());
        }

        let mut author_ids: Vec<Uuid> = comments.iter().map(|c| c.user_id).collect();
        author_ids.sort();
        author_ids.dedup();
        let authors: HashMap<Uuid, Profile> = match self.profile_repo.get_many(&author_ids).await {
            Ok(profiles) => profiles.into_iter().map(|p| (p.id, p)).collect(),
            Err(e) => {
                log::warn!("author lookup for {} failed: {}", parent_id, e);
                HashMap::new()
            }
        };

        let ids: Vec<Uuid> = comments.iter().map(|c| c.id).collect();
        let likes = match scope.like_kind() {
            Some(kind) => {
                let counts = self
                    .engagement_repo
                    .count_by_parent(kind, &ids)
                    .await
                    .unwrap_or_else(|e| {
                        log::warn!("comment like counts for {} failed: {}", parent_id, e);
                        HashMap::new()
                    });
                let mine = match actor {
                    Some(actor) => self
                        .engagement_repo
                        .liked_among(kind, actor.id, &ids)
                        .await
                        .unwrap_or_else(|e| {
                            log::warn!("comment like membership for {} failed: {}", parent_id, e);
                            HashSet::new()
                        }),
                    None => HashSet::new(),
                };
                Some((counts, mine))
            }
            None => None,
        };

        Ok(comments
            .into_iter()
            .map(|comment| {
                let like = likes.as_ref().map(|(counts, mine)| {
                    LikeState::new(
                        mine.contains(&comment.id),
                        counts.get(&comment.id).copied().unwrap_or(0),
                    )
                });
                CommentEntry {
                    author: authors.get(&comment.user_id).cloned(),
                    like,
                    can_edit: can_edit_comment(actor, &comment),
                    can_delete: can_delete_comment(actor, &comment, content_owner_id),
                    comment,
                }
            })
            .collect())
    }

    pub async fn add_comment(
        &self,
        scope: CommentScope,
        parent_id: Uuid,
        actor: Option<&Actor>,
        text: &str,
    ) -> AppResult<Comment> {
        let actor = actor.ok_or(AppError::Unauthenticated)?;
        let content = checked_comment_text(text)?;

        let comment = Comment::new(scope, parent_id, actor.id, content);
        self.comment_repo.insert(&comment).await?;

        self.event_bus
            .emit(CommentAdded::new(scope, parent_id, comment.id));
        self.invalidate(scope, parent_id);
        Ok(comment)
    }

    pub async fn edit_comment(
        &self,
        scope: CommentScope,
        comment_id: Uuid,
        actor: Option<&Actor>,
        text: &str,
    ) -> AppResult<Comment> {
        let actor = actor.ok_or(AppError::Unauthenticated)?;
        let mut comment = self.load(scope, comment_id).await?;
        if !can_edit_comment(Some(actor), &comment) {
            return Err(AppError::Forbidden);
        }
        let content = checked_comment_text(text)?;

        self.comment_repo
            .update_content(scope, comment_id, &content)
            .await?;
        comment.content = content;

        self.event_bus
            .emit(CommentEdited::new(scope, comment.parent_id, comment_id));
        self.invalidate(scope, comment.parent_id);
        Ok(comment)
    }

    /// Delete a comment and its like facts
    pub async fn delete_comment(
        &self,
        scope: CommentScope,
        comment_id: Uuid,
        actor: Option<&Actor>,
        content_owner_id: Uuid,
    ) -> AppResult<()> {
        let actor = actor.ok_or(AppError::Unauthenticated)?;
        let comment = self.load(scope, comment_id).await?;
        if !can_delete_comment(Some(actor), &comment, content_owner_id) {
            return Err(AppError::Forbidden);
        }

        if let Some(kind) = scope.like_kind() {
            self.engagement_repo
                .delete_for_parents(kind, &[comment_id])
                .await?;
        }
        self.comment_repo.delete(scope, comment_id).await?;

        if actor.id != comment.user_id {
            log::info!("comment {} removed by content owner {}", comment_id, actor.id);
        }
        self.event_bus.emit(CommentDeleted::new(
            scope,
            comment.parent_id,
            comment_id,
            actor.id,
        ));
        self.invalidate(scope, comment.parent_id);
        Ok(())
    }

    /// Optimistic like toggle on a story comment
    pub async fn toggle_comment_like(
        &self,
        scope: CommentScope,
        comment_id: Uuid,
        actor: Option<&Actor>,
        state: LikeState,
    ) -> AppResult<LikeState> {
        let kind = scope.like_kind().ok_or_else(|| {
            AppError::Domain(DomainError::Unsupported(
                "chapter comments cannot be liked".to_string(),
            ))
        })?;
        self.aggregation
            .toggle_like(kind, comment_id, actor, state)
            .await
    }

    async fn load(&self, scope: CommentScope, comment_id: Uuid) -> AppResult<Comment> {
        self.comment_repo
            .get_by_id(scope, comment_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    fn invalidate(&self, scope: CommentScope, parent_id: Uuid) {
        self.event_bus
            .emit(CollectionInvalidated::new(scope.collection(), parent_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support::memory_store;
    use crate::repositories::{MockProfileRepository, Repositories};

    fn service_with(repos: &Repositories) -> CommentService {
        let bus = Arc::new(EventBus::new());
        let aggregation = Arc::new(AggregationService::new(
            repos.engagement.clone(),
            repos.comments.clone(),
            repos.chapters.clone(),
            bus.clone(),
        ));
        CommentService::new(
            repos.comments.clone(),
            repos.profiles.clone(),
            repos.engagement.clone(),
            aggregation,
            bus,
        )
    }

    fn actor() -> Actor {
        Actor::new(Uuid::new_v4(), None)
    }

    #[tokio::test]
    async fn test_entries_join_authors_and_likes() {
        let repos = Repositories::sqlite(memory_store());
        let service = service_with(&repos);
        let (owner, author, fan) = (actor(), actor(), actor());
        let story = Uuid::new_v4();

        let mut profile = Profile::new(author.id, None);
        profile.first_name = Some("Leyla".to_string());
        repos.profiles.save(&profile).await.unwrap();

        let comment = service
            .add_comment(CommentScope::Story, story, Some(&author), "Nice!")
            .await
            .unwrap();
        service
            .toggle_comment_like(CommentScope::Story, comment.id, Some(&fan), LikeState::default())
            .await
            .unwrap();

        let as_fan = service
            .load_entries(CommentScope::Story, story, owner.id, Some(&fan))
            .await
            .unwrap();
        assert_eq!(as_fan.len(), 1);
        assert_eq!(as_fan[0].author_name(), "Leyla");
        assert_eq!(as_fan[0].like, Some(LikeState::new(true, 1)));
        assert!(!as_fan[0].can_edit);
        assert!(!as_fan[0].can_delete);

        let as_owner = service
            .load_entries(CommentScope::Story, story, owner.id, Some(&owner))
            .await
            .unwrap();
        assert_eq!(as_owner[0].like, Some(LikeState::new(false, 1)));
        assert!(as_owner[0].can_delete);
    }

    #[tokio::test]
    async fn test_blank_and_anonymous_comments_rejected() {
        let repos = Repositories::sqlite(memory_store());
        let service = service_with(&repos);
        let parent = Uuid::new_v4();

        assert!(matches!(
            service.add_comment(CommentScope::Chapter, parent, None, "hi").await,
            Err(AppError::Unauthenticated)
        ));
        assert!(matches!(
            service.add_comment(CommentScope::Chapter, parent, Some(&actor()), "  \n").await,
            Err(AppError::Domain(_))
        ));
        assert_eq!(repos.comments.count(CommentScope::Chapter, parent).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_edit_and_delete_permissions() {
        let repos = Repositories::sqlite(memory_store());
        let service = service_with(&repos);
        let (owner, author, stranger) = (actor(), actor(), actor());
        let story = Uuid::new_v4();
        let comment = service
            .add_comment(CommentScope::Story, story, Some(&author), "first")
            .await
            .unwrap();

        assert!(matches!(
            service.edit_comment(CommentScope::Story, comment.id, Some(&owner), "x").await,
            Err(AppError::Forbidden)
        ));
        let edited = service
            .edit_comment(CommentScope::Story, comment.id, Some(&author), " second ")
            .await
            .unwrap();
        assert_eq!(edited.content, " second ");
        let stored = repos
            .comments
            .get_by_id(CommentScope::Story, comment.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.content, " second ");

        assert!(matches!(
            service
                .delete_comment(CommentScope::Story, comment.id, Some(&stranger), owner.id)
                .await,
            Err(AppError::Forbidden)
        ));
        service
            .toggle_comment_like(CommentScope::Story, comment.id, Some(&stranger), LikeState::default())
            .await
            .unwrap();
        service
            .delete_comment(CommentScope::Story, comment.id, Some(&owner), owner.id)
            .await
            .unwrap();

        assert_eq!(repos.comments.count(CommentScope::Story, story).await.unwrap(), 0);
        assert_eq!(
            repos
                .engagement
                .count(crate::domain::FactKind::StoryCommentLike, comment.id)
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_chapter_comment_like_is_unsupported() {
        let repos = Repositories::sqlite(memory_store());
        let service = service_with(&repos);
        let result = service
            .toggle_comment_like(CommentScope::Chapter, Uuid::new_v4(), Some(&actor()), LikeState::default())
            .await;
        assert!(matches!(result, Err(AppError::Domain(DomainError::Unsupported(_)))));
    }

    #[tokio::test]
    async fn test_author_lookup_failure_degrades() {
        let mut repos = Repositories::sqlite(memory_store());
        let mut profiles = MockProfileRepository::new();
        profiles
            .expect_get_many()
            .returning(|_| Err(AppError::Backend("down".to_string())));
        repos.profiles = Arc::new(profiles);
        let service = service_with(&repos);

        let parent = Uuid::new_v4();
        service
            .add_comment(CommentScope::Chapter, parent, Some(&actor()), "hello")
            .await
            .unwrap();
        let entries = service
            .load_entries(CommentScope::Chapter, parent, Uuid::new_v4(), None)
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].author.is_none());
        assert_eq!(entries[0].like, None);
        assert_eq!(entries[0].author_name(), "İstifadəçi");
    }
}
