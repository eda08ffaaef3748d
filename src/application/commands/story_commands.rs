// src/application/commands/story_commands.rs
//
// Story and Chapter Command Handlers

use uuid::Uuid;

use crate::application::notice::*;
use crate::application::{AppState, Outcome};
use crate::domain::{
    is_owner, Chapter, CommentScope, ContentTarget, EngagementStats, LikeState, Profile,
    SingleStory, Story,
};
use crate::services::{CommentThread, CreateStoryRequest, UpdateStoryRequest};

/// Body of a story page, depending on `is_chapters`
#[derive(Debug, Clone)]
pub enum StoryBody {
    Single(Option<SingleStory>),
    Chapters(Vec<Chapter>),
}

pub struct StoryPage {
    pub story: Story,
    pub author: Option<Profile>,
    pub body: StoryBody,
    pub stats: EngagementStats,
    pub like: LikeState,
    pub is_owner: bool,
    pub comments: CommentThread,
}

pub struct ChapterPage {
    pub story: Story,
    pub chapter: Chapter,
    pub previous: Option<Uuid>,
    pub next: Option<Uuid>,
    pub stats: EngagementStats,
    pub like: LikeState,
    pub is_owner: bool,
    pub comments: CommentThread,
}

pub struct StoryEditor {
    pub story: Story,
    pub body: StoryBody,
}

fn story_not_found() -> NoticeMap {
    NoticeMap::new().not_found(MSG_STORY_NOT_FOUND, Some(ROUTE_PROFILE))
}

fn editor_guard(forbidden: &'static str) -> NoticeMap {
    NoticeMap::new()
        .unauthenticated(MSG_SIGN_IN_REQUIRED, Some(ROUTE_AUTH))
        .forbidden(forbidden, Some(ROUTE_PROFILE))
        .not_found(MSG_STORY_NOT_FOUND, Some(ROUTE_PROFILE))
}

async fn load_body(state: &AppState, story: &Story) -> Result<StoryBody, Notice> {
    let body = if story.is_chapters {
        state.story_service.chapters(story.id).await.map(StoryBody::Chapters)
    } else {
        state.story_service.single_body(story.id).await.map(StoryBody::Single)
    };
    body.map_err(|e| notice_for(&e))
}

// ============================================================================
// PAGES
// ============================================================================

/// Story page: records a view, then loads body, counts and comments
pub async fn open_story(state: &AppState, story_id: Uuid) -> Result<StoryPage, Notice> {
    let actor = state.session.actor();
    let story = state
        .story_service
        .get_story(story_id)
        .await
        .map_err(|e| story_not_found().notice(&e))?;

    let target = ContentTarget::Story(story.id);
    state.aggregation.record_view(target, actor.as_ref()).await;

    let body = match load_body(state, &story).await {
        Ok(body) => body,
        Err(notice) => return Err(notice.redirect_to(ROUTE_PROFILE)),
    };
    let stats = state.aggregation.story_stats(&story).await;
    // chapter-structured stories are liked per chapter; show the chapter total
    let like = if story.is_chapters {
        LikeState::new(false, stats.likes)
    } else {
        state.aggregation.like_state(target, actor.as_ref()).await
    };
    let author = state.profile_service.get_profile(story.user_id).await.ok();

    let mut comments = CommentThread::new(
        state.comment_service.clone(),
        CommentScope::Story,
        story.id,
        story.user_id,
        state.config.story_comments_per_page,
    );
    comments.watch(&state.event_bus);
    if let Err(e) = comments.load(actor.as_ref()).await {
        log::warn!("comments for story {} unavailable: {}", story.id, e);
    }

    Ok(StoryPage {
        is_owner: is_owner(actor.as_ref(), &story),
        story,
        author,
        body,
        stats,
        like,
        comments,
    })
}

/// Chapter page with neighbour links for navigation
pub async fn open_chapter(state: &AppState, story_id: Uuid, chapter_id: Uuid) -> Result<ChapterPage, Notice> {
    let actor = state.session.actor();
    let back = NoticeMap::new().not_found(MSG_CHAPTER_NOT_FOUND, Some(story_route(story_id).as_str()));

    let story = state
        .story_service
        .get_story(story_id)
        .await
        .map_err(|e| back.notice(&e))?;
    let chapter = state
        .story_service
        .get_chapter(story_id, chapter_id)
        .await
        .map_err(|e| back.notice(&e))?;

    let target = ContentTarget::Chapter(chapter.id);
    state.aggregation.record_view(target, actor.as_ref()).await;

    let (previous, next) = match state.story_service.chapters(story_id).await {
        Ok(chapters) => neighbours(&chapters, chapter.id),
        Err(e) => {
            log::warn!("chapter list for {} unavailable: {}", story_id, e);
            (None, None)
        }
    };
    let stats = state.aggregation.stats(target).await;
    let like = state.aggregation.like_state(target, actor.as_ref()).await;

    let mut comments = CommentThread::new(
        state.comment_service.clone(),
        CommentScope::Chapter,
        chapter.id,
        story.user_id,
        state.config.chapter_comments_per_page,
    );
    comments.watch(&state.event_bus);
    if let Err(e) = comments.load(actor.as_ref()).await {
        log::warn!("comments for chapter {} unavailable: {}", chapter.id, e);
    }

    Ok(ChapterPage {
        is_owner: is_owner(actor.as_ref(), &story),
        story,
        chapter,
        previous,
        next,
        stats,
        like,
        comments,
    })
}

/// Previous and next chapter ids; `chapters` is ordered by number
fn neighbours(chapters: &[Chapter], chapter_id: Uuid) -> (Option<Uuid>, Option<Uuid>) {
    let Some(pos) = chapters.iter().position(|c| c.id == chapter_id) else {
        return (None, None);
    };
    let previous = pos.checked_sub(1).map(|i| chapters[i].id);
    let next = chapters.get(pos + 1).map(|c| c.id);
    (previous, next)
}

/// Editor for the story; only its owner gets in
pub async fn open_story_editor(state: &AppState, story_id: Uuid) -> Result<StoryEditor, Notice> {
    let actor = state.session.actor();
    let story = state
        .story_service
        .require_owned(story_id, actor.as_ref())
        .await
        .map_err(|e| editor_guard(MSG_NO_STORY_PERMISSION).notice(&e))?;
    let body = load_body(state, &story).await?;
    Ok(StoryEditor { story, body })
}

pub async fn open_chapter_editor(state: &AppState, story_id: Uuid, chapter_id: Uuid) -> Result<Chapter, Notice> {
    let actor = state.session.actor();
    let guard = editor_guard(MSG_NO_CHAPTER_PERMISSION);
    state
        .story_service
        .require_owned(story_id, actor.as_ref())
        .await
        .map_err(|e| guard.notice(&e))?;
    state
        .story_service
        .get_chapter(story_id, chapter_id)
        .await
        .map_err(|e| {
            NoticeMap::new()
                .not_found(MSG_CHAPTER_NOT_FOUND, Some(story_route(story_id).as_str()))
                .notice(&e)
        })
}

// ============================================================================
// LIKES
// ============================================================================

/// Toggle the story-level like and patch the page
pub async fn like_story(state: &AppState, page: &mut StoryPage) -> Result<(), Notice> {
    if page.story.is_chapters {
        return Err(Notice::info(MSG_LIKE_CHAPTERS_INSTEAD));
    }
    let actor = state.session.actor();
    page.like = state
        .aggregation
        .toggle_story_like(&page.story, actor.as_ref(), page.like)
        .await
        .map_err(|e| {
            NoticeMap::new()
                .unauthenticated(MSG_LIKE_SIGN_IN, None)
                .notice(&e)
        })?;
    Ok(())
}

pub async fn like_chapter(state: &AppState, page: &mut ChapterPage) -> Result<(), Notice> {
    let actor = state.session.actor();
    page.like = state
        .aggregation
        .toggle_target_like(ContentTarget::Chapter(page.chapter.id), actor.as_ref(), page.like)
        .await
        .map_err(|e| {
            NoticeMap::new()
                .unauthenticated(MSG_LIKE_SIGN_IN, None)
                .notice(&e)
        })?;
    Ok(())
}

// ============================================================================
// AUTHORING
// ============================================================================

fn authoring() -> NoticeMap {
    editor_guard(MSG_NO_STORY_PERMISSION)
}

pub async fn create_story(state: &AppState, request: CreateStoryRequest) -> Result<Outcome<Story>, Notice> {
    let actor = state.session.actor();
    let story = state
        .story_service
        .create_story(actor.as_ref(), request)
        .await
        .map_err(|e| authoring().notice(&e))?;
    let route = format!("/story/{}/edit", story.id);
    Ok(Outcome::new(story, Notice::success(MSG_POST_CREATED).redirect_to(route)))
}

pub async fn save_story(state: &AppState, request: UpdateStoryRequest) -> Result<Outcome<Story>, Notice> {
    let actor = state.session.actor();
    let story = state
        .story_service
        .update_metadata(actor.as_ref(), request)
        .await
        .map_err(|e| authoring().notice(&e))?;
    Ok(Outcome::new(story, Notice::success(MSG_SAVED)))
}

pub async fn save_single_body(state: &AppState, story_id: Uuid, text: &str) -> Result<Outcome<SingleStory>, Notice> {
    let actor = state.session.actor();
    let body = state
        .story_service
        .save_single_body(actor.as_ref(), story_id, text)
        .await
        .map_err(|e| authoring().notice(&e))?;
    Ok(Outcome::new(body, Notice::success(MSG_SAVED)))
}

pub async fn add_chapter(state: &AppState, story_id: Uuid, title: &str, content: &str) -> Result<Outcome<Chapter>, Notice> {
    let actor = state.session.actor();
    let chapter = state
        .story_service
        .add_chapter(actor.as_ref(), story_id, title, content)
        .await
        .map_err(|e| authoring().notice(&e))?;
    Ok(Outcome::new(chapter, Notice::success(MSG_SAVED)))
}

pub async fn save_chapter(
    state: &AppState,
    story_id: Uuid,
    chapter_id: Uuid,
    title: &str,
    content: &str,
) -> Result<Outcome<Chapter>, Notice> {
    let actor = state.session.actor();
    let chapter = state
        .story_service
        .update_chapter(actor.as_ref(), story_id, chapter_id, title, content)
        .await
        .map_err(|e| editor_guard(MSG_NO_CHAPTER_PERMISSION).notice(&e))?;
    Ok(Outcome::new(chapter, Notice::success(MSG_SAVED)))
}

/// Delete the story and everything hanging off it.
/// A partial deletion reports an error; running it again is safe.
pub async fn delete_story(state: &AppState, story_id: Uuid) -> Notice {
    let actor = state.session.actor();
    let map = authoring().failure(MSG_POST_DELETE_FAILED);
    match state.story_service.delete_story(actor.as_ref(), story_id).await {
        Ok(report) if report.is_complete() => {
            Notice::success(MSG_POST_DELETED).redirect_to(ROUTE_PROFILE)
        }
        Ok(report) => {
            if let Some((step, reason)) = &report.failed {
                log::error!(
                    "story {} deletion stopped at {} after {} steps: {}",
                    story_id,
                    step,
                    report.completed.len(),
                    reason
                );
            }
            Notice::error(MSG_POST_DELETE_FAILED)
        }
        Err(e) => map.notice(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{local_state, sign_in, sign_out_locally};
    use crate::domain::ContentType;
    use crate::services::SortMode;

    fn request(title: &str) -> CreateStoryRequest {
        CreateStoryRequest {
            title: title.to_string(),
            description: None,
            tags: vec![],
            content_type: ContentType::Story,
            categories: vec!["Nağıl".to_string()],
            cover: None,
        }
    }

    #[tokio::test]
    async fn test_create_then_two_views() {
        let (state, _dir) = local_state();
        sign_in(&state);
        let created = create_story(&state, request("Dağ kəndi")).await.unwrap();
        assert_eq!(created.notice.message, MSG_POST_CREATED);
        let story_id = created.value.id;

        sign_in(&state);
        open_story(&state, story_id).await.unwrap();
        let page = open_story(&state, story_id).await.unwrap();

        assert_eq!(page.stats.views, 2);
        assert_eq!(page.stats.likes, 0);
        assert!(!page.is_owner);
        assert!(matches!(page.body, StoryBody::Single(Some(_))));
        assert_eq!(page.comments.page_size(), 5);
        assert_eq!(page.comments.sort_mode(), SortMode::Newest);
    }

    #[tokio::test]
    async fn test_missing_story_redirects_to_profile() {
        let (state, _dir) = local_state();
        let notice = open_story(&state, Uuid::new_v4()).await.err().unwrap();
        assert_eq!(notice.message, MSG_STORY_NOT_FOUND);
        assert_eq!(notice.redirect.as_deref(), Some(ROUTE_PROFILE));
    }

    #[tokio::test]
    async fn test_unauthenticated_like_changes_nothing() {
        let (state, _dir) = local_state();
        sign_in(&state);
        let story_id = create_story(&state, request("Nağıl")).await.unwrap().value.id;
        sign_out_locally(&state);

        let mut page = open_story(&state, story_id).await.unwrap();
        let notice = like_story(&state, &mut page).await.err().unwrap();
        assert_eq!(notice.message, MSG_LIKE_SIGN_IN);
        assert_eq!(page.like, LikeState::new(false, 0));
        assert_eq!(page.stats.views, 0);

        let reopened = open_story(&state, story_id).await.unwrap();
        assert_eq!(reopened.stats.likes, 0);
    }

    #[tokio::test]
    async fn test_like_story_then_chapter_story_is_info() {
        let (state, _dir) = local_state();
        sign_in(&state);
        let story_id = create_story(&state, request("Nağıl")).await.unwrap().value.id;

        let mut page = open_story(&state, story_id).await.unwrap();
        like_story(&state, &mut page).await.unwrap();
        assert_eq!(page.like, LikeState::new(true, 1));

        add_chapter(&state, story_id, "Birinci", "Mətn").await.unwrap();
        let mut page = open_story(&state, story_id).await.unwrap();
        assert!(matches!(&page.body, StoryBody::Chapters(c) if c.len() == 1));
        let notice = like_story(&state, &mut page).await.err().unwrap();
        assert_eq!(notice.kind, NoticeKind::Info);
    }

    #[tokio::test]
    async fn test_chapter_page_navigation_and_like() {
        let (state, _dir) = local_state();
        sign_in(&state);
        let story_id = create_story(&state, request("Roman")).await.unwrap().value.id;
        let first = add_chapter(&state, story_id, "1", "a").await.unwrap().value;
        let second = add_chapter(&state, story_id, "2", "b").await.unwrap().value;

        let mut page = open_chapter(&state, story_id, second.id).await.unwrap();
        assert_eq!(page.previous, Some(first.id));
        assert_eq!(page.next, None);
        assert_eq!(page.stats.views, 1);
        assert_eq!(page.comments.page_size(), 10);

        like_chapter(&state, &mut page).await.unwrap();
        assert_eq!(page.like, LikeState::new(true, 1));

        let story_page = open_story(&state, story_id).await.unwrap();
        assert_eq!(story_page.stats.likes, 1);
        assert_eq!(story_page.like, LikeState::new(false, story_page.stats.likes));
    }

    #[tokio::test]
    async fn test_chapter_of_other_story_redirects_back() {
        let (state, _dir) = local_state();
        sign_in(&state);
        let a = create_story(&state, request("A")).await.unwrap().value.id;
        let b = create_story(&state, request("B")).await.unwrap().value.id;
        let chapter = add_chapter(&state, a, "1", "x").await.unwrap().value;

        let notice = open_chapter(&state, b, chapter.id).await.err().unwrap();
        assert_eq!(notice.message, MSG_CHAPTER_NOT_FOUND);
        assert_eq!(notice.redirect, Some(story_route(b)));
    }

    #[tokio::test]
    async fn test_editor_guard_redirects() {
        let (state, _dir) = local_state();
        sign_in(&state);
        let story_id = create_story(&state, request("Mənim")).await.unwrap().value.id;
        assert!(open_story_editor(&state, story_id).await.is_ok());

        sign_out_locally(&state);
        let notice = open_story_editor(&state, story_id).await.err().unwrap();
        assert_eq!(notice.redirect.as_deref(), Some(ROUTE_AUTH));

        sign_in(&state);
        let notice = open_story_editor(&state, story_id).await.err().unwrap();
        assert_eq!(notice.message, MSG_NO_STORY_PERMISSION);
        assert_eq!(notice.redirect.as_deref(), Some(ROUTE_PROFILE));

        let notice = open_story_editor(&state, Uuid::new_v4()).await.err().unwrap();
        assert_eq!(notice.message, MSG_STORY_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_story_from_editor() {
        let (state, _dir) = local_state();
        sign_in(&state);
        let story_id = create_story(&state, request("Silinəcək")).await.unwrap().value.id;
        add_chapter(&state, story_id, "1", "x").await.unwrap();

        let notice = delete_story(&state, story_id).await;
        assert_eq!(notice.message, MSG_POST_DELETED);
        assert_eq!(notice.redirect.as_deref(), Some(ROUTE_PROFILE));
        assert!(open_story(&state, story_id).await.is_err());
    }

    #[test]
    fn test_neighbours_of_edges() {
        let story = Uuid::new_v4();
        let chapters: Vec<Chapter> = (1..=3)
            .map(|n| Chapter::new(story, n, format!("{}", n), "x".to_string()))
            .collect();
        assert_eq!(neighbours(&chapters, chapters[0].id), (None, Some(chapters[1].id)));
        assert_eq!(
            neighbours(&chapters, chapters[1].id),
            (Some(chapters[0].id), Some(chapters[2].id))
        );
        assert_eq!(neighbours(&chapters, Uuid::new_v4()), (None, None));
    }
}
