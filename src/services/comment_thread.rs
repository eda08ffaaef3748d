// src/services/comment_thread.rs
//
// Comment Thread - View Model for One Comment Section
//
// Holds the joined entries of one parent, the sort and page selection
// and the panel/edit state. Mutations go through CommentService and are
// followed by a reload; a watched thread also goes stale when anyone
// else invalidates its (collection, parent id) key.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Actor, CommentScope, DomainError, LikeState};
use crate::error::{AppError, AppResult};
use crate::events::{CollectionInvalidated, EventBus, Subscription};
use crate::services::{CommentEntry, CommentService};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// created_at descending
    #[default]
    Newest,
    /// like count descending, ties in fetch order
    MostLiked,
}

/// Visibility of the comment panel and the comment being edited
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PanelState {
    #[default]
    Hidden,
    Viewing,
    Editing { comment_id: Uuid, draft: String },
}

impl PanelState {
    pub fn is_visible(&self) -> bool {
        !matches!(self, PanelState::Hidden)
    }
}

/// Stable reordering of `entries` (which are in fetch order)
pub fn sort_entries(entries: &mut [CommentEntry], mode: SortMode) {
    match mode {
        SortMode::Newest => entries.sort_by(|a, b| b.comment.created_at.cmp(&a.comment.created_at)),
        SortMode::MostLiked => entries.sort_by_key(|e| std::cmp::Reverse(e.like_count())),
    }
}

/// Number of pages needed for `total` items
pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// Items of 1-based page `n`; empty when out of range
pub fn page_slice<T>(items: &[T], page_size: usize, n: usize) -> &[T] {
    if n == 0 || page_size == 0 {
        return &[];
    }
    let start = (n - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = (start + page_size).min(items.len());
    &items[start..end]
}

pub struct CommentThread {
    service: Arc<CommentService>,
    scope: CommentScope,
    parent_id: Uuid,
    content_owner_id: Uuid,
    page_size: usize,

    /// In fetch order
    fetched: Vec<CommentEntry>,
    /// `fetched` reordered by `sort`
    sorted: Vec<CommentEntry>,
    sort: SortMode,
    page: usize,
    panel: PanelState,

    stale: Arc<AtomicBool>,
    watch: Option<Subscription>,
}

impl CommentThread {
    pub fn new(
        service: Arc<CommentService>,
        scope: CommentScope,
        parent_id: Uuid,
        content_owner_id: Uuid,
        page_size: usize,
    ) -> Self {
        Self {
            service,
            scope,
            parent_id,
            content_owner_id,
            page_size: page_size.max(1),
            fetched: Vec::new(),
            sorted: Vec::new(),
            sort: SortMode::Newest,
            page: 1,
            panel: PanelState::Hidden,
            stale: Arc::new(AtomicBool::new(true)),
            watch: None,
        }
    }

    pub fn scope(&self) -> CommentScope {
        self.scope
    }

    pub fn parent_id(&self) -> Uuid {
        self.parent_id
    }

    /// Mark the thread stale whenever its key is invalidated.
    /// Replaces any earlier watch.
    pub fn watch(&mut self, bus: &EventBus) {
        let stale = Arc::clone(&self.stale);
        let collection = self.scope.collection();
        let parent_id = self.parent_id;
        self.watch = Some(bus.subscribe::<CollectionInvalidated, _>(move |event| {
            if event.matches(collection, parent_id) {
                stale.store(true, Ordering::SeqCst);
            }
        }));
    }

    /// Stop watching; the thread keeps its data
    pub fn unwatch(&mut self) {
        if let Some(sub) = self.watch.take() {
            sub.dispose();
        }
    }

    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::SeqCst)
    }

    // ========================================================================
    // LOADING
    // ========================================================================

    /// Fetch and join all comments; keeps sort, clamps the page
    pub async fn load(&mut self, actor: Option<&Actor>) -> AppResult<()> {
        // cleared first so an invalidation during the read is not lost
        self.stale.store(false, Ordering::SeqCst);
        let entries = match self
            .service
            .load_entries(self.scope, self.parent_id, self.content_owner_id, actor)
            .await
        {
            Ok(entries) => entries,
            Err(e) => {
                self.stale.store(true, Ordering::SeqCst);
                return Err(e);
            }
        };

        self.fetched = entries;
        self.resort();
        self.page = self.page.clamp(1, self.page_count().max(1));
        Ok(())
    }

    /// Reload only if something invalidated the thread
    pub async fn refresh_if_stale(&mut self, actor: Option<&Actor>) -> AppResult<bool> {
        if !self.is_stale() {
            return Ok(false);
        }
        self.load(actor).await?;
        Ok(true)
    }

    // ========================================================================
    // SORTING AND PAGING
    // ========================================================================

    pub fn sort_mode(&self) -> SortMode {
        self.sort
    }

    /// Reorder and return to page 1
    pub fn sort_by(&mut self, mode: SortMode) {
        self.sort = mode;
        self.resort();
        self.page = 1;
    }

    fn resort(&mut self) {
        self.sorted = self.fetched.clone();
        sort_entries(&mut self.sorted, self.sort);
    }

    /// Every entry in the current sort order
    pub fn entries(&self) -> &[CommentEntry] {
        &self.sorted
    }

    pub fn total(&self) -> usize {
        self.sorted.len()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_count(&self) -> usize {
        page_count(self.sorted.len(), self.page_size)
    }

    pub fn current_page(&self) -> usize {
        self.page
    }

    /// Entries of 1-based page `n`; empty when out of range
    pub fn page(&self, n: usize) -> &[CommentEntry] {
        page_slice(&self.sorted, self.page_size, n)
    }

    pub fn current_entries(&self) -> &[CommentEntry] {
        self.page(self.page)
    }

    /// Navigate, clamped to `1..=page_count`; returns the page now shown
    pub fn set_page(&mut self, n: usize) -> usize {
        self.page = n.clamp(1, self.page_count().max(1));
        self.page
    }

    pub fn next_page(&mut self) -> usize {
        self.set_page(self.page + 1)
    }

    pub fn previous_page(&mut self) -> usize {
        self.set_page(self.page.saturating_sub(1))
    }

    // ========================================================================
    // PANEL STATE
    // ========================================================================

    pub fn panel(&self) -> &PanelState {
        &self.panel
    }

    pub fn show(&mut self) {
        if self.panel == PanelState::Hidden {
            self.panel = PanelState::Viewing;
        }
    }

    /// Hiding abandons any edit in progress
    pub fn hide(&mut self) {
        self.panel = PanelState::Hidden;
    }

    pub fn toggle_panel(&mut self) {
        if self.panel.is_visible() {
            self.hide();
        } else {
            self.show();
        }
    }

    /// Start editing a comment the entry marks editable. Starting another
    /// edit abandons the current one.
    pub fn begin_edit(&mut self, comment_id: Uuid) -> AppResult<()> {
        if !self.panel.is_visible() {
            return Err(AppError::Domain(DomainError::InvalidStateTransition(
                "comments are hidden".to_string(),
            )));
        }
        let entry = self
            .sorted
            .iter()
            .find(|e| e.comment.id == comment_id)
            .ok_or(AppError::NotFound)?;
        if !entry.can_edit {
            return Err(AppError::Forbidden);
        }

        self.panel = PanelState::Editing {
            comment_id,
            draft: entry.comment.content.clone(),
        };
        Ok(())
    }

    pub fn set_draft(&mut self, text: &str) {
        if let PanelState::Editing { draft, .. } = &mut self.panel {
            *draft = text.to_string();
        }
    }

    pub fn cancel_edit(&mut self) {
        if matches!(self.panel, PanelState::Editing { .. }) {
            self.panel = PanelState::Viewing;
        }
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// Post a comment, reload, show page 1
    pub async fn add_comment(&mut self, actor: Option<&Actor>, text: &str) -> AppResult<()> {
        self.service
            .add_comment(self.scope, self.parent_id, actor, text)
            .await?;
        self.load(actor).await?;
        self.page = 1;
        Ok(())
    }

    /// Save the draft of the comment being edited
    pub async fn submit_edit(&mut self, actor: Option<&Actor>) -> AppResult<()> {
        let PanelState::Editing { comment_id, draft } = self.panel.clone() else {
            return Err(AppError::Domain(DomainError::InvalidStateTransition(
                "no comment is being edited".to_string(),
            )));
        };
        self.edit_comment(actor, comment_id, &draft).await
    }

    pub async fn edit_comment(&mut self, actor: Option<&Actor>, comment_id: Uuid, text: &str) -> AppResult<()> {
        self.service
            .edit_comment(self.scope, comment_id, actor, text)
            .await?;
        if matches!(&self.panel, PanelState::Editing { comment_id: id, .. } if *id == comment_id) {
            self.panel = PanelState::Viewing;
        }
        self.load(actor).await
    }

    pub async fn delete_comment(&mut self, actor: Option<&Actor>, comment_id: Uuid) -> AppResult<()> {
        self.service
            .delete_comment(self.scope, comment_id, actor, self.content_owner_id)
            .await?;
        if matches!(&self.panel, PanelState::Editing { comment_id: id, .. } if *id == comment_id) {
            self.panel = PanelState::Viewing;
        }
        self.load(actor).await
    }

    /// Toggle the actor's like and patch the entry in place
    pub async fn toggle_comment_like(&mut self, actor: Option<&Actor>, comment_id: Uuid) -> AppResult<LikeState> {
        let current = self
            .fetched
            .iter()
            .find(|e| e.comment.id == comment_id)
            .ok_or(AppError::NotFound)?
            .like
            .unwrap_or_default();

        let next = self
            .service
            .toggle_comment_like(self.scope, comment_id, actor, current)
            .await?;

        for list in [&mut self.fetched, &mut self.sorted] {
            if let Some(entry) = list.iter_mut().find(|e| e.comment.id == comment_id) {
                entry.like = Some(next);
            }
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Comment, FactKind};
    use crate::repositories::test_support::memory_store;
    use crate::repositories::Repositories;
    use crate::services::AggregationService;
    use chrono::{Duration, Utc};

    struct Fixture {
        service: Arc<CommentService>,
        repos: Repositories,
        bus: Arc<EventBus>,
    }

    fn fixture() -> Fixture {
        let repos = Repositories::sqlite(memory_store());
        let bus = Arc::new(EventBus::new());
        let aggregation = Arc::new(AggregationService::new(
            repos.engagement.clone(),
            repos.comments.clone(),
            repos.chapters.clone(),
            bus.clone(),
        ));
        let service = Arc::new(CommentService::new(
            repos.comments.clone(),
            repos.profiles.clone(),
            repos.engagement.clone(),
            aggregation,
            bus.clone(),
        ));
        Fixture { service, repos, bus }
    }

    fn actor() -> Actor {
        Actor::new(Uuid::new_v4(), None)
    }

    fn entry(likes: u64, minutes_ago: i64) -> CommentEntry {
        let mut comment = Comment::new(CommentScope::Story, Uuid::nil(), Uuid::new_v4(), "x".into());
        comment.created_at = Utc::now() - Duration::minutes(minutes_ago);
        CommentEntry {
            comment,
            author: None,
            like: Some(LikeState::new(false, likes)),
            can_edit: false,
            can_delete: false,
        }
    }

    /// Seed `n` comments on `parent`, oldest first
    async fn seed(f: &Fixture, parent: Uuid, n: usize) -> Vec<Comment> {
        let mut out = Vec::new();
        for i in 0..n {
            let mut c = Comment::new(CommentScope::Story, parent, Uuid::new_v4(), format!("c{}", i));
            c.created_at = Utc::now() - Duration::minutes((n - i) as i64);
            f.repos.comments.insert(&c).await.unwrap();
            out.push(c);
        }
        out
    }

    #[test]
    fn test_sort_is_stable_reordering() {
        let fetched = vec![entry(1, 1), entry(3, 2), entry(1, 3), entry(3, 4)];
        let mut sorted = fetched.clone();
        sort_entries(&mut sorted, SortMode::MostLiked);

        let ids = |v: &[CommentEntry]| v.iter().map(|e| e.comment.id).collect::<Vec<_>>();
        assert_eq!(
            ids(&sorted),
            vec![
                fetched[1].comment.id,
                fetched[3].comment.id,
                fetched[0].comment.id,
                fetched[2].comment.id
            ]
        );

        let mut a = ids(&sorted);
        let mut b = ids(&fetched);
        a.sort();
        b.sort();
        assert_eq!(a, b);

        sort_entries(&mut sorted, SortMode::Newest);
        assert_eq!(ids(&sorted), ids(&fetched));
    }

    #[test]
    fn test_pages_reconstruct_list() {
        let items: Vec<u32> = (0..23).collect();
        for size in [1, 5, 10, 23, 30] {
            let pages = page_count(items.len(), size);
            let rebuilt: Vec<u32> = (1..=pages)
                .flat_map(|n| page_slice(&items, size, n).to_vec())
                .collect();
            assert_eq!(rebuilt, items);
            assert!(page_slice(&items, size, pages + 1).is_empty());
            assert!(page_slice(&items, size, 0).is_empty());
        }
        assert_eq!(page_count(0, 5), 0);
    }

    #[tokio::test]
    async fn test_add_comment_scenario() {
        let f = fixture();
        let story = Uuid::new_v4();
        let me = actor();
        let mut thread = CommentThread::new(f.service.clone(), CommentScope::Story, story, Uuid::new_v4(), 5);
        thread.load(Some(&me)).await.unwrap();
        assert_eq!(thread.total(), 0);

        thread.add_comment(Some(&me), "Nice!").await.unwrap();

        assert_eq!(thread.total(), 1);
        assert_eq!(thread.current_page(), 1);
        let first = &thread.current_entries()[0];
        assert_eq!(first.comment.content, "Nice!");
        assert_eq!(first.comment.user_id, me.id);
        assert!(first.can_edit);
        assert_eq!(first.like, Some(LikeState::new(false, 0)));
    }

    #[tokio::test]
    async fn test_unauthenticated_add_is_rejected() {
        let f = fixture();
        let mut thread =
            CommentThread::new(f.service.clone(), CommentScope::Chapter, Uuid::new_v4(), Uuid::new_v4(), 10);
        thread.load(None).await.unwrap();
        assert!(matches!(
            thread.add_comment(None, "hi").await,
            Err(AppError::Unauthenticated)
        ));
        assert_eq!(thread.total(), 0);
    }

    #[tokio::test]
    async fn test_navigation_is_clamped() {
        let f = fixture();
        let story = Uuid::new_v4();
        seed(&f, story, 12).await;
        let mut thread = CommentThread::new(f.service.clone(), CommentScope::Story, story, Uuid::new_v4(), 5);
        thread.load(None).await.unwrap();

        assert_eq!(thread.page_count(), 3);
        assert_eq!(thread.set_page(9), 3);
        assert_eq!(thread.current_entries().len(), 2);
        assert_eq!(thread.next_page(), 3);
        assert_eq!(thread.set_page(0), 1);
        assert_eq!(thread.previous_page(), 1);
        assert_eq!(thread.current_entries()[0].comment.content, "c11");
        assert!(thread.page(4).is_empty());
    }

    #[tokio::test]
    async fn test_most_liked_with_toggle() {
        let f = fixture();
        let story = Uuid::new_v4();
        let seeded = seed(&f, story, 3).await;
        let fan = actor();
        f.repos
            .engagement
            .record(FactKind::StoryCommentLike, seeded[0].id, Uuid::new_v4())
            .await
            .unwrap();

        let mut thread = CommentThread::new(f.service.clone(), CommentScope::Story, story, Uuid::new_v4(), 5);
        thread.load(Some(&fan)).await.unwrap();
        thread.sort_by(SortMode::MostLiked);
        assert_eq!(thread.entries()[0].comment.id, seeded[0].id);

        let state = thread.toggle_comment_like(Some(&fan), seeded[0].id).await.unwrap();
        assert_eq!(state, LikeState::new(true, 2));
        assert_eq!(thread.entries()[0].like, Some(state));

        assert!(matches!(
            thread.toggle_comment_like(None, seeded[1].id).await,
            Err(AppError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_panel_state_machine() {
        let f = fixture();
        let story = Uuid::new_v4();
        let me = actor();
        let mut thread = CommentThread::new(f.service.clone(), CommentScope::Story, story, Uuid::new_v4(), 5);
        thread.add_comment(Some(&me), "one").await.unwrap();
        thread.add_comment(Some(&me), "two").await.unwrap();
        let a = thread.entries()[0].comment.id;
        let b = thread.entries()[1].comment.id;

        assert!(thread.begin_edit(a).is_err());
        thread.show();
        thread.begin_edit(a).unwrap();
        thread.begin_edit(b).unwrap();
        assert!(matches!(thread.panel(), PanelState::Editing { comment_id, .. } if *comment_id == b));

        thread.set_draft("   ");
        assert!(thread.submit_edit(Some(&me)).await.is_err());
        thread.set_draft("one, edited");
        thread.submit_edit(Some(&me)).await.unwrap();
        assert_eq!(thread.panel(), &PanelState::Viewing);
        assert!(thread.entries().iter().any(|e| e.comment.content == "one, edited"));

        thread.begin_edit(a).unwrap();
        thread.hide();
        assert_eq!(thread.panel(), &PanelState::Hidden);
        thread.toggle_panel();
        assert_eq!(thread.panel(), &PanelState::Viewing);
    }

    #[tokio::test]
    async fn test_watched_thread_goes_stale_on_foreign_write() {
        let f = fixture();
        let story = Uuid::new_v4();
        let mut thread = CommentThread::new(f.service.clone(), CommentScope::Story, story, Uuid::new_v4(), 5);
        thread.watch(&f.bus);
        thread.load(None).await.unwrap();
        assert!(!thread.is_stale());

        f.service
            .add_comment(CommentScope::Story, Uuid::new_v4(), Some(&actor()), "elsewhere")
            .await
            .unwrap();
        assert!(!thread.is_stale());

        f.service
            .add_comment(CommentScope::Story, story, Some(&actor()), "here")
            .await
            .unwrap();
        assert!(thread.is_stale());
        assert!(thread.refresh_if_stale(None).await.unwrap());
        assert_eq!(thread.total(), 1);
        assert!(!thread.refresh_if_stale(None).await.unwrap());

        thread.unwatch();
        f.service
            .add_comment(CommentScope::Story, story, Some(&actor()), "again")
            .await
            .unwrap();
        assert!(!thread.is_stale());
    }

    #[tokio::test]
    async fn test_story_owner_moderates_thread() {
        let f = fixture();
        let story = Uuid::new_v4();
        let owner = actor();
        let author = actor();
        let mut thread = CommentThread::new(f.service.clone(), CommentScope::Story, story, owner.id, 5);
        thread.add_comment(Some(&author), "spam").await.unwrap();
        let id = thread.entries()[0].comment.id;

        thread.load(Some(&owner)).await.unwrap();
        assert!(thread.entries()[0].can_delete);
        assert!(!thread.entries()[0].can_edit);
        thread.delete_comment(Some(&owner), id).await.unwrap();
        assert_eq!(thread.total(), 0);
    }
}
