// src/application/commands/comment_commands.rs
//
// Comment Command Handlers
//
// Operate on the CommentThread a page holds.

use uuid::Uuid;

use crate::application::notice::*;
use crate::application::AppState;
use crate::domain::DomainError;
use crate::error::AppError;
use crate::services::{CommentThread, PanelState};

fn is_blank_rejection(error: &AppError) -> bool {
    matches!(error, AppError::Domain(DomainError::InvariantViolation(_)))
}

pub async fn post_comment(state: &AppState, thread: &mut CommentThread, text: &str) -> Notice {
    let actor = state.session.actor();
    match thread.add_comment(actor.as_ref(), text).await {
        Ok(()) => Notice::success(MSG_COMMENT_ADDED),
        Err(e) if is_blank_rejection(&e) => Notice::error(MSG_COMMENT_EMPTY),
        Err(e) => NoticeMap::new()
            .unauthenticated(MSG_COMMENT_SIGN_IN, None)
            .failure(MSG_COMMENT_ADD_FAILED)
            .notice(&e),
    }
}

/// Save the draft of the comment being edited
pub async fn save_comment_edit(state: &AppState, thread: &mut CommentThread) -> Notice {
    if !matches!(thread.panel(), PanelState::Editing { .. }) {
        return Notice::error(MSG_COMMENT_UPDATE_FAILED);
    }
    let actor = state.session.actor();
    match thread.submit_edit(actor.as_ref()).await {
        Ok(()) => Notice::success(MSG_COMMENT_UPDATED),
        Err(e) if is_blank_rejection(&e) => Notice::error(MSG_COMMENT_EMPTY),
        Err(e) => NoticeMap::new()
            .failure(MSG_COMMENT_UPDATE_FAILED)
            .notice(&e),
    }
}

pub async fn remove_comment(state: &AppState, thread: &mut CommentThread, comment_id: Uuid) -> Notice {
    let actor = state.session.actor();
    match thread.delete_comment(actor.as_ref(), comment_id).await {
        Ok(()) => Notice::success(MSG_COMMENT_DELETED),
        Err(e) => NoticeMap::new()
            .forbidden(MSG_COMMENT_DELETE_FAILED, None)
            .not_found(MSG_COMMENT_DELETE_FAILED, None)
            .failure(MSG_COMMENT_DELETE_FAILED)
            .notice(&e),
    }
}

pub async fn like_comment(state: &AppState, thread: &mut CommentThread, comment_id: Uuid) -> Result<(), Notice> {
    let actor = state.session.actor();
    thread
        .toggle_comment_like(actor.as_ref(), comment_id)
        .await
        .map(|_| ())
        .map_err(|e| {
            NoticeMap::new()
                .unauthenticated(MSG_LIKE_SIGN_IN, None)
                .notice(&e)
        })
}

/// Reload the thread if another action invalidated it
pub async fn refresh_comments(state: &AppState, thread: &mut CommentThread) -> Result<bool, Notice> {
    let actor = state.session.actor();
    thread
        .refresh_if_stale(actor.as_ref())
        .await
        .map_err(|e| notice_for(&e))
}
