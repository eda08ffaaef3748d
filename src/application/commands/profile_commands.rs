// src/application/commands/profile_commands.rs
//
// Profile Command Handlers

use uuid::Uuid;

use crate::application::notice::*;
use crate::application::{AppState, Outcome};
use crate::domain::{Profile, ProfileUpdate};
use crate::infrastructure::Upload;
use crate::services::PublicProfile;

fn own_profile_guard() -> NoticeMap {
    NoticeMap::new().unauthenticated(MSG_SIGN_IN_REQUIRED, Some(ROUTE_AUTH))
}

/// The signed-in user's profile and stories
pub async fn open_own_profile(state: &AppState) -> Result<PublicProfile, Notice> {
    let actor = state.session.actor();
    let guard = own_profile_guard();
    let profile = state
        .profile_service
        .own_profile(actor.as_ref())
        .await
        .map_err(|e| guard.notice(&e))?;
    let stories = state
        .story_service
        .list_by_owner(profile.id)
        .await
        .map_err(|e| guard.notice(&e))?;
    Ok(PublicProfile { profile, stories })
}

pub async fn open_public_profile(state: &AppState, user_id: Uuid) -> Result<PublicProfile, Notice> {
    state
        .profile_service
        .public_profile(user_id)
        .await
        .map_err(|e| {
            NoticeMap::new()
                .not_found(MSG_USER_NOT_FOUND, Some(ROUTE_HOME))
                .notice(&e)
        })
}

pub async fn update_profile(state: &AppState, update: ProfileUpdate) -> Result<Outcome<Profile>, Notice> {
    let actor = state.session.actor();
    let guard = own_profile_guard();
    // the row may not exist before the first edit
    let own = state
        .profile_service
        .own_profile(actor.as_ref())
        .await
        .map_err(|e| guard.notice(&e))?;
    let profile = state
        .profile_service
        .update_profile(actor.as_ref(), own.id, update)
        .await
        .map_err(|e| guard.notice(&e))?;
    Ok(Outcome::new(profile, Notice::success(MSG_PROFILE_UPDATED)))
}

pub async fn upload_avatar(state: &AppState, upload: Upload) -> Result<Outcome<Profile>, Notice> {
    let actor = state.session.actor();
    let profile = state
        .profile_service
        .upload_avatar(actor.as_ref(), upload)
        .await
        .map_err(|e| own_profile_guard().notice(&e))?;
    Ok(Outcome::new(profile, Notice::success(MSG_AVATAR_UPLOADED)))
}
