// src/services/profile_service.rs
//
// Profile Service - Profiles and Avatars
//
// CRITICAL RULES:
// - A profile is written only by the actor it belongs to
// - Avatars live at one path per user and are overwritten in place

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::domain::{is_owner, validate_profile, Actor, Profile, ProfileUpdate};
use crate::error::{AppError, AppResult};
use crate::events::{CollectionInvalidated, EventBus};
use crate::infrastructure::{avatar_path, store_public, Bucket, ObjectStorage, Upload};
use crate::repositories::ProfileRepository;
use crate::services::{StoryService, StorySummary};

/// What anyone may see about a user
#[derive(Debug, Clone, Serialize)]
pub struct PublicProfile {
    pub profile: Profile,
    pub stories: Vec<StorySummary>,
}

pub struct ProfileService {
    profile_repo: Arc<dyn ProfileRepository>,
    story_service: Arc<StoryService>,
    storage: Arc<dyn ObjectStorage>,
    event_bus: Arc<EventBus>,
}

impl ProfileService {
    pub fn new(
        profile_repo: Arc<dyn ProfileRepository>,
        story_service: Arc<StoryService>,
        storage: Arc<dyn ObjectStorage>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            profile_repo,
            story_service,
            storage,
            event_bus,
        }
    }

    pub async fn get_profile(&self, user_id: Uuid) -> AppResult<Profile> {
        self.profile_repo
            .get_by_id(user_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// The actor's own profile, created empty on first use
    pub async fn own_profile(&self, actor: Option<&Actor>) -> AppResult<Profile> {
        let actor = actor.ok_or(AppError::Unauthenticated)?;
        if let Some(profile) = self.profile_repo.get_by_id(actor.id).await? {
            return Ok(profile);
        }

        let profile = Profile::new(actor.id, actor.email.clone());
        self.profile_repo.save(&profile).await?;
        log::info!("created profile for {}", actor.id);
        Ok(profile)
    }

    pub async fn update_profile(&self, actor: Option<&Actor>, user_id: Uuid, update: ProfileUpdate) -> AppResult<Profile> {
        let actor = actor.ok_or(AppError::Unauthenticated)?;
        let mut profile = self.get_profile(user_id).await?;
        if !is_owner(Some(actor), &profile) {
            return Err(AppError::Forbidden);
        }

        profile.apply(update);
        validate_profile(&profile)?;
        self.profile_repo.update(&profile).await?;

        self.event_bus
            .emit(CollectionInvalidated::new("profiles", profile.id));
        Ok(profile)
    }

    /// Upload (overwrite) the actor's avatar and point the profile at it
    pub async fn upload_avatar(&self, actor: Option<&Actor>, upload: Upload) -> AppResult<Profile> {
        let mut profile = self.own_profile(actor).await?;

        let path = avatar_path(profile.id, &upload);
        let url = store_public(self.storage.as_ref(), Bucket::Avatars, &path, upload, true).await?;

        profile.apply(ProfileUpdate {
            avatar_url: Some(url),
            ..ProfileUpdate::default()
        });
        self.profile_repo.update(&profile).await?;

        self.event_bus
            .emit(CollectionInvalidated::new("profiles", profile.id));
        Ok(profile)
    }

    /// Profile plus every story of the user, newest first, with counts
    pub async fn public_profile(&self, user_id: Uuid) -> AppResult<PublicProfile> {
        let profile = self.get_profile(user_id).await?;
        let stories = self.story_service.list_by_owner(user_id).await?;
        Ok(PublicProfile { profile, stories })
    }
}
