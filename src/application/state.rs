// src/application/state.rs
//
// Application State - Composition Root
//
// Wires infrastructure -> repositories -> services for the configured
// backend. All fields are Arc-wrapped for sharing across UI actions.

use std::sync::Arc;

use crate::config::{AppConfig, BackendConfig};
use crate::db::{create_connection_pool, get_connection, initialize_database};
use crate::error::AppResult;
use crate::events::EventBus;
use crate::infrastructure::{AuthProvider, LocalAuth, LocalObjectStorage, ObjectStorage};
use crate::integrations::{HostedAuth, HostedClient, HostedObjectStorage, HostedStore};
use crate::repositories::Repositories;
use crate::services::{
    AggregationService, CommentService, ProfileService, SessionProvider, StoryService,
};

pub struct AppState {
    pub config: AppConfig,
    pub event_bus: Arc<EventBus>,
    pub session: Arc<SessionProvider>,
    pub aggregation: Arc<AggregationService>,
    pub story_service: Arc<StoryService>,
    pub profile_service: Arc<ProfileService>,
    pub comment_service: Arc<CommentService>,
}

impl AppState {
    /// Build every component for `config.backend`.
    ///
    /// The session is not restored here; call `session.init()` once the
    /// runtime is up.
    pub fn from_config(config: AppConfig) -> AppResult<Self> {
        config.validate()?;

        // 1. INFRASTRUCTURE
        let (repos, storage, auth): (Repositories, Arc<dyn ObjectStorage>, Arc<dyn AuthProvider>) =
            match &config.backend {
                BackendConfig::Local {
                    database_path,
                    storage_root,
                } => {
                    let pool = Arc::new(create_connection_pool(database_path)?);
                    {
                        let conn = get_connection(&pool)?;
                        initialize_database(&conn)?;
                    }
                    log::info!("using local backend at {}", database_path.display());
                    let storage: Arc<dyn ObjectStorage> =
                        Arc::new(LocalObjectStorage::new(storage_root.clone()));
                    let auth: Arc<dyn AuthProvider> = Arc::new(LocalAuth::default());
                    (Repositories::sqlite(pool), storage, auth)
                }
                BackendConfig::Hosted {
                    url,
                    anon_key,
                    access_token,
                } => {
                    let client = Arc::new(HostedClient::new(url, anon_key, access_token.clone())?);
                    log::info!("using hosted backend at {}", url);
                    let storage: Arc<dyn ObjectStorage> =
                        Arc::new(HostedObjectStorage::new(client.clone()));
                    let auth: Arc<dyn AuthProvider> = Arc::new(HostedAuth::new(client.clone()));
                    (hosted_repositories(client), storage, auth)
                }
            };

        Ok(Self::from_parts(config, repos, storage, auth))
    }

    /// Wire services over already-built infrastructure
    pub fn from_parts(
        config: AppConfig,
        repos: Repositories,
        storage: Arc<dyn ObjectStorage>,
        auth: Arc<dyn AuthProvider>,
    ) -> Self {
        let event_bus = Arc::new(EventBus::new());

        // 2. SERVICES
        let session = Arc::new(SessionProvider::new(auth, event_bus.clone()));
        let aggregation = Arc::new(AggregationService::new(
            repos.engagement.clone(),
            repos.comments.clone(),
            repos.chapters.clone(),
            event_bus.clone(),
        ));
        let story_service = Arc::new(StoryService::new(
            &repos,
            storage.clone(),
            aggregation.clone(),
            event_bus.clone(),
            config.delete_max_attempts,
        ));
        let profile_service = Arc::new(ProfileService::new(
            repos.profiles.clone(),
            story_service.clone(),
            storage,
            event_bus.clone(),
        ));
        let comment_service = Arc::new(CommentService::new(
            repos.comments.clone(),
            repos.profiles.clone(),
            repos.engagement.clone(),
            aggregation.clone(),
            event_bus.clone(),
        ));

        Self {
            config,
            event_bus,
            session,
            aggregation,
            story_service,
            profile_service,
            comment_service,
        }
    }
}

fn hosted_repositories(client: Arc<HostedClient>) -> Repositories {
    let store = Arc::new(HostedStore::new(client));
    Repositories {
        profiles: store.clone(),
        stories: store.clone(),
        chapters: store.clone(),
        single_stories: store.clone(),
        comments: store.clone(),
        engagement: store,
    }
}
