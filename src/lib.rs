// src/lib.rs
// Inkora - story and poem sharing platform core
//
// Architecture:
// - Domain-centric: entities, invariants and ownership rules live in domain
// - Repositories: one trait per entity family, SQLite and hosted REST backends
// - Event-driven: services announce writes and invalidations on the event bus
// - Explicit session: every service call receives the acting user
// - Application layer: page loaders and actions that end in user notices

// ============================================================================
// FOUNDATION
// ============================================================================

pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod events;
pub mod infrastructure;
pub mod repositories;
pub mod services;

// ============================================================================
// APPLICATION LAYER
// ============================================================================

pub mod application;
pub mod integrations;

// ============================================================================
// PUBLIC API - Domain Entities
// ============================================================================

pub use domain::{
    can_delete_comment,
    can_edit_comment,
    is_owner,
    // Actor
    Actor,
    // Chapter
    Chapter,
    // Comment
    Comment,
    CommentScope,
    ContentTarget,
    ContentType,
    EngagementStats,
    // Engagement
    FactKind,
    LikeState,
    Owned,
    // Profile
    Profile,
    ProfileUpdate,
    Session,
    SingleStory,
    // Story
    Story,
    StoryStatus,
};

// ============================================================================
// PUBLIC API - Error Types
// ============================================================================

pub use error::{AppError, AppResult};

// ============================================================================
// PUBLIC API - Configuration
// ============================================================================

pub use config::{AppConfig, BackendConfig};

// ============================================================================
// PUBLIC API - Events
// ============================================================================

pub use events::{
    create_event_bus,
    ChapterAdded,
    // Cache
    CollectionInvalidated,
    CommentAdded,
    CommentDeleted,
    CommentEdited,
    DomainEvent,
    EventBus,
    EventLogEntry,
    LikeToggled,
    // Session
    SessionChanged,
    StoryCreated,
    StoryDeleted,
    Subscription,
};

// ============================================================================
// PUBLIC API - Database
// ============================================================================

pub use db::{create_connection_pool, create_memory_pool, initialize_database, ConnectionPool};

// ============================================================================
// PUBLIC API - Repositories
// ============================================================================

pub use repositories::{
    ChapterRepository,
    CommentRepository,
    EngagementRepository,
    ProfileRepository,
    Repositories,
    SingleStoryRepository,
    StoryRepository,
};

// ============================================================================
// PUBLIC API - Infrastructure
// ============================================================================

pub use infrastructure::{AuthProvider, Bucket, LocalAuth, LocalObjectStorage, ObjectStorage, Upload};

// ============================================================================
// PUBLIC API - Services
// ============================================================================

pub use services::{
    // Aggregation
    AggregationService,
    // Comments
    CommentEntry,
    CommentService,
    CommentThread,
    CreateStoryRequest,
    DeletionReport,
    PanelState,
    // Profiles
    ProfileService,
    PublicProfile,
    // Session
    SessionProvider,
    SortMode,
    // Stories
    StoryService,
    StorySummary,
    UpdateStoryRequest,
};

// ============================================================================
// PUBLIC API - Application Layer
// ============================================================================

pub use application::{AppState, Notice, NoticeKind, Outcome};

// Re-export application submodules
pub use application::commands;

// ============================================================================
// PUBLIC API - Integrations
// ============================================================================

pub use integrations::{HostedAuth, HostedClient, HostedObjectStorage, HostedStore};
