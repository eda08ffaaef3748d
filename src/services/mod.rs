// src/services/mod.rs
//
// Services Module - Orchestration Layer

pub mod aggregation_service;
pub mod comment_service;
pub mod comment_thread;
pub mod profile_service;
pub mod session_service;
pub mod story_service;

// Re-export all services and their types
pub use aggregation_service::AggregationService;

pub use comment_service::{CommentEntry, CommentService};

pub use comment_thread::{page_count, page_slice, sort_entries, CommentThread, PanelState, SortMode};

pub use profile_service::{ProfileService, PublicProfile};

pub use session_service::SessionProvider;

pub use story_service::{
    CreateStoryRequest,
    DeletionReport,
    DeletionStep,
    StoryService,
    StorySummary,
    UpdateStoryRequest,
};
