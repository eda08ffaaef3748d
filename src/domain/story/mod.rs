pub mod entity;
pub mod invariants;

pub use entity::{ContentType, Story, StoryStatus};
pub use invariants::{
    normalize_tags, validate_categories, validate_story, MAX_CATEGORIES, POEM_CATEGORIES,
    STORY_CATEGORIES,
};
