pub mod entity;
pub mod invariants;

pub use entity::{next_chapter_number, Chapter, SingleStory};
pub use invariants::{validate_chapter, validate_single_story};
