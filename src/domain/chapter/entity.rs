use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One chapter of a chapter-structured story
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: Uuid,

    /// Parent story
    pub story_id: Uuid,

    /// Positive, unique within the story. Never reused or renumbered.
    pub chapter_number: u32,

    pub title: String,
    pub content: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of a single-bodied story (at most one per story)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleStory {
    pub id: Uuid,
    pub story_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chapter {
    pub fn new(story_id: Uuid, chapter_number: u32, title: String, content: String) -> Self {
        let now = crate::domain::timestamp_now();
        Self {
            id: Uuid::new_v4(),
            story_id,
            chapter_number,
            title,
            content,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn revise(&mut self, title: String, content: String) {
        self.title = title;
        self.content = content;
        self.updated_at = crate::domain::timestamp_now();
    }
}

impl SingleStory {
    pub fn new(story_id: Uuid, content: String) -> Self {
        let now = crate::domain::timestamp_now();
        Self {
            id: Uuid::new_v4(),
            story_id,
            content,
            created_at: now,
            updated_at: now,
        }
    }
}

/// max + 1, or 1 for the first chapter
pub fn next_chapter_number(current_max: Option<u32>) -> u32 {
    current_max.map(|n| n + 1).unwrap_or(1)
}
