use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user-authored story or poem (the content item).
/// The body lives either in chapters or in a single body row,
/// selected by `is_chapters`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: Uuid,

    /// Owning actor. Immutable after creation.
    pub user_id: Uuid,

    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub cover_image_url: Option<String>,

    /// Free-text tags, stored in input order
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,

    pub content_type: ContentType,

    /// 1 to 5 labels from the list of the content type
    #[serde(default, deserialize_with = "null_as_empty")]
    pub categories: Vec<String>,

    pub status: StoryStatus,

    pub is_chapters: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Kind of work. Serialized with the labels the platform stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    #[serde(rename = "hekayə")]
    Story,
    #[serde(rename = "şeir")]
    Poem,
}

/// Publication lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryStatus {
    Draft,
    Published,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<Vec<String>> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

impl Story {
    /// New draft, single-bodied story owned by `user_id`
    pub fn new(user_id: Uuid, title: String, content_type: ContentType) -> Self {
        let now = crate::domain::timestamp_now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title,
            description: None,
            cover_image_url: None,
            tags: Vec::new(),
            content_type,
            categories: Vec::new(),
            status: StoryStatus::Draft,
            is_chapters: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = crate::domain::timestamp_now();
    }
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Story => "hekayə",
            ContentType::Poem => "şeir",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hekayə" => Ok(ContentType::Story),
            "şeir" => Ok(ContentType::Poem),
            other => Err(format!("Unknown content type: {}", other)),
        }
    }
}

impl std::fmt::Display for StoryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoryStatus::Draft => write!(f, "draft"),
            StoryStatus::Published => write!(f, "published"),
        }
    }
}

impl std::str::FromStr for StoryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(StoryStatus::Draft),
            "published" => Ok(StoryStatus::Published),
            other => Err(format!("Unknown story status: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_story_is_single_bodied_draft() {
        let owner = Uuid::new_v4();
        let story = Story::new(owner, "Dağlar".to_string(), ContentType::Poem);
        assert_eq!(story.user_id, owner);
        assert_eq!(story.status, StoryStatus::Draft);
        assert!(!story.is_chapters);
    }

    #[test]
    fn test_row_with_null_tags_deserializes() {
        let json = serde_json::json!({
            "id": Uuid::new_v4(),
            "user_id": Uuid::new_v4(),
            "title": "Nağıl",
            "description": null,
            "cover_image_url": null,
            "tags": null,
            "content_type": "hekayə",
            "categories": ["Nağıl"],
            "status": "draft",
            "is_chapters": false,
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-05-01T10:00:00Z"
        });

        let story: Story = serde_json::from_value(json).unwrap();
        assert!(story.tags.is_empty());
        assert_eq!(story.content_type, ContentType::Story);
    }
}
