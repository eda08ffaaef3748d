use super::entity::{ContentType, Story};
use crate::domain::{DomainError, DomainResult};

pub const MAX_CATEGORIES: usize = 5;

pub const STORY_CATEGORIES: &[&str] = &[
    "Nağıl",
    "Qısa hekayə",
    "Roman parçaları",
    "Fantastika",
    "Elmi-fantastika",
    "Sehrli realizm",
    "Psixoloji",
    "Dram",
    "Komediya",
    "Romantika",
    "Dəhşət / Qorxu",
    "Macəra",
    "Tarixi hadisələr",
];

pub const POEM_CATEGORIES: &[&str] = &[
    "Klassik şeir",
    "Müasir şeir",
    "Qəzəl",
    "Qoşma",
    "Bayatı",
    "Rübai",
    "Poema",
    "Mahnı sözləri",
    "Sevgi",
    "Dostluq",
    "Vətən",
    "Təbiət",
    "Uşaq",
    "Dini",
];

impl ContentType {
    pub fn categories(&self) -> &'static [&'static str] {
        match self {
            ContentType::Story => STORY_CATEGORIES,
            ContentType::Poem => POEM_CATEGORIES,
        }
    }
}

/// Validates input-time Story rules
pub fn validate_story(story: &Story) -> DomainResult<()> {
    if story.title.trim().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Title is required".to_string(),
        ));
    }
    validate_categories(story.content_type, &story.categories)
}

/// 1..=5 categories, all from the list of the content type, no repeats
pub fn validate_categories(content_type: ContentType, categories: &[String]) -> DomainResult<()> {
    if categories.is_empty() {
        return Err(DomainError::InvariantViolation(
            "At least one category must be selected".to_string(),
        ));
    }
    if categories.len() > MAX_CATEGORIES {
        return Err(DomainError::InvariantViolation(format!(
            "At most {} categories can be selected",
            MAX_CATEGORIES
        )));
    }

    let allowed = content_type.categories();
    for (idx, category) in categories.iter().enumerate() {
        if !allowed.contains(&category.as_str()) {
            return Err(DomainError::InvariantViolation(format!(
                "Category '{}' does not belong to {}",
                category, content_type
            )));
        }
        if categories[..idx].contains(category) {
            return Err(DomainError::InvariantViolation(format!(
                "Category '{}' selected twice",
                category
            )));
        }
    }
    Ok(())
}

/// Trims tags, drops blanks and repeated values, keeps first-seen order
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}
