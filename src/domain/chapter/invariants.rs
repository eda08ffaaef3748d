use super::entity::{Chapter, SingleStory};
use crate::domain::{DomainError, DomainResult};

/// Chapter title and body are required; numbers start at 1
pub fn validate_chapter(chapter: &Chapter) -> DomainResult<()> {
    if chapter.chapter_number == 0 {
        return Err(DomainError::InvariantViolation(
            "Chapter numbers start at 1".to_string(),
        ));
    }
    if chapter.title.trim().is_empty() || chapter.content.trim().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Chapter title and content are required".to_string(),
        ));
    }
    Ok(())
}

/// A saved single body must not be blank.
/// The empty placeholder written at story creation bypasses this.
pub fn validate_single_story(body: &SingleStory) -> DomainResult<()> {
    if body.content.trim().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Story content is required".to_string(),
        ));
    }
    Ok(())
}
