// src/domain/ownership.rs
//
// Ownership Guard - Advisory ownership checks
//
// These gate which controls are offered (edit, delete, moderation).
// They do not stop a client from issuing the write itself; the
// backend's access policy is the enforcement point.

use uuid::Uuid;

use crate::domain::actor::Actor;
use crate::domain::comment::Comment;
use crate::domain::profile::Profile;
use crate::domain::story::Story;

/// Anything with an owning actor
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

impl Owned for Story {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

impl Owned for Comment {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

impl Owned for Profile {
    fn owner_id(&self) -> Uuid {
        self.id
    }
}

/// `actor.id == entity.owner_id`; never true without an actor
pub fn is_owner<E: Owned + ?Sized>(actor: Option<&Actor>, entity: &E) -> bool {
    actor.map(|a| a.id == entity.owner_id()).unwrap_or(false)
}

/// Comment text is editable by its author only
pub fn can_edit_comment(actor: Option<&Actor>, comment: &Comment) -> bool {
    is_owner(actor, comment)
}

/// Comments are deletable by their author or by the owner of the story
/// the thread belongs to
pub fn can_delete_comment(actor: Option<&Actor>, comment: &Comment, content_owner_id: Uuid) -> bool {
    is_owner(actor, comment) || actor.map(|a| a.id == content_owner_id).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::comment::CommentScope;
    use crate::domain::story::ContentType;

    fn actor() -> Actor {
        Actor::new(Uuid::new_v4(), None)
    }

    #[test]
    fn test_is_owner_truth_table() {
        let owner = actor();
        let stranger = actor();
        let story = Story::new(owner.id, "Title".to_string(), ContentType::Story);

        assert!(is_owner(Some(&owner), &story));
        assert!(!is_owner(Some(&stranger), &story));
        assert!(!is_owner(None, &story));
    }

    #[test]
    fn test_comment_permissions() {
        let story_owner = actor();
        let author = actor();
        let stranger = actor();
        let comment = Comment::new(
            CommentScope::Story,
            Uuid::new_v4(),
            author.id,
            "Nice!".to_string(),
        );

        assert!(can_edit_comment(Some(&author), &comment));
        assert!(!can_edit_comment(Some(&story_owner), &comment));
        assert!(!can_edit_comment(None, &comment));

        assert!(can_delete_comment(Some(&author), &comment, story_owner.id));
        assert!(can_delete_comment(Some(&story_owner), &comment, story_owner.id));
        assert!(!can_delete_comment(Some(&stranger), &comment, story_owner.id));
        assert!(!can_delete_comment(None, &comment, story_owner.id));
    }

    #[test]
    fn test_profile_owned_by_its_actor() {
        let me = actor();
        let profile = Profile::new(me.id, None);
        assert!(is_owner(Some(&me), &profile));
        assert!(!is_owner(Some(&actor()), &profile));
    }
}
