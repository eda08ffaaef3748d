pub mod entity;

pub use entity::{checked_comment_text, Comment, CommentScope};
