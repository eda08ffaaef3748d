pub mod entity;

pub use entity::{ContentTarget, EngagementFact, EngagementStats, FactKind, LikeState};
