pub mod entity;
pub mod invariants;

pub use entity::{Profile, ProfileUpdate};
pub use invariants::validate_profile;
