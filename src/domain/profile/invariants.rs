use std::sync::OnceLock;

use regex::Regex;

use super::entity::Profile;
use crate::domain::{DomainError, DomainResult};

fn username_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.]{3,30}$").expect("valid username pattern"))
}

/// Validates Profile invariants
pub fn validate_profile(profile: &Profile) -> DomainResult<()> {
    if let Some(username) = &profile.username {
        if !username_pattern().is_match(username) {
            return Err(DomainError::InvariantViolation(format!(
                "Username '{}' must be 3-30 letters, digits, '_' or '.'",
                username
            )));
        }
    }
    Ok(())
}
