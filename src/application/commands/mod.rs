// src/application/commands/mod.rs
//
// Command Handlers
//
// RULES:
// - Read the actor from the session provider
// - Call services
// - Return page models or Notices
// - Never contain business logic

pub mod comment_commands;
pub mod profile_commands;
pub mod session_commands;
pub mod story_commands;

pub use comment_commands::*;
pub use profile_commands::*;
pub use session_commands::*;
pub use story_commands::*;
