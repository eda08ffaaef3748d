// src/application/mod.rs
//
// Application Layer
//
// ARCHITECTURE:
// - This layer sits ABOVE the services
// - It is the boundary between the UI and the services
// - Every failure leaves here as a Notice, never as an AppError
// - Page models are assembled here; business rules stay in services

pub mod commands;
pub mod notice;
pub mod state;

pub use commands::*;
pub use notice::{notice_for, Notice, NoticeKind, NoticeMap};
pub use state::AppState;

/// A successful action plus the toast it produces
#[derive(Debug, Clone)]
pub struct Outcome<T> {
    pub value: T,
    pub notice: Notice,
}

impl<T> Outcome<T> {
    pub fn new(value: T, notice: Notice) -> Self {
        Self { value, notice }
    }
}
