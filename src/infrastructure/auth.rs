// src/infrastructure/auth.rs
//
// Authentication backend seam
//
// The sign-in form and credential exchange live outside this crate; an
// AuthProvider only restores and terminates sessions.

use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::Session;
use crate::error::AppResult;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The session the backend currently considers valid, if any
    async fn current_session(&self) -> AppResult<Option<Session>>;

    /// Terminate the session on the backend
    async fn sign_out(&self) -> AppResult<()>;

    /// Take over a session produced by an external sign-in flow
    fn adopt(&self, session: Option<Session>);
}

/// In-process auth for the local backend.
///
/// Holds whatever session was last handed to it.
#[derive(Default)]
pub struct LocalAuth {
    session: RwLock<Option<Session>>,
}

impl LocalAuth {
    pub fn new(session: Option<Session>) -> Self {
        Self {
            session: RwLock::new(session),
        }
    }

    pub fn store(&self, session: Option<Session>) {
        *self
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = session;
    }
}

#[async_trait]
impl AuthProvider for LocalAuth {
    async fn current_session(&self) -> AppResult<Option<Session>> {
        Ok(self
            .session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone())
    }

    async fn sign_out(&self) -> AppResult<()> {
        self.store(None);
        Ok(())
    }

    fn adopt(&self, session: Option<Session>) {
        self.store(session);
    }
}
