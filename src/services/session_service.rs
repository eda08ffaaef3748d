// src/services/session_service.rs
//
// Session Provider - Current Actor and Change Notifications
//
// CRITICAL RULES:
// - One explicit context object; nothing global
// - State changes only after the backend agrees (sign-out failure leaves
//   the prior session in place)
// - Every change is broadcast as SessionChanged

use std::sync::{Arc, RwLock};

use chrono::Utc;

use crate::domain::{Actor, Session};
use crate::error::{AppError, AppResult};
use crate::events::{EventBus, SessionChanged, Subscription};
use crate::infrastructure::AuthProvider;

pub struct SessionProvider {
    auth: Arc<dyn AuthProvider>,
    event_bus: Arc<EventBus>,
    current: RwLock<Option<Session>>,
}

impl SessionProvider {
    pub fn new(auth: Arc<dyn AuthProvider>, event_bus: Arc<EventBus>) -> Self {
        Self {
            auth,
            event_bus,
            current: RwLock::new(None),
        }
    }

    /// Restore whatever session the auth backend holds.
    ///
    /// A backend failure leaves the provider signed out and is returned.
    pub async fn init(&self) -> AppResult<Option<Session>> {
        let session = match self.auth.current_session().await {
            Ok(session) => session,
            Err(e) => {
                log::warn!("session restore failed: {}", e);
                self.replace(None);
                return Err(e);
            }
        };
        self.replace(session.clone());
        Ok(session)
    }

    /// The live session; expired sessions read as none
    pub fn current(&self) -> Option<Session> {
        self.read()
            .clone()
            .filter(|s| !s.is_expired(Utc::now()))
    }

    pub fn actor(&self) -> Option<Actor> {
        self.current().map(|s| s.actor)
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    /// The actor, or `Unauthenticated`
    pub fn require_actor(&self) -> AppResult<Actor> {
        self.actor().ok_or(AppError::Unauthenticated)
    }

    /// Notify `handler` on every session change until the handle is dropped
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&SessionChanged) + Send + Sync + 'static,
    {
        self.event_bus.subscribe::<SessionChanged, _>(handler)
    }

    /// Install a session obtained by an external sign-in flow
    pub fn set_session(&self, session: Option<Session>) {
        self.auth.adopt(session.clone());
        self.replace(session);
    }

    /// End the session on the backend, then locally
    pub async fn sign_out(&self) -> AppResult<()> {
        if let Err(e) = self.auth.sign_out().await {
            log::error!("sign-out failed: {}", e);
            return Err(e);
        }
        self.replace(None);
        log::info!("signed out");
        Ok(())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<Session>> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Swap the stored session; emits only when the actor changed
    fn replace(&self, session: Option<Session>) {
        let before = self.read().as_ref().map(|s| s.actor.id);
        let after = session.as_ref().map(|s| s.actor.id);
        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = session;

        if before != after {
            self.event_bus.emit(SessionChanged::new(after));
        }
    }
}
