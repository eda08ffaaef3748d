// src/application/commands/session_commands.rs
//
// Session Command Handlers

use crate::application::notice::*;
use crate::application::AppState;
use crate::domain::Actor;

/// Restore the backend's session at startup; failures leave the app
/// signed out
pub async fn restore_session(state: &AppState) -> Option<Actor> {
    match state.session.init().await {
        Ok(session) => session.map(|s| s.actor),
        Err(e) => {
            log::warn!("starting signed out: {}", e);
            None
        }
    }
}

pub async fn sign_out(state: &AppState) -> Notice {
    match state.session.sign_out().await {
        Ok(()) => Notice::success(MSG_SIGNED_OUT).redirect_to(ROUTE_HOME),
        Err(_) => Notice::error(MSG_SIGN_OUT_FAILED),
    }
}
