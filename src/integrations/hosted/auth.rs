// src/integrations/hosted/auth.rs

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::{Actor, Session};
use crate::error::AppResult;
use crate::infrastructure::AuthProvider;
use crate::integrations::hosted::client::HostedClient;

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

/// Session lookups against /auth/v1
pub struct HostedAuth {
    client: Arc<HostedClient>,
}

impl HostedAuth {
    pub fn new(client: Arc<HostedClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthProvider for HostedAuth {
    async fn current_session(&self) -> AppResult<Option<Session>> {
        let Some(token) = self.client.access_token() else {
            return Ok(None);
        };

        let response = self
            .client
            .request(Method::GET, &self.client.auth_url("user"))
            .send()
            .await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            log::info!("stored access token rejected; continuing signed out");
            return Ok(None);
        }
        let response = HostedClient::check(response, "get user").await?;
        let user: UserPayload = response.json().await?;

        Ok(Some(Session::with_token(Actor::new(user.id, user.email), token)))
    }

    async fn sign_out(&self) -> AppResult<()> {
        let response = self
            .client
            .request(Method::POST, &self.client.auth_url("logout"))
            .send()
            .await?;
        HostedClient::check(response, "sign out").await?;
        self.client.set_access_token(None);
        Ok(())
    }

    fn adopt(&self, session: Option<Session>) {
        self.client
            .set_access_token(session.and_then(|s| s.access_token));
    }
}
