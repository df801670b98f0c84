//! Auth backend speaking the Supabase Auth (GoTrue) REST API.

use super::{AuthProvider, Credentials, Session, User};
use crate::{
    errors::{Error, Result},
    remote::{error_message, with_api_key},
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;
use tracing::{instrument, warn};

/// Auth client for one Supabase project.
#[derive(Debug, Clone)]
pub struct SupabaseAuth {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseAuth {
    /// Creates a client for the project at `base_url`.
    pub fn new(client: Client, base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            anon_key: anon_key.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }
}

async fn auth_error(response: reqwest::Response) -> Error {
    Error::Auth {
        message: error_message(response).await,
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session> {
        let request = self
            .client
            .post(self.endpoint("token"))
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": credentials.email, "password": credentials.password }));

        let response = with_api_key(request, &self.anon_key, &self.anon_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(auth_error(response).await);
        }

        Ok(response.json::<Session>().await?)
    }

    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn sign_up(&self, credentials: &Credentials, redirect_to: &str) -> Result<()> {
        let request = self
            .client
            .post(self.endpoint("signup"))
            .query(&[("redirect_to", redirect_to)])
            .json(&json!({ "email": credentials.email, "password": credentials.password }));

        let response = with_api_key(request, &self.anon_key, &self.anon_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(auth_error(response).await);
        }

        Ok(())
    }

    #[instrument(skip_all)]
    async fn sign_out(&self, access_token: &str) -> Result<()> {
        let request = self.client.post(self.endpoint("logout"));
        let response = with_api_key(request, &self.anon_key, access_token)
            .send()
            .await?;

        // An already-expired session is as good as signed out
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("Sign-out with an expired session");
            return Ok(());
        }
        if !response.status().is_success() {
            return Err(auth_error(response).await);
        }

        Ok(())
    }

    #[instrument(skip_all)]
    async fn current_user(&self, access_token: &str) -> Result<Option<User>> {
        let request = self.client.get(self.endpoint("user"));
        let response = with_api_key(request, &self.anon_key, access_token)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status if status.is_success() => Ok(Some(response.json::<User>().await?)),
            _ => Err(auth_error(response).await),
        }
    }
}
