//! Session and authentication.
//!
//! User accounts and sessions belong to the hosted auth service; this module only
//! signs people in and out and resolves a bearer token to its user. Messages coming
//! back from the service are surfaced to the user verbatim.

mod supabase;

pub use supabase::SupabaseAuth;

use crate::errors::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

/// An authenticated account as reported by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Account identifier
    pub id: String,
    /// Account e-mail
    #[serde(default)]
    pub email: Option<String>,
    /// Role assigned by the auth service
    #[serde(default)]
    pub role: Option<String>,
}

/// A signed-in session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token for subsequent requests
    pub access_token: String,
    /// Token used to refresh the session
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Seconds until `access_token` expires
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// The signed-in user
    pub user: User,
}

/// E-mail and password pair.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    /// Account e-mail
    pub email: String,
    /// Account password
    pub password: String,
}

/// Capability to talk to the auth service.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Exchanges credentials for a session.
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session>;

    /// Registers an account; the confirmation e-mail links to `redirect_to`.
    async fn sign_up(&self, credentials: &Credentials, redirect_to: &str) -> Result<()>;

    /// Invalidates a session.
    async fn sign_out(&self, access_token: &str) -> Result<()>;

    /// Resolves a token to its user, `None` when the token is not valid.
    async fn current_user(&self, access_token: &str) -> Result<Option<User>>;
}

/// Sign-in, sign-up and session lookups with the site's redirect policy.
#[derive(Clone)]
pub struct AuthService {
    provider: Arc<dyn AuthProvider>,
    redirect_url: String,
}

impl AuthService {
    /// Creates the service; `redirect_url` is where users land after authenticating.
    pub fn new(provider: Arc<dyn AuthProvider>, redirect_url: impl Into<String>) -> Self {
        Self {
            provider,
            redirect_url: redirect_url.into(),
        }
    }

    /// Where users land after signing in or confirming a sign-up.
    #[must_use]
    pub fn redirect_url(&self) -> &str {
        &self.redirect_url
    }

    /// Signs in with e-mail and password.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let credentials = credentials(email, password)?;
        let session = self.provider.sign_in(&credentials).await?;
        info!("User {} signed in", session.user.id);
        Ok(session)
    }

    /// Registers a new admin account.
    ///
    /// # Errors
    /// Fails locally, without contacting the auth service, when the two passwords differ.
    #[instrument(skip(self, password, repeat_password))]
    pub async fn sign_up(&self, email: &str, password: &str, repeat_password: &str) -> Result<()> {
        if password != repeat_password {
            return Err(Error::Auth {
                message: "Las contraseñas no coinciden".to_string(),
            });
        }

        let credentials = credentials(email, password)?;
        self.provider
            .sign_up(&credentials, &self.redirect_url)
            .await
    }

    /// Signs out the session behind `access_token`.
    pub async fn sign_out(&self, access_token: &str) -> Result<()> {
        self.provider.sign_out(access_token).await
    }

    /// The user behind `access_token`, if the token is valid.
    pub async fn current_user(&self, access_token: &str) -> Result<Option<User>> {
        if access_token.is_empty() {
            return Ok(None);
        }
        self.provider.current_user(access_token).await
    }
}

fn credentials(email: &str, password: &str) -> Result<Credentials> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(Error::Auth {
            message: "El email y la contraseña son requeridos".to_string(),
        });
    }

    Ok(Credentials {
        email: email.to_string(),
        password: password.to_string(),
    })
}
