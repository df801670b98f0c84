//! Authentication routes.
//!
//! Failures from the auth provider reach the client with their message unchanged.

use crate::{
    auth::{Session, User},
    errors::Result,
    web::{AdminSession, AppState},
};
use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Sign-in form.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Account e-mail
    pub email: String,
    /// Account password
    pub password: String,
}

/// Sign-up form.
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    /// Account e-mail
    pub email: String,
    /// Chosen password
    pub password: String,
    /// Same password again
    pub repeat_password: String,
}

/// Successful sign-in.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// The new session
    pub session: Session,
    /// Where the client should navigate next
    pub redirect_to: String,
}

/// Successful sign-up.
#[derive(Debug, Serialize)]
pub struct SignUpResponse {
    /// Message for the user
    pub message: String,
    /// Where the confirmation e-mail leads
    pub redirect_to: String,
}

/// Signs in with e-mail and password.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let session = state.auth.sign_in(&request.email, &request.password).await?;
    Ok(Json(LoginResponse {
        session,
        redirect_to: state.auth.redirect_url().to_string(),
    }))
}

/// Registers an account; the user confirms it by e-mail.
pub async fn sign_up(
    State(state): State<AppState>,
    Json(request): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<SignUpResponse>)> {
    state
        .auth
        .sign_up(&request.email, &request.password, &request.repeat_password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SignUpResponse {
            message: "Revisa tu email para confirmar tu cuenta".to_string(),
            redirect_to: state.auth.redirect_url().to_string(),
        }),
    ))
}

/// Ends the caller's session.
pub async fn logout(State(state): State<AppState>, session: AdminSession) -> Result<StatusCode> {
    state.auth.sign_out(&session.access_token).await?;
    info!("User {} signed out", session.user.id);
    Ok(StatusCode::NO_CONTENT)
}

/// The caller's account.
pub async fn current_user(session: AdminSession) -> Json<User> {
    Json(session.user)
}
