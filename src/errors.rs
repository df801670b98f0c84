//! Unified error types and result handling.
//!
//! Every layer returns [`Result`]. Validation problems carry the full set of
//! field messages so the caller can render them next to each input, while
//! collaborator failures collapse into a single message.

use crate::core::form::ValidationErrors;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Application error type
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed configuration
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Any failure reported by the record store
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// The requested travel package does not exist
    #[error("Travel package not found: {id}")]
    PackageNotFound {
        /// Identifier that was looked up
        id: String,
    },

    /// The draft broke one or more field rules
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// The selected file is not an acceptable image
    #[error("Invalid image: {reason}")]
    InvalidImage {
        /// User-facing reason
        reason: String,
    },

    /// Re-encoding the image before upload failed
    #[error("Image optimization failed: {message}")]
    ImageOptimization {
        /// Underlying decoder/encoder message
        message: String,
    },

    /// The object storage collaborator rejected a request
    #[error("Storage error: {message}")]
    Storage {
        /// Message reported by the storage service
        message: String,
    },

    /// The auth collaborator rejected a request; the message is shown verbatim
    #[error("{message}")]
    Auth {
        /// Message reported by the auth service
        message: String,
    },

    /// The request carried no valid session
    #[error("Unauthorized")]
    Unauthorized,

    /// A destructive action was requested without explicit confirmation
    #[error("This action requires explicit confirmation")]
    ConfirmationRequired,

    /// The request itself is malformed (bad query, unreadable multipart body)
    #[error("{message}")]
    BadRequest {
        /// What was wrong with the request
        message: String,
    },

    /// The form or package is already being saved
    #[error("A submission is already in progress")]
    SubmissionInProgress,

    /// Transport-level failure talking to a remote collaborator
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable error
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    /// HTTP status used when this error crosses the web boundary.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::PackageNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InvalidImage { .. }
            | Self::ImageOptimization { .. }
            | Self::ConfirmationRequired
            | Self::BadRequest { .. }
            | Self::Auth { .. } => StatusCode::BAD_REQUEST,
            Self::SubmissionInProgress => StatusCode::CONFLICT,
            Self::Storage { .. } | Self::Http(_) => StatusCode::BAD_GATEWAY,
            Self::Config { .. }
            | Self::Database(_)
            | Self::Io(_)
            | Self::EnvVar(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            Self::Validation(errors) => json!({ "error": self.to_string(), "fields": errors }),
            _ => json!({ "error": self.to_string() }),
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {self}");
        }

        (status, Json(body)).into_response()
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
