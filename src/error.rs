use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{title}: {message}")]
    Validation { title: String, message: String },

    /// A backend failure already logged and mapped to a user-facing message.
    #[error("{title}: {message}")]
    Failed { title: String, message: String },

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Already requested: {0}")]
    AlreadyRequested(String),

    #[error("Backend error {status} ({code:?}): {message}")]
    Backend {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error")]
    InternalServerError,
}

impl AppError {
    pub fn validation(title: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn failed(title: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Failed {
            title: title.into(),
            message: message.into(),
        }
    }

    /// Postgres / PostgREST error code carried by a backend rejection.
    pub fn backend_code(&self) -> Option<&str> {
        match self {
            AppError::Backend { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Short heading shown above the message in an alert.
    pub fn title(&self) -> &str {
        match self {
            AppError::Validation { title, .. } => title,
            AppError::Failed { title, .. } => title,
            AppError::Duplicate(_) => "Duplicate Request",
            AppError::Unauthorized(_) => "Not Signed In",
            AppError::NotFound => "Not Found",
            AppError::AlreadyRequested(_) => "Request Already Exists",
            AppError::Conflict(_) => "Conflict",
            _ => "Error",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub title: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let title = self.title().to_string();
        let (status, error_message) = match self {
            AppError::Validation { message, .. } => (StatusCode::BAD_REQUEST, message),
            AppError::Failed { message, .. } => (StatusCode::BAD_GATEWAY, message),
            AppError::Duplicate(msg) => (StatusCode::CONFLICT, msg),
            AppError::AlreadyRequested(msg) => (StatusCode::CONFLICT, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Backend { status, code, message } => {
                error!("backend error {} ({:?}): {}", status, code, message);
                (
                    StatusCode::BAD_GATEWAY,
                    "The server rejected the request. Please try again.".to_string(),
                )
            }
            AppError::Http(e) => {
                error!("http error: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "Could not reach the server. Please try again.".to_string(),
                )
            }
            AppError::Database(e) => {
                error!("database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                )
            }
            AppError::Config(msg) => {
                error!("configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(ErrorResponse {
            error: status.to_string(),
            title,
            message: error_message,
        });

        (status, body).into_response()
    }
}
