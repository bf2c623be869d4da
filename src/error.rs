use std::collections::BTreeMap;

use axum::{
    extract::rejection::JsonRejection,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::crypto::token::TokenError;

/// Field name → messages, as returned to login/signup forms.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A database error.
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// A connection pool error.
    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// The pool could not be built from the configuration.
    #[error("Pool creation error: {0}")]
    CreatePool(#[from] deadpool_postgres::CreatePoolError),

    /// The credential store could not be reached.
    #[error("Credential store unavailable: {0}")]
    StoreUnavailable(String),

    /// A column was missing from a database row.
    #[error("Missing data: {0}")]
    MissingData(String),

    /// Wrong email or wrong password. Both cases carry the same message.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Signup with an email that already has an account.
    #[error("Email already registered")]
    EmailTaken,

    /// No valid session accompanies the request.
    #[error("Not authenticated")]
    Unauthenticated,

    /// A resource not found error.
    #[error("Resource not found")]
    NotFound,

    /// A validation error, with per-field messages for form display.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field_errors: FieldErrors,
    },

    /// Missing or invalid configuration, such as an empty signing secret.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Password hashing failed.
    #[error("Hashing error: {0}")]
    Hashing(String),

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// A validation error that is not tied to a single form field.
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            field_errors: FieldErrors::new(),
        }
    }

    /// The machine-readable kind sent to clients.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Database(_) | AppError::Pool(_) | AppError::StoreUnavailable(_) => {
                "store_unavailable"
            }
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::EmailTaken => "email_taken",
            AppError::Unauthenticated => "unauthenticated",
            AppError::NotFound => "not_found",
            AppError::Validation { .. } => "validation",
            AppError::CreatePool(_)
            | AppError::MissingData(_)
            | AppError::Config(_)
            | AppError::Hashing(_)
            | AppError::Internal(_) => "internal",
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Config(msg) => AppError::Config(msg),
            TokenError::Encoding(msg) => AppError::Internal(msg),
            TokenError::Malformed | TokenError::InvalidSignature | TokenError::Expired => {
                AppError::Unauthenticated
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::validation(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    kind: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    field_errors: Option<&'a FieldErrors>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        const UNAVAILABLE: &str = "Service temporarily unavailable, please try again";
        const INTERNAL: &str = "Internal server error";

        let (status, message) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::SERVICE_UNAVAILABLE, UNAVAILABLE.to_string())
            }

            AppError::Pool(ref e) => {
                tracing::error!("Pool error: {}", e);
                (StatusCode::SERVICE_UNAVAILABLE, UNAVAILABLE.to_string())
            }

            AppError::StoreUnavailable(ref msg) => {
                tracing::error!("Credential store unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, UNAVAILABLE.to_string())
            }

            AppError::CreatePool(ref e) => {
                tracing::error!("Pool creation error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_string())
            }

            AppError::MissingData(ref column) => {
                tracing::error!("Missing column in row: {}", column);
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_string())
            }

            AppError::InvalidCredentials => {
                tracing::warn!("Authentication failed: invalid credentials");
                (StatusCode::UNAUTHORIZED, self.to_string())
            }

            AppError::EmailTaken => {
                tracing::warn!("Signup rejected: email already registered");
                (StatusCode::CONFLICT, self.to_string())
            }

            AppError::Unauthenticated => {
                tracing::debug!("Request without a valid session");
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
            }

            AppError::NotFound => {
                tracing::debug!("Resource not found");
                (StatusCode::NOT_FOUND, "Resource not found".to_string())
            }

            AppError::Validation { ref message, .. } => {
                tracing::debug!("Validation error: {}", message);
                (StatusCode::BAD_REQUEST, message.clone())
            }

            AppError::Config(ref msg) => {
                tracing::error!("Configuration error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_string())
            }

            AppError::Hashing(ref msg) => {
                tracing::error!("Hashing error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_string())
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_string())
            }
        };

        let field_errors = match self {
            AppError::Validation { ref field_errors, .. } if !field_errors.is_empty() => {
                Some(field_errors)
            }
            _ => None,
        };

        let body = sonic_rs::to_string(&ErrorBody {
            error: &message,
            kind: self.kind(),
            field_errors,
        })
        .unwrap_or_else(|_| r#"{"error":"Internal server error","kind":"internal"}"#.to_string());

        (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
    }
}
