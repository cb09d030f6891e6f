use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::json;

/// Error type for every fallible portal operation.
#[derive(thiserror::Error, Debug)]
pub enum PortalError {
    /// A form field failed validation; nothing was written.
    #[error("{field}: {message}")]
    Validation { field: String, message: String },
    /// The record does not exist, or does not belong to the caller.
    #[error("record not found")]
    NotFound,
    /// Login attempt with credentials that do not check out.
    #[error("{0}")]
    InvalidCredentials(String),
    /// A student-portal route was hit without a student session.
    #[error("student login required")]
    StudentSessionRequired,
    /// An admin route was hit without an admin session.
    #[error("admin login required")]
    AdminSessionRequired,
    /// The operation is not allowed in the record's current state.
    #[error("{0}")]
    Rejected(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl PortalError {
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation { field, message } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "field": field, "error": message })),
            )
                .into_response(),
            Self::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "record not found" })),
            )
                .into_response(),
            Self::InvalidCredentials(message) => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response()
            }
            Self::StudentSessionRequired => Redirect::to("/portal/login").into_response(),
            Self::AdminSessionRequired => Redirect::to("/admin/login").into_response(),
            Self::Rejected(message) => {
                (StatusCode::FORBIDDEN, Json(json!({ "error": message }))).into_response()
            }
            Self::Database(e) => {
                log::error!("database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal error" })),
                )
                    .into_response()
            }
            Self::Migrate(e) => {
                log::error!("migration error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal error" })),
                )
                    .into_response()
            }
        }
    }
}
