use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::response::{FieldErrors, Reply};

const MSG_INTERNAL: &str = "Internal server error";
const MSG_NOT_FOUND: &str = "User not found";
const MSG_VALIDATION: &str = "Validation failed";
const MSG_MALFORMED: &str = "Malformed request body";
const IN_USE: &str = "already in use";

/// Unique column that rejected a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictField {
    Email,
    Username,
}

impl ConflictField {
    pub fn as_str(self) -> &'static str {
        match self {
            ConflictField::Email => "email",
            ConflictField::Username => "username",
        }
    }

    fn message(self) -> &'static str {
        match self {
            ConflictField::Email => "Email already registered",
            ConflictField::Username => "Username already in use",
        }
    }

    /// Maps a Postgres unique constraint name back to the column it guards.
    pub fn from_constraint(name: Option<&str>) -> Self {
        match name {
            Some("users_username_key") => ConflictField::Username,
            _ => ConflictField::Email,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated on {}", .0.as_str())]
    UniqueViolation(ConflictField),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Splits unique violations (SQLSTATE 23505) out of raw driver errors.
    pub fn classify(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                return StoreError::UniqueViolation(ConflictField::from_constraint(
                    db_err.constraint(),
                ));
            }
        }
        StoreError::Database(err)
    }
}

#[derive(Debug, Error)]
pub enum UserError {
    #[error("user not found")]
    NotFound,
    #[error("{} already in use", .0.as_str())]
    Conflict(ConflictField),
    #[error("invalid request fields: {0:?}")]
    Validation(FieldErrors),
    #[error("malformed request body: {0}")]
    MalformedBody(String),
    #[error("store failure: {0}")]
    Store(StoreError),
    #[error(transparent)]
    Hash(#[from] anyhow::Error),
}

impl From<StoreError> for UserError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(field) => UserError::Conflict(field),
            other => UserError::Store(other),
        }
    }
}

impl UserError {
    pub fn status(&self) -> StatusCode {
        match self {
            UserError::NotFound => StatusCode::NOT_FOUND,
            UserError::Conflict(_) => StatusCode::CONFLICT,
            UserError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            UserError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            UserError::Store(_) | UserError::Hash(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Turns the error into its envelope. Internal causes are logged under
    /// `op` and replaced by a generic message.
    pub fn into_reply<T>(self, op: &'static str) -> Reply<T> {
        let status = self.status();
        match self {
            UserError::NotFound => Reply::message(status, MSG_NOT_FOUND),
            UserError::Conflict(field) => {
                warn!(op, field = field.as_str(), "unique field conflict");
                let mut errors = FieldErrors::new();
                errors.insert(field.as_str().to_string(), IN_USE.to_string());
                Reply::failure(status, field.message(), Some(errors))
            }
            UserError::Validation(errors) => {
                warn!(op, fields = ?errors.keys().collect::<Vec<_>>(), "request rejected");
                Reply::failure(status, MSG_VALIDATION, Some(errors))
            }
            UserError::MalformedBody(detail) => {
                warn!(op, %detail, "malformed request body");
                Reply::failure(status, MSG_MALFORMED, None)
            }
            UserError::Store(e) => {
                error!(op, error = %e, "store error");
                Reply::failure(status, MSG_INTERNAL, None)
            }
            UserError::Hash(e) => {
                error!(op, error = %e, "password hashing error");
                Reply::failure(status, MSG_INTERNAL, None)
            }
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        self.into_reply::<()>("request").into_response()
    }
}
