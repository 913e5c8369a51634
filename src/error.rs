use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

use crate::{
    dao::catalog::CatalogError,
    state::{
        player::PlayError,
        session::InvalidQuestion,
        state_machine::{AbortError, ApplyError, PlanError},
    },
};

/// Message returned for every failure that is not the caller's fault.
const SYSTEM_ERROR_MESSAGE: &str = "A system error occurred";

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Catalog backend failed.
    #[error("catalog unavailable")]
    Unavailable(#[source] CatalogError),
    /// Catalog call exceeded its time limit.
    #[error("operation timed out")]
    Timeout,
    /// Referenced game, session or player does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Caller does not own the referenced game or session.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Malformed input.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Caller-visible errors: access problems, input problems, and opaque internal failures.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed input or an action attempted in an invalid state.
    #[error("{0}")]
    BadRequest(String),
    /// Unknown, ended or not-owned game, session or player.
    #[error("{0}")]
    Forbidden(String),
    /// Anything else; the detail is logged, never returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(message) | ServiceError::Forbidden(message) => {
                AppError::Forbidden(message)
            }
            ServiceError::InvalidInput(message) | ServiceError::InvalidState(message) => {
                AppError::BadRequest(message)
            }
            ServiceError::Unavailable(source) => AppError::Internal(source.to_string()),
            ServiceError::Timeout => AppError::Internal("catalog call timed out".into()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::Forbidden(message) => (StatusCode::FORBIDDEN, message),
            AppError::Internal(detail) => {
                error!(%detail, "request failed with an internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    SYSTEM_ERROR_MESSAGE.to_owned(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

impl From<PlanError> for ServiceError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::AlreadyPending => {
                ServiceError::InvalidState("session transition already pending".into())
            }
            PlanError::InvalidTransition(invalid) => {
                ServiceError::InvalidState(invalid.to_string())
            }
        }
    }
}

impl From<ApplyError> for ServiceError {
    fn from(err: ApplyError) -> Self {
        match err {
            ApplyError::NoPending => ServiceError::InvalidState("no transition is pending".into()),
            ApplyError::IdMismatch { .. } => {
                ServiceError::InvalidState("pending transition does not match".into())
            }
            ApplyError::PhaseMismatch { expected, actual } => ServiceError::InvalidState(format!(
                "session changed during transition (expected {expected:?}, got {actual:?})"
            )),
            ApplyError::VersionMismatch { expected, actual } => {
                ServiceError::InvalidState(format!(
                    "session version mismatch during transition (expected {expected}, got {actual})"
                ))
            }
        }
    }
}

impl From<AbortError> for ServiceError {
    fn from(err: AbortError) -> Self {
        match err {
            AbortError::NoPending => ServiceError::InvalidState("no pending transition".into()),
            AbortError::IdMismatch { .. } => {
                ServiceError::InvalidState("transition plan does not match".into())
            }
        }
    }
}

impl From<PlayError> for ServiceError {
    fn from(err: PlayError) -> Self {
        let message = err.to_string();
        match err {
            PlayError::SessionEnded(_) | PlayError::UnknownPlayer(_) => {
                ServiceError::NotFound(message)
            }
            PlayError::InvalidName
            | PlayError::EmptyAnswer
            | PlayError::UnknownOption(_)
            | PlayError::TooManyOptions => ServiceError::InvalidInput(message),
            PlayError::LateJoinClosed(_)
            | PlayError::NotStarted
            | PlayError::Finished
            | PlayError::WindowClosed(_)
            | PlayError::WindowOpen(_) => ServiceError::InvalidState(message),
        }
    }
}

impl From<InvalidQuestion> for ServiceError {
    fn from(err: InvalidQuestion) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}
