use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{
    dao::storage::StorageError,
    state::{authoring::AuthoringError, error::EngineError},
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// The submitted game or round was rejected.
    #[error(transparent)]
    Authoring(#[from] AuthoringError),
    /// The progression engine rejected the action.
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Operation exceeded its timeout limit.
    #[error("operation timed out")]
    Timeout,
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source @ StorageError::Conflict { .. }) => {
                AppError::Conflict(source.to_string())
            }
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::Authoring(err) => AppError::BadRequest(err.to_string()),
            ServiceError::Engine(err) => err.into(),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Timeout => AppError::ServiceUnavailable("operation timed out".into()),
        }
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        let message = err.to_string();
        match err {
            EngineError::QuestionNotFound { .. } | EngineError::RoundNotFound { .. } => {
                AppError::NotFound(message)
            }
            EngineError::UnknownUser { .. } => AppError::BadRequest(message),
            EngineError::AlreadyAnswered { .. }
            | EngineError::InvalidTurn(_)
            | EngineError::NotReady(_)
            | EngineError::InvalidTransition(_) => AppError::Conflict(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::state_machine::{GameEvent, GamePhase, InvalidTransition};

    fn status(err: ServiceError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn engine_rejections_map_to_http_statuses() {
        assert_eq!(
            status(
                EngineError::AlreadyAnswered {
                    question_id: "q".into()
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(
                EngineError::QuestionNotFound {
                    question_id: "q".into()
                }
                .into()
            ),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(
                EngineError::from(InvalidTransition {
                    from: GamePhase::Finished,
                    event: GameEvent::Finish,
                })
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(AuthoringError::NoRounds.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(
                StorageError::Conflict {
                    key: "active::1".into()
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(status(ServiceError::Degraded), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status(ServiceError::Timeout), StatusCode::SERVICE_UNAVAILABLE);
    }
}
