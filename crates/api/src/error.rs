use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hsseq_core::backend::BackendError;
use hsseq_core::error::CoreError;
use serde::Serialize;

/// Error returned by every handler.
///
/// Domain and persistence failures arrive as [`CoreError`]. Responses carry
/// a `{ "error", "code" }` body.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        AppError::Core(err.into())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Core(CoreError::Validation(errors.to_string()))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

const GENERIC_INTERNAL: &str = "An internal error occurred";
const GENERIC_UNAVAILABLE: &str = "The form store is temporarily unavailable";

/// Status, code and client-facing message for a domain error.
///
/// Server-side details of unreachable and internal failures are logged here
/// and never sent to the client.
fn classify(err: &CoreError) -> (StatusCode, &'static str, String) {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::MalformedInput(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
        CoreError::Unreachable(detail) => {
            tracing::error!(error = %detail, "Form store unreachable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                GENERIC_UNAVAILABLE.to_string(),
            )
        }
        CoreError::Internal(detail) => {
            tracing::error!(error = %detail, "Internal domain error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                GENERIC_INTERNAL.to_string(),
            )
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, error) = match &self {
            AppError::Core(core) => classify(core),
            AppError::InternalError(detail) => {
                tracing::error!(error = %detail, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    GENERIC_INTERNAL.to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error, code })).into_response()
    }
}
