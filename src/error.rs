use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::failures::AuthFailure;
use crate::validation::ValidationErrors;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed")]
    Validation(ValidationErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("{}", .0.message())]
    Auth(AuthFailure),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Body of every non-2xx response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ValidationErrors>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(f) => f.status(),
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Internal(e.into())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(e: ValidationErrors) -> Self {
        AppError::Validation(e)
    }
}

impl From<AuthFailure> for AppError {
    fn from(f: AuthFailure) -> Self {
        AppError::Auth(f)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::Internal(e) => {
                tracing::error!(error = ?e, "internal error");
                ErrorBody {
                    success: false,
                    error: "Internal server error".into(),
                    code: None,
                    details: None,
                }
            }
            AppError::Validation(details) => ErrorBody {
                success: false,
                error: "Validation failed".into(),
                code: None,
                details: Some(details),
            },
            AppError::Auth(failure) => ErrorBody {
                success: false,
                error: failure.message().into(),
                code: Some(failure.code()),
                details: None,
            },
            other => ErrorBody {
                success: false,
                error: other.to_string(),
                code: None,
                details: None,
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404_with_message() {
        let err = AppError::NotFound("Recipe");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Recipe not found");
    }

    #[test]
    fn internal_error_hides_cause() {
        let err = AppError::Internal(anyhow::anyhow!("connection refused"));
        let res = err.into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn error_body_omits_empty_details() {
        let body = ErrorBody {
            success: false,
            error: "nope".into(),
            code: None,
            details: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"success": false, "error": "nope"}));
    }
}
