use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::validation::ValidationError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Couldn't find the desired {0}")]
    NotFound(&'static str),

    #[error("Missing or invalid authorization")]
    Unauthorized,

    #[error("Not allowed to {0}")]
    Forbidden(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Couldn't encode document: {0}")]
    Encode(#[from] bson::ser::Error),

    #[error("In-memory store lock was poisoned")]
    Poisoned,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Invalid(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Database(_) | AppError::Encode(_) | AppError::Poisoned => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        HttpResponse::build(status).json(json!({ "error": self.to_string() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::Invalid(ValidationError::NoPayers), StatusCode::BAD_REQUEST)]
    #[case(AppError::NotFound("group"), StatusCode::NOT_FOUND)]
    #[case(AppError::Unauthorized, StatusCode::UNAUTHORIZED)]
    #[case(AppError::Forbidden("settle someone else's debt"), StatusCode::FORBIDDEN)]
    #[case(AppError::Poisoned, StatusCode::INTERNAL_SERVER_ERROR)]
    fn maps_to_status(#[case] error: AppError, #[case] expected: StatusCode) {
        assert_eq!(error.status_code(), expected);
        assert_eq!(error.error_response().status(), expected);
    }

    #[test]
    fn validation_message_passes_through() {
        let error = AppError::from(ValidationError::UnknownMember("z".to_string()));
        assert_eq!(error.to_string(), "Member z is not part of this group");
    }
}
