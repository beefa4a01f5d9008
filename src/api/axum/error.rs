use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::AuthError;
use crate::api::ErrorResponse;

/// converts `AuthError` into appropriate HTTP responses
#[derive(Debug)]
pub struct AppError(pub AuthError);

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        Self(err)
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials | AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::NotFound => StatusCode::NOT_FOUND,
            AuthError::DatabaseError(_)
            | AuthError::PasswordHashError
            | AuthError::CryptoError(_)
            | AuthError::ConfigurationError(_)
            | AuthError::Timeout(_)
            | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.0.is_internal() {
            log::error!(target: "mainframe_auth", "msg=\"request failed\" error=\"{}\"", self.0);
        }

        (self.status(), Json(ErrorResponse::from(&self.0))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError(AuthError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError(AuthError::Unauthorized).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError(AuthError::Forbidden).status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError(AuthError::Validation("x".to_owned())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError(AuthError::NotFound).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError(AuthError::Timeout("find_session")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
