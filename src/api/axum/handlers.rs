//! HTTP handlers for the authentication endpoints.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::cookies::append_cookie;
use super::error::AppError;
use super::routes::AppState;
use crate::actions::{Authenticated, LoginAction, LogoutAction};
use crate::api::{LoginRequest, MessageResponse, RolesResponse, UserResponse};
use crate::crypto::PasswordHasher;
use crate::session::SessionCookie;
use crate::{AuthError, Role, SessionRepository, UserRepository};

/// Exchange credentials for a session cookie.
///
/// POST /api/auth/login
///
/// A body that is not a JSON login object is a validation error, not axum's
/// plain-text rejection.
pub async fn login<U, S, H>(
    State(state): State<AppState<U, S, H>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Response
where
    U: UserRepository + Clone + 'static,
    S: SessionRepository + Clone + 'static,
    H: PasswordHasher + Clone + 'static,
{
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            log::debug!(
                target: "mainframe_auth",
                "msg=\"login body rejected\" status={} reason=\"{}\"",
                rejection.status(),
                rejection.body_text()
            );
            return AppError(AuthError::Validation(
                "request body must be a JSON object with username and password".to_owned(),
            ))
            .into_response();
        }
    };

    if let Err(err) = body.validate() {
        return AppError(err).into_response();
    }

    let action = LoginAction::new(
        state.user_repo,
        state.session_repo,
        state.hasher,
        &state.config,
    )
    .with_events(state.events);

    match action.execute(body.username.trim(), &body.password).await {
        Ok(outcome) => {
            let cookie = outcome.cookie(&state.config.session);
            let mut response = (StatusCode::OK, Json(UserResponse::from(outcome.user))).into_response();
            append_cookie(response.headers_mut(), &cookie);
            response
        }
        Err(err) => AppError(err).into_response(),
    }
}

/// Revoke the current session and clear the cookie.
///
/// POST /api/auth/logout
pub async fn logout<U, S, H>(
    State(state): State<AppState<U, S, H>>,
    identity: Authenticated,
) -> Response
where
    U: Clone + Send + Sync + 'static,
    S: SessionRepository + Clone + 'static,
    H: Clone + Send + Sync + 'static,
{
    let action = LogoutAction::new(state.session_repo, &state.config).with_events(state.events);

    match action.execute(&identity.session).await {
        Ok(()) => {
            let mut response = StatusCode::NO_CONTENT.into_response();
            append_cookie(
                response.headers_mut(),
                &SessionCookie::removal(&state.config.session),
            );
            response
        }
        Err(err) => AppError(err).into_response(),
    }
}

/// GET /api/auth/me
pub async fn current_user(identity: Authenticated) -> Json<UserResponse> {
    Json(UserResponse::from(identity.user))
}

/// List assignable roles. Administrators only.
///
/// GET /api/roles
pub async fn list_roles() -> Json<RolesResponse> {
    Json(RolesResponse {
        roles: Role::ALL.to_vec(),
    })
}

/// GET /health
pub async fn health() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "ok".to_owned(),
    })
}
