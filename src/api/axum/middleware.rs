use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::cookies::HeaderCookies;
use super::error::AppError;
use super::routes::AppState;
use crate::actions::{Authenticated, RoleGuard, SessionGuard};
use crate::crypto::PasswordHasher;
use crate::{AuthError, SessionRepository, UserRepository};

/// Validates the session cookie and stores the [`Authenticated`] identity as a
/// request extension.
///
/// Cookies written by the guard (renewal or removal) are added to the
/// response, including rejections.
pub async fn require_session<U, S, H>(
    State(state): State<AppState<U, S, H>>,
    mut request: Request,
    next: Next,
) -> Response
where
    U: UserRepository + Clone + 'static,
    S: SessionRepository + Clone + 'static,
    H: PasswordHasher + Clone + 'static,
{
    let mut cookies = HeaderCookies::from_headers(request.headers());
    let guard = SessionGuard::new(
        state.user_repo.clone(),
        state.session_repo.clone(),
        &state.config,
    )
    .with_events(state.events.clone());

    let mut response = match guard.authenticate(&mut cookies).await {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(err) => AppError(err).into_response(),
    };

    cookies.apply(response.headers_mut());
    response
}

/// Rejects requests whose identity lacks the guard's role.
///
/// Must be layered inside [`require_session`].
pub async fn require_role(State(guard): State<RoleGuard>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let allowed = guard
        .check(request.extensions().get::<Authenticated>(), &path)
        .await
        .map(|_| ());

    match allowed {
        Ok(()) => next.run(request).await,
        Err(err) => AppError(err).into_response(),
    }
}

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Self>().cloned().ok_or_else(|| {
            log::error!(
                target: "mainframe_auth",
                "msg=\"handler requires a session but none was attached\" path=\"{}\"",
                parts.uri.path()
            );
            AppError(AuthError::Internal(
                "authenticated route mounted without session middleware".to_owned(),
            ))
        })
    }
}
