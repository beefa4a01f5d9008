use std::sync::Arc;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};

use super::{handlers, middleware};
use crate::actions::RoleGuard;
use crate::crypto::PasswordHasher;
use crate::events::EventDispatcher;
use crate::{AuthConfig, Role, SessionRepository, UserRepository};

#[derive(Clone)]
pub struct AppState<U, S, H> {
    pub user_repo: U,
    pub session_repo: S,
    pub hasher: H,
    pub config: Arc<AuthConfig>,
    pub events: EventDispatcher,
}

impl<U, S, H> AppState<U, S, H> {
    pub fn new(user_repo: U, session_repo: S, hasher: H, config: AuthConfig) -> Self {
        Self {
            user_repo,
            session_repo,
            hasher,
            config: Arc::new(config),
            events: EventDispatcher::default(),
        }
    }

    #[must_use]
    pub fn with_events(mut self, events: EventDispatcher) -> Self {
        self.events = events;
        self
    }
}

/// Full application router with state applied.
pub fn app<U, S, H>(state: AppState<U, S, H>) -> Router
where
    U: UserRepository + Clone + 'static,
    S: SessionRepository + Clone + 'static,
    H: PasswordHasher + Clone + 'static,
{
    Router::new()
        .merge(public_routes())
        .merge(private_routes(&state))
        .with_state(state)
}

pub fn public_routes<U, S, H>() -> Router<AppState<U, S, H>>
where
    U: UserRepository + Clone + 'static,
    S: SessionRepository + Clone + 'static,
    H: PasswordHasher + Clone + 'static,
{
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/auth/login", post(handlers::login::<U, S, H>))
}

/// Routes behind the session middleware. `/api/roles` additionally requires
/// the `Administrator` role.
pub fn private_routes<U, S, H>(state: &AppState<U, S, H>) -> Router<AppState<U, S, H>>
where
    U: UserRepository + Clone + 'static,
    S: SessionRepository + Clone + 'static,
    H: PasswordHasher + Clone + 'static,
{
    let admin = Router::new()
        .route("/api/roles", get(handlers::list_roles))
        .route_layer(from_fn_with_state(
            RoleGuard::new(Role::Administrator).with_events(state.events.clone()),
            middleware::require_role,
        ));

    Router::new()
        .route("/api/auth/logout", post(handlers::logout::<U, S, H>))
        .route("/api/auth/me", get(handlers::current_user))
        .merge(admin)
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::require_session::<U, S, H>,
        ))
}
