mod cookies;
mod error;
mod handlers;
mod middleware;
mod routes;

pub use cookies::{HeaderCookies, append_cookie};
pub use error::AppError;
pub use middleware::{require_role, require_session};
pub use routes::{AppState, app, private_routes, public_routes};
