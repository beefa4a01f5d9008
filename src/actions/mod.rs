pub mod authenticate;
pub mod authorize;
pub mod login;
pub mod logout;
pub mod prune_expired;

pub use authenticate::{Authenticated, SessionGuard};
pub use authorize::RoleGuard;
pub use login::{LoginAction, LoginOutcome};
pub use logout::LogoutAction;
pub use prune_expired::PruneExpiredSessionsAction;
