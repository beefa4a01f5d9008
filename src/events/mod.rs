//! Authentication event delivery.
//!
//! Actions and guards emit [`AuthEvent`]s through an injected
//! [`EventDispatcher`]. Nothing is global: a component built with
//! `EventDispatcher::default()` simply emits to nobody.
//!
//! ```rust
//! use mainframe_auth::events::EventDispatcher;
//! use mainframe_auth::events::listeners::LoggingListener;
//!
//! let events = EventDispatcher::new().listen(LoggingListener::new());
//! assert_eq!(events.len(), 1);
//! ```

mod event;
mod listener;
mod registry;

pub mod listeners;

pub use event::{AuthEvent, RejectReason};
pub use listener::Listener;
pub use registry::EventDispatcher;
