use std::sync::Arc;

use super::{AuthEvent, Listener};

/// Fans events out to a fixed set of listeners.
///
/// Built once at startup and handed to every action and guard that emits
/// events. Cloning shares the listener list. A dispatcher with no listeners
/// drops events.
#[derive(Clone, Default)]
pub struct EventDispatcher {
    listeners: Vec<Arc<dyn Listener>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener. Listeners run in the order they were added.
    #[must_use]
    pub fn listen(mut self, listener: impl Listener) -> Self {
        self.listeners.push(Arc::new(listener));
        self
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub async fn dispatch(&self, event: AuthEvent) {
        for listener in &self.listeners {
            listener.handle(&event).await;
        }
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;

    #[derive(Clone, Default)]
    struct Recorder {
        seen: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl Listener for Recorder {
        async fn handle(&self, event: &AuthEvent) {
            self.seen.lock().unwrap().push(event.name());
        }
    }

    #[tokio::test]
    async fn test_dispatch_reaches_every_listener_in_order() {
        let first = Recorder::default();
        let second = Recorder::default();
        let dispatcher = EventDispatcher::new()
            .listen(first.clone())
            .listen(second.clone());
        assert_eq!(dispatcher.len(), 2);

        dispatcher
            .dispatch(AuthEvent::SessionsPruned {
                count: 2,
                at: Utc::now(),
            })
            .await;

        assert_eq!(*first.seen.lock().unwrap(), vec!["auth.session.pruned"]);
        assert_eq!(*second.seen.lock().unwrap(), vec!["auth.session.pruned"]);
    }

    #[tokio::test]
    async fn test_empty_dispatcher_is_noop() {
        let dispatcher = EventDispatcher::default();
        assert!(dispatcher.is_empty());
        dispatcher
            .dispatch(AuthEvent::SessionsPruned {
                count: 0,
                at: Utc::now(),
            })
            .await;
    }

    #[tokio::test]
    async fn test_clones_share_listeners() {
        let recorder = Recorder::default();
        let dispatcher = EventDispatcher::new().listen(recorder.clone());
        let cloned = dispatcher.clone();

        cloned
            .dispatch(AuthEvent::UnknownUser {
                username: "ghost".to_owned(),
                at: Utc::now(),
            })
            .await;

        assert_eq!(recorder.seen.lock().unwrap().len(), 1);
    }
}
